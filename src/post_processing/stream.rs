//! Single-stream decompression
//!
//! Decompresses gz/bz/bz2/lzma/xz files to the path with the compression
//! suffix stripped. Blocking; run by the dispatcher under `spawn_blocking`.

use crate::error::{DecompressError, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Suffixes handled here (checked case-insensitively, last extension only)
const STREAM_SUFFIXES: [&str; 5] = ["gz", "bz", "bz2", "lzma", "xz"];

/// Output path for a single-stream compressed file, if its suffix is one
///
/// `rockyou.txt.gz` decompresses to `rockyou.txt`; anything without a
/// recognized suffix returns `None`.
pub(crate) fn output_path(path: &Path) -> Option<PathBuf> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    if STREAM_SUFFIXES.contains(&ext.as_str()) {
        Some(path.with_extension(""))
    } else {
        None
    }
}

fn stream_failed(path: &Path, reason: impl ToString) -> crate::error::Error {
    DecompressError::StreamFailed {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
    .into()
}

/// Decompress `path` into `output`
///
/// The caller has already established that `output` does not exist.
pub(crate) fn decompress(path: &Path, output: &Path) -> Result<()> {
    debug!(path = %path.display(), output = %output.display(), "decompressing");

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    let file = std::fs::File::open(path).map_err(|e| stream_failed(path, e))?;
    let mut reader: Box<dyn std::io::Read> = match ext.as_str() {
        "gz" => Box::new(flate2::read::GzDecoder::new(file)),
        "bz" | "bz2" => Box::new(bzip2::read::BzDecoder::new(file)),
        // liblzma decodes both the xz and the legacy lzma-alone container
        "lzma" | "xz" => Box::new(xz2::read::XzDecoder::new(file)),
        other => return Err(stream_failed(path, format!("unknown file type: {other}"))),
    };

    let mut out = std::fs::File::create(output).map_err(|e| stream_failed(path, e))?;
    if let Err(e) = std::io::copy(&mut reader, &mut out) {
        // Don't leave a truncated output behind a failed decode
        drop(out);
        let _ = std::fs::remove_file(output);
        return Err(stream_failed(path, e));
    }

    info!(path = %path.display(), output = %output.display(), "decompression complete");
    Ok(())
}
