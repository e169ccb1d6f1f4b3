//! Post-transfer decompression and cleanup pipeline
//!
//! Runs after a successful transfer when decompression was requested.
//! Dispatch is by filename suffix: multi-member containers extract all
//! members into the archive's directory, single-stream formats decompress to
//! the suffix-stripped path, and anything else is left untouched. Cleanup of
//! the compressed original is a separate, configuration-gated step that never
//! touches plain wordlists or torrent descriptors.

mod archive;
mod stream;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

use crate::error::{DecompressError, Error, Result};
use std::path::{Path, PathBuf};
use tokio::task::spawn_blocking;
use tracing::debug;

/// Suffixes that the cleanup stage never deletes: already-plain wordlists
/// and transient torrent descriptors
const KEEP_SUFFIXES: [&str; 3] = ["txt", "lst", "torrent"];

/// Result of running the decompression dispatcher on one artifact
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DecompressOutcome {
    /// A multi-member container was extracted into its directory
    Extracted {
        /// The archive that was extracted
        archive: PathBuf,
    },
    /// A single-stream file was decompressed
    Decompressed {
        /// The suffix-stripped output file
        output: PathBuf,
    },
    /// The single-stream output already exists; nothing was overwritten
    SkippedExisting {
        /// The pre-existing output file
        output: PathBuf,
    },
    /// The suffix is not a compression format; the file was left untouched
    NotApplicable,
}

/// Decompress one fetched artifact, dispatching on its filename suffix
///
/// Torrent descriptors are transient bookkeeping, never payload, and are
/// reported as [`DecompressOutcome::NotApplicable`] like any other
/// unrecognized suffix. Codec work runs on the blocking pool.
pub async fn decompress(path: &Path) -> Result<DecompressOutcome> {
    if path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("torrent"))
    {
        return Ok(DecompressOutcome::NotApplicable);
    }

    if let Some(kind) = archive::detect(path) {
        let archive_path = path.to_path_buf();
        let dest = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        run_blocking(path, move || {
            archive::extract(&archive_path, kind, &dest)
        })
        .await?;
        return Ok(DecompressOutcome::Extracted {
            archive: path.to_path_buf(),
        });
    }

    if let Some(output) = stream::output_path(path) {
        if output.exists() {
            return Ok(DecompressOutcome::SkippedExisting { output });
        }
        let input = path.to_path_buf();
        let out = output.clone();
        run_blocking(path, move || stream::decompress(&input, &out)).await?;
        return Ok(DecompressOutcome::Decompressed { output });
    }

    debug!(path = %path.display(), "unrecognized suffix, leaving file untouched");
    Ok(DecompressOutcome::NotApplicable)
}

/// Whether the cleanup stage may delete this file
///
/// Plain wordlists (`txt`, `lst`) and torrent descriptors are kept no matter
/// what the configuration says.
pub fn cleanup_eligible(path: &Path) -> bool {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => !KEEP_SUFFIXES
            .iter()
            .any(|keep| keep.eq_ignore_ascii_case(ext)),
        None => false,
    }
}

/// Delete the compressed original after a successful decompression
///
/// Returns `Ok(true)` when the file was removed, `Ok(false)` when its suffix
/// exempts it from cleanup.
pub async fn cleanup(path: &Path) -> Result<bool> {
    if !cleanup_eligible(path) {
        debug!(path = %path.display(), "suffix exempt from cleanup");
        return Ok(false);
    }
    tokio::fs::remove_file(path).await?;
    Ok(true)
}

async fn run_blocking(
    path: &Path,
    work: impl FnOnce() -> Result<()> + Send + 'static,
) -> Result<()> {
    spawn_blocking(work).await.map_err(|e| {
        Error::Decompress(DecompressError::ExtractionFailed {
            archive: path.to_path_buf(),
            reason: format!("decompression task panicked: {e}"),
        })
    })?
}
