//! Multi-member archive extraction
//!
//! Extracts every member of rar/zip/7z/tar archives into the archive's own
//! directory. All functions here are blocking and are run by the dispatcher
//! under `spawn_blocking`.

use crate::error::{DecompressError, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Recognized multi-member container formats
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ArchiveKind {
    Rar,
    Zip,
    SevenZip,
    Tar,
    TarGz,
    TarXz,
    TarBz2,
}

/// Detect a container format from the file name suffix
///
/// Compound tar suffixes are matched before the bare single-stream ones, so
/// `lists.tar.gz` extracts as a tarball rather than decompressing to
/// `lists.tar`.
pub(crate) fn detect(path: &Path) -> Option<ArchiveKind> {
    let name = path.file_name()?.to_str()?.to_ascii_lowercase();
    if name.ends_with(".tar.gz") {
        Some(ArchiveKind::TarGz)
    } else if name.ends_with(".tar.xz") {
        Some(ArchiveKind::TarXz)
    } else if name.ends_with(".tar.bz2") {
        Some(ArchiveKind::TarBz2)
    } else if name.ends_with(".tar") {
        Some(ArchiveKind::Tar)
    } else if name.ends_with(".rar") {
        Some(ArchiveKind::Rar)
    } else if name.ends_with(".zip") {
        Some(ArchiveKind::Zip)
    } else if name.ends_with(".7z") {
        Some(ArchiveKind::SevenZip)
    } else {
        None
    }
}

/// Extract all members of `archive` into `dest`
pub(crate) fn extract(archive: &Path, kind: ArchiveKind, dest: &Path) -> Result<()> {
    debug!(archive = %archive.display(), ?kind, dest = %dest.display(), "extracting archive");
    match kind {
        ArchiveKind::Zip => extract_zip(archive, dest),
        ArchiveKind::SevenZip => extract_sevenzip(archive, dest),
        ArchiveKind::Rar => extract_rar(archive, dest),
        ArchiveKind::Tar | ArchiveKind::TarGz | ArchiveKind::TarXz | ArchiveKind::TarBz2 => {
            extract_tar(archive, kind, dest)
        }
    }
}

fn extraction_failed(archive: &Path, reason: impl ToString) -> crate::error::Error {
    DecompressError::ExtractionFailed {
        archive: archive.to_path_buf(),
        reason: reason.to_string(),
    }
    .into()
}

fn extract_zip(archive: &Path, dest: &Path) -> Result<()> {
    let file = std::fs::File::open(archive).map_err(|e| extraction_failed(archive, e))?;
    let mut zip = zip::ZipArchive::new(file).map_err(|e| extraction_failed(archive, e))?;
    zip.extract(dest).map_err(|e| extraction_failed(archive, e))?;
    info!(archive = %archive.display(), members = zip.len(), "ZIP extraction complete");
    Ok(())
}

fn extract_sevenzip(archive: &Path, dest: &Path) -> Result<()> {
    sevenz_rust::decompress_file(archive, dest).map_err(|e| extraction_failed(archive, e))?;
    info!(archive = %archive.display(), "7z extraction complete");
    Ok(())
}

/// Extract a RAR archive using the unrar state-machine interface
fn extract_rar(archive: &Path, dest: &Path) -> Result<()> {
    let processor = unrar::Archive::new(archive)
        .open_for_processing()
        .map_err(|e| extraction_failed(archive, e))?;

    let mut extracted = 0usize;
    let mut at_header = processor;
    loop {
        let at_file = match at_header.read_header() {
            Ok(Some(entry_processor)) => entry_processor,
            Ok(None) => break,
            Err(e) => return Err(extraction_failed(archive, e)),
        };

        let header = at_file.entry();

        // Drop traversal components so members cannot escape the destination
        let sanitized = Path::new(&header.filename)
            .components()
            .filter(|c| matches!(c, std::path::Component::Normal(_)))
            .collect::<PathBuf>();

        if sanitized.as_os_str().is_empty() || header.is_directory() {
            at_header = at_file.skip().map_err(|e| extraction_failed(archive, e))?;
            continue;
        }

        let member_path = dest.join(&sanitized);
        at_header = at_file
            .extract_to(&member_path)
            .map_err(|e| extraction_failed(archive, e))?;
        extracted += 1;
    }

    info!(archive = %archive.display(), extracted, "RAR extraction complete");
    Ok(())
}

fn extract_tar(archive: &Path, kind: ArchiveKind, dest: &Path) -> Result<()> {
    let file = std::fs::File::open(archive).map_err(|e| extraction_failed(archive, e))?;
    let reader: Box<dyn std::io::Read> = match kind {
        ArchiveKind::Tar => Box::new(file),
        ArchiveKind::TarGz => Box::new(flate2::read::GzDecoder::new(file)),
        ArchiveKind::TarXz => Box::new(xz2::read::XzDecoder::new(file)),
        ArchiveKind::TarBz2 => Box::new(bzip2::read::BzDecoder::new(file)),
        other => {
            warn!(archive = %archive.display(), ?other, "not a tar variant");
            return Err(extraction_failed(archive, "not a tar variant"));
        }
    };

    tar::Archive::new(reader)
        .unpack(dest)
        .map_err(|e| extraction_failed(archive, e))?;
    info!(archive = %archive.display(), "tar extraction complete");
    Ok(())
}
