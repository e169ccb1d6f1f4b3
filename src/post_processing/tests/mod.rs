use super::*;
use crate::error::Error;
use flate2::Compression;
use flate2::write::GzEncoder;
use std::io::Write;

fn write_gzip(path: &Path, data: &[u8]) {
    let file = std::fs::File::create(path).unwrap();
    let mut encoder = GzEncoder::new(file, Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap();
}

// ---------------------------------------------------------------------------
// Single-stream dispatch
// ---------------------------------------------------------------------------

#[tokio::test]
async fn gzip_decompresses_to_the_suffix_stripped_path() {
    let dir = tempfile::tempdir().unwrap();
    let archive = dir.path().join("rockyou.txt.gz");
    write_gzip(&archive, b"123456\npassword\n");

    let outcome = decompress(&archive).await.unwrap();
    let output = dir.path().join("rockyou.txt");
    assert_eq!(
        outcome,
        DecompressOutcome::Decompressed {
            output: output.clone()
        }
    );
    assert_eq!(std::fs::read(&output).unwrap(), b"123456\npassword\n");
    // The original is untouched by this stage; cleanup is separate
    assert!(archive.is_file());
}

#[tokio::test]
async fn second_run_skips_instead_of_overwriting() {
    let dir = tempfile::tempdir().unwrap();
    let archive = dir.path().join("rockyou.txt.gz");
    write_gzip(&archive, b"123456\n");

    let first = decompress(&archive).await.unwrap();
    assert!(matches!(first, DecompressOutcome::Decompressed { .. }));

    // Scribble on the output; a second run must not restore it
    let output = dir.path().join("rockyou.txt");
    std::fs::write(&output, b"edited").unwrap();

    let second = decompress(&archive).await.unwrap();
    assert_eq!(
        second,
        DecompressOutcome::SkippedExisting {
            output: output.clone()
        }
    );
    assert_eq!(std::fs::read(&output).unwrap(), b"edited");
}

#[tokio::test]
async fn unrecognized_suffix_is_not_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("names.txt");
    std::fs::write(&file, b"alice\nbob\n").unwrap();

    let outcome = decompress(&file).await.unwrap();
    assert_eq!(outcome, DecompressOutcome::NotApplicable);
    assert_eq!(std::fs::read(&file).unwrap(), b"alice\nbob\n");
}

#[tokio::test]
async fn torrent_descriptors_are_never_decompressed() {
    let dir = tempfile::tempdir().unwrap();
    let descriptor = dir.path().join("rockyou.torrent");
    std::fs::write(&descriptor, b"d8:announce0:e").unwrap();

    let outcome = decompress(&descriptor).await.unwrap();
    assert_eq!(outcome, DecompressOutcome::NotApplicable);
    assert!(descriptor.is_file());
}

#[tokio::test]
async fn corrupt_stream_reports_the_failure_and_leaves_no_output() {
    let dir = tempfile::tempdir().unwrap();
    let archive = dir.path().join("broken.gz");
    std::fs::write(&archive, b"this is not gzip data").unwrap();

    let err = decompress(&archive).await.unwrap_err();
    assert!(matches!(err, Error::Decompress(_)));
    assert!(!dir.path().join("broken").exists());
}

// ---------------------------------------------------------------------------
// Multi-member containers
// ---------------------------------------------------------------------------

#[tokio::test]
async fn tarball_members_extract_into_the_archive_directory() {
    let dir = tempfile::tempdir().unwrap();
    let archive = dir.path().join("lists.tar.gz");

    let gz = GzEncoder::new(
        std::fs::File::create(&archive).unwrap(),
        Compression::default(),
    );
    let mut builder = tar::Builder::new(gz);
    for (name, body) in [
        ("common.txt", &b"root\nadmin\n"[..]),
        ("dirs.txt", &b"cgi-bin\n"[..]),
    ] {
        let mut header = tar::Header::new_gnu();
        header.set_size(body.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append_data(&mut header, name, body).unwrap();
    }
    builder.into_inner().unwrap().finish().unwrap();

    let outcome = decompress(&archive).await.unwrap();
    assert_eq!(
        outcome,
        DecompressOutcome::Extracted {
            archive: archive.clone()
        }
    );
    assert_eq!(
        std::fs::read(dir.path().join("common.txt")).unwrap(),
        b"root\nadmin\n"
    );
    assert_eq!(std::fs::read(dir.path().join("dirs.txt")).unwrap(), b"cgi-bin\n");
}

#[tokio::test]
async fn zip_members_extract_into_the_archive_directory() {
    let dir = tempfile::tempdir().unwrap();
    let archive = dir.path().join("lists.zip");

    let file = std::fs::File::create(&archive).unwrap();
    let mut writer = zip::ZipWriter::new(file);
    writer
        .start_file("subdomains.txt", zip::write::FileOptions::default())
        .unwrap();
    writer.write_all(b"www\nmail\n").unwrap();
    writer.finish().unwrap();

    let outcome = decompress(&archive).await.unwrap();
    assert!(matches!(outcome, DecompressOutcome::Extracted { .. }));
    assert_eq!(
        std::fs::read(dir.path().join("subdomains.txt")).unwrap(),
        b"www\nmail\n"
    );
}

#[tokio::test]
async fn plain_tar_takes_the_archive_path_not_the_stream_path() {
    let dir = tempfile::tempdir().unwrap();
    let archive = dir.path().join("lists.tar");

    let mut builder = tar::Builder::new(std::fs::File::create(&archive).unwrap());
    let body = &b"data\n"[..];
    let mut header = tar::Header::new_gnu();
    header.set_size(body.len() as u64);
    header.set_mode(0o644);
    header.set_cksum();
    builder.append_data(&mut header, "inner.txt", body).unwrap();
    builder.into_inner().unwrap();

    let outcome = decompress(&archive).await.unwrap();
    assert!(matches!(outcome, DecompressOutcome::Extracted { .. }));
    assert!(dir.path().join("inner.txt").is_file());
}

// ---------------------------------------------------------------------------
// Cleanup stage
// ---------------------------------------------------------------------------

#[tokio::test]
async fn cleanup_removes_compressed_originals() {
    let dir = tempfile::tempdir().unwrap();
    let archive = dir.path().join("rockyou.txt.gz");
    write_gzip(&archive, b"123456\n");

    assert!(cleanup(&archive).await.unwrap());
    assert!(!archive.exists());
}

#[tokio::test]
async fn cleanup_never_touches_plain_wordlists_or_descriptors() {
    let dir = tempfile::tempdir().unwrap();
    for name in ["names.txt", "names.lst", "rockyou.torrent", "NAMES.TXT"] {
        let file = dir.path().join(name);
        std::fs::write(&file, b"data").unwrap();

        assert!(!cleanup(&file).await.unwrap(), "{name} must be exempt");
        assert!(file.is_file(), "{name} must survive cleanup");
    }
}

#[test]
fn cleanup_eligibility_is_suffix_based() {
    assert!(cleanup_eligible(Path::new("a/rockyou.txt.gz")));
    assert!(cleanup_eligible(Path::new("lists.tar.bz2")));
    assert!(cleanup_eligible(Path::new("lists.zip")));
    assert!(!cleanup_eligible(Path::new("a/rockyou.txt")));
    assert!(!cleanup_eligible(Path::new("names.lst")));
    assert!(!cleanup_eligible(Path::new("rockyou.torrent")));
    assert!(!cleanup_eligible(Path::new("no_extension")));
}
