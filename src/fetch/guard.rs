//! Idempotency check against the destination directory
//!
//! A wordlist counts as already fetched when any file in the destination
//! directory shares its stem, where the stem is the file name up to the
//! first `.`. Requesting `rockyou.txt.gz` is satisfied by an existing
//! `rockyou.txt`, so neither the archive nor its decompressed form is
//! fetched twice.

use std::path::Path;

/// File name up to the first `.`
pub(crate) fn stem(file_name: &str) -> &str {
    file_name.split('.').next().unwrap_or(file_name)
}

/// Whether any file in `dir` shares the stem of `file_name`
///
/// An unreadable or missing directory means nothing was fetched yet.
pub(crate) fn already_fetched(dir: &Path, file_name: &str) -> bool {
    let target = stem(file_name);
    if target.is_empty() {
        return false;
    }
    let Ok(entries) = std::fs::read_dir(dir) else {
        return false;
    };
    entries.flatten().any(|entry| {
        entry
            .file_name()
            .to_str()
            .is_some_and(|name| stem(name) == target)
    })
}
