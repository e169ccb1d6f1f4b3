//! Entry resolution
//!
//! Converts a [`Selection`] into the ordered list of catalog entries to fetch,
//! and each entry into a concrete source URL, source kind, and destination
//! directory. Selection errors abort before anything is scheduled; resolution
//! errors are per-entry.

use crate::catalog::Catalog;
use crate::config::Config;
use crate::error::{ResolutionError, Result, SelectionError};
use std::path::PathBuf;

/// Which entries of the catalog to fetch
///
/// `code` 0 means every entry in scope; `k > 0` means the k-th entry
/// (1-indexed). The scope is the named category's entry list when `category`
/// is set, otherwise the whole catalog in catalog order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Selection {
    /// Selection code: 0 = all, k = k-th entry in scope (1-indexed)
    pub code: usize,
    /// Optional category filter narrowing the scope
    pub category: Option<String>,
}

impl Selection {
    /// Select every entry in the catalog
    pub fn all() -> Self {
        Self {
            code: 0,
            category: None,
        }
    }

    /// Select the k-th entry of the whole catalog (1-indexed)
    pub fn id(code: usize) -> Self {
        Self {
            code,
            category: None,
        }
    }

    /// Select within a category: 0 = the whole category, k = its k-th entry
    pub fn in_category(code: usize, category: impl Into<String>) -> Self {
        Self {
            code,
            category: Some(category.into()),
        }
    }
}

/// How a resolved source is to be transferred
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceKind {
    /// Plain HTTP streaming download
    Http,
    /// `.torrent` descriptor fetched over HTTP, then registered with the swarm
    TorrentFile,
    /// Magnet link resolved via distributed peer discovery
    Magnet,
}

/// One fetchable entry: chosen source plus destination placement
#[derive(Clone, Debug)]
pub struct ResolvedEntry {
    /// Catalog entry name
    pub name: String,
    /// Chosen source URL (HTTP URL, descriptor URL, or magnet link)
    pub url: String,
    /// Transfer strategy for `url`
    pub kind: SourceKind,
    /// Directory the output lands in (destination root + category)
    pub dest_dir: PathBuf,
    /// Basename of the source URL; `None` for magnet links, whose real
    /// output name is only known once swarm metadata resolves
    pub file_name: Option<String>,
}

/// Expand a selection into the ordered entry names in scope
///
/// Fails with [`SelectionError`] when the category is unknown or the code
/// falls outside `[0, scope_size]`; in that case zero work is scheduled.
pub fn select_entries(catalog: &Catalog, selection: &Selection) -> Result<Vec<String>> {
    let scope: Vec<String> = match &selection.category {
        Some(category) => catalog
            .category(category)
            .ok_or_else(|| SelectionError::UnknownCategory {
                name: category.clone(),
            })?
            .to_vec(),
        None => catalog.entry_names().map(str::to_string).collect(),
    };

    if selection.code > scope.len() {
        return Err(SelectionError::IdOutOfRange {
            id: selection.code,
            scope_size: scope.len(),
        }
        .into());
    }

    if selection.code == 0 {
        Ok(scope)
    } else {
        Ok(vec![scope[selection.code - 1].clone()])
    }
}

/// Resolve one entry to its source and destination
///
/// Source choice: HTTP when `prefer_http` is set and an HTTP URL exists, or
/// when no torrent URL exists; otherwise the torrent source. An entry with
/// neither URL fails with [`ResolutionError::NoSource`].
///
/// `category_hint` is the selection's category filter; without it the entry
/// lands under the first catalog category containing it, or the destination
/// root when it belongs to none.
pub fn resolve_entry(
    catalog: &Catalog,
    config: &Config,
    name: &str,
    category_hint: Option<&str>,
) -> Result<ResolvedEntry> {
    let sources = catalog
        .entry(name)
        .ok_or_else(|| ResolutionError::NoSource {
            name: name.to_string(),
        })?;

    let (url, kind) = if (config.prefer_http && !sources.http.is_empty())
        || (sources.torrent.is_empty() && !sources.http.is_empty())
    {
        (sources.http.clone(), SourceKind::Http)
    } else if !sources.torrent.is_empty() {
        let kind = if sources.torrent.starts_with("magnet:?") {
            SourceKind::Magnet
        } else {
            SourceKind::TorrentFile
        };
        (sources.torrent.clone(), kind)
    } else {
        return Err(ResolutionError::NoSource {
            name: name.to_string(),
        }
        .into());
    };

    let dest_dir = match category_hint.or_else(|| catalog.category_of(name)) {
        Some(category) => config.wordlist_dir.join(category),
        None => config.wordlist_dir.clone(),
    };

    let file_name = match kind {
        SourceKind::Magnet => None,
        _ => Some(source_file_name(&url).unwrap_or_else(|| name.to_string())),
    };

    Ok(ResolvedEntry {
        name: name.to_string(),
        url,
        kind,
        dest_dir,
        file_name,
    })
}

/// Basename of a source URL (last non-empty path segment)
fn source_file_name(source: &str) -> Option<String> {
    if let Ok(parsed) = url::Url::parse(source) {
        if let Some(last) = parsed
            .path_segments()
            .and_then(|segments| segments.filter(|s| !s.is_empty()).next_back())
        {
            return Some(last.to_string());
        }
    }
    source
        .rsplit('/')
        .next()
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
