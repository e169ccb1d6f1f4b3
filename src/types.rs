//! Core types and events

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Events emitted by the fetcher during a run
///
/// Consumers subscribe via
/// [`WordlistFetcher::subscribe`](crate::WordlistFetcher::subscribe); there is
/// no console output from the library itself. Events are broadcast; a slow
/// subscriber that lags behind the channel buffer misses the oldest events.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// A fetch task started its transfer
    FetchStarted {
        /// Catalog entry name
        name: String,
        /// Source URL being fetched
        url: String,
    },

    /// A fetch task finished its transfer
    FetchCompleted {
        /// Catalog entry name
        name: String,
        /// Path of the fetched file
        path: PathBuf,
    },

    /// The existence guard found the entry already present; nothing was transferred
    FetchSkipped {
        /// Catalog entry name
        name: String,
        /// Path that already satisfied the request
        path: PathBuf,
    },

    /// A fetch task failed; sibling tasks are unaffected
    FetchFailed {
        /// Catalog entry name
        name: String,
        /// Error message
        error: String,
    },

    /// Decompression of a fetched artifact started
    Decompressing {
        /// Catalog entry name
        name: String,
        /// Artifact being decompressed
        path: PathBuf,
    },

    /// Decompression finished
    Decompressed {
        /// Catalog entry name
        name: String,
        /// The decompressed artifact (the archive itself for multi-member
        /// containers, the suffix-stripped output for single streams)
        path: PathBuf,
    },

    /// Decompression failed; the fetched artifact is left in place
    DecompressFailed {
        /// Catalog entry name
        name: String,
        /// Error message
        error: String,
    },

    /// Decompression skipped because the output already exists
    DecompressSkipped {
        /// Catalog entry name
        name: String,
        /// The output that already exists
        path: PathBuf,
    },

    /// The compressed original was removed after decompression
    ArchiveRemoved {
        /// Catalog entry name
        name: String,
        /// Path of the removed file
        path: PathBuf,
    },
}
