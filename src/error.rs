//! Error types for wordlist-dl
//!
//! This module provides the error handling for the library:
//! - Domain-specific error types (Selection, Resolution, Fetch, Decompress)
//! - A top-level [`Error`] enum with context information per variant
//!
//! Selection and configuration errors abort an operation before any fetch
//! task is scheduled; fetch and decompression errors are contained per task.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for wordlist-dl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for wordlist-dl
///
/// This is the primary error type used throughout the library. Each variant includes
/// contextual information to help diagnose issues.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "max_concurrent_fetches")
        key: Option<String>,
    },

    /// Requested wordlist or category id is out of range
    #[error("selection error: {0}")]
    Selection(#[from] SelectionError),

    /// Entry could not be resolved to a usable source
    #[error("resolution error: {0}")]
    Resolution(#[from] ResolutionError),

    /// Transfer or swarm-registration failure
    #[error("fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Decompression or extraction failure
    #[error("decompression error: {0}")]
    Decompress(#[from] DecompressError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Network error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Shutdown in progress - not accepting new fetch tasks
    #[error("shutdown in progress: not accepting new fetch tasks")]
    ShuttingDown,
}

/// Selection errors (requested id or category out of range)
///
/// These abort the whole operation before any task is scheduled.
#[derive(Debug, Error)]
pub enum SelectionError {
    /// Selection id falls outside `[0, scope_size]`
    #[error("{id} is not a valid wordlist id (scope has {scope_size} entries)")]
    IdOutOfRange {
        /// The requested 1-based wordlist id (0 means "all")
        id: usize,
        /// Number of entries in the selected scope
        scope_size: usize,
    },

    /// Named category does not exist in the catalog
    #[error("category {name} is unavailable")]
    UnknownCategory {
        /// The category name that was not found
        name: String,
    },
}

/// Resolution errors (entry cannot be turned into a fetchable source)
#[derive(Debug, Error)]
pub enum ResolutionError {
    /// Entry has neither an HTTP nor a torrent URL
    #[error("wordlist {name} has no usable source url")]
    NoSource {
        /// The catalog entry name
        name: String,
    },

    /// File-hosting redirect page yielded no download link
    #[error("no download link found on {url}")]
    NoDownloadLink {
        /// The redirect page that was scanned
        url: String,
    },
}

/// Fetch errors (transfer or swarm failures, contained per task)
#[derive(Debug, Error)]
pub enum FetchError {
    /// HTTP request failed or returned a non-success status
    #[error("request for {url} failed: {source}")]
    Http {
        /// The URL that was being fetched
        url: String,
        /// The underlying client error
        #[source]
        source: reqwest::Error,
    },

    /// Writing the response body to disk failed
    #[error("writing {path} failed: {source}")]
    Write {
        /// Destination path of the partial file
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Torrent session could not be created
    #[error("torrent session unavailable: {reason}")]
    Session {
        /// Why the session could not be brought up
        reason: String,
    },

    /// Swarm registration or removal failed
    #[error("swarm operation for {url} failed: {reason}")]
    Swarm {
        /// The magnet link or descriptor URL involved
        url: String,
        /// Engine-reported failure cause
        reason: String,
    },

    /// Torrent descriptor file vanished between fetch and registration
    #[error("torrent descriptor {path} missing after fetch")]
    DescriptorMissing {
        /// Expected descriptor location
        path: PathBuf,
    },

    /// Transfer interrupted by shutdown
    #[error("fetch interrupted by shutdown")]
    Interrupted,
}

/// Decompression errors (unsupported or corrupt containers, contained per task)
#[derive(Debug, Error)]
pub enum DecompressError {
    /// Multi-member archive extraction failed
    #[error("extraction failed for {archive}: {reason}")]
    ExtractionFailed {
        /// The archive file that failed to extract
        archive: PathBuf,
        /// The reason extraction failed
        reason: String,
    },

    /// Single-stream decompression failed
    #[error("decompression failed for {path}: {reason}")]
    StreamFailed {
        /// The compressed file being decompressed
        path: PathBuf,
        /// The reason decompression failed
        reason: String,
    },
}
