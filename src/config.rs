//! Configuration types for wordlist-dl

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Top-level configuration for a [`WordlistFetcher`](crate::WordlistFetcher)
///
/// All fields have sensible defaults; an empty `{}` deserializes to the same
/// values as [`Config::default()`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Destination root for fetched wordlists (default: "./wordlists")
    ///
    /// Entries are placed in a per-category subdirectory underneath this root.
    /// The directory is created at fetcher construction if it does not exist.
    #[serde(default = "default_wordlist_dir")]
    pub wordlist_dir: PathBuf,

    /// Maximum concurrent fetch tasks (default: 10)
    ///
    /// Must be at least 1; validated at fetcher construction.
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_fetches: usize,

    /// Decompress fetched archives (default: false)
    #[serde(default)]
    pub decompress: bool,

    /// Remove the compressed original after successful decompression (default: false)
    ///
    /// Files whose suffix denotes a plain wordlist (`txt`, `lst`) or a torrent
    /// descriptor are never removed, regardless of this flag.
    #[serde(default)]
    pub remove_after_decompress: bool,

    /// Prefer the HTTP source over the torrent source when both exist (default: false)
    #[serde(default)]
    pub prefer_http: bool,

    /// User-Agent header sent with every HTTP request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Torrent engine settings
    #[serde(default)]
    pub torrent: TorrentConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            wordlist_dir: default_wordlist_dir(),
            max_concurrent_fetches: default_max_concurrent(),
            decompress: false,
            remove_after_decompress: false,
            prefer_http: false,
            user_agent: default_user_agent(),
            torrent: TorrentConfig::default(),
        }
    }
}

impl Config {
    /// Validate the configuration
    ///
    /// Returns a [`Error::Config`] naming the offending key when a setting is
    /// unusable. Called by the fetcher before any task can be scheduled.
    pub fn validate(&self) -> Result<()> {
        if self.max_concurrent_fetches == 0 {
            return Err(Error::Config {
                message: "concurrent fetch count can't be less than 1".to_string(),
                key: Some("max_concurrent_fetches".to_string()),
            });
        }
        Ok(())
    }
}

/// Torrent engine settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TorrentConfig {
    /// Poll interval in milliseconds for metadata and seeding waits (default: 100)
    ///
    /// The waits themselves are unbounded; only process interruption ends them.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl Default for TorrentConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl TorrentConfig {
    /// Poll interval as a [`Duration`], never zero
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}

fn default_wordlist_dir() -> PathBuf {
    PathBuf::from("./wordlists")
}

fn default_max_concurrent() -> usize {
    10
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; WOW64; rv:63.0) Gecko/20180101 Firefox/63.0".to_string()
}

fn default_poll_interval_ms() -> u64 {
    100
}
