//! # wordlist-dl
//!
//! Embeddable library for fetching wordlist archives from a catalog of HTTP
//! and BitTorrent sources, decompressing them, and cleaning up intermediates.
//!
//! ## Design Philosophy
//!
//! wordlist-dl is designed to be:
//! - **Library-first** - No CLI or UI, purely a Rust crate for embedding
//! - **Bounded** - A configurable worker pool caps concurrent transfers
//! - **Idempotent** - Already-fetched wordlists are skipped, never re-fetched
//! - **Event-driven** - Consumers subscribe to events, no console output
//!
//! ## Quick Start
//!
//! ```no_run
//! use wordlist_dl::{Catalog, Config, Selection, WordlistFetcher};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let catalog = Catalog::from_json(
//!         &std::fs::read_to_string("urls.json")?,
//!         &std::fs::read_to_string("categories.json")?,
//!     )?;
//!
//!     let config = Config {
//!         decompress: true,
//!         remove_after_decompress: true,
//!         ..Default::default()
//!     };
//!
//!     let fetcher = WordlistFetcher::new(config, catalog).await?;
//!
//!     // Subscribe to events
//!     let mut events = fetcher.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Event: {:?}", event);
//!         }
//!     });
//!
//!     // Fetch every wordlist in the "passwords" category
//!     fetcher.fetch(&Selection::in_category(0, "passwords")).await?;
//!     fetcher.drain().await;
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Catalog data model
pub mod catalog;
/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Concurrent fetch orchestration (worker pool, HTTP and torrent strategies)
pub mod fetch;
/// Post-transfer decompression and cleanup pipeline
pub mod post_processing;
/// Selection and entry resolution
pub mod resolver;
/// Core types and events
pub mod types;

// Re-export commonly used types
pub use catalog::{Catalog, EntrySources};
pub use config::{Config, TorrentConfig};
pub use error::{
    DecompressError, Error, FetchError, ResolutionError, Result, SelectionError,
};
pub use fetch::WordlistFetcher;
pub use post_processing::DecompressOutcome;
pub use resolver::{ResolvedEntry, Selection, SourceKind};
pub use types::Event;

/// Helper function to run the fetcher with graceful signal handling.
///
/// Waits for a termination signal, then cancels the fetcher and waits for
/// in-flight tasks to exit. Cleanup on interrupt is best-effort; partially
/// written files from interrupted transfers may remain.
///
/// - **Unix:** listens for SIGTERM and SIGINT, with fallbacks if signal registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
///
/// # Example
///
/// ```no_run
/// use wordlist_dl::{Catalog, Config, Selection, WordlistFetcher, run_with_shutdown};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let catalog = Catalog::default();
///     let fetcher = WordlistFetcher::new(Config::default(), catalog).await?;
///
///     fetcher.fetch(&Selection::all()).await?;
///     run_with_shutdown(fetcher).await;
///
///     Ok(())
/// }
/// ```
pub async fn run_with_shutdown(fetcher: WordlistFetcher) {
    wait_for_signal().await;
    fetcher.shutdown().await;
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Signal registration may fail in restricted environments (containers, tests)
    let sigterm_result = signal(SignalKind::terminate());
    let sigint_result = signal(SignalKind::interrupt());

    match (sigterm_result, sigint_result) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM signal");
                }
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT signal (Ctrl+C)");
                }
            }
        }
        (Err(e), _) => {
            tracing::warn!(error = %e, "Could not register SIGTERM handler, waiting for SIGINT only");
            if let Ok(mut sigint) = signal(SignalKind::interrupt()) {
                sigint.recv().await;
                tracing::info!("Received SIGINT signal (Ctrl+C)");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
        (_, Err(e)) => {
            tracing::warn!(error = %e, "Could not register SIGINT handler, waiting for SIGTERM only");
            if let Ok(mut sigterm) = signal(SignalKind::terminate()) {
                sigterm.recv().await;
                tracing::info!("Received SIGTERM signal");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Received Ctrl+C signal");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
        }
    }
}
