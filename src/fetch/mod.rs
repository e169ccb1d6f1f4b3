//! Concurrent fetch orchestration
//!
//! [`WordlistFetcher`] is the worker pool at the center of the crate. It owns
//! every piece of state shared by fetch tasks:
//! - the admission semaphore bounding concurrent transfers
//! - the live-task registry used by [`drain`](WordlistFetcher::drain)
//! - the lazily created torrent session
//! - the HTTP client, cancellation token, and event channel
//!
//! Submission blocks while the pool is full and unblocks as soon as a slot
//! frees; admitted tasks run fire-and-forget. A task's failure is reported
//! through tracing and the event stream but never cancels or blocks sibling
//! tasks.

mod guard;
mod http;
mod torrent;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

use crate::catalog::Catalog;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::post_processing::{self, DecompressOutcome};
use crate::resolver::{self, ResolvedEntry, Selection, SourceKind};
use crate::types::Event;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{Semaphore, broadcast};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

/// How a single fetch task ended
enum TaskOutcome {
    /// Transfer finished and produced this file
    Fetched(PathBuf),
    /// Existence guard matched; nothing was transferred
    Skipped(PathBuf),
}

/// Concurrent wordlist fetcher (cloneable - all fields are shared handles)
///
/// Constructed once per run from a [`Config`] and a [`Catalog`], then driven
/// through [`fetch`](Self::fetch) or [`submit`](Self::submit). Dropping a
/// clone does not stop in-flight tasks; use [`shutdown`](Self::shutdown).
///
/// # Example
///
/// ```no_run
/// use wordlist_dl::{Catalog, Config, Selection, WordlistFetcher};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let catalog = Catalog::from_json(
///         r#"{"rockyou": {"http": "http://x/rockyou.txt.gz", "torrent": ""}}"#,
///         r#"{"passwords": ["rockyou"]}"#,
///     )?;
///     let fetcher = WordlistFetcher::new(Config::default(), catalog).await?;
///
///     fetcher.fetch(&Selection::in_category(1, "passwords")).await?;
///     fetcher.drain().await;
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct WordlistFetcher {
    config: Arc<Config>,
    catalog: Arc<Catalog>,
    client: reqwest::Client,
    permits: Arc<Semaphore>,
    tasks: TaskTracker,
    cancel: CancellationToken,
    session: Arc<torrent::LazySession>,
    event_tx: broadcast::Sender<Event>,
}

impl WordlistFetcher {
    /// Create a new fetcher
    ///
    /// Validates the configuration (the concurrency cap must be at least 1)
    /// and creates the destination root if it does not exist.
    pub async fn new(config: Config, catalog: Catalog) -> Result<Self> {
        config.validate()?;

        tokio::fs::create_dir_all(&config.wordlist_dir)
            .await
            .map_err(|e| {
                Error::Io(std::io::Error::new(
                    e.kind(),
                    format!(
                        "failed to create wordlist directory '{}': {}",
                        config.wordlist_dir.display(),
                        e
                    ),
                ))
            })?;

        let client = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .build()?;

        let (event_tx, _rx) = broadcast::channel(1000);
        let session = Arc::new(torrent::LazySession::new(config.wordlist_dir.clone()));

        Ok(Self {
            permits: Arc::new(Semaphore::new(config.max_concurrent_fetches)),
            config: Arc::new(config),
            catalog: Arc::new(catalog),
            client,
            tasks: TaskTracker::new(),
            cancel: CancellationToken::new(),
            session,
            event_tx,
        })
    }

    /// Subscribe to fetch events
    ///
    /// Multiple subscribers are supported; each receives all events
    /// independently. Subscribe before submitting to observe a full run.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Resolve a selection and submit every entry in scope, in order
    ///
    /// Selection errors (id or category out of range) abort before any task
    /// is scheduled. When a single entry was selected, its resolution error
    /// propagates; when `code == 0` expands to many entries, per-entry
    /// resolution failures are reported and the rest continue.
    pub async fn fetch(&self, selection: &Selection) -> Result<()> {
        let names = resolver::select_entries(&self.catalog, selection)?;
        let contained = selection.code == 0;

        for name in names {
            match resolver::resolve_entry(
                &self.catalog,
                &self.config,
                &name,
                selection.category.as_deref(),
            ) {
                Ok(entry) => self.submit(entry).await?,
                Err(e) if contained => {
                    warn!(name = %name, error = %e, "skipping unresolvable wordlist");
                    self.emit(Event::FetchFailed {
                        name,
                        error: e.to_string(),
                    });
                }
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    /// Submit one resolved entry to the pool
    ///
    /// Blocks while the concurrency cap is reached and returns once the task
    /// has been admitted and spawned; the transfer itself runs fire-and-forget.
    /// Completion is observable only through events and [`drain`](Self::drain).
    /// Fails with [`Error::ShuttingDown`] once the fetcher was cancelled.
    pub async fn submit(&self, entry: ResolvedEntry) -> Result<()> {
        let permit = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Err(Error::ShuttingDown),
            permit = Arc::clone(&self.permits).acquire_owned() => {
                permit.map_err(|_| Error::ShuttingDown)?
            }
        };

        tokio::fs::create_dir_all(&entry.dest_dir).await?;

        debug!(name = %entry.name, url = %entry.url, "fetch task admitted");
        let worker = self.clone();
        self.tasks.spawn(async move {
            let _permit = permit;
            worker.run_task(entry).await;
        });
        Ok(())
    }

    /// Wait for every outstanding task to finish
    ///
    /// The pool accepts new submissions again afterwards, so a second batch
    /// can reuse the fetcher.
    pub async fn drain(&self) {
        self.tasks.close();
        self.tasks.wait().await;
        self.tasks.reopen();
    }

    /// Cancel all admission and polling loops, then wait for tasks to exit
    ///
    /// Cleanup is best-effort: a transfer interrupted mid-flight may leave a
    /// partial file behind.
    pub async fn shutdown(&self) {
        info!("shutting down fetch pool");
        self.cancel.cancel();
        self.drain().await;
    }

    fn emit(&self, event: Event) {
        // send() fails only when nobody subscribed, which is fine
        self.event_tx.send(event).ok();
    }

    /// Body of one spawned fetch task; contains all per-task failures
    async fn run_task(&self, entry: ResolvedEntry) {
        self.emit(Event::FetchStarted {
            name: entry.name.clone(),
            url: entry.url.clone(),
        });

        match self.execute(&entry).await {
            Ok(TaskOutcome::Skipped(path)) => {
                warn!(name = %entry.name, path = %path.display(), "already exists -- skipping");
                self.emit(Event::FetchSkipped {
                    name: entry.name.clone(),
                    path,
                });
            }
            Ok(TaskOutcome::Fetched(path)) => {
                info!(name = %entry.name, path = %path.display(), "fetch complete");
                self.emit(Event::FetchCompleted {
                    name: entry.name.clone(),
                    path: path.clone(),
                });
                if self.config.decompress {
                    self.post_process(&entry.name, &path).await;
                }
            }
            Err(e) => {
                warn!(name = %entry.name, url = %entry.url, error = %e, "fetch failed");
                self.emit(Event::FetchFailed {
                    name: entry.name.clone(),
                    error: e.to_string(),
                });
            }
        }
    }

    async fn execute(&self, entry: &ResolvedEntry) -> Result<TaskOutcome> {
        match entry.kind {
            SourceKind::Http => {
                let file_name = entry.file_name.as_deref().unwrap_or(&entry.name);
                let path = entry.dest_dir.join(file_name);
                if guard::already_fetched(&entry.dest_dir, file_name) {
                    return Ok(TaskOutcome::Skipped(path));
                }
                http::fetch_to_path(&self.client, &entry.url, &path, &self.cancel).await?;
                Ok(TaskOutcome::Fetched(path))
            }
            SourceKind::TorrentFile | SourceKind::Magnet => {
                // Magnets have no usable name before metadata resolves; the
                // guard runs inside the torrent task once it does.
                if let Some(file_name) = entry.file_name.as_deref() {
                    if guard::already_fetched(&entry.dest_dir, file_name) {
                        return Ok(TaskOutcome::Skipped(entry.dest_dir.join(file_name)));
                    }
                }
                let outcome = torrent::fetch(
                    &self.session,
                    &self.client,
                    entry,
                    self.config.torrent.poll_interval(),
                    &self.cancel,
                )
                .await?;
                match outcome {
                    torrent::TorrentOutcome::AlreadyPresent(path) => {
                        Ok(TaskOutcome::Skipped(path))
                    }
                    torrent::TorrentOutcome::Fetched(path) => Ok(TaskOutcome::Fetched(path)),
                }
            }
        }
    }

    /// Decompress a fetched artifact and optionally remove the original
    ///
    /// Pipeline failures are contained here like fetch failures: reported,
    /// never propagated.
    async fn post_process(&self, name: &str, path: &Path) {
        self.emit(Event::Decompressing {
            name: name.to_string(),
            path: path.to_path_buf(),
        });

        let outcome = match post_processing::decompress(path).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(name, path = %path.display(), error = %e, "decompression failed");
                self.emit(Event::DecompressFailed {
                    name: name.to_string(),
                    error: e.to_string(),
                });
                return;
            }
        };

        match outcome {
            DecompressOutcome::Extracted { archive } => {
                info!(name, archive = %archive.display(), "archive extracted");
                self.emit(Event::Decompressed {
                    name: name.to_string(),
                    path: archive,
                });
            }
            DecompressOutcome::Decompressed { output } => {
                info!(name, output = %output.display(), "decompressed");
                self.emit(Event::Decompressed {
                    name: name.to_string(),
                    path: output,
                });
            }
            DecompressOutcome::SkippedExisting { output } => {
                warn!(name, output = %output.display(), "already exists -- skipping");
                self.emit(Event::DecompressSkipped {
                    name: name.to_string(),
                    path: output,
                });
                return;
            }
            DecompressOutcome::NotApplicable => {
                debug!(name, path = %path.display(), "no decompression for this suffix");
                return;
            }
        }

        if self.config.remove_after_decompress {
            match post_processing::cleanup(path).await {
                Ok(true) => {
                    debug!(name, path = %path.display(), "removed compressed original");
                    self.emit(Event::ArchiveRemoved {
                        name: name.to_string(),
                        path: path.to_path_buf(),
                    });
                }
                Ok(false) => {}
                Err(e) => {
                    warn!(name, path = %path.display(), error = %e, "cleanup failed");
                }
            }
        }
    }
}
