//! Torrent fetch strategy backed by a shared librqbit session
//!
//! The session is created lazily on the first torrent task and then shared by
//! every concurrent torrent task for the life of the process. It listens with
//! the engine defaults (all interfaces, DHT peer discovery on); registration
//! and removal are safe under concurrent callers.
//!
//! Per task the flow is a small state machine: magnets resolve swarm metadata
//! during registration; `.torrent` descriptor URLs are fetched over HTTP,
//! registered, and the descriptor file is removed immediately afterwards,
//! independent of the cleanup configuration. Both paths then poll the swarm
//! at a fixed interval until the transfer is complete. The waits are
//! intentionally unbounded; every iteration observes the cancellation token
//! so a process interrupt ends them promptly.

use crate::error::{FetchError, Result};
use crate::fetch::{guard, http};
use crate::resolver::{ResolvedEntry, SourceKind};
use librqbit::{AddTorrent, AddTorrentOptions, Session};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Lazily created process-wide torrent session
pub(crate) struct LazySession {
    root: PathBuf,
    cell: OnceCell<Arc<Session>>,
}

impl LazySession {
    pub(crate) fn new(root: PathBuf) -> Self {
        Self {
            root,
            cell: OnceCell::new(),
        }
    }

    /// Session handle, creating the session on first use
    ///
    /// `OnceCell` serializes concurrent first callers, so exactly one session
    /// exists per process even when several torrent tasks start together.
    pub(crate) async fn get(&self) -> Result<Arc<Session>> {
        let session = self
            .cell
            .get_or_try_init(|| async {
                info!(root = %self.root.display(), "starting torrent session");
                Session::new(self.root.clone())
                    .await
                    .map_err(|e| FetchError::Session {
                        reason: format!("{e:#}"),
                    })
            })
            .await?;
        Ok(Arc::clone(session))
    }
}

/// How a torrent task ended
pub(crate) enum TorrentOutcome {
    /// Transfer finished; the output file is at the given path
    Fetched(PathBuf),
    /// Existence guard matched the swarm-reported name; entry was withdrawn
    AlreadyPresent(PathBuf),
}

/// Run one torrent transfer to completion
pub(crate) async fn fetch(
    session: &LazySession,
    client: &reqwest::Client,
    entry: &ResolvedEntry,
    poll: Duration,
    cancel: &CancellationToken,
) -> Result<TorrentOutcome> {
    let session = session.get().await?;

    let options = AddTorrentOptions {
        output_folder: Some(entry.dest_dir.to_string_lossy().into_owned()),
        overwrite: true,
        paused: true,
        ..Default::default()
    };

    let descriptor_path = match entry.kind {
        SourceKind::TorrentFile => {
            let name = entry.file_name.as_deref().unwrap_or(&entry.name);
            Some(entry.dest_dir.join(name))
        }
        _ => None,
    };

    let add = match &descriptor_path {
        Some(descriptor) => {
            http::fetch_to_path(client, &entry.url, descriptor, cancel).await?;
            let bytes = tokio::fs::read(descriptor).await.map_err(|_| {
                FetchError::DescriptorMissing {
                    path: descriptor.clone(),
                }
            })?;
            AddTorrent::from_bytes(bytes)
        }
        None => AddTorrent::from_url(&entry.url),
    };

    // Magnet registration blocks while swarm metadata resolves; keep the wait
    // interruptible even though it has no deadline of its own.
    let response = tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            remove_descriptor(descriptor_path.as_deref()).await;
            return Err(FetchError::Interrupted.into());
        }
        added = session.add_torrent(add, Some(options)) => {
            added.map_err(|e| FetchError::Swarm {
                url: entry.url.clone(),
                reason: format!("{e:#}"),
            })
        }
    };

    // The descriptor is transient: drop it as soon as registration settled,
    // whether or not that succeeded, and regardless of cleanup settings.
    remove_descriptor(descriptor_path.as_deref()).await;
    let response = response?;

    let handle = response.into_handle().ok_or_else(|| FetchError::Swarm {
        url: entry.url.clone(),
        reason: "torrent was not added to the session".to_string(),
    })?;

    let output_name = handle.name().unwrap_or_else(|| {
        entry
            .file_name
            .as_deref()
            .map(guard::stem)
            .unwrap_or(&entry.name)
            .to_string()
    });
    let output_path = entry.dest_dir.join(&output_name);

    // The swarm-reported name may differ from the descriptor's; re-check
    // before any payload is written.
    if guard::already_fetched(&entry.dest_dir, &output_name) {
        withdraw(&session, handle.id(), &entry.url).await;
        return Ok(TorrentOutcome::AlreadyPresent(output_path));
    }

    if let Err(e) = session.unpause(&handle).await {
        withdraw(&session, handle.id(), &entry.url).await;
        return Err(FetchError::Swarm {
            url: entry.url.clone(),
            reason: format!("{e:#}"),
        }
        .into());
    }

    info!(name = %entry.name, output = %output_name, "downloading from swarm");
    let mut ticker = tokio::time::interval(poll);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                withdraw(&session, handle.id(), &entry.url).await;
                return Err(FetchError::Interrupted.into());
            }
            _ = ticker.tick() => {
                if handle.stats().finished {
                    break;
                }
            }
        }
    }

    withdraw(&session, handle.id(), &entry.url).await;
    Ok(TorrentOutcome::Fetched(output_path))
}

/// Remove the swarm entry, keeping downloaded files on disk
async fn withdraw(session: &Session, id: usize, url: &str) {
    if let Err(e) = session.delete(id.into(), false).await {
        warn!(url, error = %format!("{e:#}"), "failed to remove torrent from session");
    }
}

async fn remove_descriptor(path: Option<&std::path::Path>) {
    if let Some(path) = path {
        debug!(path = %path.display(), "removing torrent descriptor");
        http::remove_partial(path).await;
    }
}
