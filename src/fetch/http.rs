//! Streaming HTTP fetcher
//!
//! Streams response bodies to disk chunk by chunk so memory use stays flat
//! regardless of archive size. Mediafire file pages are redirect pages, not
//! the payload; those are resolved to the real link first. There is no
//! automatic retry: a failed transfer removes its partial file and reports
//! the cause.

use crate::error::{FetchError, ResolutionError, Result};
use futures::StreamExt;
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// URL prefix of mediafire file-hosting redirect pages
const MEDIAFIRE_FILE_PREFIX: &str = "http://www.mediafire.com/file/";

/// Anchor whose visible text begins with `Download (` carries the real link
#[allow(clippy::expect_used)]
static DOWNLOAD_ANCHOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<a\s[^>]*href\s*=\s*"([^"]+)"[^>]*>\s*Download \("#)
        .expect("download anchor pattern is valid")
});

/// Extract the download link from a file-hosting redirect page
pub(crate) fn find_download_link(page: &str) -> Option<String> {
    DOWNLOAD_ANCHOR
        .captures(page)
        .map(|captures| captures[1].to_string())
}

/// Fetch `url` to `path`, streaming the body in chunks
///
/// Resolves known redirect pages to their real source first; that resolution
/// failing yields [`ResolutionError::NoDownloadLink`] before any bytes are
/// written. On transfer failure the partial file is removed best-effort.
pub(crate) async fn fetch_to_path(
    client: &reqwest::Client,
    url: &str,
    path: &Path,
    cancel: &CancellationToken,
) -> Result<()> {
    let source = if url.starts_with(MEDIAFIRE_FILE_PREFIX) {
        resolve_hosted(client, url).await?
    } else {
        url.to_string()
    };

    debug!(url = %source, path = %path.display(), "starting http transfer");
    match stream_to_file(client, &source, path, cancel).await {
        Ok(()) => {
            info!(path = %path.display(), "http transfer complete");
            Ok(())
        }
        Err(e) => {
            remove_partial(path).await;
            Err(e)
        }
    }
}

/// Resolve a file-hosting redirect page to the real download link
async fn resolve_hosted(client: &reqwest::Client, url: &str) -> Result<String> {
    let page = client
        .get(url)
        .send()
        .await
        .and_then(reqwest::Response::error_for_status)
        .map_err(|e| FetchError::Http {
            url: url.to_string(),
            source: e,
        })?
        .text()
        .await
        .map_err(|e| FetchError::Http {
            url: url.to_string(),
            source: e,
        })?;

    match find_download_link(&page) {
        Some(link) => {
            debug!(page = url, link = %link, "resolved hosted download link");
            Ok(link)
        }
        None => Err(ResolutionError::NoDownloadLink {
            url: url.to_string(),
        }
        .into()),
    }
}

async fn stream_to_file(
    client: &reqwest::Client,
    url: &str,
    path: &Path,
    cancel: &CancellationToken,
) -> Result<()> {
    let response = client
        .get(url)
        .send()
        .await
        .and_then(reqwest::Response::error_for_status)
        .map_err(|e| FetchError::Http {
            url: url.to_string(),
            source: e,
        })?;

    let mut file = tokio::fs::File::create(path)
        .await
        .map_err(|e| FetchError::Write {
            path: path.to_path_buf(),
            source: e,
        })?;

    let mut body = response.bytes_stream();
    while let Some(chunk) = body.next().await {
        if cancel.is_cancelled() {
            return Err(FetchError::Interrupted.into());
        }
        let chunk = chunk.map_err(|e| FetchError::Http {
            url: url.to_string(),
            source: e,
        })?;
        file.write_all(&chunk).await.map_err(|e| FetchError::Write {
            path: path.to_path_buf(),
            source: e,
        })?;
    }

    file.flush().await.map_err(|e| FetchError::Write {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(())
}

/// Best-effort removal of a partially written file
pub(crate) async fn remove_partial(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => debug!(path = %path.display(), "removed partial file"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => debug!(path = %path.display(), error = %e, "failed to remove partial file"),
    }
}
