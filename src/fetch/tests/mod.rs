use super::*;
use crate::catalog::Catalog;
use crate::resolver::resolve_entry;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use wiremock::matchers::{method, path as url_path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn single_entry_catalog(base: &str, file: &str) -> Catalog {
    Catalog::from_json(
        &format!(r#"{{"list": {{"http": "{base}/{file}", "torrent": ""}}}}"#),
        r#"{"misc": ["list"]}"#,
    )
    .unwrap()
}

fn test_config(dir: &std::path::Path) -> Config {
    Config {
        wordlist_dir: dir.to_path_buf(),
        ..Default::default()
    }
}

/// Drain all buffered events from a subscription
fn collected(rx: &mut broadcast::Receiver<Event>) -> Vec<Event> {
    std::iter::from_fn(|| rx.try_recv().ok()).collect()
}

// ---------------------------------------------------------------------------
// Redirect-page link extraction
// ---------------------------------------------------------------------------

#[test]
fn download_anchor_is_extracted_from_a_hosting_page() {
    let page = r#"
        <html><body>
        <a href="/about">About</a>
        <a class="input" href="https://download.example.com/file/abc/rockyou.txt.gz">
            Download (133.44MB)</a>
        </body></html>
    "#;
    assert_eq!(
        http::find_download_link(page).as_deref(),
        Some("https://download.example.com/file/abc/rockyou.txt.gz")
    );
}

#[test]
fn page_without_a_download_anchor_yields_nothing() {
    let page = r#"<html><body><a href="/other">Mirror (slow)</a></body></html>"#;
    assert!(http::find_download_link(page).is_none());
}

#[test]
fn anchor_text_must_begin_with_the_download_marker() {
    // "Downloads" or a plain "Download" without the size parenthesis is not the real link
    let page = r#"<a href="/x">Download page</a><a href="/y">All Downloads</a>"#;
    assert!(http::find_download_link(page).is_none());
}

// ---------------------------------------------------------------------------
// Worker pool admission
// ---------------------------------------------------------------------------

#[tokio::test]
async fn live_tasks_never_exceed_the_concurrency_cap() {
    let server = MockServer::start().await;
    for i in 0..4 {
        Mock::given(method("GET"))
            .and(url_path(format!("/list{i}.txt")))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_bytes(b"words".to_vec())
                    .set_delay(Duration::from_millis(150)),
            )
            .mount(&server)
            .await;
    }

    let urls = (0..4)
        .map(|i| {
            format!(
                r#""list{i}": {{"http": "{}/list{i}.txt", "torrent": ""}}"#,
                server.uri()
            )
        })
        .collect::<Vec<_>>()
        .join(",");
    let catalog = Catalog::from_json(&format!("{{{urls}}}"), "{}").unwrap();

    let dir = tempfile::tempdir().unwrap();
    let config = Config {
        max_concurrent_fetches: 2,
        ..test_config(dir.path())
    };
    let fetcher = WordlistFetcher::new(config, catalog).await.unwrap();

    // FetchStarted fires after admission, FetchCompleted before the permit
    // frees, and the broadcast channel preserves send order, so the running
    // count below tracks simultaneously executing fetch units exactly.
    let mut events = fetcher.subscribe();
    let max_seen = Arc::new(AtomicUsize::new(0));
    let watcher = {
        let max_seen = Arc::clone(&max_seen);
        tokio::spawn(async move {
            let mut live = 0usize;
            while let Ok(event) = events.recv().await {
                match event {
                    Event::FetchStarted { .. } => {
                        live += 1;
                        max_seen.fetch_max(live, Ordering::SeqCst);
                    }
                    Event::FetchCompleted { .. }
                    | Event::FetchSkipped { .. }
                    | Event::FetchFailed { .. } => live = live.saturating_sub(1),
                    _ => {}
                }
            }
        })
    };

    fetcher.fetch(&Selection::all()).await.unwrap();
    fetcher.drain().await;
    watcher.abort();

    assert!(
        max_seen.load(Ordering::SeqCst) <= 2,
        "observed {} simultaneous fetches with a cap of 2",
        max_seen.load(Ordering::SeqCst)
    );
    for i in 0..4 {
        assert!(dir.path().join(format!("list{i}.txt")).is_file());
    }
}

#[tokio::test]
async fn drain_returns_only_after_all_tasks_finished() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(url_path("/list.txt"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(b"a\nb\nc".to_vec())
                .set_delay(Duration::from_millis(200)),
        )
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let catalog = single_entry_catalog(&server.uri(), "list.txt");
    let fetcher = WordlistFetcher::new(test_config(dir.path()), catalog)
        .await
        .unwrap();

    fetcher.fetch(&Selection::id(1)).await.unwrap();
    fetcher.drain().await;

    // The slow transfer must be on disk by the time drain returns
    let body = std::fs::read(dir.path().join("misc/list.txt")).unwrap();
    assert_eq!(body, b"a\nb\nc");
}

#[tokio::test]
async fn pool_accepts_a_second_batch_after_drain() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(url_path("/list.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"words".to_vec()))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let catalog = single_entry_catalog(&server.uri(), "list.txt");
    let fetcher = WordlistFetcher::new(test_config(dir.path()), catalog)
        .await
        .unwrap();
    let mut events = fetcher.subscribe();

    fetcher.fetch(&Selection::id(1)).await.unwrap();
    fetcher.drain().await;

    // Second batch: the guard skips, but the task must still be admitted and run
    fetcher.fetch(&Selection::id(1)).await.unwrap();
    fetcher.drain().await;

    let events = collected(&mut events);
    assert!(events.iter().any(|e| matches!(e, Event::FetchCompleted { .. })));
    assert!(events.iter().any(|e| matches!(e, Event::FetchSkipped { .. })));
}

#[tokio::test]
async fn submit_after_shutdown_is_rejected() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let catalog = single_entry_catalog(&server.uri(), "list.txt");
    let config = test_config(dir.path());
    let fetcher = WordlistFetcher::new(config.clone(), catalog.clone())
        .await
        .unwrap();

    fetcher.shutdown().await;

    let entry = resolve_entry(&catalog, &config, "list", None).unwrap();
    let err = fetcher.submit(entry).await.unwrap_err();
    assert!(matches!(err, Error::ShuttingDown));
}

// ---------------------------------------------------------------------------
// Existence guard and failure containment
// ---------------------------------------------------------------------------

#[tokio::test]
async fn existing_output_skips_the_transfer_entirely() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(url_path("/list.txt.gz"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"unused".to_vec()))
        .expect(0)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let category_dir = dir.path().join("misc");
    std::fs::create_dir_all(&category_dir).unwrap();
    std::fs::write(category_dir.join("list.txt"), b"already here").unwrap();

    let catalog = single_entry_catalog(&server.uri(), "list.txt.gz");
    let fetcher = WordlistFetcher::new(test_config(dir.path()), catalog)
        .await
        .unwrap();
    let mut events = fetcher.subscribe();

    fetcher.fetch(&Selection::id(1)).await.unwrap();
    fetcher.drain().await;

    let events = collected(&mut events);
    assert!(events.iter().any(|e| matches!(e, Event::FetchSkipped { .. })));
    assert!(!events.iter().any(|e| matches!(e, Event::FetchCompleted { .. })));

    // Directory unchanged: still exactly the pre-existing file
    let entries: Vec<_> = std::fs::read_dir(&category_dir).unwrap().flatten().collect();
    assert_eq!(entries.len(), 1);
    assert_eq!(
        std::fs::read(category_dir.join("list.txt")).unwrap(),
        b"already here"
    );
}

#[tokio::test]
async fn http_failure_removes_the_partial_file_and_spares_siblings() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(url_path("/bad.txt"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(url_path("/good.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"fine".to_vec()))
        .mount(&server)
        .await;

    let catalog = Catalog::from_json(
        &format!(
            r#"{{
                "bad": {{"http": "{0}/bad.txt", "torrent": ""}},
                "good": {{"http": "{0}/good.txt", "torrent": ""}}
            }}"#,
            server.uri()
        ),
        "{}",
    )
    .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let fetcher = WordlistFetcher::new(test_config(dir.path()), catalog)
        .await
        .unwrap();
    let mut events = fetcher.subscribe();

    fetcher.fetch(&Selection::all()).await.unwrap();
    fetcher.drain().await;

    assert!(!dir.path().join("bad.txt").exists());
    assert_eq!(std::fs::read(dir.path().join("good.txt")).unwrap(), b"fine");

    let events = collected(&mut events);
    assert!(events.iter().any(
        |e| matches!(e, Event::FetchFailed { name, .. } if name == "bad")
    ));
    assert!(events.iter().any(
        |e| matches!(e, Event::FetchCompleted { name, .. } if name == "good")
    ));
}

#[tokio::test]
async fn selection_error_schedules_no_work() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let catalog = single_entry_catalog(&server.uri(), "list.txt");
    let fetcher = WordlistFetcher::new(test_config(dir.path()), catalog)
        .await
        .unwrap();

    let err = fetcher.fetch(&Selection::id(2)).await.unwrap_err();
    assert!(matches!(err, Error::Selection(_)));
    fetcher.drain().await;
}

#[tokio::test]
async fn unresolvable_entry_in_an_expansion_does_not_abort_the_batch() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(url_path("/good.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"fine".to_vec()))
        .mount(&server)
        .await;

    let catalog = Catalog::from_json(
        &format!(
            r#"{{
                "orphan": {{"http": "", "torrent": ""}},
                "good": {{"http": "{}/good.txt", "torrent": ""}}
            }}"#,
            server.uri()
        ),
        "{}",
    )
    .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let fetcher = WordlistFetcher::new(test_config(dir.path()), catalog)
        .await
        .unwrap();
    let mut events = fetcher.subscribe();

    fetcher.fetch(&Selection::all()).await.unwrap();
    fetcher.drain().await;

    assert!(dir.path().join("good.txt").is_file());
    let events = collected(&mut events);
    assert!(events.iter().any(
        |e| matches!(e, Event::FetchFailed { name, .. } if name == "orphan")
    ));
}

#[tokio::test]
async fn single_unresolvable_selection_propagates_the_resolution_error() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = Catalog::from_json(r#"{"orphan": {"http": "", "torrent": ""}}"#, "{}").unwrap();
    let fetcher = WordlistFetcher::new(test_config(dir.path()), catalog)
        .await
        .unwrap();

    let err = fetcher.fetch(&Selection::id(1)).await.unwrap_err();
    assert!(matches!(err, Error::Resolution(_)));

    // Destination directory untouched
    let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().flatten().collect();
    assert!(entries.is_empty());
}

#[tokio::test]
async fn zero_cap_is_rejected_at_construction() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config {
        max_concurrent_fetches: 0,
        ..test_config(dir.path())
    };
    let err = WordlistFetcher::new(config, Catalog::default())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Config { .. }));
}
