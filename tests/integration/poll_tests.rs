//! Integration tests for the poller
//!
//! These tests use wiremock to serve listing pages and a temporary CSV file
//! to check the full fetch -> extract -> dedup -> persist cycle end-to-end.

use bulletin_watch::config::{Config, PageTarget};
use bulletin_watch::poller::{watch, Controller, CycleOutcome};
use bulletin_watch::storage::{CsvStore, Store};
use bulletin_watch::Watermark;
use std::fs;
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration pointed at the mock server
fn create_test_config(base_url: &str, output: &Path) -> Config {
    let mut config = Config::default();
    config.source.base_url = base_url.to_string();
    config.source.timeout_secs = 2;
    config.poll.interval_ms = 20;
    config.poll.max_backoff_ms = 100;
    config.poll.jitter = 0.0;
    config.output.path = output.to_path_buf();
    config.target = PageTarget {
        category: "new_crypto".to_string(),
        page: 1,
    };
    config
}

/// Renders a listing page; titles prefixed with '*' are pinned
fn listing(titles: &[&str]) -> String {
    let mut entries = String::new();
    for title in titles {
        let (title, pinned) = match title.strip_prefix('*') {
            Some(rest) => (rest, true),
            None => (*title, false),
        };
        let slug = title.to_lowercase().replace(' ', "-");
        let tag = if pinned {
            r#"<div class="article-item-tag-top">Top</div>"#
        } else {
            ""
        };
        entries.push_str(&format!(
            r#"<a class="no-style" href="/en-US/article/{slug}"><div class="article-item"><span>{title}</span>{tag}<div class="article-item-date">Jan 01, 2024</div></div></a>"#
        ));
    }
    format!(
        r#"<!DOCTYPE html><html><head><title>Announcements</title></head><body><div class="article-list">{entries}</div></body></html>"#
    )
}

async fn mount_listing(server: &MockServer, titles: &[&str], times: u64) {
    Mock::given(method("GET"))
        .and(path("/en-US/"))
        .and(query_param("category", "new_crypto"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing(titles)))
        .up_to_n_times(times)
        .mount(server)
        .await;
}

/// Rows of the CSV file split on the carriage-return terminator
fn read_rows(path: &Path) -> Vec<String> {
    fs::read_to_string(path)
        .unwrap()
        .split('\r')
        .filter(|row| !row.is_empty())
        .map(str::to_string)
        .collect()
}

fn row_titles(path: &Path) -> Vec<String> {
    read_rows(path)
        .iter()
        .skip(1)
        .map(|row| row.split(',').next().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn test_overlapping_polls_append_only_new_items() {
    let server = MockServer::start().await;
    mount_listing(&server, &["A", "B", "C"], 1).await;
    mount_listing(&server, &["D", "A", "B"], 1).await;

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("news.csv");
    let config = create_test_config(&server.uri(), &output);

    let mut controller = Controller::new(&config, CsvStore::new(&output)).unwrap();
    controller.prepare(false).unwrap();
    assert_eq!(read_rows(&output), vec!["title,link,date"]);

    let first = controller.run_cycle().await.unwrap();
    assert_eq!(
        first,
        CycleOutcome::Appended {
            count: 3,
            watermark: Watermark::at_title("A"),
        }
    );

    let second = controller.run_cycle().await.unwrap();
    assert_eq!(
        second,
        CycleOutcome::Appended {
            count: 1,
            watermark: Watermark::at_title("D"),
        }
    );

    assert_eq!(row_titles(&output), vec!["A", "B", "C", "D"]);

    let rows = read_rows(&output);
    let d_row: Vec<&str> = rows[4].split(',').collect();
    assert_eq!(d_row[1], format!("{}/en-US/article/d", server.uri()));
    assert_eq!(d_row[2].len(), "YYYY-MM-DD HH:MM:SS".len());
}

#[tokio::test]
async fn test_pinned_items_never_reach_the_file() {
    let server = MockServer::start().await;
    mount_listing(&server, &["*Welcome", "B", "*Campaign", "A"], 1).await;
    mount_listing(&server, &["*Welcome", "C", "B", "*Campaign", "A"], 1).await;

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("news.csv");
    let config = create_test_config(&server.uri(), &output);

    let mut controller = Controller::new(&config, CsvStore::new(&output)).unwrap();
    controller.prepare(false).unwrap();
    controller.run_cycle().await.unwrap();
    controller.run_cycle().await.unwrap();

    assert_eq!(row_titles(&output), vec!["B", "A", "C"]);
}

#[tokio::test]
async fn test_restart_without_resume_reappends_page() {
    let server = MockServer::start().await;
    mount_listing(&server, &["B", "A"], 2).await;

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("news.csv");
    let config = create_test_config(&server.uri(), &output);

    let mut before = Controller::new(&config, CsvStore::new(&output)).unwrap();
    before.prepare(false).unwrap();
    before.run_cycle().await.unwrap();
    drop(before);

    // Same page after a restart: the in-memory watermark is gone
    let mut after = Controller::new(&config, CsvStore::new(&output)).unwrap();
    after.prepare(false).unwrap();
    assert!(after.watermark().is_empty());
    let outcome = after.run_cycle().await.unwrap();

    assert!(matches!(outcome, CycleOutcome::Appended { count: 2, .. }));
    assert_eq!(row_titles(&output), vec!["B", "A", "B", "A"]);
    assert_eq!(read_rows(&output)[0], "title,link,date");
}

#[tokio::test]
async fn test_restart_with_resume_skips_seen_items() {
    let server = MockServer::start().await;
    mount_listing(&server, &["B", "A"], 1).await;
    mount_listing(&server, &["C", "B", "A"], 1).await;

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("news.csv");
    let config = create_test_config(&server.uri(), &output);

    let mut before = Controller::new(&config, CsvStore::new(&output)).unwrap();
    before.prepare(false).unwrap();
    before.run_cycle().await.unwrap();
    drop(before);

    // The sidecar holds the newest title written, so only "C" is new
    let mut after = Controller::new(&config, CsvStore::new(&output)).unwrap();
    after.prepare(true).unwrap();
    assert_eq!(after.watermark(), &Watermark::at_title("B"));
    after.run_cycle().await.unwrap();

    assert_eq!(row_titles(&output), vec!["B", "A", "C"]);
    assert!(output.with_file_name("news.csv.watermark").exists());
}

#[tokio::test]
async fn test_append_only_growth_across_cycles() {
    let server = MockServer::start().await;
    mount_listing(&server, &["A"], 1).await;
    mount_listing(&server, &["C", "B", "A"], 1).await;
    mount_listing(&server, &["F", "E", "D", "C", "B"], 1).await;

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("news.csv");
    let config = create_test_config(&server.uri(), &output);

    let mut controller = Controller::new(&config, CsvStore::new(&output)).unwrap();
    controller.prepare(false).unwrap();

    let mut appended = 0;
    let mut snapshots = Vec::new();
    for _ in 0..3 {
        if let CycleOutcome::Appended { count, .. } = controller.run_cycle().await.unwrap() {
            appended += count;
        }
        snapshots.push(fs::read_to_string(&output).unwrap());
    }

    assert_eq!(appended, 1 + 2 + 3);
    assert_eq!(read_rows(&output).len(), 1 + appended);
    assert_eq!(controller.store().count_records().unwrap(), appended as u64);
    for pair in snapshots.windows(2) {
        assert!(pair[1].starts_with(&pair[0]));
    }
}

#[tokio::test]
async fn test_error_page_is_a_parse_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<html><body>Just a moment...</body></html>"),
        )
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("news.csv");
    let config = create_test_config(&server.uri(), &output);

    let mut controller = Controller::new(&config, CsvStore::new(&output)).unwrap();
    controller.prepare(false).unwrap();

    let err = controller.run_cycle().await.unwrap_err();
    assert_eq!(err.stage(), "parse");
    assert_eq!(read_rows(&output), vec!["title,link,date"]);
}

#[tokio::test]
async fn test_watch_survives_failures_until_cancelled() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(502))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    mount_listing(&server, &["B", "A"], 1).await;
    mount_listing(&server, &["C", "B", "A"], 100).await;

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("news.csv");
    let config = create_test_config(&server.uri(), &output);

    let shutdown = CancellationToken::new();
    let canceller = shutdown.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(600)).await;
        canceller.cancel();
    });

    tokio::time::timeout(Duration::from_secs(5), watch(config, false, shutdown))
        .await
        .expect("watch should stop after cancellation")
        .unwrap();

    assert_eq!(row_titles(&output), vec!["B", "A", "C"]);
}

#[tokio::test]
async fn test_watch_rejects_foreign_file() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("news.csv");
    fs::write(&output, "id;value\r1;2\r").unwrap();

    let config = create_test_config("http://127.0.0.1:1", &output);
    let result = watch(config, false, CancellationToken::new()).await;

    let err = result.unwrap_err();
    assert_eq!(err.stage(), "persist");
}
