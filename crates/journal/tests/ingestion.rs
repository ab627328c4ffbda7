//! Worker, SQLite store and read API running together.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::NaiveDate;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

use journal::{
    ApodRecord, IngestionWorker, JournalError, JournalReader, MediaKind, PollPolicy,
    RecordSource, Result, SqliteStore, api,
};

#[derive(Debug)]
struct ScriptedSource {
    script: Mutex<VecDeque<ApodRecord>>,
}

#[async_trait]
impl RecordSource for ScriptedSource {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn fetch_today(&self) -> Result<ApodRecord> {
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| JournalError::Network("HTTP 503: no record".into()))
    }
}

fn record(day: u32) -> ApodRecord {
    ApodRecord::new(
        NaiveDate::from_ymd_opt(2024, 5, day).unwrap(),
        format!("Day {day}"),
        "Explanation",
        format!("https://apod.nasa.gov/apod/image/{day}.jpg"),
        MediaKind::Image,
        "v1",
    )
    .with_hd_url(format!("https://apod.nasa.gov/apod/image/{day}_hd.jpg"))
}

fn fast_policy() -> PollPolicy {
    PollPolicy {
        poll_interval: Duration::from_millis(40),
        fetch_retry_interval: Duration::from_millis(10),
        duplicate_retry_interval: Duration::from_millis(10),
        duplicate_threshold: 2,
    }
}

async fn wait_for_records(store: &SqliteStore, count: usize) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while store.get_all().await.unwrap().len() < count {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("worker did not store the expected records in time");
}

#[tokio::test]
async fn test_worker_fills_journal_served_by_api() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(SqliteStore::new(dir.path().join("journal.db")).unwrap());

    // Day 1 is fetched three times before day 2 is published.
    let source = Arc::new(ScriptedSource {
        script: Mutex::new(VecDeque::from([record(1), record(1), record(1), record(2)])),
    });

    let shutdown = CancellationToken::new();
    let worker = IngestionWorker::new(source, store.clone(), fast_policy());
    let handle = tokio::spawn(worker.run(shutdown.clone()));

    wait_for_records(&store, 2).await;
    shutdown.cancel();
    let state = tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("worker did not stop after cancellation")
        .unwrap();
    assert!(state.consecutive_duplicates() <= 2);

    let app = api::router(store, Duration::from_secs(4));

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/journal").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = serde_json::from_slice(
        &axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap(),
    )
    .unwrap();
    let titles: Vec<_> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["title"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(titles, vec!["Day 2", "Day 1"]);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/journal/2024-05-01")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = serde_json::from_slice(
        &axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap(),
    )
    .unwrap();
    assert_eq!(body["data"]["hdurl"], "https://apod.nasa.gov/apod/image/1_hd.jpg");
}

#[tokio::test]
async fn test_restart_does_not_duplicate_records() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("journal.db");

    for _ in 0..2 {
        let store = Arc::new(SqliteStore::new(&path).unwrap());
        let source = Arc::new(ScriptedSource {
            script: Mutex::new(VecDeque::from([record(7)])),
        });
        let mut worker = IngestionWorker::new(source, store, fast_policy());
        worker.run_cycle().await;
    }

    let store = SqliteStore::new(&path).unwrap();
    assert_eq!(store.get_all().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_serve_stops_on_cancellation() {
    let store = Arc::new(SqliteStore::in_memory().unwrap());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let shutdown = CancellationToken::new();

    let server = tokio::spawn(api::serve(
        listener,
        api::router(store, Duration::from_secs(4)),
        shutdown.clone(),
    ));

    shutdown.cancel();
    let result = tokio::time::timeout(Duration::from_secs(5), server)
        .await
        .expect("server did not stop after cancellation")
        .unwrap();
    assert!(result.is_ok());
}
