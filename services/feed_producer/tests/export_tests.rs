//! Exporters driven through the publication channel

use codec::decode_feed;
use feed_producer::{FeedFileWriter, FeedHttpServer, SchedulerStats};
use hyper::{Body, Client, Method, Request, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use tempfile::tempdir;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use types::{FeedSnapshot, PositionRecord};

fn snapshot(created_at_ms: u64) -> FeedSnapshot {
    FeedSnapshot::new(
        vec![
            PositionRecord::new("5512", 39.95, -75.16, 90.0, 4.2, 1_365_614_681_000).unwrap(),
            PositionRecord::new("5507", 39.97, -75.12, 180.0, 0.0, 1_365_614_650_500).unwrap(),
        ],
        created_at_ms,
    )
}

#[tokio::test]
async fn test_file_writer_follows_publications() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("vehicle-positions.pb");
    let (publisher, updates) = watch::channel(Arc::new(FeedSnapshot::empty()));
    let cancel = CancellationToken::new();

    let handle = FeedFileWriter::new(&path).spawn(updates, cancel.clone());
    publisher.send_replace(Arc::new(snapshot(1_365_614_700_000)));

    let mut written = None;
    for _ in 0..100 {
        if let Ok(bytes) = std::fs::read(&path) {
            written = Some(bytes);
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    let feed = decode_feed(&written.expect("feed file should appear")).unwrap();
    assert_eq!(feed.header.timestamp, Some(1_365_614_700));
    assert_eq!(feed.entity.len(), 2);

    cancel.cancel();
    handle.await.unwrap();
}

#[tokio::test]
async fn test_http_endpoints() {
    let (_publisher, feed) = watch::channel(Arc::new(snapshot(1_365_614_700_000)));
    let stats = Arc::new(SchedulerStats::new());
    let cancel = CancellationToken::new();

    let server = FeedHttpServer::new("127.0.0.1:0".parse().unwrap(), feed, stats);
    let (addr, handle) = server.spawn(cancel.clone()).unwrap();
    let client = Client::new();

    let response = client
        .get(format!("http://{}/vehicle-positions", addr).parse().unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "application/x-protobuf");
    let body = hyper::body::to_bytes(response.into_body()).await.unwrap();
    let message = decode_feed(&body).unwrap();
    assert_eq!(message.header.gtfs_realtime_version, "1.0");
    let ids: Vec<_> = message.entity.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, vec!["5507", "5512"]);

    let response = client
        .get(format!("http://{}/vehicle-positions?debug", addr).parse().unwrap())
        .await
        .unwrap();
    assert_eq!(response.headers()["content-type"], "application/json");
    let body = hyper::body::to_bytes(response.into_body()).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["max_timestamp_ms"], 1_365_614_681_000u64);
    assert_eq!(json["records"].as_array().unwrap().len(), 2);

    let response = client
        .get(format!("http://{}/health", addr).parse().unwrap())
        .await
        .unwrap();
    let body = hyper::body::to_bytes(response.into_body()).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["vehicles"], 2);
    assert_eq!(json["cursor_ms"], 1_365_614_681_000u64);
    assert_eq!(json["stats"]["position_cycles"], 0);

    let response = client
        .get(format!("http://{}/nowhere", addr).parse().unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let request = Request::builder()
        .method(Method::POST)
        .uri(format!("http://{}/vehicle-positions", addr))
        .body(Body::empty())
        .unwrap();
    let response = client.request(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);

    cancel.cancel();
    handle.await.unwrap();
}

#[tokio::test]
async fn test_http_bind_conflict_is_reported() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let taken = listener.local_addr().unwrap();
    let (_publisher, feed) = watch::channel(Arc::new(FeedSnapshot::empty()));

    let server = FeedHttpServer::new(taken, feed, Arc::new(SchedulerStats::new()));
    assert!(server.spawn(CancellationToken::new()).is_err());
}
