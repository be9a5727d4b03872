//! Relay ticks against a Nightscout API v3 sink

use std::sync::Arc;

use glucolink_core::domain::RelayError;
use glucolink_nightscout::v3::NightscoutV3Client;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common;

const ENTRIES: &str = "/api/v3/entries";
const ACCESS_TOKEN: &str = "relay-0123456789abcdef";

fn sink(server: &MockServer) -> Arc<NightscoutV3Client> {
    Arc::new(
        NightscoutV3Client::new(server.uri(), ACCESS_TOKEN, "test-device", "test-app").unwrap(),
    )
}

async fn mount_authorization(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path(format!("/api/v2/authorization/request/{ACCESS_TOKEN}")))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(common::fixture("glucolink-nightscout", "authorization.json")),
        )
        .mount(server)
        .await;
}

async fn mount_last_entry(server: &MockServer, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(ENTRIES))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

async fn mount_upload(server: &MockServer, status: u16) {
    Mock::given(method("POST"))
        .and(path(ENTRIES))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_watermark_limits_per_entry_uploads() {
    let server = common::setup_upstream().await;
    mount_authorization(&server).await;
    mount_last_entry(
        &server,
        common::fixture("glucolink-nightscout", "entries-v3.json"),
    )
    .await;
    mount_upload(&server, 201).await;

    let report = common::engine(&server, sink(&server), false)
        .tick()
        .await
        .expect("tick");

    assert_eq!(report.uploaded, 112);

    let posts = common::received(&server, "POST", ENTRIES).await;
    assert_eq!(posts.len(), 112);

    let bodies: Vec<serde_json::Value> = posts
        .iter()
        .map(|r| r.body_json().expect("entry body"))
        .collect();
    assert!(bodies.iter().all(|b| b["app"] == "test-app"));
    assert!(bodies
        .iter()
        .any(|b| b["date"] == 1_672_418_860_000_i64 && b["direction"] == "Flat"));
    assert!(bodies
        .iter()
        .all(|b| b["date"].as_i64().unwrap_or_default() > 1_672_384_540_000));
}

#[tokio::test]
async fn test_empty_store_fails_tick() {
    let server = common::setup_upstream().await;
    mount_authorization(&server).await;
    mount_last_entry(&server, serde_json::json!({ "status": 200, "result": [] })).await;
    mount_upload(&server, 201).await;

    let engine = common::engine(&server, sink(&server), false);
    let err = engine.tick().await.unwrap_err();

    assert!(matches!(err, RelayError::Sink(_)));
    assert!(common::received(&server, "POST", ENTRIES).await.is_empty());
    assert!(!engine.has_valid_session().await);
}

#[tokio::test]
async fn test_all_data_bootstraps_empty_store() {
    let server = common::setup_upstream().await;
    mount_authorization(&server).await;
    mount_upload(&server, 201).await;

    let report = common::engine(&server, sink(&server), true)
        .tick()
        .await
        .expect("tick");

    assert_eq!(report.uploaded, 142);
    assert_eq!(common::received(&server, "POST", ENTRIES).await.len(), 142);
    assert!(common::received(&server, "GET", ENTRIES).await.is_empty());
}

#[tokio::test]
async fn test_single_rejected_entry_fails_tick() {
    let server = common::setup_upstream().await;
    mount_authorization(&server).await;
    mount_last_entry(
        &server,
        common::fixture("glucolink-nightscout", "entries-v3.json"),
    )
    .await;
    Mock::given(method("POST"))
        .and(path(ENTRIES))
        .respond_with(ResponseTemplate::new(400))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    mount_upload(&server, 201).await;

    let err = common::engine(&server, sink(&server), false)
        .tick()
        .await
        .unwrap_err();

    assert_eq!(err.kind(), "sink");
}
