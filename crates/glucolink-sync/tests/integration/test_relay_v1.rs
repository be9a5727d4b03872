//! Relay ticks against a Nightscout API v1 sink

use std::sync::Arc;

use glucolink_core::domain::RelayError;
use glucolink_nightscout::v1::NightscoutV1Client;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common;

const ENTRIES: &str = "/api/v1/entries";

fn sink(server: &MockServer) -> Arc<NightscoutV1Client> {
    Arc::new(NightscoutV1Client::new(server.uri(), "api-secret-value", "test-device").unwrap())
}

async fn mount_last_entry(server: &MockServer, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(ENTRIES))
        .and(header("api-secret", "api-secret-value"))
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

async fn uploaded_body(server: &MockServer) -> Vec<serde_json::Value> {
    let posts = common::received(server, "POST", ENTRIES).await;
    assert_eq!(posts.len(), 1, "one batch upload expected");
    posts[0].body_json().expect("upload body is a JSON array")
}

#[tokio::test]
async fn test_empty_sink_receives_full_history() {
    let server = common::setup_upstream().await;
    mount_last_entry(&server, serde_json::json!([])).await;
    mount_upload(&server, 200).await;

    let report = common::engine(&server, sink(&server), false)
        .tick()
        .await
        .expect("tick");

    assert_eq!(report.fetched, 142);
    assert_eq!(report.uploaded, 142);
    assert_eq!(report.watermark, None);
    assert_eq!(report.patient_id.as_str(), common::FIRST_PATIENT);

    let body = uploaded_body(&server).await;
    assert_eq!(body.len(), 142);

    assert_eq!(body[0]["date"], 1_672_418_860_000_i64);
    assert_eq!(body[0]["direction"], "Flat");
    assert_eq!(body[0]["sgv"], 115);
    assert_eq!(body[0]["type"], "sgv");
    assert_eq!(body[0]["device"], "test-device");

    assert_eq!(body[1]["date"], 1_672_375_840_000_i64);
    assert!(body[1].get("direction").is_none());
    assert_eq!(body[1]["sgv"], 173);
}

#[tokio::test]
async fn test_watermark_limits_upload_to_newer_entries() {
    let server = common::setup_upstream().await;
    mount_last_entry(
        &server,
        common::fixture("glucolink-nightscout", "entries.json"),
    )
    .await;
    mount_upload(&server, 200).await;

    let report = common::engine(&server, sink(&server), false)
        .tick()
        .await
        .expect("tick");

    assert_eq!(report.uploaded, 112);
    assert_eq!(
        report.watermark.map(|w| w.timestamp_millis()),
        Some(1_672_384_540_000)
    );

    let body = uploaded_body(&server).await;
    assert_eq!(body.len(), 112);

    assert_eq!(body[0]["date"], 1_672_418_860_000_i64);
    assert_eq!(body[0]["direction"], "Flat");
    assert_eq!(body[0]["sgv"], 115);

    assert_eq!(body[1]["date"], 1_672_384_839_000_i64);
    assert!(body[1].get("direction").is_none());
    assert_eq!(body[1]["sgv"], 177);
}

#[tokio::test]
async fn test_all_data_ignores_watermark() {
    let server = common::setup_upstream().await;
    mount_last_entry(
        &server,
        common::fixture("glucolink-nightscout", "entries.json"),
    )
    .await;
    mount_upload(&server, 200).await;

    let report = common::engine(&server, sink(&server), true)
        .tick()
        .await
        .expect("tick");

    assert_eq!(report.uploaded, 142);
    assert!(common::received(&server, "GET", ENTRIES).await.is_empty());
}

#[tokio::test]
async fn test_session_survives_successful_ticks() {
    let server = common::setup_upstream().await;
    mount_last_entry(&server, serde_json::json!([])).await;
    mount_upload(&server, 200).await;

    let engine = common::engine(&server, sink(&server), false);
    engine.tick().await.expect("first tick");
    assert!(engine.has_valid_session().await);
    engine.tick().await.expect("second tick");

    let logins = common::received(&server, "POST", "/llu/auth/login").await;
    assert_eq!(logins.len(), 1);
    assert_eq!(common::received(&server, "POST", ENTRIES).await.len(), 2);
}

#[tokio::test]
async fn test_expired_ticket_forces_login_every_tick() {
    let server =
        common::setup_upstream_with_login(common::login_expiring_at(common::FIXTURE_EXPIRY))
            .await;
    mount_last_entry(&server, serde_json::json!([])).await;
    mount_upload(&server, 200).await;

    let engine = common::engine(&server, sink(&server), false);
    engine.tick().await.expect("first tick");
    assert!(!engine.has_valid_session().await);
    engine.tick().await.expect("second tick");

    let logins = common::received(&server, "POST", "/llu/auth/login").await;
    assert_eq!(logins.len(), 2);
}

#[tokio::test]
async fn test_rejected_upload_fails_tick_and_forces_login() {
    let server = common::setup_upstream().await;
    mount_last_entry(&server, serde_json::json!([])).await;
    mount_upload(&server, 401).await;

    let engine = common::engine(&server, sink(&server), false);

    let err = engine.tick().await.unwrap_err();
    assert!(matches!(err, RelayError::Sink(_)));
    assert!(!engine.has_valid_session().await);

    let _ = engine.tick().await;
    let logins = common::received(&server, "POST", "/llu/auth/login").await;
    assert_eq!(logins.len(), 2);
}

#[tokio::test]
async fn test_wrong_region_aborts_before_sink() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/llu/auth/login"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(common::fixture("glucolink-librelink", "login-redirect.json")),
        )
        .mount(&server)
        .await;

    let err = common::engine(&server, sink(&server), false)
        .tick()
        .await
        .unwrap_err();

    assert!(matches!(err, RelayError::RegionMismatch { ref region } if region == "US"));
    assert!(common::received(&server, "GET", ENTRIES).await.is_empty());
}
