//! Shared test helpers for Nightscout integration tests

use std::path::PathBuf;

use chrono::{TimeZone, Utc};
use glucolink_core::domain::{Direction, SyncEntry};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Access token used by the v3 tests
pub const ACCESS_TOKEN: &str = "relay-0123456789abcdef";

/// JWT in `authorization.json`
pub const JWT: &str =
    "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9.eyJhY2Nlc3NUb2tlbiI6InJlbGF5In0.c2lnbmVk";

/// Loads a JSON fixture from `tests/fixtures`
pub fn fixture(name: &str) -> serde_json::Value {
    let file = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name);
    let content = std::fs::read_to_string(&file)
        .unwrap_or_else(|e| panic!("read fixture {}: {e}", file.display()));
    serde_json::from_str(&content).expect("parse fixture")
}

/// Two entries: the current reading with a trend and one history reading
pub fn sample_entries() -> Vec<SyncEntry> {
    vec![
        SyncEntry {
            date: Utc.timestamp_millis_opt(1_672_418_860_000).unwrap(),
            sgv: 115,
            direction: Some(Direction::Flat),
        },
        SyncEntry {
            date: Utc.timestamp_millis_opt(1_672_375_840_000).unwrap(),
            sgv: 173,
            direction: None,
        },
    ]
}

/// Mounts the v2 authorization endpoint returning `authorization.json`.
pub async fn mount_authorization(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path(format!("/api/v2/authorization/request/{ACCESS_TOKEN}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(fixture("authorization.json")))
        .mount(server)
        .await;
}
