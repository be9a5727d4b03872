//! Shared test helpers for relay integration tests
//!
//! A single mock server answers both the LibreLink Up paths (`/llu/...`)
//! and the Nightscout paths (`/api/...`). Fixtures are shared with the
//! adapter crates.

use std::path::PathBuf;
use std::sync::Arc;

use glucolink_core::ports::{Credentials, IEntrySink};
use glucolink_librelink::LibreLinkClient;
use glucolink_sync::RelayEngine;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

/// Patient id of the first connection in `connections.json`
pub const FIRST_PATIENT: &str = "7ad66b40-ba9b-401e-9845-4f49f998cf16";

/// Loads a JSON fixture from another workspace crate's `tests/fixtures`
pub fn fixture(krate: &str, name: &str) -> serde_json::Value {
    let file = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join(krate)
        .join("tests")
        .join("fixtures")
        .join(name);
    let content = std::fs::read_to_string(&file)
        .unwrap_or_else(|e| panic!("read fixture {}: {e}", file.display()));
    serde_json::from_str(&content).expect("parse fixture")
}

/// Ticket expiry far in the future (2100-01-01)
pub const FAR_FUTURE: i64 = 4_102_444_800;

/// Ticket expiry stored in `login.json` (June 2023)
pub const FIXTURE_EXPIRY: i64 = 1_687_970_889;

/// `login.json` with the ticket expiry replaced
pub fn login_expiring_at(expires: i64) -> serde_json::Value {
    let mut body = fixture("glucolink-librelink", "login.json");
    body["data"]["authTicket"]["expires"] = serde_json::json!(expires);
    body
}

/// Starts a mock server with the LibreLink Up login, connections and graph
/// endpoints mounted; the issued ticket does not expire during the test.
pub async fn setup_upstream() -> MockServer {
    setup_upstream_with_login(login_expiring_at(FAR_FUTURE)).await
}

/// Same as [`setup_upstream`] with a custom login response body.
pub async fn setup_upstream_with_login(login: serde_json::Value) -> MockServer {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/llu/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(login))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/llu/connections"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(fixture("glucolink-librelink", "connections.json")),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("/llu/connections/{FIRST_PATIENT}/graph")))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(fixture("glucolink-librelink", "graph.json")),
        )
        .mount(&server)
        .await;

    server
}

/// Builds an engine whose upstream points at `server`
pub fn engine(
    server: &MockServer,
    sink: Arc<dyn IEntrySink + Send + Sync>,
    all_data: bool,
) -> RelayEngine {
    let upstream = LibreLinkClient::with_base_url(server.uri()).expect("build client");
    RelayEngine::new(
        Arc::new(upstream),
        sink,
        Credentials::new("me@example.com", "secret"),
        None,
        all_data,
    )
}

/// Requests received by `server` matching method and path
pub async fn received(server: &MockServer, verb: &str, route: &str) -> Vec<Request> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|r| r.method.as_str() == verb && r.url.path() == route)
        .collect()
}
