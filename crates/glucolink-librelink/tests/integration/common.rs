//! Shared test helpers for LibreLink Up integration tests
//!
//! Provides wiremock-based mock server setup for the LibreLink Up endpoints.
//! Each helper mounts the necessary mock endpoints; `setup_llu_mock` returns a
//! LibreLinkClient pointing at the mock server.

use std::path::PathBuf;

use glucolink_core::domain::{AuthHeaders, AuthSession, AuthTicket};
use glucolink_librelink::client::LibreLinkClient;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Patient id of the first connection in `connections.json`
pub const FIRST_PATIENT: &str = "7ad66b40-ba9b-401e-9845-4f49f998cf16";

/// Patient id of the second connection in `connections.json`
pub const SECOND_PATIENT: &str = "77179667-ba4b-11eb-ad1f-0242ac110004";

/// User id in `login.json`
pub const USER_ID: &str = "fa80d039-9c51-11ed-a6b9-0242ac110005";

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

/// Headers of a session established with the `login.json` identity
pub fn auth_headers() -> AuthHeaders {
    let mut session = AuthSession::new();
    session.establish(AuthTicket::new("test-token", i64::MAX, 0), USER_ID);
    session.auth_headers().expect("session has headers")
}

/// Sets up a mock server with the three LibreLink Up endpoints and returns
/// a (MockServer, LibreLinkClient) tuple.
///
/// Pre-configured endpoints:
/// - POST /llu/auth/login → login.json
/// - GET /llu/connections → connections.json
/// - GET /llu/connections/{FIRST_PATIENT}/graph → graph.json
pub async fn setup_llu_mock() -> (MockServer, LibreLinkClient) {
    let server = MockServer::start().await;

    mount_login(&server, fixture("login.json")).await;

    Mock::given(method("GET"))
        .and(path("/llu/connections"))
        .respond_with(ResponseTemplate::new(200).set_body_json(fixture("connections.json")))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("/llu/connections/{FIRST_PATIENT}/graph")))
        .respond_with(ResponseTemplate::new(200).set_body_json(fixture("graph.json")))
        .mount(&server)
        .await;

    let client = LibreLinkClient::with_base_url(server.uri()).expect("build client");

    (server, client)
}

/// Mounts the login endpoint with the given body.
pub async fn mount_login(server: &MockServer, body: serde_json::Value) {
    Mock::given(method("POST"))
        .and(path("/llu/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}
