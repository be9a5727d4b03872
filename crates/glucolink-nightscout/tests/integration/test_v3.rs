//! Integration tests for the Nightscout API v3 sink

use glucolink_core::ports::IEntrySink;
use glucolink_nightscout::v3::NightscoutV3Client;
use glucolink_nightscout::NightscoutError;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common;

fn client(server: &MockServer) -> NightscoutV3Client {
    NightscoutV3Client::new(server.uri(), common::ACCESS_TOKEN, "test-device", "test-app").unwrap()
}

fn bearer() -> String {
    format!("Bearer {}", common::JWT)
}

#[tokio::test]
async fn test_last_entry_uses_jwt_and_sort() {
    let server = MockServer::start().await;
    common::mount_authorization(&server).await;
    Mock::given(method("GET"))
        .and(path("/api/v3/entries"))
        .and(query_param("limit", "1"))
        .and(query_param("sort$desc", "date"))
        .and(header("authorization", bearer().as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::fixture("entries-v3.json")))
        .expect(1)
        .mount(&server)
        .await;

    let entry = client(&server)
        .last_entry()
        .await
        .expect("last entry")
        .expect("v3 never returns None");

    assert_eq!(entry.date.timestamp_millis(), 1_672_384_540_000);
}

#[tokio::test]
async fn test_empty_store_is_an_error() {
    let server = MockServer::start().await;
    common::mount_authorization(&server).await;
    Mock::given(method("GET"))
        .and(path("/api/v3/entries"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": 200,
            "result": []
        })))
        .mount(&server)
        .await;

    let err = client(&server).last_entry().await.unwrap_err();

    assert!(matches!(
        err.downcast_ref::<NightscoutError>(),
        Some(NightscoutError::EmptyStore)
    ));
}

#[tokio::test]
async fn test_missing_jwt_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/api/v2/authorization/request/{}", common::ACCESS_TOKEN)))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .mount(&server)
        .await;

    let err = client(&server).last_entry().await.unwrap_err();

    assert!(matches!(
        err.downcast_ref::<NightscoutError>(),
        Some(NightscoutError::MissingToken)
    ));
}

#[tokio::test]
async fn test_upload_posts_one_request_per_entry() {
    let server = MockServer::start().await;
    common::mount_authorization(&server).await;
    Mock::given(method("POST"))
        .and(path("/api/v3/entries"))
        .and(header("authorization", bearer().as_str()))
        .and(body_partial_json(serde_json::json!({
            "type": "sgv",
            "device": "test-device",
            "app": "test-app"
        })))
        .respond_with(ResponseTemplate::new(201))
        .expect(2)
        .mount(&server)
        .await;

    client(&server)
        .upload_entries(&common::sample_entries())
        .await
        .expect("upload");
}

#[tokio::test]
async fn test_single_entry_failure_fails_upload() {
    let server = MockServer::start().await;
    common::mount_authorization(&server).await;
    Mock::given(method("POST"))
        .and(path("/api/v3/entries"))
        .and(body_partial_json(serde_json::json!({ "sgv": 173 })))
        .respond_with(ResponseTemplate::new(400))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v3/entries"))
        .respond_with(ResponseTemplate::new(201))
        .mount(&server)
        .await;

    let err = client(&server)
        .upload_entries(&common::sample_entries())
        .await
        .unwrap_err();

    assert!(err.to_string().contains("400"), "{err}");
}

#[tokio::test]
async fn test_200_instead_of_201_fails_upload() {
    let server = MockServer::start().await;
    common::mount_authorization(&server).await;
    Mock::given(method("POST"))
        .and(path("/api/v3/entries"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let result = client(&server)
        .upload_entries(&common::sample_entries())
        .await;

    assert!(result.is_err());
}
