#![allow(clippy::unwrap_used)]
// Integration tests for `SecSmartClient` using wiremock.

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use secsmart_api::{AreasPayload, Error, SecSmartClient};

// ── Helpers ─────────────────────────────────────────────────────────

const TOKEN: &str = "test-token";

async fn setup() -> (MockServer, SecSmartClient) {
    let server = MockServer::start().await;
    let client = SecSmartClient::from_reqwest(
        &server.uri(),
        TOKEN.to_string().into(),
        reqwest::Client::new(),
        Duration::from_secs(20),
    )
    .unwrap();
    (server, client)
}

// ── Reads ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_get_areas_json() {
    let (server, client) = setup().await;

    let body = json!({
        "area1": { "mode": "Manual 3 ", "label": "Living room" },
        "area2": { "mode": "INACTIVE " },
    });

    Mock::given(method("GET"))
        .and(path("/devices/DEV1/areas"))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .expect(1)
        .mount(&server)
        .await;

    let payload = client.get_areas("DEV1").await.unwrap();

    assert_eq!(payload, AreasPayload::Json(body));
}

#[tokio::test]
async fn test_get_areas_non_json_returns_raw_text() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/devices/DEV1/areas"))
        .respond_with(ResponseTemplate::new(200).set_body_string("maintenance window"))
        .mount(&server)
        .await;

    let payload = client.get_areas("DEV1").await.unwrap();

    assert_eq!(payload, AreasPayload::Text("maintenance window".into()));
    assert!(payload.as_object().is_none());
}

#[tokio::test]
async fn test_get_areas_malformed_json() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/devices/DEV1/areas"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("{\"area1\":", "application/json"))
        .mount(&server)
        .await;

    let result = client.get_areas("DEV1").await;

    assert!(
        matches!(result, Err(Error::Deserialization { .. })),
        "expected Deserialization error, got: {result:?}"
    );
}

#[tokio::test]
async fn test_device_id_is_path_escaped() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/devices/a%2Fb/areas"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    client.get_areas("a/b").await.unwrap();
}

// ── Writes ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_set_area_mode_sends_body() {
    let (server, client) = setup().await;

    Mock::given(method("PUT"))
        .and(path("/devices/DEV1/areas/mode"))
        .and(header("authorization", "Bearer test-token"))
        .and(body_json(json!({ "areaid": 2, "mode": "Manual 4" })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    client.set_area_mode("DEV1", 2, "Manual 4").await.unwrap();
}

// ── Status mapping ──────────────────────────────────────────────────

#[tokio::test]
async fn test_unauthorized_maps_to_authentication() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/devices/DEV1/areas"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let result = client.get_areas("DEV1").await;

    assert!(
        matches!(result, Err(Error::Authentication { .. })),
        "expected Authentication error, got: {result:?}"
    );
    assert!(result.unwrap_err().is_auth_failure());
}

#[tokio::test]
async fn test_bad_request_carries_body() {
    let (server, client) = setup().await;

    Mock::given(method("PUT"))
        .and(path("/devices/DEV1/areas/mode"))
        .respond_with(ResponseTemplate::new(400).set_body_string("unknown mode 'Manual 9'"))
        .mount(&server)
        .await;

    let err = client
        .set_area_mode("DEV1", 1, "Manual 9")
        .await
        .unwrap_err();

    match err {
        Error::BadRequest { body } => assert_eq!(body, "unknown mode 'Manual 9'"),
        other => panic!("expected BadRequest, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_server_error_is_transient() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/devices/DEV1/areas"))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream down"))
        .mount(&server)
        .await;

    let err = client.get_areas("DEV1").await.unwrap_err();

    assert!(matches!(err, Error::Http { status: 503, .. }), "got: {err:?}");
    assert!(err.is_transient());
    assert_eq!(err.status(), Some(503));
}

#[tokio::test]
async fn test_timeout_maps_to_timeout() {
    let server = MockServer::start().await;
    let http = reqwest::Client::builder()
        .timeout(Duration::from_millis(100))
        .build()
        .unwrap();
    let client = SecSmartClient::from_reqwest(
        &server.uri(),
        TOKEN.to_string().into(),
        http,
        Duration::from_millis(100),
    )
    .unwrap();

    Mock::given(method("GET"))
        .and(path("/devices/DEV1/areas"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({}))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let err = client.get_areas("DEV1").await.unwrap_err();

    assert!(
        matches!(err, Error::Timeout { timeout } if timeout == Duration::from_millis(100)),
        "got: {err:?}"
    );
    assert_eq!(err.to_string(), "Request timed out after 100ms");
    assert!(err.is_transient());
}
