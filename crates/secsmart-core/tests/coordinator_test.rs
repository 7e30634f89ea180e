#![allow(clippy::unwrap_used)]
// Coordinator, dispatcher and hub behavior against a wiremock server.

use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use secsmart_api::SecSmartClient;
use secsmart_core::{
    AreaId, CommandOutcome, Coordinator, CoreError, DeviceConfig, DeviceId, Dispatcher,
    FailureKind, Health, Hub, HubConfig, Preset,
};

// ── Helpers ─────────────────────────────────────────────────────────

const TOKEN: &str = "test-token";

fn area(n: u8) -> AreaId {
    AreaId::try_from(n).unwrap()
}

fn coordinator(server: &MockServer, device: &str) -> Coordinator {
    coordinator_with_timeout(server, device, Duration::from_secs(20))
}

fn coordinator_with_timeout(server: &MockServer, device: &str, timeout: Duration) -> Coordinator {
    let http = reqwest::Client::builder().timeout(timeout).build().unwrap();
    let client =
        SecSmartClient::from_reqwest(&server.uri(), TOKEN.to_string().into(), http, timeout)
            .unwrap();
    Coordinator::new(DeviceId::from(device), Arc::new(client), Duration::from_secs(60))
}

fn hub_config(server: &MockServer) -> HubConfig {
    HubConfig::new(Url::parse(&server.uri()).unwrap(), TOKEN.to_string().into())
}

async fn mount_areas(server: &MockServer, device: &str, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(format!("/devices/{device}/areas")))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

// ── Coordinator ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_refresh_normalizes_modes() {
    let server = MockServer::start().await;
    mount_areas(
        &server,
        "D1",
        json!({
            "area1": { "mode": "Manual 3 ", "label": "Living" },
            "area2": { "mode": "INACTIVE " },
        }),
    )
    .await;

    let coordinator = coordinator(&server, "D1");
    let snapshot = coordinator.refresh().await.unwrap();

    assert_eq!(snapshot.area(area(1)).unwrap().mode, "Manual 3");
    assert_eq!(snapshot.area(area(2)).unwrap().mode, "INACTIVE");
    assert_eq!(coordinator.state().health(), Health::Fresh);
}

#[tokio::test]
async fn test_concurrent_refreshes_share_one_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/devices/D1/areas"))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "area1": { "mode": "Manual 2" } }))
                .set_delay(Duration::from_millis(200)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let coordinator = coordinator(&server, "D1");
    let (a, b) = tokio::join!(coordinator.refresh(), coordinator.refresh());

    let (a, b) = (a.unwrap(), b.unwrap());
    assert!(Arc::ptr_eq(&a, &b), "both callers should get the same snapshot");
}

#[tokio::test]
async fn test_refresh_after_completion_fetches_again() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/devices/D1/areas"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(2)
        .mount(&server)
        .await;

    let coordinator = coordinator(&server, "D1");
    coordinator.refresh().await.unwrap();
    coordinator.refresh().await.unwrap();
}

#[tokio::test]
async fn test_auth_failure_keeps_previous_snapshot() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/devices/D1/areas"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "area1": { "mode": "Snooze" } })),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/devices/D1/areas"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let coordinator = coordinator(&server, "D1");
    let first = coordinator.refresh().await.unwrap();

    let failure = coordinator.refresh().await.unwrap_err();
    assert_eq!(failure.kind, FailureKind::Auth);

    let state = coordinator.state();
    assert_eq!(state.health(), Health::Stale);
    assert_eq!(state.last_error.as_ref().map(|e| e.kind), Some(FailureKind::Auth));
    assert!(Arc::ptr_eq(state.snapshot.as_ref().unwrap(), &first));
    assert_eq!(state.last_success, Some(first.captured_at));
}

#[tokio::test]
async fn test_non_json_body_is_unexpected() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/devices/D1/areas"))
        .respond_with(ResponseTemplate::new(200).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let coordinator = coordinator(&server, "D1");
    let failure = coordinator.refresh().await.unwrap_err();

    assert_eq!(failure.kind, FailureKind::Unexpected);
    assert_eq!(coordinator.state().health(), Health::Unavailable);
}

#[tokio::test]
async fn test_subscribers_see_new_state() {
    let server = MockServer::start().await;
    mount_areas(&server, "D1", json!({ "area3": { "mode": "Fans off" } })).await;

    let coordinator = coordinator(&server, "D1");
    let mut stream = coordinator.stream();
    assert!(stream.current().snapshot.is_none());

    coordinator.refresh().await.unwrap();
    let state = stream.changed().await.unwrap();
    assert_eq!(state.snapshot.as_ref().unwrap().areas.len(), 1);
}

#[tokio::test]
async fn test_abandoned_refresh_is_not_resumed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/devices/D1/areas"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "area1": { "mode": "Manual 2" } }))
                .set_delay(Duration::from_millis(100)),
        )
        .mount(&server)
        .await;

    let coordinator = coordinator_with_timeout(&server, "D1", Duration::from_millis(300));

    // Give up on the first refresh long before the server answers.
    let abandoned = tokio::time::timeout(Duration::from_millis(20), coordinator.refresh()).await;
    assert!(abandoned.is_err());
    assert_eq!(coordinator.state().health(), Health::Pending);

    // Past the client timeout: a resumed request would now fail.
    tokio::time::sleep(Duration::from_millis(600)).await;

    let snapshot = coordinator.refresh().await.unwrap();
    assert_eq!(snapshot.areas.len(), 1);
    let state = coordinator.state();
    assert_eq!(state.health(), Health::Fresh);
    assert!(state.last_error.is_none());
}

// ── Dispatcher ──────────────────────────────────────────────────────

#[tokio::test]
async fn test_set_percentage_writes_then_refreshes() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/devices/D1/areas/mode"))
        .and(header("authorization", "Bearer test-token"))
        .and(body_json(json!({ "areaid": 2, "mode": "Manual 4" })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/devices/D1/areas"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "area2": { "mode": "Manual 4" } })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let dispatcher = Dispatcher::new(coordinator(&server, "D1"));
    let outcome = dispatcher.set_percentage(area(2), 70).await.unwrap();

    assert_eq!(
        outcome,
        CommandOutcome::Applied {
            mode: "Manual 4".into()
        }
    );
    let snapshot = dispatcher.coordinator().snapshot().unwrap();
    assert_eq!(snapshot.area(area(2)).unwrap().mode, "Manual 4");
}

#[tokio::test]
async fn test_zero_percentage_turns_fans_off() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/devices/D1/areas/mode"))
        .and(body_json(json!({ "areaid": 1, "mode": "Fans off" })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    mount_areas(&server, "D1", json!({ "area1": { "mode": "Fans off" } })).await;

    let dispatcher = Dispatcher::new(coordinator(&server, "D1"));
    dispatcher.set_percentage(area(1), 0).await.unwrap();
}

#[tokio::test]
async fn test_unsupported_preset_makes_no_request() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(0)
        .mount(&server)
        .await;

    let dispatcher = Dispatcher::new(coordinator(&server, "D1"));
    for name in ["turbo", "inactive"] {
        let outcome = dispatcher.set_preset(area(1), name).await.unwrap();
        assert!(matches!(outcome, CommandOutcome::Ignored { .. }));
    }
}

#[tokio::test]
async fn test_write_failure_propagates_without_refresh() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/devices/D1/areas/mode"))
        .respond_with(ResponseTemplate::new(400).set_body_string("mode not allowed"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(0)
        .mount(&server)
        .await;

    let dispatcher = Dispatcher::new(coordinator(&server, "D1"));
    let err = dispatcher.turn_off(area(5)).await.unwrap_err();

    assert!(
        matches!(err, CoreError::BadRequest { ref body } if body == "mode not allowed"),
        "got {err:?}"
    );
}

#[tokio::test]
async fn test_refresh_failure_after_write_is_absorbed() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let dispatcher = Dispatcher::new(coordinator(&server, "D1"));
    let outcome = dispatcher
        .turn_on(area(1), None, Some("co2".into()))
        .await
        .unwrap();

    assert_eq!(
        outcome,
        CommandOutcome::Applied {
            mode: "CO2 regulation".into()
        }
    );
    let state = dispatcher.coordinator().state();
    assert_eq!(state.last_error.as_ref().map(|e| e.kind), Some(FailureKind::Transient));
}

#[tokio::test]
async fn test_toggle_boost_restores_manual_level() {
    let server = MockServer::start().await;
    mount_areas(&server, "D1", json!({ "area1": { "mode": "Boost ventilation" } })).await;
    Mock::given(method("PUT"))
        .and(body_json(json!({ "areaid": 1, "mode": "Manual 3" })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let dispatcher = Dispatcher::new(coordinator(&server, "D1"));
    let snapshot = dispatcher.coordinator().refresh().await.unwrap();
    let entity = secsmart_core::exposed_entities(&DeviceId::from("D1"), &snapshot);
    assert_eq!(entity[0].preset, Some(Preset::Boost));

    dispatcher.toggle_boost(area(1), None).await.unwrap();
}

// ── Hub ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_hub_devices_fail_independently() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/devices/BAD/areas"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    mount_areas(
        &server,
        "GOOD",
        json!({ "area1": { "mode": "Manual 1" }, "area2": { "mode": "INACTIVE" } }),
    )
    .await;

    let config = hub_config(&server)
        .with_device(DeviceConfig::new("BAD"))
        .with_device(DeviceConfig::new("GOOD"));
    let hub = Hub::new(&config).unwrap();
    hub.start().await;

    assert_eq!(hub.coordinator("BAD").unwrap().state().health(), Health::Unavailable);
    assert_eq!(hub.coordinator("GOOD").unwrap().state().health(), Health::Fresh);
    assert!(hub.entities("BAD").unwrap().is_empty());

    let good = hub.entities("GOOD").unwrap();
    assert_eq!(good.len(), 1);
    assert_eq!(good[0].unique_id, "GOOD_area1");

    hub.shutdown().await;
}

#[tokio::test]
async fn test_hub_unknown_device() {
    let server = MockServer::start().await;
    let hub = Hub::new(&hub_config(&server).with_device(DeviceConfig::new("D1"))).unwrap();

    assert!(matches!(
        hub.dispatcher("nope"),
        Err(CoreError::UnknownDevice { ref device_id }) if device_id == "nope"
    ));
    assert!(matches!(hub.entities("nope"), Err(CoreError::UnknownDevice { .. })));
}

#[tokio::test]
async fn test_hub_polls_until_shutdown() {
    let server = MockServer::start().await;
    mount_areas(&server, "D1", json!({ "area1": { "mode": "Snooze" } })).await;

    let config = hub_config(&server)
        .with_device(DeviceConfig::new("D1").with_poll_interval(Duration::from_millis(50)));
    let hub = Hub::new(&config).unwrap();
    hub.start().await;

    tokio::time::sleep(Duration::from_millis(180)).await;
    hub.shutdown().await;

    let polled = server.received_requests().await.unwrap().len();
    assert!(polled >= 3, "expected initial refresh plus polls, got {polled}");

    tokio::time::sleep(Duration::from_millis(120)).await;
    let after = server.received_requests().await.unwrap().len();
    assert_eq!(after, polled, "no polling after shutdown");

    // Cache survives shutdown.
    assert!(hub.coordinator("D1").unwrap().snapshot().is_some());
}

#[tokio::test]
async fn test_hub_stays_stopped_after_shutdown() {
    let server = MockServer::start().await;
    mount_areas(&server, "D1", json!({ "area1": { "mode": "Snooze" } })).await;

    let config = hub_config(&server)
        .with_device(DeviceConfig::new("D1").with_poll_interval(Duration::from_millis(50)));
    let hub = Hub::new(&config).unwrap();
    hub.start().await;
    hub.shutdown().await;
    let before = server.received_requests().await.unwrap().len();

    hub.start().await;
    tokio::time::sleep(Duration::from_millis(150)).await;

    let after = server.received_requests().await.unwrap().len();
    assert_eq!(after, before, "a stopped hub neither refreshes nor polls");
}
