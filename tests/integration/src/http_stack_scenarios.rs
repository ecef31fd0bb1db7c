//! The engine driving real HTTP gateways against mock collaborators

use apron_core::DispatchConfig;
use apron_dispatch::{Direction, Dispatcher, TripRequest};
use apron_gateway::{GatewayConfig, HttpGroundControl, HttpOrchestrator};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::test_utils::init_tracing;

async fn mount_ground_control(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/register-vehicle/bus"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "garrageNodeId": "garage-1",
            "VehicleId": "bus-1",
            "serviceSpots": {"A1": "P-A1"}
        })))
        .expect(1)
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/route"))
        .and(body_json(json!({"from": "garage-1", "to": "P-A1", "type": "bus"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(["garage-1", "T-1", "P-A1"])))
        .expect(1)
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/route"))
        .and(body_json(json!({"from": "P-A1", "to": "garage-1", "type": "bus"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(["P-A1", "garage-1"])))
        .expect(1)
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/move"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"distance": 0.0})))
        .expect(3)
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/arrived"))
        .respond_with(ResponseTemplate::new(200))
        .expect(3)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_boarding_over_http() {
    init_tracing();
    let ground_control = MockServer::start().await;
    let orchestrator = MockServer::start().await;
    mount_ground_control(&ground_control).await;
    Mock::given(method("POST"))
        .and(path("/boarding/boarding/start"))
        .and(body_json(json!({"aircraft_id": "SU100"})))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&orchestrator)
        .await;
    Mock::given(method("POST"))
        .and(path("/boarding/boarding/finish"))
        .and(body_json(json!({"aircraft_id": "SU100", "passengers_count": 10})))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&orchestrator)
        .await;

    let gateway = GatewayConfig {
        ground_control_url: ground_control.uri(),
        orchestrator_url: orchestrator.uri(),
        timeout: Duration::from_secs(5),
    };
    let dispatcher = Dispatcher::new(
        DispatchConfig::default(),
        Arc::new(HttpGroundControl::new(&gateway, "bus").unwrap()),
        Arc::new(HttpOrchestrator::new(&gateway).unwrap()),
    );

    let request = TripRequest::new("SU100", "A1", 10, Direction::Boarding).unwrap();
    let receipt = dispatcher.submit(request).unwrap();
    assert!(receipt.waiting);
    assert_eq!(receipt.needed_trips, 1);

    tokio::time::timeout(Duration::from_secs(10), dispatcher.drain())
        .await
        .expect("trip finished");

    assert_eq!(dispatcher.supervisor().stats().completed, 1);
    let snapshot = dispatcher.snapshot();
    assert_eq!(snapshot.count, 1);
    assert_eq!(snapshot.vehicles[0].current_node.as_deref(), Some("garage-1"));
}

#[tokio::test]
async fn test_registration_refused_over_http() {
    init_tracing();
    let ground_control = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/register-vehicle/bus"))
        .respond_with(ResponseTemplate::new(403).set_body_string("no free garage node"))
        .expect(2)
        .mount(&ground_control)
        .await;
    let orchestrator = MockServer::start().await;

    let gateway = GatewayConfig {
        ground_control_url: ground_control.uri(),
        orchestrator_url: orchestrator.uri(),
        timeout: Duration::from_secs(5),
    };
    let dispatcher = Dispatcher::new(
        DispatchConfig::default(),
        Arc::new(HttpGroundControl::new(&gateway, "bus").unwrap()),
        Arc::new(HttpOrchestrator::new(&gateway).unwrap()),
    );

    let request = TripRequest::new("SU100", "A1", 200, Direction::Deboarding).unwrap();
    dispatcher.submit(request).unwrap();
    tokio::time::timeout(Duration::from_secs(10), dispatcher.drain())
        .await
        .expect("trips finished");

    assert_eq!(dispatcher.supervisor().stats().aborted_no_vehicle, 2);
    assert!(dispatcher.registry().is_empty());
    assert!(orchestrator.received_requests().await.unwrap_or_default().is_empty());
}
