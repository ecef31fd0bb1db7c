//! Movement permission and routing behaviour on live trips

use apron_dispatch::testing::GroundCall;
use apron_dispatch::{GatewayError, PermitDecision};
use tokio::time::Instant;

use crate::test_utils::{boarding, TestFleet};

#[tokio::test(start_paused = true)]
async fn test_conflicts_back_off_then_proceed() {
    let fleet = TestFleet::with_max_vehicles(6);
    fleet.ground.push_permits(
        "garage-1",
        "P-A1",
        [
            Ok(PermitDecision::Conflict),
            Ok(PermitDecision::Conflict),
            Ok(PermitDecision::Conflict),
            Ok(PermitDecision::Granted { distance: 50.0 }),
        ],
    );

    let start = Instant::now();
    fleet.dispatcher.submit(boarding("SU100", 50)).unwrap();
    fleet.dispatcher.drain().await;
    let elapsed = start.elapsed().as_millis();

    assert_eq!(fleet.ground.permit_count("garage-1", "P-A1"), 4);
    assert_eq!(fleet.dispatcher.supervisor().stats().completed, 1);
    assert_eq!(fleet.orchestrator.finishes("SU100"), vec![50]);
    // 3 s of backoff, 2 s out, 1 s dwell, 2 s back
    assert!((8000..8100).contains(&elapsed), "elapsed {elapsed} ms");
}

#[tokio::test(start_paused = true)]
async fn test_denied_midway_parks_vehicle_where_it_stopped() {
    let fleet = TestFleet::with_max_vehicles(6);
    fleet.ground.set_route(
        "garage-1",
        "P-A1",
        Ok(vec!["garage-1".into(), "T-1".into(), "T-2".into(), "P-A1".into()]),
    );
    fleet
        .ground
        .push_permits("T-1", "T-2", [Ok(PermitDecision::Denied)]);

    fleet.dispatcher.submit(boarding("SU100", 40)).unwrap();
    fleet.dispatcher.drain().await;

    assert_eq!(fleet.dispatcher.supervisor().stats().aborted_outbound, 1);
    assert!(fleet.orchestrator.signals().is_empty());
    assert_eq!(fleet.ground.arrivals("bus-1"), vec!["T-1".to_string()]);

    let vehicle = &fleet.dispatcher.snapshot().vehicles[0];
    assert_eq!(vehicle.current_node.as_deref(), Some("T-1"));

    // The stranded vehicle is idle and serves the next request from there
    fleet
        .ground
        .set_route("T-1", "P-A1", Ok(vec!["T-1".into(), "P-A1".into()]));
    let receipt = fleet.dispatcher.submit(boarding("SU100", 40)).unwrap();
    assert!(!receipt.waiting);
    fleet.dispatcher.drain().await;
    assert_eq!(fleet.ground.register_count(), 1);
    assert_eq!(fleet.orchestrator.finishes("SU100"), vec![40]);
    assert!(fleet.ground.calls().contains(&GroundCall::Route {
        from: "T-1".into(),
        to: "P-A1".into()
    }));
}

#[tokio::test(start_paused = true)]
async fn test_unmapped_stand_aborts_without_signals() {
    let fleet = TestFleet::with_max_vehicles(6);
    let request =
        apron_dispatch::TripRequest::new("SU100", "Z9", 20, apron_dispatch::Direction::Boarding)
            .unwrap();

    fleet.dispatcher.submit(request).unwrap();
    fleet.dispatcher.drain().await;

    assert_eq!(fleet.dispatcher.supervisor().stats().aborted_outbound, 1);
    assert!(fleet.orchestrator.signals().is_empty());
    assert!(fleet.dispatcher.registry().has_idle());
}

#[tokio::test(start_paused = true)]
async fn test_failed_return_still_frees_vehicle_at_home() {
    let fleet = TestFleet::with_max_vehicles(6);
    fleet
        .ground
        .set_route("P-A1", "garage-1", Err(GatewayError::Transport("connection reset".into())));

    fleet.dispatcher.submit(boarding("SU100", 25)).unwrap();
    fleet.dispatcher.drain().await;

    let stats = fleet.dispatcher.supervisor().stats();
    assert_eq!(stats.return_incomplete, 1);
    // Passengers were moved, so the session closed normally
    assert_eq!(fleet.orchestrator.finishes("SU100"), vec![25]);

    let vehicle = &fleet.dispatcher.snapshot().vehicles[0];
    assert!(!vehicle.in_transit);
    assert_eq!(vehicle.current_node.as_deref(), Some("garage-1"));
}

#[tokio::test(start_paused = true)]
async fn test_unreachable_orchestrator_does_not_stall_fleet() {
    let fleet = TestFleet::with_max_vehicles(6);
    fleet
        .orchestrator
        .fail_with(GatewayError::Status { status: 503, body: "unavailable".into() });

    fleet.dispatcher.submit(boarding("SU100", 200)).unwrap();
    fleet.dispatcher.drain().await;

    assert_eq!(fleet.dispatcher.supervisor().stats().completed, 2);
    assert_eq!(fleet.dispatcher.sessions().active_sessions(), 0);
    assert!(fleet.dispatcher.snapshot().vehicles.iter().all(|v| !v.in_transit));
}
