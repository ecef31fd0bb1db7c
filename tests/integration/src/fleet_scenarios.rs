//! Vehicle allocation across concurrently dispatched trips

use apron_core::DispatchConfig;
use std::time::Duration;

use crate::test_utils::{boarding, TestFleet};

#[tokio::test(start_paused = true)]
async fn test_one_idle_vehicle_reused_and_one_registered() {
    let fleet = TestFleet::with_max_vehicles(6);
    let parked = fleet.park_idle_vehicle().await;
    assert_eq!(fleet.ground.register_count(), 1);

    let receipt = fleet.dispatcher.submit(boarding("SU100", 200)).unwrap();
    assert_eq!(receipt.needed_trips, 2);
    assert!(!receipt.waiting, "an idle vehicle was available");

    fleet.dispatcher.drain().await;

    // The parked vehicle served one trip, a second one was registered
    assert_eq!(fleet.ground.register_count(), 2);
    assert_eq!(fleet.dispatcher.registry().len(), 2);
    assert!(!fleet.ground.arrivals(&parked).is_empty());
    assert_eq!(fleet.orchestrator.starts("SU100"), 1);
    assert_eq!(fleet.orchestrator.finishes("SU100"), vec![200]);
    assert_eq!(fleet.dispatcher.supervisor().stats().completed, 2);
}

#[tokio::test(start_paused = true)]
async fn test_full_pool_aborts_every_trip() {
    let fleet = TestFleet::with_max_vehicles(2);
    let registry = fleet.dispatcher.registry().clone();
    let first = registry.acquire().await.unwrap();
    let second = registry.acquire().await.unwrap();

    let receipt = fleet.dispatcher.submit(boarding("SU100", 200)).unwrap();
    assert!(receipt.waiting);
    assert_eq!(receipt.needed_trips, 2);

    fleet.dispatcher.drain().await;

    let stats = fleet.dispatcher.supervisor().stats();
    assert_eq!(stats.aborted_no_vehicle, 2);
    assert_eq!(stats.completed, 0);
    assert!(fleet.orchestrator.signals().is_empty());
    assert_eq!(fleet.dispatcher.sessions().active_sessions(), 0);
    assert_eq!(fleet.ground.register_count(), 2);

    // Held vehicles were never touched
    let snapshot = fleet.dispatcher.snapshot();
    assert!(snapshot.vehicles.iter().all(|v| v.in_transit));

    registry.release(&first.vehicle_id, &first.home_node);
    registry.release(&second.vehicle_id, &second.home_node);
    assert!(registry.has_idle());
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_requests_never_exceed_pool() {
    let fleet = TestFleet::with_max_vehicles(6);
    fleet.ground.set_register_delay(Duration::from_millis(200));

    for n in 0..10 {
        fleet
            .dispatcher
            .submit(boarding(&format!("AC{n}"), 20))
            .unwrap();
    }
    fleet.dispatcher.drain().await;

    assert_eq!(fleet.dispatcher.registry().len(), 6);
    assert_eq!(fleet.ground.register_count(), 6);
    let stats = fleet.dispatcher.supervisor().stats();
    assert_eq!(stats.completed, 6);
    assert_eq!(stats.aborted_no_vehicle, 4);

    let snapshot = fleet.dispatcher.snapshot();
    let mut ids: Vec<_> = snapshot.vehicles.iter().map(|v| v.vehicle_id.clone()).collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 6);
    assert!(snapshot.vehicles.iter().all(|v| !v.in_transit));
}

#[tokio::test(start_paused = true)]
async fn test_vehicles_return_home_and_are_reused() {
    let fleet = TestFleet::with_max_vehicles(6);

    fleet.dispatcher.submit(boarding("SU100", 300)).unwrap();
    fleet.dispatcher.drain().await;
    assert_eq!(fleet.ground.register_count(), 2);

    let receipt = fleet.dispatcher.submit(boarding("SU200", 300)).unwrap();
    assert!(!receipt.waiting);
    fleet.dispatcher.drain().await;

    // Second request ran entirely on the parked fleet
    assert_eq!(fleet.ground.register_count(), 2);
    for vehicle in fleet.dispatcher.snapshot().vehicles {
        assert_eq!(vehicle.current_node.as_deref(), Some(vehicle.home_node.as_str()));
    }
}

#[tokio::test(start_paused = true)]
async fn test_capacity_change_reshapes_later_requests() {
    let fleet = TestFleet::new(DispatchConfig::default());

    assert_eq!(fleet.dispatcher.submit(boarding("SU100", 150)).unwrap().needed_trips, 1);
    fleet.dispatcher.set_capacity(50).unwrap();
    assert_eq!(fleet.dispatcher.submit(boarding("SU200", 150)).unwrap().needed_trips, 3);
    fleet.dispatcher.drain().await;

    assert_eq!(fleet.orchestrator.finishes("SU100"), vec![150]);
    assert_eq!(fleet.orchestrator.finishes("SU200"), vec![150]);
    assert_eq!(fleet.dispatcher.registry().len(), 4);
}
