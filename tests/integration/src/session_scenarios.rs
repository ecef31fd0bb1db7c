//! Boarding session aggregation over several vehicles

use apron_dispatch::testing::Signal;
use apron_dispatch::{Direction, Trip, TripRequest};
use std::sync::Arc;

use crate::test_utils::{deboarding, TestFleet};

fn request(aircraft_id: &str, passengers: i64) -> Arc<TripRequest> {
    Arc::new(TripRequest::new(aircraft_id, "A1", passengers, Direction::Boarding).unwrap())
}

#[tokio::test(start_paused = true)]
async fn test_three_vehicles_report_one_total() {
    let fleet = TestFleet::with_max_vehicles(6);
    let request = request("SU100", 150);

    // Different loads dwell for different times, so vehicles leave 40, 50, 60
    let trips: Vec<_> = [50, 60, 40]
        .into_iter()
        .map(|load| tokio::spawn(Trip::new(request.clone(), load, fleet.context()).run()))
        .collect();
    for trip in trips {
        assert!(trip.await.unwrap().is_completed());
    }

    assert_eq!(fleet.orchestrator.starts("SU100"), 1);
    assert_eq!(fleet.orchestrator.finishes("SU100"), vec![150]);
    assert!(!fleet.dispatcher.sessions().is_active("SU100"));

    let signals = fleet.orchestrator.signals();
    assert!(matches!(signals.first(), Some(Signal::Start { .. })));
    assert!(matches!(signals.last(), Some(Signal::Finish { .. })));
}

#[tokio::test(start_paused = true)]
async fn test_staggered_arrivals_still_aggregate() {
    let fleet = TestFleet::with_max_vehicles(6);
    // bus-2 drives a longer route but still arrives while bus-1 dwells
    fleet.ground.set_route(
        "garage-2",
        "P-A1",
        Ok(vec!["garage-2".into(), "X-1".into(), "P-A1".into()]),
    );
    let request = request("SU100", 500);

    let first = tokio::spawn(Trip::new(request.clone(), 300, fleet.context()).run());
    tokio::task::yield_now().await;
    let second = tokio::spawn(Trip::new(request.clone(), 200, fleet.context()).run());

    assert!(first.await.unwrap().is_completed());
    assert!(second.await.unwrap().is_completed());
    assert_eq!(fleet.orchestrator.starts("SU100"), 1);
    assert_eq!(fleet.orchestrator.finishes("SU100"), vec![500]);
}

#[tokio::test(start_paused = true)]
async fn test_separate_aircraft_get_separate_sessions() {
    let fleet = TestFleet::with_max_vehicles(6);

    fleet.dispatcher.submit(deboarding("SU100", 120)).unwrap();
    fleet.dispatcher.submit(deboarding("SU200", 90)).unwrap();
    fleet.dispatcher.drain().await;

    assert_eq!(fleet.orchestrator.starts("SU100"), 1);
    assert_eq!(fleet.orchestrator.starts("SU200"), 1);
    assert_eq!(fleet.orchestrator.finishes("SU100"), vec![120]);
    assert_eq!(fleet.orchestrator.finishes("SU200"), vec![90]);
    assert!(fleet.orchestrator.signals().iter().all(|s| match s {
        Signal::Start { direction, .. } | Signal::Finish { direction, .. } => {
            *direction == Direction::Deboarding
        }
    }));
    assert_eq!(fleet.dispatcher.sessions().active_sessions(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_sequential_events_open_new_sessions() {
    let fleet = TestFleet::with_max_vehicles(6);

    fleet.dispatcher.submit(deboarding("SU100", 80)).unwrap();
    fleet.dispatcher.drain().await;
    fleet
        .dispatcher
        .submit(crate::test_utils::boarding("SU100", 95))
        .unwrap();
    fleet.dispatcher.drain().await;

    assert_eq!(fleet.orchestrator.starts("SU100"), 2);
    assert_eq!(fleet.orchestrator.finishes("SU100"), vec![80, 95]);
}
