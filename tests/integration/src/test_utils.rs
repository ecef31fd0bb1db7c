//! Shared fixtures for the integration scenarios

use apron_core::DispatchConfig;
use apron_dispatch::testing::{FakeGroundControl, RecordingOrchestrator};
use apron_dispatch::{Direction, Dispatcher, TripContext, TripRequest};
use std::sync::Arc;

/// Install a test subscriber once; later calls are no-ops
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// A dispatcher wired to scripted gateways
pub struct TestFleet {
    pub dispatcher: Dispatcher,
    pub ground: Arc<FakeGroundControl>,
    pub orchestrator: Arc<RecordingOrchestrator>,
}

impl TestFleet {
    pub fn new(config: DispatchConfig) -> Self {
        init_tracing();
        let ground = Arc::new(FakeGroundControl::new());
        let orchestrator = Arc::new(RecordingOrchestrator::new());
        let dispatcher = Dispatcher::new(config, ground.clone(), orchestrator.clone());
        Self {
            dispatcher,
            ground,
            orchestrator,
        }
    }

    pub fn with_max_vehicles(max_vehicles: usize) -> Self {
        Self::new(DispatchConfig {
            max_vehicles,
            ..DispatchConfig::default()
        })
    }

    /// Register one vehicle and park it idle at its garage
    pub async fn park_idle_vehicle(&self) -> String {
        let registry = self.dispatcher.registry();
        let lease = registry
            .acquire()
            .await
            .expect("pool has room for a parked vehicle");
        registry.release(&lease.vehicle_id, &lease.home_node);
        lease.vehicle_id
    }

    /// Context for driving trips by hand, sharing this fleet's state
    pub fn context(&self) -> TripContext {
        TripContext {
            registry: self.dispatcher.registry().clone(),
            sessions: self.dispatcher.sessions().clone(),
            ground: self.ground.clone(),
            orchestrator: self.orchestrator.clone(),
            config: Arc::new(DispatchConfig::default()),
        }
    }
}

pub fn boarding(aircraft_id: &str, passengers: i64) -> TripRequest {
    TripRequest::new(aircraft_id, "A1", passengers, Direction::Boarding)
        .expect("valid boarding request")
}

pub fn deboarding(aircraft_id: &str, passengers: i64) -> TripRequest {
    TripRequest::new(aircraft_id, "A1", passengers, Direction::Deboarding)
        .expect("valid deboarding request")
}
