//! Trip dispatcher
//!
//! Turns one transport request into `ceil(passengers / capacity)` detached
//! trips and answers immediately with a `waiting` hint. The hint comes from
//! a non-committing look at the registry and never gates dispatch.
//!
//! Passengers are split across the trips: every vehicle but the last
//! carries a full load, the last one the remainder.

use apron_core::DispatchConfig;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::info;

use crate::error::DispatchError;
use crate::gateway::{BoardingOrchestrator, GroundControl};
use crate::registry::{VehicleRegistry, VehicleSnapshot};
use crate::request::TripRequest;
use crate::session::SessionAggregator;
use crate::supervisor::{TripStats, TripSupervisor};
use crate::trip::{Trip, TripContext};

/// Immediate answer to a submitted request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchReceipt {
    /// No vehicle was idle when the request arrived
    pub waiting: bool,
    /// Trips spawned for the request
    pub needed_trips: u32,
}

/// Read-only view of the fleet for operators
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FleetSnapshot {
    /// Registered vehicles
    pub count: usize,
    /// Current seat capacity
    pub capacity: u32,
    /// Trips still running
    pub active_trips: usize,
    /// Open boarding sessions
    pub active_sessions: usize,
    /// Finished trips by outcome
    pub trip_stats: TripStats,
    /// Per-vehicle state, in registration order
    pub vehicles: Vec<VehicleSnapshot>,
}

/// Number of vehicles needed to carry `passengers` at `capacity` seats each.
///
/// `None` when the capacity is zero.
pub fn needed_trips(passengers: u32, capacity: u32) -> Option<u32> {
    if capacity == 0 {
        return None;
    }
    Some(passengers.div_ceil(capacity))
}

/// Per-vehicle loads for `passengers` at `capacity` seats each.
///
/// Empty when the capacity is zero.
pub fn trip_loads(passengers: u32, capacity: u32) -> Vec<u32> {
    let Some(trips) = needed_trips(passengers, capacity) else {
        return Vec::new();
    };
    let mut remaining = passengers;
    (0..trips)
        .map(|_| {
            let load = remaining.min(capacity);
            remaining -= load;
            load
        })
        .collect()
}

/// Entry point of the dispatch engine
pub struct Dispatcher {
    ctx: TripContext,
    capacity: RwLock<u32>,
    supervisor: TripSupervisor,
}

impl Dispatcher {
    /// Build the registry, aggregator and supervisor for one process
    pub fn new(
        config: DispatchConfig,
        ground: Arc<dyn GroundControl>,
        orchestrator: Arc<dyn BoardingOrchestrator>,
    ) -> Self {
        let registry = Arc::new(VehicleRegistry::new(
            ground.clone(),
            config.vehicle_type.clone(),
            config.max_vehicles,
        ));
        let capacity = RwLock::new(config.default_capacity);
        Self {
            ctx: TripContext {
                registry,
                sessions: Arc::new(SessionAggregator::new()),
                ground,
                orchestrator,
                config: Arc::new(config),
            },
            capacity,
            supervisor: TripSupervisor::new(),
        }
    }

    /// Validate `request`, spawn its trips and return without waiting.
    ///
    /// Must be called within a tokio runtime.
    pub fn submit(&self, request: TripRequest) -> Result<DispatchReceipt, DispatchError> {
        request.validate()?;
        let capacity = self.capacity();
        let loads = trip_loads(request.passenger_count, capacity);
        if loads.is_empty() {
            return Err(DispatchError::validation(
                "vehicle capacity is 0, no trip can be planned",
            ));
        }
        let needed = loads.len() as u32;

        let waiting = !self.ctx.registry.has_idle();
        let request = Arc::new(request);
        for load in loads {
            self.supervisor
                .spawn(Trip::new(request.clone(), load, self.ctx.clone()));
        }

        info!(
            aircraft_id = %request.aircraft_id,
            direction = %request.direction,
            passengers = request.passenger_count,
            capacity,
            needed_trips = needed,
            waiting,
            "Trips dispatched"
        );
        Ok(DispatchReceipt {
            waiting,
            needed_trips: needed,
        })
    }

    /// Current seat capacity
    pub fn capacity(&self) -> u32 {
        *self.capacity.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace the seat capacity. Affects only requests submitted afterwards.
    pub fn set_capacity(&self, value: i64) -> Result<u32, DispatchError> {
        let value = u32::try_from(value).map_err(|_| {
            DispatchError::validation(format!("capacity must be a non-negative integer, got {value}"))
        })?;
        *self.capacity.write().unwrap_or_else(PoisonError::into_inner) = value;
        info!(capacity = value, "Vehicle capacity updated");
        Ok(value)
    }

    /// Fleet state for inspection
    pub fn snapshot(&self) -> FleetSnapshot {
        let vehicles = self.ctx.registry.snapshot();
        FleetSnapshot {
            count: vehicles.len(),
            capacity: self.capacity(),
            active_trips: self.supervisor.active(),
            active_sessions: self.ctx.sessions.active_sessions(),
            trip_stats: self.supervisor.stats(),
            vehicles,
        }
    }

    /// Wait for every running trip to finish
    pub async fn drain(&self) {
        self.supervisor.drain().await;
    }

    /// Vehicle pool
    pub fn registry(&self) -> &Arc<VehicleRegistry> {
        &self.ctx.registry
    }

    /// Boarding session bookkeeping
    pub fn sessions(&self) -> &Arc<SessionAggregator> {
        &self.ctx.sessions
    }

    /// Trip task owner
    pub fn supervisor(&self) -> &TripSupervisor {
        &self.supervisor
    }
}
