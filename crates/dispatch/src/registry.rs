//! Vehicle registry
//!
//! Bounded pool of vehicles with per-vehicle position tracking. Every
//! mutation happens under one mutex whose critical sections are pure
//! in-memory work; registration with ground control happens between two
//! such sections so its latency never blocks other acquisitions.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{info, warn};

use crate::gateway::GroundControl;

/// Where a vehicle is right now
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Position {
    /// Parked and available at a node
    Idle(String),
    /// Leased to a trip
    InTransit,
}

impl Position {
    /// Check if the vehicle can be acquired
    pub fn is_idle(&self) -> bool {
        matches!(self, Position::Idle(_))
    }
}

/// A vehicle owned by the registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vehicle {
    /// Identifier assigned by ground control
    pub id: String,
    /// Vehicle type used in ground-control calls
    pub vehicle_type: String,
    /// Garage node
    pub home_node: String,
    /// Current position
    pub position: Position,
    /// Aircraft coordinate key to aircraft-adjacent node
    pub service_spots: BTreeMap<String, String>,
}

/// Exclusive use of one vehicle, handed to a trip by [`VehicleRegistry::acquire`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VehicleLease {
    /// Leased vehicle
    pub vehicle_id: String,
    /// Vehicle type used in ground-control calls
    pub vehicle_type: String,
    /// Node the vehicle was parked at when leased
    pub node: String,
    /// Garage node
    pub home_node: String,
    /// Aircraft coordinate key to aircraft-adjacent node
    pub service_spots: BTreeMap<String, String>,
}

impl VehicleLease {
    fn from_vehicle(vehicle: &Vehicle, node: String) -> Self {
        Self {
            vehicle_id: vehicle.id.clone(),
            vehicle_type: vehicle.vehicle_type.clone(),
            node,
            home_node: vehicle.home_node.clone(),
            service_spots: vehicle.service_spots.clone(),
        }
    }

    /// Node adjacent to the aircraft at `coordinate_key`, if this vehicle knows it
    pub fn service_node(&self, coordinate_key: &str) -> Option<&str> {
        self.service_spots.get(coordinate_key).map(String::as_str)
    }
}

/// Read-only view of one vehicle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleSnapshot {
    /// Vehicle identifier
    pub vehicle_id: String,
    /// Vehicle type
    pub vehicle_type: String,
    /// Garage node
    pub home_node: String,
    /// Current node, `None` while in transit
    pub current_node: Option<String>,
    /// Whether the vehicle is leased to a trip
    pub in_transit: bool,
    /// Aircraft coordinate key to aircraft-adjacent node
    pub service_spots: BTreeMap<String, String>,
}

#[derive(Debug, Default)]
struct Pool {
    /// Insertion-ordered; the pool is small enough for linear scans
    vehicles: Vec<Vehicle>,
    /// Registrations in flight, each holding one slot
    pending: usize,
}

impl Pool {
    fn occupied_slots(&self) -> usize {
        self.vehicles.len() + self.pending
    }

    fn take_idle(&mut self) -> Option<VehicleLease> {
        for vehicle in self.vehicles.iter_mut() {
            if let Position::Idle(node) = &vehicle.position {
                let node = node.clone();
                vehicle.position = Position::InTransit;
                return Some(VehicleLease::from_vehicle(vehicle, node));
            }
        }
        None
    }
}

/// Bounded vehicle pool
pub struct VehicleRegistry {
    ground_control: Arc<dyn GroundControl>,
    vehicle_type: String,
    max_vehicles: usize,
    pool: Mutex<Pool>,
}

impl VehicleRegistry {
    /// Create an empty registry that registers new vehicles through `ground_control`
    pub fn new(
        ground_control: Arc<dyn GroundControl>,
        vehicle_type: impl Into<String>,
        max_vehicles: usize,
    ) -> Self {
        Self {
            ground_control,
            vehicle_type: vehicle_type.into(),
            max_vehicles,
            pool: Mutex::new(Pool::default()),
        }
    }

    fn pool(&self) -> MutexGuard<'_, Pool> {
        // Critical sections never leave the pool half-updated, so a poisoned
        // lock still guards consistent data.
        self.pool.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Lease an idle vehicle, registering a new one if the pool has room.
    ///
    /// Returns `None` when the pool is full and busy, or when registration
    /// fails. A leased vehicle stays in transit until [`release`](Self::release).
    pub async fn acquire(&self) -> Option<VehicleLease> {
        {
            let mut pool = self.pool();
            if let Some(lease) = pool.take_idle() {
                return Some(lease);
            }
            if pool.occupied_slots() >= self.max_vehicles {
                warn!(
                    max_vehicles = self.max_vehicles,
                    pending = pool.pending,
                    "Vehicle pool exhausted, no idle vehicle"
                );
                return None;
            }
            pool.pending += 1;
        }

        let registration = self.ground_control.register(&self.vehicle_type).await;

        let mut pool = self.pool();
        pool.pending -= 1;
        let registration = match registration {
            Ok(registration) => registration,
            Err(e) => {
                warn!(error = %e, "Vehicle registration failed");
                return None;
            }
        };

        if pool.vehicles.iter().any(|v| v.id == registration.vehicle_id) {
            warn!(
                vehicle_id = %registration.vehicle_id,
                "Ground control returned an already registered vehicle id"
            );
            return None;
        }

        let vehicle = Vehicle {
            id: registration.vehicle_id,
            vehicle_type: self.vehicle_type.clone(),
            home_node: registration.home_node.clone(),
            position: Position::InTransit,
            service_spots: registration.service_spots,
        };
        let lease = VehicleLease::from_vehicle(&vehicle, registration.home_node);
        pool.vehicles.push(vehicle);

        info!(
            vehicle_id = %lease.vehicle_id,
            home_node = %lease.home_node,
            fleet_size = pool.vehicles.len(),
            "Registered new vehicle"
        );
        Some(lease)
    }

    /// Park `vehicle_id` idle at `node`.
    ///
    /// Returns `false` if the id is unknown.
    pub fn release(&self, vehicle_id: &str, node: &str) -> bool {
        let mut pool = self.pool();
        match pool.vehicles.iter_mut().find(|v| v.id == vehicle_id) {
            Some(vehicle) => {
                vehicle.position = Position::Idle(node.to_string());
                true
            }
            None => {
                warn!(vehicle_id, node, "Release of unknown vehicle ignored");
                false
            }
        }
    }

    /// Non-committing check: is any vehicle idle right now?
    pub fn has_idle(&self) -> bool {
        self.pool().vehicles.iter().any(|v| v.position.is_idle())
    }

    /// Number of registered vehicles
    pub fn len(&self) -> usize {
        self.pool().vehicles.len()
    }

    /// Check if no vehicle has been registered yet
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of every vehicle's state, in registration order
    pub fn snapshot(&self) -> Vec<VehicleSnapshot> {
        self.pool()
            .vehicles
            .iter()
            .map(|v| VehicleSnapshot {
                vehicle_id: v.id.clone(),
                vehicle_type: v.vehicle_type.clone(),
                home_node: v.home_node.clone(),
                current_node: match &v.position {
                    Position::Idle(node) => Some(node.clone()),
                    Position::InTransit => None,
                },
                in_transit: !v.position.is_idle(),
                service_spots: v.service_spots.clone(),
            })
            .collect()
    }
}
