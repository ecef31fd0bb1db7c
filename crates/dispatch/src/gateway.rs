//! Collaborator contracts
//!
//! The engine talks to two external services: ground control (vehicle
//! registration, routing, movement permission, arrival notification) and
//! the boarding orchestrator (start/finish signals). Both are traits so the
//! engine can run against HTTP clients in production and scripted fakes in
//! tests.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Gateway call failures
#[derive(Debug, Clone, Error, PartialEq)]
pub enum GatewayError {
    /// The service answered with a status outside its success taxonomy
    #[error("Unexpected status {status}: {body}")]
    Status {
        /// HTTP-like status code
        status: u16,
        /// Response body, for logging
        body: String,
    },

    /// The requested resource (route, node) does not exist
    #[error("Not found")]
    NotFound,

    /// The request never got an answer
    #[error("Transport failure: {0}")]
    Transport(String),

    /// The answer could not be decoded
    #[error("Failed to decode response: {0}")]
    Decode(String),
}

/// Direction of a passenger transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Terminal to aircraft
    Boarding,
    /// Aircraft to terminal
    Deboarding,
}

impl Direction {
    /// Stable lowercase name used in logs
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Boarding => "boarding",
            Direction::Deboarding => "deboarding",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A freshly registered vehicle as described by ground control
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    /// Vehicle identifier assigned by ground control
    pub vehicle_id: String,
    /// Garage node the vehicle starts at and returns to
    pub home_node: String,
    /// Aircraft coordinate key to the node adjacent to that aircraft stand
    pub service_spots: BTreeMap<String, String>,
}

/// Answer to a movement permission request
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PermitDecision {
    /// Move granted; the hop is `distance` long
    Granted {
        /// Hop length in distance units
        distance: f64,
    },
    /// Target node is occupied right now; ask again later
    Conflict,
    /// Move refused
    Denied,
    /// One of the nodes does not exist
    NodeNotFound,
}

/// Ground-control service boundary
#[async_trait]
pub trait GroundControl: Send + Sync {
    /// Register a new vehicle of `vehicle_type`
    async fn register(&self, vehicle_type: &str) -> Result<Registration, GatewayError>;

    /// Ordered node sequence from `from` to `to`, both ends included
    async fn route(&self, from: &str, to: &str) -> Result<Vec<String>, GatewayError>;

    /// Ask permission to move one hop
    async fn permit(
        &self,
        vehicle_id: &str,
        vehicle_type: &str,
        from: &str,
        to: &str,
    ) -> Result<PermitDecision, GatewayError>;

    /// Report arrival at `node_id`
    async fn notify_arrival(
        &self,
        vehicle_id: &str,
        vehicle_type: &str,
        node_id: &str,
    ) -> Result<(), GatewayError>;
}

/// Boarding orchestrator boundary
#[async_trait]
pub trait BoardingOrchestrator: Send + Sync {
    /// Signal that boarding or deboarding of `aircraft_id` has started
    async fn start(&self, aircraft_id: &str, direction: Direction) -> Result<(), GatewayError>;

    /// Signal completion with the total number of passengers moved
    async fn finish(
        &self,
        aircraft_id: &str,
        direction: Direction,
        passengers: u32,
    ) -> Result<(), GatewayError>;
}
