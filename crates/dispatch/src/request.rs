//! Transport requests

use serde::{Deserialize, Serialize};

use crate::error::DispatchError;
use crate::gateway::Direction;

/// One request to move passengers to or from an aircraft
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TripRequest {
    /// Aircraft being serviced
    pub aircraft_id: String,
    /// Stand coordinate key, resolved per vehicle to an aircraft-adjacent node
    pub coordinate_key: String,
    /// Passengers to move, always positive
    pub passenger_count: u32,
    /// Boarding or deboarding
    pub direction: Direction,
}

impl TripRequest {
    /// Build a validated request from raw caller input.
    pub fn new(
        aircraft_id: impl Into<String>,
        coordinate_key: impl Into<String>,
        passenger_count: i64,
        direction: Direction,
    ) -> Result<Self, DispatchError> {
        if passenger_count <= 0 {
            return Err(DispatchError::validation(format!(
                "passenger_count must be positive, got {passenger_count}"
            )));
        }
        let passenger_count = u32::try_from(passenger_count).map_err(|_| {
            DispatchError::validation(format!("passenger_count {passenger_count} is too large"))
        })?;

        let request = Self {
            aircraft_id: aircraft_id.into(),
            coordinate_key: coordinate_key.into(),
            passenger_count,
            direction,
        };
        request.validate()?;
        Ok(request)
    }

    /// Check required fields
    pub fn validate(&self) -> Result<(), DispatchError> {
        if self.aircraft_id.trim().is_empty() {
            return Err(DispatchError::validation("aircraft_id is required"));
        }
        if self.coordinate_key.trim().is_empty() {
            return Err(DispatchError::validation("aircraft coordinates are required"));
        }
        if self.passenger_count == 0 {
            return Err(DispatchError::validation("passenger_count must be positive"));
        }
        Ok(())
    }
}
