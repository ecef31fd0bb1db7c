//! Dispatch configuration.
//!
//! All fields carry defaults, so an empty TOML file (or no file at all)
//! yields the stock airfield setup: six buses of 150 seats moving at
//! 25 m/s and boarding 50 passengers per second.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::{ConfigError, Result};

/// Hard ceiling on the vehicle pool unless configured otherwise.
pub const DEFAULT_MAX_VEHICLES: usize = 6;

/// Seat capacity assumed at startup.
pub const DEFAULT_CAPACITY: u32 = 150;

/// Tunables for the dispatch engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Vehicle type sent to ground control on registration and movement
    #[serde(default = "default_vehicle_type")]
    pub vehicle_type: String,

    /// Maximum number of vehicles the pool may ever hold
    #[serde(default = "default_max_vehicles")]
    pub max_vehicles: usize,

    /// Seat capacity at startup, adjustable at runtime
    #[serde(default = "default_capacity")]
    pub default_capacity: u32,

    /// Vehicle speed in distance units per second
    #[serde(default = "default_vehicle_speed")]
    pub vehicle_speed: f64,

    /// Passengers moved on or off per second while dwelling
    #[serde(default = "default_boarding_rate")]
    pub boarding_rate: f64,

    /// Delay before re-requesting a conflicted movement permission
    #[serde(default = "default_conflict_backoff_ms")]
    pub conflict_backoff_ms: u64,
}

fn default_vehicle_type() -> String {
    "bus".to_string()
}

fn default_max_vehicles() -> usize {
    DEFAULT_MAX_VEHICLES
}

fn default_capacity() -> u32 {
    DEFAULT_CAPACITY
}

fn default_vehicle_speed() -> f64 {
    25.0
}

fn default_boarding_rate() -> f64 {
    50.0
}

fn default_conflict_backoff_ms() -> u64 {
    1000
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            vehicle_type: default_vehicle_type(),
            max_vehicles: default_max_vehicles(),
            default_capacity: default_capacity(),
            vehicle_speed: default_vehicle_speed(),
            boarding_rate: default_boarding_rate(),
            conflict_backoff_ms: default_conflict_backoff_ms(),
        }
    }
}

impl DispatchConfig {
    /// Load configuration from a TOML file and validate it.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from TOML text and validate it.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: DispatchConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<()> {
        if self.vehicle_type.trim().is_empty() {
            return Err(ConfigError::Validation(
                "vehicle_type must not be empty".to_string(),
            ));
        }
        if !self
            .vehicle_type
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(ConfigError::Validation(format!(
                "vehicle_type may only contain ASCII letters, digits, '-' and '_', got {:?}",
                self.vehicle_type
            )));
        }
        if self.max_vehicles == 0 {
            return Err(ConfigError::Validation(
                "max_vehicles must be at least 1".to_string(),
            ));
        }
        if !(self.vehicle_speed.is_finite() && self.vehicle_speed > 0.0) {
            return Err(ConfigError::Validation(format!(
                "vehicle_speed must be positive, got {}",
                self.vehicle_speed
            )));
        }
        if !(self.boarding_rate.is_finite() && self.boarding_rate > 0.0) {
            return Err(ConfigError::Validation(format!(
                "boarding_rate must be positive, got {}",
                self.boarding_rate
            )));
        }
        // A full vehicle of u32::MAX passengers must still yield a dwell time
        if Duration::try_from_secs_f64(f64::from(u32::MAX) / self.boarding_rate).is_err() {
            return Err(ConfigError::Validation(format!(
                "boarding_rate {} is too small",
                self.boarding_rate
            )));
        }
        Ok(())
    }

    /// Backoff between conflicted movement permission requests
    pub fn conflict_backoff(&self) -> Duration {
        Duration::from_millis(self.conflict_backoff_ms)
    }

    /// Time to cover `distance`, rounded up to whole seconds.
    pub fn travel_time(&self, distance: f64) -> Duration {
        let secs = (distance.max(0.0) / self.vehicle_speed).ceil();
        Duration::from_secs(secs as u64)
    }

    /// Time to move `passengers` on or off a vehicle. Not rounded.
    ///
    /// Saturates at `Duration::MAX` for rates that were never validated.
    pub fn dwell_time(&self, passengers: u32) -> Duration {
        Duration::try_from_secs_f64(f64::from(passengers) / self.boarding_rate)
            .unwrap_or(Duration::MAX)
    }
}
