//! Boarding session aggregation
//!
//! Several vehicles may service one aircraft at the same time. The
//! orchestrator must still see exactly one start and one finish per
//! aircraft event, with the finish carrying the summed passenger count.
//! The aggregator only does the bookkeeping; callers send the signals
//! outside the lock based on what `join`/`leave` return.
//!
//! Sessions are keyed by aircraft id alone. Boarding and deboarding the
//! same aircraft concurrently would share one session; callers must not
//! overlap the two directions for one aircraft.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};

#[derive(Debug, Default)]
struct BoardingSession {
    vehicles: BTreeSet<String>,
    passengers: u32,
}

/// Result of leaving a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeaveResult {
    /// This leave emptied the session
    pub is_last: bool,
    /// Aggregate passenger count when `is_last`, otherwise 0
    pub total: u32,
}

/// Per-aircraft join/leave bookkeeping
#[derive(Debug, Default)]
pub struct SessionAggregator {
    sessions: Mutex<HashMap<String, BoardingSession>>,
}

impl SessionAggregator {
    /// Create an empty aggregator
    pub fn new() -> Self {
        Self::default()
    }

    fn sessions(&self) -> MutexGuard<'_, HashMap<String, BoardingSession>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add `vehicle_id` to the session for `aircraft_id`.
    ///
    /// Returns `true` if this call created the session.
    pub fn join(&self, aircraft_id: &str, vehicle_id: &str, passengers: u32) -> bool {
        let mut sessions = self.sessions();
        let is_first = !sessions.contains_key(aircraft_id);
        let session = sessions.entry(aircraft_id.to_string()).or_default();
        session.vehicles.insert(vehicle_id.to_string());
        session.passengers = session.passengers.saturating_add(passengers);
        debug!(
            aircraft_id,
            vehicle_id,
            members = session.vehicles.len(),
            passengers = session.passengers,
            is_first,
            "Joined boarding session"
        );
        is_first
    }

    /// Remove `vehicle_id` from the session for `aircraft_id`.
    ///
    /// When the last member leaves, the session is deleted and its total
    /// returned.
    pub fn leave(&self, aircraft_id: &str, vehicle_id: &str) -> LeaveResult {
        let mut sessions = self.sessions();
        let Some(session) = sessions.get_mut(aircraft_id) else {
            warn!(aircraft_id, vehicle_id, "Leave for unknown boarding session");
            return LeaveResult {
                is_last: false,
                total: 0,
            };
        };

        if !session.vehicles.remove(vehicle_id) {
            warn!(aircraft_id, vehicle_id, "Vehicle was not part of boarding session");
            return LeaveResult {
                is_last: false,
                total: 0,
            };
        }

        if session.vehicles.is_empty() {
            let total = session.passengers;
            sessions.remove(aircraft_id);
            debug!(aircraft_id, vehicle_id, total, "Boarding session closed");
            LeaveResult {
                is_last: true,
                total,
            }
        } else {
            LeaveResult {
                is_last: false,
                total: 0,
            }
        }
    }

    /// Number of open sessions
    pub fn active_sessions(&self) -> usize {
        self.sessions().len()
    }

    /// Check if a session is open for `aircraft_id`
    pub fn is_active(&self, aircraft_id: &str) -> bool {
        self.sessions().contains_key(aircraft_id)
    }
}
