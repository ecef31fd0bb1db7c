//! Scripted in-memory gateways
//!
//! Available to this crate's tests and, with the `testing` feature, to
//! downstream crates. Unscripted calls succeed with predictable values:
//! registrations hand out `bus-N` parked at `garage-N`, routes go straight
//! from `from` to `to`, and every permission is granted for
//! [`FakeGroundControl::DEFAULT_DISTANCE`].

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::gateway::{
    BoardingOrchestrator, Direction, GatewayError, GroundControl, PermitDecision, Registration,
};

/// A call received by [`FakeGroundControl`]
#[derive(Debug, Clone, PartialEq)]
pub enum GroundCall {
    /// `register`
    Register {
        /// Requested vehicle type
        vehicle_type: String,
    },
    /// `route`
    Route {
        /// Origin node
        from: String,
        /// Destination node
        to: String,
    },
    /// `permit`
    Permit {
        /// Moving vehicle
        vehicle_id: String,
        /// Origin node
        from: String,
        /// Destination node
        to: String,
    },
    /// `notify_arrival`
    Arrival {
        /// Arriving vehicle
        vehicle_id: String,
        /// Reached node
        node: String,
    },
}

#[derive(Default)]
struct GroundState {
    next_vehicle: usize,
    registrations: VecDeque<Result<Registration, GatewayError>>,
    register_delay: Option<Duration>,
    routes: HashMap<(String, String), Result<Vec<String>, GatewayError>>,
    permits: HashMap<(String, String), VecDeque<Result<PermitDecision, GatewayError>>>,
    arrival_failure: Option<GatewayError>,
    calls: Vec<GroundCall>,
}

fn locked<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Scripted ground-control service
#[derive(Default)]
pub struct FakeGroundControl {
    state: Mutex<GroundState>,
}

impl FakeGroundControl {
    /// Distance granted for unscripted permissions
    pub const DEFAULT_DISTANCE: f64 = 50.0;

    /// Create a fake with no scripted responses
    pub fn new() -> Self {
        Self::default()
    }

    /// Registration with the default service spots `A1 -> P-A1`, `B2 -> P-B2`
    pub fn registration(vehicle_id: &str, home_node: &str) -> Registration {
        let mut service_spots = BTreeMap::new();
        service_spots.insert("A1".to_string(), "P-A1".to_string());
        service_spots.insert("B2".to_string(), "P-B2".to_string());
        Registration {
            vehicle_id: vehicle_id.to_string(),
            home_node: home_node.to_string(),
            service_spots,
        }
    }

    /// Queue the answer to the next `register` call
    pub fn push_registration(&self, result: Result<Registration, GatewayError>) {
        locked(&self.state).registrations.push_back(result);
    }

    /// Delay every `register` call by `delay`
    pub fn set_register_delay(&self, delay: Duration) {
        locked(&self.state).register_delay = Some(delay);
    }

    /// Answer `route(from, to)` with `result`
    pub fn set_route(&self, from: &str, to: &str, result: Result<Vec<String>, GatewayError>) {
        locked(&self.state)
            .routes
            .insert((from.to_string(), to.to_string()), result);
    }

    /// Queue answers for permission on the hop `from -> to`
    pub fn push_permits(
        &self,
        from: &str,
        to: &str,
        results: impl IntoIterator<Item = Result<PermitDecision, GatewayError>>,
    ) {
        locked(&self.state)
            .permits
            .entry((from.to_string(), to.to_string()))
            .or_default()
            .extend(results);
    }

    /// Make every arrival notification fail
    pub fn fail_arrivals(&self, error: GatewayError) {
        locked(&self.state).arrival_failure = Some(error);
    }

    /// Every call received so far
    pub fn calls(&self) -> Vec<GroundCall> {
        locked(&self.state).calls.clone()
    }

    /// Number of `register` calls
    pub fn register_count(&self) -> usize {
        self.count(|c| matches!(c, GroundCall::Register { .. }))
    }

    /// Number of `permit` calls for the hop `from -> to`
    pub fn permit_count(&self, from: &str, to: &str) -> usize {
        self.count(|c| {
            matches!(c, GroundCall::Permit { from: f, to: t, .. } if f == from && t == to)
        })
    }

    /// Nodes `vehicle_id` reported arriving at, in order
    pub fn arrivals(&self, vehicle_id: &str) -> Vec<String> {
        locked(&self.state)
            .calls
            .iter()
            .filter_map(|c| match c {
                GroundCall::Arrival { vehicle_id: v, node } if v == vehicle_id => {
                    Some(node.clone())
                }
                _ => None,
            })
            .collect()
    }

    fn count(&self, predicate: impl Fn(&GroundCall) -> bool) -> usize {
        locked(&self.state).calls.iter().filter(|c| predicate(c)).count()
    }
}

#[async_trait]
impl GroundControl for FakeGroundControl {
    async fn register(&self, vehicle_type: &str) -> Result<Registration, GatewayError> {
        let delay = {
            let mut state = locked(&self.state);
            state.calls.push(GroundCall::Register {
                vehicle_type: vehicle_type.to_string(),
            });
            state.register_delay
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = locked(&self.state);
        match state.registrations.pop_front() {
            Some(result) => result,
            None => {
                state.next_vehicle += 1;
                let n = state.next_vehicle;
                Ok(Self::registration(&format!("bus-{n}"), &format!("garage-{n}")))
            }
        }
    }

    async fn route(&self, from: &str, to: &str) -> Result<Vec<String>, GatewayError> {
        let mut state = locked(&self.state);
        state.calls.push(GroundCall::Route {
            from: from.to_string(),
            to: to.to_string(),
        });
        state
            .routes
            .get(&(from.to_string(), to.to_string()))
            .cloned()
            .unwrap_or_else(|| Ok(vec![from.to_string(), to.to_string()]))
    }

    async fn permit(
        &self,
        vehicle_id: &str,
        _vehicle_type: &str,
        from: &str,
        to: &str,
    ) -> Result<PermitDecision, GatewayError> {
        let mut state = locked(&self.state);
        state.calls.push(GroundCall::Permit {
            vehicle_id: vehicle_id.to_string(),
            from: from.to_string(),
            to: to.to_string(),
        });
        state
            .permits
            .get_mut(&(from.to_string(), to.to_string()))
            .and_then(VecDeque::pop_front)
            .unwrap_or(Ok(PermitDecision::Granted {
                distance: Self::DEFAULT_DISTANCE,
            }))
    }

    async fn notify_arrival(
        &self,
        vehicle_id: &str,
        _vehicle_type: &str,
        node_id: &str,
    ) -> Result<(), GatewayError> {
        let mut state = locked(&self.state);
        state.calls.push(GroundCall::Arrival {
            vehicle_id: vehicle_id.to_string(),
            node: node_id.to_string(),
        });
        match &state.arrival_failure {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

/// A signal received by [`RecordingOrchestrator`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Signal {
    /// `start`
    Start {
        /// Aircraft
        aircraft_id: String,
        /// Transfer direction
        direction: Direction,
    },
    /// `finish`
    Finish {
        /// Aircraft
        aircraft_id: String,
        /// Transfer direction
        direction: Direction,
        /// Reported total
        passengers: u32,
    },
}

/// Orchestrator fake that records every signal
#[derive(Default)]
pub struct RecordingOrchestrator {
    signals: Mutex<Vec<Signal>>,
    failure: Mutex<Option<GatewayError>>,
}

impl RecordingOrchestrator {
    /// Create a recorder that acknowledges everything
    pub fn new() -> Self {
        Self::default()
    }

    /// Record signals but answer each with `error`
    pub fn fail_with(&self, error: GatewayError) {
        *locked(&self.failure) = Some(error);
    }

    /// Every signal received so far
    pub fn signals(&self) -> Vec<Signal> {
        locked(&self.signals).clone()
    }

    /// Start signals for `aircraft_id`
    pub fn starts(&self, aircraft_id: &str) -> usize {
        self.signals()
            .iter()
            .filter(|s| matches!(s, Signal::Start { aircraft_id: a, .. } if a == aircraft_id))
            .count()
    }

    /// Totals reported by finish signals for `aircraft_id`
    pub fn finishes(&self, aircraft_id: &str) -> Vec<u32> {
        self.signals()
            .iter()
            .filter_map(|s| match s {
                Signal::Finish {
                    aircraft_id: a,
                    passengers,
                    ..
                } if a == aircraft_id => Some(*passengers),
                _ => None,
            })
            .collect()
    }

    fn answer(&self) -> Result<(), GatewayError> {
        match &*locked(&self.failure) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl BoardingOrchestrator for RecordingOrchestrator {
    async fn start(&self, aircraft_id: &str, direction: Direction) -> Result<(), GatewayError> {
        locked(&self.signals).push(Signal::Start {
            aircraft_id: aircraft_id.to_string(),
            direction,
        });
        self.answer()
    }

    async fn finish(
        &self,
        aircraft_id: &str,
        direction: Direction,
        passengers: u32,
    ) -> Result<(), GatewayError> {
        locked(&self.signals).push(Signal::Finish {
            aircraft_id: aircraft_id.to_string(),
            direction,
            passengers,
        });
        self.answer()
    }
}
