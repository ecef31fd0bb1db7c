//! Detached trip supervision
//!
//! Trips run on their own tokio tasks and nobody awaits them on the request
//! path. Each one gets a tracked watcher that logs how it ended, including
//! panics, and bumps the outcome counters.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_util::task::TaskTracker;
use tracing::{error, info, warn};

use crate::trip::{Trip, TripOutcome};

#[derive(Debug, Default)]
struct Counters {
    completed: AtomicU64,
    aborted_no_vehicle: AtomicU64,
    aborted_outbound: AtomicU64,
    return_incomplete: AtomicU64,
    panicked: AtomicU64,
}

/// Totals of finished trips by outcome
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TripStats {
    /// Trips that completed
    pub completed: u64,
    /// Trips that found no vehicle
    pub aborted_no_vehicle: u64,
    /// Trips that never reached the aircraft
    pub aborted_outbound: u64,
    /// Trips whose drive home failed
    pub return_incomplete: u64,
    /// Trips whose task panicked
    pub panicked: u64,
}

/// Owner of all in-flight trip tasks
#[derive(Debug, Default)]
pub struct TripSupervisor {
    tracker: TaskTracker,
    counters: Arc<Counters>,
    drain_lock: Mutex<()>,
}

impl TripSupervisor {
    /// Create a supervisor with no trips
    pub fn new() -> Self {
        Self::default()
    }

    /// Start `trip` in the background. Must be called within a tokio runtime.
    pub fn spawn(&self, trip: Trip) {
        let trip_id = trip.id();
        let counters = self.counters.clone();
        let handle = tokio::spawn(trip.run());

        self.tracker.spawn(async move {
            match handle.await {
                Ok(outcome) => {
                    record(&counters, &outcome);
                    match &outcome {
                        TripOutcome::Completed { vehicle_id } => {
                            info!(%trip_id, %vehicle_id, "Trip completed");
                        }
                        TripOutcome::AbortedNoVehicle => {
                            warn!(%trip_id, "Trip aborted: no vehicle available");
                        }
                        TripOutcome::AbortedOutbound {
                            vehicle_id,
                            released_at,
                            error,
                        } => {
                            warn!(%trip_id, %vehicle_id, %released_at, %error, "Trip aborted on outbound leg");
                        }
                        TripOutcome::ReturnIncomplete { vehicle_id, error } => {
                            warn!(%trip_id, %vehicle_id, %error, "Trip return incomplete");
                        }
                    }
                }
                Err(e) if e.is_panic() => {
                    counters.panicked.fetch_add(1, Ordering::Relaxed);
                    error!(%trip_id, "Trip task panicked");
                }
                Err(e) => {
                    error!(%trip_id, error = %e, "Trip task did not finish");
                }
            }
        });
    }

    /// Trips still running
    pub fn active(&self) -> usize {
        self.tracker.len()
    }

    /// Outcome totals so far
    pub fn stats(&self) -> TripStats {
        let c = &self.counters;
        TripStats {
            completed: c.completed.load(Ordering::Relaxed),
            aborted_no_vehicle: c.aborted_no_vehicle.load(Ordering::Relaxed),
            aborted_outbound: c.aborted_outbound.load(Ordering::Relaxed),
            return_incomplete: c.return_incomplete.load(Ordering::Relaxed),
            panicked: c.panicked.load(Ordering::Relaxed),
        }
    }

    /// Wait until every trip spawned so far has finished.
    ///
    /// Trips may still be spawned while draining and are waited for too.
    /// Concurrent callers drain one after another.
    pub async fn drain(&self) {
        let _guard = self.drain_lock.lock().await;
        self.tracker.close();
        self.tracker.wait().await;
        self.tracker.reopen();
    }
}

fn record(counters: &Counters, outcome: &TripOutcome) {
    let counter = match outcome {
        TripOutcome::Completed { .. } => &counters.completed,
        TripOutcome::AbortedNoVehicle => &counters.aborted_no_vehicle,
        TripOutcome::AbortedOutbound { .. } => &counters.aborted_outbound,
        TripOutcome::ReturnIncomplete { .. } => &counters.return_incomplete,
    };
    counter.fetch_add(1, Ordering::Relaxed);
}
