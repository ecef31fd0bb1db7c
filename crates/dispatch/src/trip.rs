//! Trip state machine
//!
//! A trip is one vehicle's full cycle for one request: lease a vehicle,
//! drive to the aircraft, join the boarding session, dwell, leave the
//! session, drive home, release. The only suspension points are gateway
//! calls and timed waits; registry and session locks are never held across
//! them.
//!
//! Failures never escape a trip. Outbound failures release the vehicle
//! where it stands and end the trip without any boarding signal. Return
//! failures park the vehicle at home anyway. A start signal already sent is
//! never retracted.

use apron_core::DispatchConfig;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::gateway::{BoardingOrchestrator, GatewayError, GroundControl, PermitDecision};
use crate::registry::{VehicleLease, VehicleRegistry};
use crate::request::TripRequest;
use crate::session::SessionAggregator;

/// Trip lifecycle phases, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TripPhase {
    /// Leasing a vehicle
    Allocating,
    /// Driving to the aircraft
    RoutingOut,
    /// Joining the boarding session
    SessionJoin,
    /// Moving passengers on or off
    Dwelling,
    /// Leaving the boarding session
    SessionLeave,
    /// Driving home
    RoutingBack,
    /// Vehicle returned to the pool
    Released,
}

/// Why a leg of a trip could not be driven
#[derive(Debug, Clone, Error, PartialEq)]
pub enum LegError {
    /// The vehicle has no service spot for the requested coordinates
    #[error("No service spot for coordinate key {0}")]
    UnmappedCoordinate(String),

    /// Routing failed or found nothing
    #[error("Route {from} -> {to} unavailable: {source}")]
    RouteUnavailable {
        /// Origin node
        from: String,
        /// Destination node
        to: String,
        /// Gateway failure
        source: GatewayError,
    },

    /// Routing returned an empty node list
    #[error("Route {from} -> {to} is empty")]
    EmptyRoute {
        /// Origin node
        from: String,
        /// Destination node
        to: String,
    },

    /// Ground control refused the move
    #[error("Move {from} -> {to} denied")]
    MoveDenied {
        /// Origin node
        from: String,
        /// Destination node
        to: String,
    },

    /// Ground control does not know one of the nodes
    #[error("Move {from} -> {to} references an unknown node")]
    NodeNotFound {
        /// Origin node
        from: String,
        /// Destination node
        to: String,
    },

    /// Permission request failed outright
    #[error("Permission for {from} -> {to} failed: {source}")]
    Permission {
        /// Origin node
        from: String,
        /// Destination node
        to: String,
        /// Gateway failure
        source: GatewayError,
    },
}

/// How a trip ended
#[derive(Debug, Clone, PartialEq)]
pub enum TripOutcome {
    /// Passengers moved and vehicle home
    Completed {
        /// Vehicle used
        vehicle_id: String,
    },
    /// No vehicle could be leased
    AbortedNoVehicle,
    /// Could not reach the aircraft; vehicle released where it stood
    AbortedOutbound {
        /// Vehicle used
        vehicle_id: String,
        /// Node the vehicle was released at
        released_at: String,
        /// Cause
        error: LegError,
    },
    /// Passengers moved but the drive home failed; vehicle parked at home
    ReturnIncomplete {
        /// Vehicle used
        vehicle_id: String,
        /// Cause
        error: LegError,
    },
}

impl TripOutcome {
    /// Check if the trip ran to completion
    pub fn is_completed(&self) -> bool {
        matches!(self, TripOutcome::Completed { .. })
    }
}

/// Everything a trip needs, shared by all trips of a process
#[derive(Clone)]
pub struct TripContext {
    /// Vehicle pool
    pub registry: Arc<VehicleRegistry>,
    /// Boarding session bookkeeping
    pub sessions: Arc<SessionAggregator>,
    /// Ground-control gateway
    pub ground: Arc<dyn GroundControl>,
    /// Orchestrator gateway
    pub orchestrator: Arc<dyn BoardingOrchestrator>,
    /// Timing and fleet tunables
    pub config: Arc<DispatchConfig>,
}

/// One vehicle servicing one request
pub struct Trip {
    id: Uuid,
    request: Arc<TripRequest>,
    passengers: u32,
    ctx: TripContext,
}

impl Trip {
    /// Create a trip carrying `passengers` of `request`
    pub fn new(request: Arc<TripRequest>, passengers: u32, ctx: TripContext) -> Self {
        Self {
            id: Uuid::new_v4(),
            request,
            passengers,
            ctx,
        }
    }

    /// Trip identifier used in logs
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Drive the trip to its end.
    pub async fn run(self) -> TripOutcome {
        let span = info_span!(
            "trip",
            trip_id = %self.id,
            aircraft_id = %self.request.aircraft_id,
            direction = %self.request.direction,
            passengers = self.passengers,
        );
        self.drive().instrument(span).await
    }

    fn enter(&self, phase: TripPhase) {
        debug!(?phase, "Trip phase");
    }

    async fn drive(&self) -> TripOutcome {
        let request = &self.request;

        self.enter(TripPhase::Allocating);
        let Some(lease) = self.ctx.registry.acquire().await else {
            warn!("No vehicle available, trip aborted");
            return TripOutcome::AbortedNoVehicle;
        };
        info!(vehicle_id = %lease.vehicle_id, node = %lease.node, "Vehicle leased");

        self.enter(TripPhase::RoutingOut);
        let mut position = lease.node.clone();
        let outbound = match lease.service_node(&request.coordinate_key) {
            Some(service_node) => {
                let service_node = service_node.to_string();
                self.travel(&lease, &mut position, &service_node).await
            }
            None => Err(LegError::UnmappedCoordinate(request.coordinate_key.clone())),
        };
        if let Err(error) = outbound {
            warn!(
                vehicle_id = %lease.vehicle_id,
                released_at = %position,
                error = %error,
                "Outbound leg failed, trip aborted"
            );
            self.ctx.registry.release(&lease.vehicle_id, &position);
            return TripOutcome::AbortedOutbound {
                vehicle_id: lease.vehicle_id,
                released_at: position,
                error,
            };
        }

        self.enter(TripPhase::SessionJoin);
        let is_first =
            self.ctx
                .sessions
                .join(&request.aircraft_id, &lease.vehicle_id, self.passengers);
        if is_first {
            self.signal_start().await;
        }

        self.enter(TripPhase::Dwelling);
        let dwell = self.ctx.config.dwell_time(self.passengers);
        info!(
            vehicle_id = %lease.vehicle_id,
            dwell_secs = dwell.as_secs_f64(),
            "Moving passengers"
        );
        tokio::time::sleep(dwell).await;

        self.enter(TripPhase::SessionLeave);
        let leave = self
            .ctx
            .sessions
            .leave(&request.aircraft_id, &lease.vehicle_id);
        if leave.is_last {
            self.signal_finish(leave.total).await;
        }

        self.enter(TripPhase::RoutingBack);
        let home = lease.home_node.clone();
        let inbound = self.travel(&lease, &mut position, &home).await;
        self.ctx.registry.release(&lease.vehicle_id, &home);
        self.enter(TripPhase::Released);

        match inbound {
            Ok(()) => {
                info!(vehicle_id = %lease.vehicle_id, home = %home, "Vehicle back in garage");
                TripOutcome::Completed {
                    vehicle_id: lease.vehicle_id,
                }
            }
            Err(error) => {
                warn!(
                    vehicle_id = %lease.vehicle_id,
                    stranded_at = %position,
                    error = %error,
                    "Return leg failed, vehicle force-released at home"
                );
                TripOutcome::ReturnIncomplete {
                    vehicle_id: lease.vehicle_id,
                    error,
                }
            }
        }
    }

    /// Route from `position` to `to` and drive it hop by hop, keeping
    /// `position` at the last node reached.
    async fn travel(
        &self,
        lease: &VehicleLease,
        position: &mut String,
        to: &str,
    ) -> Result<(), LegError> {
        let route = self
            .ctx
            .ground
            .route(position, to)
            .await
            .map_err(|source| LegError::RouteUnavailable {
                from: position.clone(),
                to: to.to_string(),
                source,
            })?;
        if route.is_empty() {
            return Err(LegError::EmptyRoute {
                from: position.clone(),
                to: to.to_string(),
            });
        }
        debug!(vehicle_id = %lease.vehicle_id, ?route, "Route received");

        for hop in route.windows(2) {
            let (from, next) = (&hop[0], &hop[1]);
            self.hop(lease, from, next).await?;
            *position = next.clone();
        }
        Ok(())
    }

    /// Obtain permission for one hop, retrying conflicts forever, then
    /// drive it and report arrival.
    async fn hop(&self, lease: &VehicleLease, from: &str, to: &str) -> Result<(), LegError> {
        let config = &self.ctx.config;
        let mut conflicts = 0u32;
        loop {
            let decision = self
                .ctx
                .ground
                .permit(&lease.vehicle_id, &lease.vehicle_type, from, to)
                .await;
            match decision {
                Ok(PermitDecision::Granted { distance }) => {
                    let travel = config.travel_time(distance);
                    debug!(
                        vehicle_id = %lease.vehicle_id,
                        from,
                        to,
                        distance,
                        travel_secs = travel.as_secs(),
                        "Moving"
                    );
                    tokio::time::sleep(travel).await;
                    if let Err(e) = self
                        .ctx
                        .ground
                        .notify_arrival(&lease.vehicle_id, &lease.vehicle_type, to)
                        .await
                    {
                        warn!(vehicle_id = %lease.vehicle_id, node = to, error = %e, "Arrival notification failed");
                    }
                    return Ok(());
                }
                Ok(PermitDecision::Conflict) => {
                    conflicts += 1;
                    debug!(vehicle_id = %lease.vehicle_id, from, to, conflicts, "Node occupied, retrying");
                    tokio::time::sleep(config.conflict_backoff()).await;
                }
                Ok(PermitDecision::Denied) => {
                    return Err(LegError::MoveDenied {
                        from: from.to_string(),
                        to: to.to_string(),
                    });
                }
                Ok(PermitDecision::NodeNotFound) => {
                    return Err(LegError::NodeNotFound {
                        from: from.to_string(),
                        to: to.to_string(),
                    });
                }
                Err(source) => {
                    return Err(LegError::Permission {
                        from: from.to_string(),
                        to: to.to_string(),
                        source,
                    });
                }
            }
        }
    }

    async fn signal_start(&self) {
        let request = &self.request;
        match self
            .ctx
            .orchestrator
            .start(&request.aircraft_id, request.direction)
            .await
        {
            Ok(()) => info!("Start signal sent"),
            Err(e) => warn!(error = %e, "Start signal failed"),
        }
    }

    async fn signal_finish(&self, total: u32) {
        let request = &self.request;
        match self
            .ctx
            .orchestrator
            .finish(&request.aircraft_id, request.direction, total)
            .await
        {
            Ok(()) => info!(total, "Finish signal sent"),
            Err(e) => warn!(total, error = %e, "Finish signal failed"),
        }
    }
}
