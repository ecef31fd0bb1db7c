//! Apron Dispatch - ground vehicle dispatch engine
//!
//! This crate moves passengers between the terminal and aircraft stands with
//! a small pool of buses. It handles:
//! - Bounded vehicle pool allocation with lazy registration
//! - The per-vehicle trip lifecycle (route out, dwell, route back)
//! - Boarding session aggregation, so that several buses servicing one
//!   aircraft produce a single start and a single finish signal
//! - Detached trip supervision with outcome counters
//!
//! # Architecture
//!
//! A request flows through the following pipeline:
//! 1. `Dispatcher::submit` validates it and splits the passengers into loads
//! 2. Each load becomes a `Trip` spawned on the `TripSupervisor`
//! 3. The trip acquires a vehicle from the `VehicleRegistry`
//! 4. The trip drives to the aircraft, joins the `SessionAggregator`, dwells,
//!    leaves and drives home
//! 5. The vehicle goes back to the pool
//!
//! External services sit behind the [`GroundControl`] and
//! [`BoardingOrchestrator`] traits.
//!
//! # Examples
//!
//! ```no_run
//! use apron_core::DispatchConfig;
//! use apron_dispatch::{Direction, Dispatcher, TripRequest};
//! # use std::sync::Arc;
//! # async fn demo(
//! #     ground: Arc<dyn apron_dispatch::GroundControl>,
//! #     orchestrator: Arc<dyn apron_dispatch::BoardingOrchestrator>,
//! # ) -> Result<(), apron_dispatch::DispatchError> {
//! let dispatcher = Dispatcher::new(DispatchConfig::default(), ground, orchestrator);
//! let request = TripRequest::new("SU100", "A1", 200, Direction::Boarding)?;
//! let receipt = dispatcher.submit(request)?;
//! assert_eq!(receipt.needed_trips, 2);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod dispatcher;
pub mod error;
pub mod gateway;
pub mod registry;
pub mod request;
pub mod session;
pub mod supervisor;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod trip;

pub use dispatcher::{needed_trips, trip_loads, DispatchReceipt, Dispatcher, FleetSnapshot};
pub use error::DispatchError;
pub use gateway::{
    BoardingOrchestrator, Direction, GatewayError, GroundControl, PermitDecision, Registration,
};
pub use registry::{Position, Vehicle, VehicleLease, VehicleRegistry, VehicleSnapshot};
pub use request::TripRequest;
pub use session::{LeaveResult, SessionAggregator};
pub use supervisor::{TripStats, TripSupervisor};
pub use trip::{LegError, Trip, TripContext, TripOutcome, TripPhase};
