//! HTTP gateways for the dispatch engine
//!
//! Implements [`GroundControl`](apron_dispatch::GroundControl) and
//! [`BoardingOrchestrator`](apron_dispatch::BoardingOrchestrator) over the
//! JSON APIs of the airport's ground-control and orchestrator services.
//! Each service's status codes are mapped onto the engine's own taxonomy;
//! the engine never sees a raw HTTP response.

pub mod config;
pub mod error;
pub mod ground_control;
pub mod orchestrator;

pub use config::{GatewayConfig, DEFAULT_GROUND_CONTROL_URL, DEFAULT_ORCHESTRATOR_URL};
pub use error::BuildError;
pub use ground_control::HttpGroundControl;
pub use orchestrator::HttpOrchestrator;
