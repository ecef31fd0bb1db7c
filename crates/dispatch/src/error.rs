//! Dispatch errors
//!
//! Only synchronous failures surface as [`DispatchError`]. Everything that
//! goes wrong once a trip is running is recovered inside the trip and
//! reported through its [`TripOutcome`](crate::trip::TripOutcome).

use thiserror::Error;

/// Errors returned to callers of the dispatcher
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DispatchError {
    /// Request or setting rejected before anything was dispatched
    #[error("Validation failed: {0}")]
    Validation(String),
}

impl DispatchError {
    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        DispatchError::Validation(msg.into())
    }
}
