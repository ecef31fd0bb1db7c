//! Shared infrastructure for the Apron transporter workspace.
//!
//! This crate provides the pieces every other crate leans on: logging
//! initialization, dispatch configuration and its error types.

pub mod config;
pub mod error;
pub mod logging;

pub use config::{DispatchConfig, DEFAULT_CAPACITY, DEFAULT_MAX_VEHICLES};
pub use error::{ConfigError, Result};
