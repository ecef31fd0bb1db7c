//! Structured logging infrastructure for Apron.
//!
//! Centralized `tracing` subscriber setup with plain or JSON output. Request
//! audit lines are emitted on the [`AUDIT_TARGET`] target so operators can
//! route them separately, e.g. `RUST_LOG=info,audit=off`.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Tracing target used for request/response audit records.
pub const AUDIT_TARGET: &str = "audit";

/// Output format for the log subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human readable lines
    Plain,
    /// One JSON object per line
    Json,
}

impl LogFormat {
    /// Parse from a `LOG_FORMAT`-style value. Anything but `json` is plain.
    pub fn from_env_value(value: Option<&str>) -> Self {
        match value {
            Some(v) if v.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Plain,
        }
    }
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Initialize the logging system with structured output.
///
/// Log level can be configured via the `RUST_LOG` environment variable.
/// If not set, defaults to `info` level.
///
/// # Example
/// ```no_run
/// use apron_core::logging;
///
/// logging::init();
/// tracing::info!("Transporter started");
/// ```
pub fn init() {
    tracing_subscriber::registry()
        .with(env_filter())
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .init();
}

/// Initialize the logging system with JSON output for production environments.
///
/// # Example
/// ```no_run
/// use apron_core::logging;
///
/// logging::init_json();
/// tracing::info!(service = "transporter", "Service started");
/// ```
pub fn init_json() {
    tracing_subscriber::registry()
        .with(env_filter())
        .with(fmt::layer().json().with_target(true).with_thread_ids(true))
        .init();
}

/// Initialize logging in the requested format.
pub fn init_with(format: LogFormat) {
    match format {
        LogFormat::Plain => init(),
        LogFormat::Json => init_json(),
    }
}
