use anyhow::{Context, Result};
use apron_core::DispatchConfig;
use apron_gateway::{GatewayConfig, DEFAULT_GROUND_CONTROL_URL, DEFAULT_ORCHESTRATOR_URL};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_PORT: u16 = 8000;
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub port: u16,
    pub ground_control_url: String,
    pub orchestrator_url: String,
    pub dispatch_config: Option<PathBuf>,
    pub http_timeout: Duration,
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup; unset keys fall back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let port = match lookup("PORT") {
            Some(raw) => raw
                .trim()
                .parse()
                .with_context(|| format!("PORT is not a valid port: {raw}"))?,
            None => DEFAULT_PORT,
        };
        let http_timeout_secs = match lookup("HTTP_TIMEOUT_SECS") {
            Some(raw) => raw
                .trim()
                .parse()
                .with_context(|| format!("HTTP_TIMEOUT_SECS is not a number: {raw}"))?,
            None => DEFAULT_HTTP_TIMEOUT_SECS,
        };

        Ok(ServiceConfig {
            port,
            ground_control_url: lookup("GROUND_CONTROL_URL")
                .unwrap_or_else(|| DEFAULT_GROUND_CONTROL_URL.to_string()),
            orchestrator_url: lookup("ORCHESTRATOR_URL")
                .unwrap_or_else(|| DEFAULT_ORCHESTRATOR_URL.to_string()),
            dispatch_config: lookup("DISPATCH_CONFIG").map(PathBuf::from),
            http_timeout: Duration::from_secs(http_timeout_secs),
        })
    }

    pub fn gateway(&self) -> GatewayConfig {
        GatewayConfig {
            ground_control_url: self.ground_control_url.clone(),
            orchestrator_url: self.orchestrator_url.clone(),
            timeout: self.http_timeout,
        }
    }

    /// Dispatch settings from `DISPATCH_CONFIG`, or the built-in defaults.
    pub fn load_dispatch_config(&self) -> Result<DispatchConfig> {
        match &self.dispatch_config {
            Some(path) => DispatchConfig::from_file(path)
                .with_context(|| format!("Failed to load dispatch config from {}", path.display())),
            None => Ok(DispatchConfig::default()),
        }
    }
}
