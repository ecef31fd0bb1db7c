//! Gateway endpoints and timeouts

use std::time::Duration;

use crate::error::BuildError;

/// Production ground-control service
pub const DEFAULT_GROUND_CONTROL_URL: &str = "https://ground-control.reaport.ru";

/// Production boarding orchestrator
pub const DEFAULT_ORCHESTRATOR_URL: &str = "https://orchestrator.reaport.ru";

/// Default per-request timeout.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Where the collaborator services live
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    /// Ground-control base URL, without trailing slash
    pub ground_control_url: String,
    /// Orchestrator base URL, without trailing slash
    pub orchestrator_url: String,
    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            ground_control_url: DEFAULT_GROUND_CONTROL_URL.to_string(),
            orchestrator_url: DEFAULT_ORCHESTRATOR_URL.to_string(),
            timeout: DEFAULT_HTTP_TIMEOUT,
        }
    }
}

impl GatewayConfig {
    /// Shared client for both gateways
    pub fn build_client(&self) -> Result<reqwest::Client, BuildError> {
        Ok(reqwest::Client::builder().timeout(self.timeout).build()?)
    }
}

/// Checks the scheme and strips trailing slashes so paths can be appended.
pub(crate) fn normalize_base_url(url: &str) -> Result<String, BuildError> {
    let trimmed = url.trim().trim_end_matches('/');
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(BuildError::InvalidUrl(url.to_string()));
    }
    Ok(trimmed.to_string())
}
