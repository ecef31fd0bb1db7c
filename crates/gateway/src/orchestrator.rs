//! Boarding orchestrator HTTP client
//!
//! Signals go to `POST /boarding/{boarding|unboarding}/{start|finish}` and
//! are acknowledged with 204.

use apron_dispatch::{BoardingOrchestrator, Direction, GatewayError};
use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;

use crate::config::{normalize_base_url, GatewayConfig};
use crate::error::BuildError;
use crate::ground_control::unexpected;

#[derive(Debug, Serialize)]
struct SignalBody<'a> {
    aircraft_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    passengers_count: Option<u32>,
}

/// [`BoardingOrchestrator`] over the orchestrator JSON API
#[derive(Debug, Clone)]
pub struct HttpOrchestrator {
    http: reqwest::Client,
    base_url: String,
}

impl HttpOrchestrator {
    /// Client for `config.orchestrator_url`
    pub fn new(config: &GatewayConfig) -> Result<Self, BuildError> {
        Self::with_client(config.build_client()?, &config.orchestrator_url)
    }

    /// Reuse an existing client
    pub fn with_client(http: reqwest::Client, base_url: &str) -> Result<Self, BuildError> {
        Ok(Self {
            http,
            base_url: normalize_base_url(base_url)?,
        })
    }

    async fn signal(
        &self,
        direction: Direction,
        stage: &str,
        body: &SignalBody<'_>,
    ) -> Result<(), GatewayError> {
        let url = format!("{}/boarding/{}/{}", self.base_url, segment(direction), stage);
        let response = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;
        debug!(%url, status = response.status().as_u16(), "Orchestrator answered");
        if !response.status().is_success() {
            return Err(unexpected(response).await);
        }
        Ok(())
    }
}

/// Path segment the orchestrator uses for each direction
fn segment(direction: Direction) -> &'static str {
    match direction {
        Direction::Boarding => "boarding",
        Direction::Deboarding => "unboarding",
    }
}

#[async_trait]
impl BoardingOrchestrator for HttpOrchestrator {
    async fn start(&self, aircraft_id: &str, direction: Direction) -> Result<(), GatewayError> {
        let body = SignalBody {
            aircraft_id,
            passengers_count: None,
        };
        self.signal(direction, "start", &body).await
    }

    async fn finish(
        &self,
        aircraft_id: &str,
        direction: Direction,
        passengers: u32,
    ) -> Result<(), GatewayError> {
        let body = SignalBody {
            aircraft_id,
            passengers_count: Some(passengers),
        };
        self.signal(direction, "finish", &body).await
    }
}
