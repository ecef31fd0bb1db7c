//! Ground-control HTTP client
//!
//! | Call | Request | Success | Other statuses |
//! |---|---|---|---|
//! | register | `POST /register-vehicle/{type}` | 200 + vehicle | error |
//! | route | `POST /route` | 200 + node list | 404 not found |
//! | permit | `POST /move` | 200 + distance | 409 conflict, 403 denied, 404 node not found |
//! | arrival | `POST /arrived` | 200 | error |

use apron_dispatch::{GatewayError, GroundControl, PermitDecision, Registration};
use async_trait::async_trait;
use reqwest::{Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use crate::config::{normalize_base_url, GatewayConfig};
use crate::error::BuildError;

#[derive(Debug, Deserialize)]
struct RegisterResponse {
    #[serde(rename = "garrageNodeId")]
    garage_node_id: String,
    #[serde(rename = "VehicleId")]
    vehicle_id: String,
    #[serde(rename = "serviceSpots", default)]
    service_spots: BTreeMap<String, String>,
}

#[derive(Debug, Serialize)]
struct RouteRequest<'a> {
    from: &'a str,
    to: &'a str,
    #[serde(rename = "type")]
    vehicle_type: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MoveRequest<'a> {
    vehicle_id: &'a str,
    vehicle_type: &'a str,
    from: &'a str,
    to: &'a str,
}

#[derive(Debug, Deserialize)]
struct MoveResponse {
    distance: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ArrivedRequest<'a> {
    vehicle_id: &'a str,
    vehicle_type: &'a str,
    node_id: &'a str,
}

/// [`GroundControl`] over the ground-control JSON API
#[derive(Debug, Clone)]
pub struct HttpGroundControl {
    http: reqwest::Client,
    base_url: String,
    vehicle_type: String,
}

impl HttpGroundControl {
    /// Client for `config.ground_control_url`. Routes are requested for
    /// `vehicle_type`.
    pub fn new(config: &GatewayConfig, vehicle_type: impl Into<String>) -> Result<Self, BuildError> {
        Self::with_client(config.build_client()?, &config.ground_control_url, vehicle_type)
    }

    /// Reuse an existing client
    pub fn with_client(
        http: reqwest::Client,
        base_url: &str,
        vehicle_type: impl Into<String>,
    ) -> Result<Self, BuildError> {
        Ok(Self {
            http,
            base_url: normalize_base_url(base_url)?,
            vehicle_type: vehicle_type.into(),
        })
    }

    async fn post<B: Serialize + ?Sized>(&self, path: &str, body: Option<&B>) -> Result<Response, GatewayError> {
        self.post_url(format!("{}{}", self.base_url, path), body).await
    }

    async fn post_url<B: Serialize + ?Sized>(&self, url: String, body: Option<&B>) -> Result<Response, GatewayError> {
        let mut request = self.http.post(&url);
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request.send().await.map_err(transport)?;
        debug!(%url, status = response.status().as_u16(), "Ground control answered");
        Ok(response)
    }

    /// Base URL with `segments` appended, each percent-encoded as one segment
    fn endpoint(&self, segments: &[&str]) -> Result<String, GatewayError> {
        let mut url = Url::parse(&self.base_url).map_err(|e| GatewayError::Transport(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|()| GatewayError::Transport(format!("{} cannot take a path", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url.into())
    }
}

fn transport(e: reqwest::Error) -> GatewayError {
    GatewayError::Transport(e.to_string())
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, GatewayError> {
    let bytes = response.bytes().await.map_err(transport)?;
    serde_json::from_slice(&bytes).map_err(|e| GatewayError::Decode(e.to_string()))
}

pub(crate) async fn unexpected(response: Response) -> GatewayError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    GatewayError::Status { status, body }
}

#[async_trait]
impl GroundControl for HttpGroundControl {
    async fn register(&self, vehicle_type: &str) -> Result<Registration, GatewayError> {
        let url = self.endpoint(&["register-vehicle", vehicle_type])?;
        let response = self.post_url::<()>(url, None).await?;
        if response.status() != StatusCode::OK {
            return Err(unexpected(response).await);
        }
        let body: RegisterResponse = decode(response).await?;
        Ok(Registration {
            vehicle_id: body.vehicle_id,
            home_node: body.garage_node_id,
            service_spots: body.service_spots,
        })
    }

    async fn route(&self, from: &str, to: &str) -> Result<Vec<String>, GatewayError> {
        let body = RouteRequest {
            from,
            to,
            vehicle_type: &self.vehicle_type,
        };
        let response = self.post("/route", Some(&body)).await?;
        match response.status() {
            StatusCode::OK => decode(response).await,
            StatusCode::NOT_FOUND => Err(GatewayError::NotFound),
            _ => Err(unexpected(response).await),
        }
    }

    async fn permit(
        &self,
        vehicle_id: &str,
        vehicle_type: &str,
        from: &str,
        to: &str,
    ) -> Result<PermitDecision, GatewayError> {
        let body = MoveRequest {
            vehicle_id,
            vehicle_type,
            from,
            to,
        };
        let response = self.post("/move", Some(&body)).await?;
        match response.status() {
            StatusCode::OK => {
                let body: MoveResponse = decode(response).await?;
                Ok(PermitDecision::Granted {
                    distance: body.distance,
                })
            }
            StatusCode::CONFLICT => Ok(PermitDecision::Conflict),
            StatusCode::FORBIDDEN => Ok(PermitDecision::Denied),
            StatusCode::NOT_FOUND => Ok(PermitDecision::NodeNotFound),
            _ => Err(unexpected(response).await),
        }
    }

    async fn notify_arrival(
        &self,
        vehicle_id: &str,
        vehicle_type: &str,
        node_id: &str,
    ) -> Result<(), GatewayError> {
        let body = ArrivedRequest {
            vehicle_id,
            vehicle_type,
            node_id,
        };
        let response = self.post("/arrived", Some(&body)).await?;
        if response.status() != StatusCode::OK {
            return Err(unexpected(response).await);
        }
        Ok(())
    }
}
