use apron_core::logging::AUDIT_TARGET;
use apron_dispatch::{Direction, DispatchError, FleetSnapshot, TripRequest};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use crate::state::AppState;

/// Body of `/load` and `/upload`
#[derive(Debug, Deserialize)]
pub struct TransferRequest {
    pub aircraft_id: String,
    pub passenger_count: i64,
    pub aircraft_coordinates: String,
}

#[derive(Debug, Serialize)]
pub struct TransferResponse {
    pub waiting: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CapacityBody {
    pub capacity: i64,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

pub struct ApiError(DispatchError);

impl From<DispatchError> for ApiError {
    fn from(e: DispatchError) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0 {
            DispatchError::Validation(_) => StatusCode::BAD_REQUEST,
        };
        let body = ErrorResponse {
            error: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Unwrap a JSON body, turning axum's rejection into a 400 `{error}` reply
fn json_body<T>(payload: Result<Json<T>, JsonRejection>, endpoint: &str) -> Result<T, ApiError> {
    match payload {
        Ok(Json(body)) => Ok(body),
        Err(rejection) => {
            let reason = rejection.body_text();
            warn!(endpoint, %reason, "Malformed request body");
            Err(ApiError(DispatchError::Validation(reason)))
        }
    }
}

pub async fn load_passengers(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<TransferRequest>, JsonRejection>,
) -> Result<Json<TransferResponse>, ApiError> {
    let payload = json_body(payload, "/load")?;
    transfer(&state, payload, Direction::Boarding, "/load")
}

pub async fn unload_passengers(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<TransferRequest>, JsonRejection>,
) -> Result<Json<TransferResponse>, ApiError> {
    let payload = json_body(payload, "/upload")?;
    transfer(&state, payload, Direction::Deboarding, "/upload")
}

fn transfer(
    state: &AppState,
    payload: TransferRequest,
    direction: Direction,
    endpoint: &str,
) -> Result<Json<TransferResponse>, ApiError> {
    info!(
        target: AUDIT_TARGET,
        endpoint,
        aircraft_id = %payload.aircraft_id,
        passenger_count = payload.passenger_count,
        aircraft_coordinates = %payload.aircraft_coordinates,
        "Transfer requested"
    );

    let receipt = TripRequest::new(
        payload.aircraft_id,
        payload.aircraft_coordinates,
        payload.passenger_count,
        direction,
    )
    .and_then(|request| state.dispatcher.submit(request))
    .map_err(|e| {
        warn!(endpoint, error = %e, "Transfer rejected");
        ApiError::from(e)
    })?;

    info!(
        target: AUDIT_TARGET,
        endpoint,
        waiting = receipt.waiting,
        needed_trips = receipt.needed_trips,
        "Transfer accepted"
    );
    Ok(Json(TransferResponse {
        waiting: receipt.waiting,
    }))
}

pub async fn get_capacity(State(state): State<Arc<AppState>>) -> Json<CapacityBody> {
    let capacity = state.dispatcher.capacity();
    info!(target: AUDIT_TARGET, capacity, "Capacity read");
    Json(CapacityBody {
        capacity: i64::from(capacity),
    })
}

pub async fn update_capacity(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CapacityBody>, JsonRejection>,
) -> Result<Json<CapacityBody>, ApiError> {
    let payload = json_body(payload, "/updateCapacity")?;
    info!(target: AUDIT_TARGET, requested = payload.capacity, "Capacity update requested");
    let capacity = state.dispatcher.set_capacity(payload.capacity).map_err(|e| {
        warn!(error = %e, "Capacity update rejected");
        ApiError::from(e)
    })?;
    info!(target: AUDIT_TARGET, capacity, "Capacity updated");
    Ok(Json(CapacityBody {
        capacity: i64::from(capacity),
    }))
}

pub async fn list_vehicles(State(state): State<Arc<AppState>>) -> Json<FleetSnapshot> {
    Json(state.dispatcher.snapshot())
}
