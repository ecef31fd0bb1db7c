use anyhow::Result;
use apron_core::logging::{self, LogFormat};
use axum::{
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use chrono::Utc;
use serde_json::{json, Value};
use std::env;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tracing::{info, warn};

mod config;
mod handlers;
mod state;

use config::ServiceConfig;
use state::AppState;

/// Upper bound on waiting for in-flight trips after Ctrl-C.
const SHUTDOWN_DRAIN: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> Result<()> {
    logging::init_with(LogFormat::from_env_value(env::var("LOG_FORMAT").ok().as_deref()));

    let config = ServiceConfig::from_env()?;
    let state = Arc::new(AppState::new(config)?);

    let app = router(state.clone());

    let bind_addr = format!("0.0.0.0:{}", state.config.port);
    let listener = TcpListener::bind(&bind_addr).await?;
    info!(
        ground_control = %state.config.ground_control_url,
        orchestrator = %state.config.orchestrator_url,
        "Apron transporter listening on {}",
        bind_addr
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    let active = state.dispatcher.supervisor().active();
    if active > 0 {
        info!(active, "Waiting for in-flight trips");
        if tokio::time::timeout(SHUTDOWN_DRAIN, state.dispatcher.drain())
            .await
            .is_err()
        {
            warn!(
                active = state.dispatcher.supervisor().active(),
                "Shutdown drain timed out, abandoning trips"
            );
        }
    }
    info!(stats = ?state.dispatcher.supervisor().stats(), "Apron transporter stopped");
    Ok(())
}

pub(crate) fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/load", post(handlers::load_passengers))
        .route("/upload", post(handlers::unload_passengers))
        .route("/getCapacity", get(handlers::get_capacity))
        .route("/updateCapacity", post(handlers::update_capacity))
        .route("/admin/vehicles", get(handlers::list_vehicles))
        .with_state(state)
        .layer(ServiceBuilder::new().into_inner())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}

async fn health_check() -> Result<Json<Value>, StatusCode> {
    Ok(Json(json!({
        "status": "healthy",
        "service": "apron-transporter",
        "timestamp": Utc::now().to_rfc3339()
    })))
}
