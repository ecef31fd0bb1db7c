use anyhow::Result;
use apron_dispatch::Dispatcher;
use apron_gateway::{HttpGroundControl, HttpOrchestrator};
use std::sync::Arc;

use crate::config::ServiceConfig;

pub struct AppState {
    pub config: ServiceConfig,
    pub dispatcher: Dispatcher,
}

impl AppState {
    pub fn new(config: ServiceConfig) -> Result<Self> {
        let dispatch = config.load_dispatch_config()?;
        let gateway = config.gateway();
        let http = gateway.build_client()?;

        let ground = HttpGroundControl::with_client(
            http.clone(),
            &gateway.ground_control_url,
            dispatch.vehicle_type.clone(),
        )?;
        let orchestrator = HttpOrchestrator::with_client(http, &gateway.orchestrator_url)?;

        Ok(AppState {
            config,
            dispatcher: Dispatcher::new(dispatch, Arc::new(ground), Arc::new(orchestrator)),
        })
    }
}
