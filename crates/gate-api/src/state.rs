//! Application state.

use std::sync::Arc;

use gate_core::{CoreResult, GatewayConfig, Orchestrator};

use crate::config::ApiConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub orchestrator: Arc<Orchestrator>,
}

impl AppState {
    /// Create state around an existing orchestrator.
    pub fn new(config: ApiConfig, orchestrator: Arc<Orchestrator>) -> Self {
        Self {
            config,
            orchestrator,
        }
    }

    /// Build the orchestrator from its own config.
    pub fn with_gateway(config: ApiConfig, gateway: GatewayConfig) -> CoreResult<Self> {
        let orchestrator = Orchestrator::new(gateway)?;
        Ok(Self::new(config, Arc::new(orchestrator)))
    }
}
