//! Health check handlers.

use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;
use serde::Serialize;

use gate_models::{ServiceHealth, ServiceId};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Health response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: String,
}

/// Health check endpoint (liveness probe).
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now().to_rfc3339(),
    })
}

/// Probe every guard service now.
pub async fn check_all_health(State(state): State<AppState>) -> Json<Vec<ServiceHealth>> {
    Json(state.orchestrator.check_all_health().await)
}

/// Probe one guard service now.
pub async fn check_service_health(
    State(state): State<AppState>,
    Path(service): Path<String>,
) -> ApiResult<Json<ServiceHealth>> {
    let id: ServiceId = service
        .parse()
        .map_err(|_| ApiError::not_found(format!("unknown service '{}'", service)))?;

    state
        .orchestrator
        .check_health(id)
        .await
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("service {} is not configured", id)))
}
