use axum::extract::State;
use axum::Json;

use gate_models::GatewayStatus;

use crate::state::AppState;

/// Configuration, health and breaker state for every service.
pub async fn status(State(state): State<AppState>) -> Json<GatewayStatus> {
    Json(state.orchestrator.status().await)
}
