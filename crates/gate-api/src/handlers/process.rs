//! Orchestration handler.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde_json::Value;
use tracing::info;

use gate_models::OrchestrationResponse;

use crate::state::AppState;

/// Route one request to its guard service.
///
/// Always answers 200: failures are reported in the response body.
pub async fn process(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Json<OrchestrationResponse> {
    match body {
        Ok(Json(raw)) => Json(state.orchestrator.process_value(raw).await),
        Err(rejection) => {
            info!(status = %rejection.status(), "Rejected malformed request body");
            Json(OrchestrationResponse::failed(
                "",
                "",
                format!("Validation error: malformed request body: {}", rejection.body_text()),
                0,
            ))
        }
    }
}
