/*
 * Responsibility
 * - GET /health (liveness)
 * - Mounted outside the token gate and audit trail
 */
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde_json::json;

use crate::state::AppState;

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({"status": "ok", "store": state.repo.backend_name()})),
    )
}
