/*
 * Responsibility
 * - GET /health (liveness + which nonce backend is wired)
 */
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde_json::json;

use crate::state::AppState;

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({
            "status": "ok",
            "nonce_store": state.sso.nonces().backend_name(),
        })),
    )
}
