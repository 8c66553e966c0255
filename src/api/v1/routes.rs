/*
 * Responsibility
 * - v1 URL layout
 * - /health, and the two ends of the SSO handshake under /session
 */
use axum::{Router, routing::get};

use crate::api::v1::handlers::{
    health::health,
    sso::{sso_login, sso_redirect},
};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/session/sso", get(sso_redirect))
        .route("/session/sso_login", get(sso_login))
}
