/*
 * Responsibility
 * - AppError shared by the HTTP surface
 * - IntoResponse (HTTP status / JSON error body)
 * - Mapping of SSO handshake failures: each stage keeps its own code
 */
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::config::ConfigError;
use crate::services::nonce::NonceError;
use crate::services::sso::SsoError;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{code}: {message}")]
    BadRequest { code: &'static str, message: String },
    #[error("{code}: {message}")]
    Forbidden { code: &'static str, message: String },
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("internal server error")]
    Internal,
}

impl AppError {
    pub fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        Self::BadRequest {
            code,
            message: message.into(),
        }
    }

    pub fn forbidden(code: &'static str, message: impl Into<String>) -> Self {
        Self::Forbidden {
            code,
            message: message.into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AppError::BadRequest { code, message } => (StatusCode::BAD_REQUEST, code, message),
            AppError::Forbidden { code, message } => (StatusCode::FORBIDDEN, code, message),
            AppError::Config(_) | AppError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_SERVER_ERROR",
                "internal server error".into(),
            ),
        };

        let body = ErrorResponse {
            error: ErrorBody { code, message },
        };

        (status, Json(body)).into_response()
    }
}

impl From<SsoError> for AppError {
    fn from(e: SsoError) -> Self {
        match e {
            // Our own outbound fields clash; nothing the client can fix.
            SsoError::Encode(e) => {
                tracing::error!(error = %e, "Failed to encode sso payload");
                AppError::Internal
            }

            // Malformed message: the client (or remote site) sent garbage.
            SsoError::Decode(e) => AppError::bad_request("SSO_MALFORMED_PAYLOAD", e.to_string()),

            // Tampered message or secrets out of sync between the two sites.
            SsoError::Signature(_) => {
                AppError::forbidden("SSO_BAD_SIGNATURE", "sso payload signature mismatch")
            }

            SsoError::Nonce(NonceError::Backend(_) | NonceError::Entropy) => AppError::Internal,
            SsoError::Nonce(e) => AppError::forbidden("SSO_INVALID_NONCE", e.to_string()),
        }
    }
}
