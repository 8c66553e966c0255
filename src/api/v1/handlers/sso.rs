/*
 * Responsibility
 * - GET /session/sso        -> 302 to the remote site with a signed payload
 * - GET /session/sso_login  -> validate the callback, consume its nonce
 * - No user lookup/creation here: the validated fields are handed back as JSON
 */
use axum::{
    Json,
    extract::{Query, RawQuery, State},
    http::{StatusCode, header},
    response::IntoResponse,
};

use crate::api::v1::dto::sso::{SsoLoginResponse, SsoRedirectQuery};
use crate::error::AppError;
use crate::services::sso::{SignedPayload, SsoError, SsoPayload};
use crate::state::AppState;

pub async fn sso_redirect(
    State(state): State<AppState>,
    Query(query): Query<SsoRedirectQuery>,
) -> Result<impl IntoResponse, AppError> {
    let url = state
        .sso
        .redirect_url(query.return_path(), SsoPayload::default())
        .await?;

    Ok((StatusCode::FOUND, [(header::LOCATION, url)]))
}

pub async fn sso_login(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> Result<Json<SsoLoginResponse>, AppError> {
    let signed = SignedPayload::from_query(query.as_deref().unwrap_or_default())
        .map_err(SsoError::from)?;

    let login = state.sso.complete(&signed).await?;

    Ok(Json(SsoLoginResponse {
        payload: login.payload,
        return_path: login.return_path,
    }))
}
