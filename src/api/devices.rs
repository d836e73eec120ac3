//! Device session API endpoints
//!
//! All three take the refresh cookie, not a Bearer token.
//!
//! - GET    /security/devices           - active sessions of the user
//! - DELETE /security/devices           - drop all sessions but this one
//! - DELETE /security/devices/:deviceId - drop one session

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};

use crate::api::middleware::{refresh_cookie, ApiError, AppState};

/// GET /security/devices
pub async fn list_devices(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let token = refresh_cookie(&headers).ok_or_else(ApiError::unauthorized)?;
    let devices = state.session_service.list_devices(&token).await?;
    Ok(Json(devices))
}

/// DELETE /security/devices
pub async fn revoke_other_devices(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let token = refresh_cookie(&headers).ok_or_else(ApiError::unauthorized)?;
    state.session_service.revoke_other_devices(&token).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /security/devices/:deviceId
pub async fn revoke_device(
    State(state): State<AppState>,
    Path(device_id): Path<String>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let token = refresh_cookie(&headers).ok_or_else(ApiError::unauthorized)?;
    state.session_service.revoke_device(&token, &device_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
