//! Authentication API endpoints
//!
//! - POST /auth/login                        - credentials -> token pair
//! - POST /auth/registration                 - create an unconfirmed account
//! - POST /auth/registration-confirmation    - confirm by code (body)
//! - POST /auth/registration-email-resending - issue and send a new code
//! - POST /auth/password-recovery            - send a recovery code
//! - POST /auth/new-password                 - set password by recovery code
//! - POST /auth/refresh-token                - rotate the refresh token
//! - POST /auth/logout                       - consume the refresh token
//! - GET  /auth/me                           - current account (Bearer auth)
//! - GET  /auth/confirm-registration?code=   - link target from the email
//! - POST /auth/confirm-email                - confirm by (email, code) pair
//!
//! The refresh token travels only in an HttpOnly cookie; the access token
//! only in response bodies and Authorization headers. Registration-family
//! endpoints are rate limited per source address and category.

use axum::{
    extract::{ConnectInfo, Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

use crate::api::middleware::{
    clear_refresh_cookie, client_ip, refresh_cookie, refresh_cookie_value, user_agent, ApiError,
    AppState, AuthenticatedUser,
};
use crate::models::RouteCategory;
use crate::services::{RateLimitDecision, TokenPair};

/// Request body for login
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub login_or_email: String,
    pub password: String,
}

/// Request body for registration
#[derive(Debug, Deserialize)]
pub struct RegistrationRequest {
    pub login: String,
    pub email: String,
    pub password: String,
}

/// Request body for confirmation by code
#[derive(Debug, Deserialize)]
pub struct ConfirmationRequest {
    pub code: String,
}

/// Request body carrying only an email
#[derive(Debug, Deserialize)]
pub struct EmailRequest {
    pub email: String,
}

/// Request body for setting a new password
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPasswordRequest {
    pub new_password: String,
    pub recovery_code: String,
}

/// Request body for confirmation by (email, code)
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmEmailRequest {
    pub email: String,
    pub confirmation_code: String,
}

/// Query parameters of the emailed confirmation link
#[derive(Debug, Deserialize)]
pub struct ConfirmCodeQuery {
    pub code: Option<String>,
}

/// Response body carrying the access token
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessTokenResponse {
    pub access_token: String,
}

/// Response body for /auth/me
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub email: String,
    pub login: String,
    pub user_id: String,
}

async fn guard_rate_limit(
    state: &AppState,
    ip: &str,
    category: RouteCategory,
) -> Result<(), ApiError> {
    match state.rate_limiter.check(ip, category).await? {
        RateLimitDecision::Allowed => Ok(()),
        RateLimitDecision::Limited { retry_after_secs } => {
            Err(ApiError::RateLimited { retry_after_secs })
        }
    }
}

fn token_pair_response(state: &AppState, pair: TokenPair) -> impl IntoResponse {
    let cookie = refresh_cookie_value(&pair.refresh_token, state.config.auth.refresh_ttl_secs);
    let mut headers = HeaderMap::new();
    if let Ok(value) = HeaderValue::from_str(&cookie) {
        headers.insert(header::SET_COOKIE, value);
    }
    (
        headers,
        Json(AccessTokenResponse {
            access_token: pair.access_token,
        }),
    )
}

/// POST /auth/login
pub async fn login(
    State(state): State<AppState>,
    addr: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    Json(body): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let ip = client_ip(&headers, addr.map(|a| a.0));
    guard_rate_limit(&state, &ip, RouteCategory::Login).await?;

    let account = state
        .account_service
        .check_credentials(&body.login_or_email, &body.password)
        .await?
        .ok_or_else(ApiError::unauthorized)?;

    let pair = state
        .session_service
        .login(&account.id, &ip, &user_agent(&headers))
        .await?;

    Ok(token_pair_response(&state, pair))
}

/// POST /auth/registration
pub async fn registration(
    State(state): State<AppState>,
    addr: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    Json(body): Json<RegistrationRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let ip = client_ip(&headers, addr.map(|a| a.0));
    guard_rate_limit(&state, &ip, RouteCategory::Registration).await?;

    state
        .account_service
        .register(&body.login, &body.email, &body.password, Some(ip))
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// POST /auth/registration-confirmation
pub async fn registration_confirmation(
    State(state): State<AppState>,
    addr: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    Json(body): Json<ConfirmationRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let ip = client_ip(&headers, addr.map(|a| a.0));
    guard_rate_limit(&state, &ip, RouteCategory::Confirmation).await?;

    state.account_service.confirm_by_code(&body.code).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /auth/registration-email-resending
pub async fn registration_email_resending(
    State(state): State<AppState>,
    addr: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    Json(body): Json<EmailRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let ip = client_ip(&headers, addr.map(|a| a.0));
    guard_rate_limit(&state, &ip, RouteCategory::EmailResend).await?;

    state.account_service.resend_confirmation(&body.email).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /auth/password-recovery
pub async fn password_recovery(
    State(state): State<AppState>,
    addr: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    Json(body): Json<EmailRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let ip = client_ip(&headers, addr.map(|a| a.0));
    guard_rate_limit(&state, &ip, RouteCategory::PasswordRecovery).await?;

    state.account_service.recover_password(&body.email).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /auth/new-password
pub async fn new_password(
    State(state): State<AppState>,
    addr: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    Json(body): Json<NewPasswordRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let ip = client_ip(&headers, addr.map(|a| a.0));
    guard_rate_limit(&state, &ip, RouteCategory::NewPassword).await?;

    state
        .account_service
        .new_password(&body.new_password, &body.recovery_code)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /auth/refresh-token
pub async fn refresh_token(
    State(state): State<AppState>,
    addr: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let token = refresh_cookie(&headers).ok_or_else(ApiError::unauthorized)?;
    let ip = client_ip(&headers, addr.map(|a| a.0));

    let pair = state
        .session_service
        .rotate(&token, &ip, &user_agent(&headers))
        .await?;

    Ok(token_pair_response(&state, pair))
}

/// POST /auth/logout
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let token = refresh_cookie(&headers).ok_or_else(ApiError::unauthorized)?;
    state.session_service.logout(&token).await?;

    let mut response_headers = HeaderMap::new();
    if let Ok(value) = HeaderValue::from_str(&clear_refresh_cookie()) {
        response_headers.insert(header::SET_COOKIE, value);
    }
    Ok((StatusCode::NO_CONTENT, response_headers))
}

/// GET /auth/me
pub async fn me(user: AuthenticatedUser) -> Json<MeResponse> {
    Json(MeResponse {
        email: user.0.email,
        login: user.0.login,
        user_id: user.0.id,
    })
}

/// GET /auth/confirm-registration?code=...
///
/// Target of the link in the confirmation email.
pub async fn confirm_registration(
    State(state): State<AppState>,
    Query(query): Query<ConfirmCodeQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let code = query
        .code
        .ok_or_else(|| ApiError::validation("code", "query param is empty"))?;
    state.account_service.confirm_by_code(&code).await?;
    Ok((StatusCode::CREATED, "Email confirmed"))
}

/// POST /auth/confirm-email
pub async fn confirm_email(
    State(state): State<AppState>,
    Json(body): Json<ConfirmEmailRequest>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .account_service
        .confirm_by_email(&body.email, &body.confirmation_code)
        .await?;
    Ok((StatusCode::CREATED, "Email confirmed"))
}
