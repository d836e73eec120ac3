//! API middleware
//!
//! Application state, the API error type, and the three auth guards:
//! Bearer access tokens for user endpoints, Basic credentials for the
//! admin surface, and the refresh cookie for session endpoints.

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use data_encoding::BASE64;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;

use crate::config::Config;
use crate::models::UserAccount;
use crate::services::{
    AccountError, AccountService, BlogService, CommentError, CommentService, JwtService,
    RateLimitService, SessionError, SessionService, TokenKind, UserService,
};

/// Name of the refresh-token cookie
pub const REFRESH_COOKIE: &str = "refreshToken";

/// Application state containing shared services
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub blog_service: Arc<BlogService>,
    pub post_service: Arc<crate::services::PostService>,
    pub comment_service: Arc<CommentService>,
    pub user_service: Arc<UserService>,
    pub account_service: Arc<AccountService>,
    pub session_service: Arc<SessionService>,
    pub rate_limiter: Arc<RateLimitService>,
    pub jwt: Arc<JwtService>,
}

/// Authenticated account extracted from a Bearer access token
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub UserAccount);

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or_else(ApiError::unauthorized)
    }
}

/// One field-tagged validation message, as it appears on the wire
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldError {
    pub message: String,
    pub field: String,
}

/// API error mapped to an HTTP status by `IntoResponse`
#[derive(Debug)]
pub enum ApiError {
    /// 400 with `{errorsMessages: [...]}`
    Validation(Vec<FieldError>),
    /// 401, body withheld
    Unauthorized,
    /// 403
    Forbidden,
    /// 404
    NotFound,
    /// 429, with a Retry-After hint
    RateLimited { retry_after_secs: i64 },
    /// 500; logged, body withheld
    Internal(anyhow::Error),
}

impl ApiError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation(vec![FieldError {
            message: message.into(),
            field: field.into(),
        }])
    }

    pub fn unauthorized() -> Self {
        Self::Unauthorized
    }

    pub fn forbidden() -> Self {
        Self::Forbidden
    }

    pub fn not_found() -> Self {
        Self::NotFound
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({ "errorsMessages": errors })),
            )
                .into_response(),
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
            ApiError::Forbidden => StatusCode::FORBIDDEN.into_response(),
            ApiError::NotFound => StatusCode::NOT_FOUND.into_response(),
            ApiError::RateLimited { retry_after_secs } => (
                StatusCode::TOO_MANY_REQUESTS,
                [(header::RETRY_AFTER, retry_after_secs.to_string())],
            )
                .into_response(),
            ApiError::Internal(e) => {
                tracing::error!(error = ?e, "internal server error");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        ApiError::Internal(e)
    }
}

impl From<AccountError> for ApiError {
    fn from(e: AccountError) -> Self {
        match e {
            AccountError::Field { field, message } => ApiError::validation(field, message),
            AccountError::TooManyEmails => ApiError::RateLimited {
                retry_after_secs: 3600,
            },
            AccountError::Internal(e) => ApiError::Internal(e),
        }
    }
}

impl From<SessionError> for ApiError {
    fn from(e: SessionError) -> Self {
        match e {
            SessionError::Unauthorized => ApiError::Unauthorized,
            SessionError::Forbidden => ApiError::Forbidden,
            SessionError::DeviceNotFound => ApiError::NotFound,
            SessionError::Internal(e) => ApiError::Internal(e),
        }
    }
}

impl From<CommentError> for ApiError {
    fn from(e: CommentError) -> Self {
        match e {
            CommentError::NotFound => ApiError::NotFound,
            CommentError::Forbidden => ApiError::Forbidden,
            CommentError::InvalidContent => {
                ApiError::validation("content", "content must be 20-300 characters")
            }
            CommentError::Internal(e) => ApiError::Internal(e),
        }
    }
}

/// Bearer-token authentication middleware
///
/// Verifies the access token and loads the account it names; the account
/// rides the request as an `AuthenticatedUser` extension.
pub async fn require_bearer_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(request.headers()).ok_or_else(ApiError::unauthorized)?;

    let claims = state
        .jwt
        .verify(TokenKind::Access, &token)
        .ok_or_else(ApiError::unauthorized)?;

    let account = state
        .account_service
        .get_by_id(&claims.user_id)
        .await?
        .ok_or_else(ApiError::unauthorized)?;

    request.extensions_mut().insert(AuthenticatedUser(account));
    Ok(next.run(request).await)
}

/// Basic-credential guard for the admin surface
pub async fn require_basic_auth(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.strip_prefix("Basic "))
        .ok_or_else(ApiError::unauthorized)?;

    let decoded = BASE64
        .decode(header.as_bytes())
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
        .ok_or_else(ApiError::unauthorized)?;

    let expected = format!(
        "{}:{}",
        state.config.auth.basic_user, state.config.auth.basic_password
    );
    if decoded != expected {
        return Err(ApiError::unauthorized());
    }

    Ok(next.run(request).await)
}

/// Extract a Bearer token from the Authorization header
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(str::to_string)
}

/// Extract the refresh token from the session cookie
pub fn refresh_cookie(headers: &HeaderMap) -> Option<String> {
    let cookies = headers.get(header::COOKIE)?.to_str().ok()?;
    for cookie in cookies.split(';') {
        if let Some(token) = cookie.trim().strip_prefix("refreshToken=") {
            if !token.is_empty() {
                return Some(token.to_string());
            }
        }
    }
    None
}

/// Build the Set-Cookie value carrying a refresh token
pub fn refresh_cookie_value(token: &str, max_age_secs: i64) -> String {
    format!(
        "{}={}; Path=/; HttpOnly; Secure; SameSite=Lax; Max-Age={}",
        REFRESH_COOKIE, token, max_age_secs
    )
}

/// Build the Set-Cookie value clearing the refresh token
pub fn clear_refresh_cookie() -> String {
    format!("{}=; Path=/; HttpOnly; Secure; SameSite=Lax; Max-Age=0", REFRESH_COOKIE)
}

/// Client address for rate limiting and device records.
///
/// Proxy headers win over the socket address.
pub fn client_ip(headers: &HeaderMap, addr: Option<SocketAddr>) -> String {
    if let Some(forwarded) = headers.get("x-forwarded-for") {
        if let Ok(forwarded) = forwarded.to_str() {
            if let Some(ip) = forwarded.split(',').next() {
                let ip = ip.trim();
                if !ip.is_empty() {
                    return ip.to_string();
                }
            }
        }
    }
    if let Some(real_ip) = headers.get("x-real-ip") {
        if let Ok(ip) = real_ip.to_str() {
            return ip.to_string();
        }
    }
    addr.map(|a| a.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// User-agent string, defaulting when the header is absent
pub fn user_agent(headers: &HeaderMap) -> String {
    headers
        .get(header::USER_AGENT)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("unknown")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_refresh_cookie_parsing() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; refreshToken=abc.def.ghi; other=1"),
        );
        assert_eq!(refresh_cookie(&headers).as_deref(), Some("abc.def.ghi"));

        headers.insert(header::COOKIE, HeaderValue::from_static("refreshToken="));
        assert!(refresh_cookie(&headers).is_none());

        headers.remove(header::COOKIE);
        assert!(refresh_cookie(&headers).is_none());
    }

    #[test]
    fn test_bearer_token_parsing() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer tok-123"),
        );
        assert_eq!(bearer_token(&headers).as_deref(), Some("tok-123"));

        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Basic dXNlcjpwYXNz"),
        );
        assert!(bearer_token(&headers).is_none());
    }

    #[test]
    fn test_client_ip_prefers_forwarded_header() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.9, 10.0.0.1"),
        );
        let addr: SocketAddr = "127.0.0.1:1234".parse().unwrap();
        assert_eq!(client_ip(&headers, Some(addr)), "203.0.113.9");

        headers.clear();
        assert_eq!(client_ip(&headers, Some(addr)), "127.0.0.1");
        assert_eq!(client_ip(&headers, None), "unknown");
    }

    #[test]
    fn test_cookie_values() {
        let set = refresh_cookie_value("tok", 600);
        assert!(set.contains("HttpOnly"));
        assert!(set.contains("Secure"));
        assert!(set.contains("Max-Age=600"));

        let clear = clear_refresh_cookie();
        assert!(clear.contains("Max-Age=0"));
    }
}
