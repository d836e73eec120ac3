//! API layer - HTTP handlers and routing
//!
//! This module contains all HTTP API endpoints for the inkpress API:
//! - Blog endpoints (with nested posts)
//! - Post endpoints (with nested comments)
//! - Comment endpoints
//! - User administration endpoints
//! - Auth/session endpoints
//! - Device session endpoints
//!
//! Routes are grouped by guard: the admin surface takes Basic credentials,
//! user-owned mutations take a Bearer access token, session endpoints read
//! the refresh cookie inside their handlers, and everything else is public.

pub mod auth;
pub mod blogs;
pub mod comments;
pub mod common;
pub mod devices;
pub mod middleware;
pub mod posts;
pub mod users;

use axum::{
    http::{header, HeaderValue, Method},
    middleware as axum_middleware,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub use middleware::{ApiError, AppState};

/// Build the main API router
pub fn build_api_router(state: AppState) -> Router<AppState> {
    // Admin surface (Basic credentials)
    let admin_routes = Router::new()
        .route("/blogs", post(blogs::create_blog))
        .route("/blogs/:id", put(blogs::update_blog).delete(blogs::delete_blog))
        .route("/blogs/:id/posts", post(blogs::create_blog_post))
        .route("/posts", post(posts::create_post))
        .route("/posts/:id", put(posts::update_post).delete(posts::delete_post))
        .route("/users", post(users::create_user))
        .route("/users/:id", delete(users::delete_user))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_basic_auth,
        ));

    // User-owned mutations and /auth/me (Bearer access token)
    let bearer_routes = Router::new()
        .route("/auth/me", get(auth::me))
        .route("/posts/:id/comments", post(posts::create_post_comment))
        .route(
            "/comments/:id",
            put(comments::update_comment).delete(comments::delete_comment),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_bearer_auth,
        ));

    // Public routes; session endpoints validate the refresh cookie themselves
    Router::new()
        .route("/blogs", get(blogs::list_blogs))
        .route("/blogs/:id", get(blogs::get_blog))
        .route("/blogs/:id/posts", get(blogs::list_blog_posts))
        .route("/posts", get(posts::list_posts))
        .route("/posts/:id", get(posts::get_post))
        .route("/posts/:id/comments", get(posts::list_post_comments))
        .route("/comments/:id", get(comments::get_comment))
        .route("/users", get(users::list_users))
        .route("/auth/login", post(auth::login))
        .route("/auth/registration", post(auth::registration))
        .route(
            "/auth/registration-confirmation",
            post(auth::registration_confirmation),
        )
        .route(
            "/auth/registration-email-resending",
            post(auth::registration_email_resending),
        )
        .route("/auth/password-recovery", post(auth::password_recovery))
        .route("/auth/new-password", post(auth::new_password))
        .route("/auth/refresh-token", post(auth::refresh_token))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/confirm-registration", get(auth::confirm_registration))
        .route("/auth/confirm-email", post(auth::confirm_email))
        .route("/security/devices", get(devices::list_devices).delete(devices::revoke_other_devices))
        .route("/security/devices/:deviceId", delete(devices::revoke_device))
        .merge(admin_routes)
        .merge(bearer_routes)
}

/// Build the complete router with middleware
pub fn build_router(state: AppState, cors_origin: &str) -> Router {
    // CORS allows credentials so the refresh cookie survives browser calls
    let cors = CorsLayer::new()
        .allow_origin(cors_origin.parse::<HeaderValue>().unwrap())
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::COOKIE])
        .allow_credentials(true);

    Router::new()
        .merge(build_api_router(state.clone()))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
