//! Comment API endpoints
//!
//! - GET    /comments/:id - fetch one
//! - PUT    /comments/:id - edit own comment (Bearer auth)
//! - DELETE /comments/:id - delete own comment (Bearer auth)

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::api::posts::CommentRequest;

/// GET /comments/:id
pub async fn get_comment(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let comment = state
        .comment_service
        .get_by_id(&id)
        .await?
        .ok_or_else(ApiError::not_found)?;
    Ok(Json(comment))
}

/// PUT /comments/:id
pub async fn update_comment(
    State(state): State<AppState>,
    Path(id): Path<String>,
    user: AuthenticatedUser,
    Json(body): Json<CommentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .comment_service
        .update(&id, &body.content, &user.0.id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /comments/:id
pub async fn delete_comment(
    State(state): State<AppState>,
    Path(id): Path<String>,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    state.comment_service.delete(&id, &user.0.id).await?;
    Ok(StatusCode::NO_CONTENT)
}
