//! Post API endpoints
//!
//! - GET    /posts               - paginated list
//! - POST   /posts               - create (Basic auth)
//! - GET    /posts/:id           - fetch one
//! - PUT    /posts/:id           - update (Basic auth)
//! - DELETE /posts/:id           - delete (Basic auth)
//! - GET    /posts/:id/comments  - comments of one post
//! - POST   /posts/:id/comments  - create a comment (Bearer auth)

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;

use crate::api::common::PaginationQuery;
use crate::api::middleware::{ApiError, AppState, AuthenticatedUser, FieldError};
use crate::models::PostInput;
use crate::services::PostUpdate;

/// Post fields shared by the create and update bodies
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostFieldsRequest {
    pub title: String,
    pub short_description: String,
    pub content: String,
}

/// Request body for creating or updating a post at the top level
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostRequest {
    pub title: String,
    pub short_description: String,
    pub content: String,
    pub blog_id: String,
}

/// Request body for creating a comment
#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    pub content: String,
}

pub(crate) fn validate_post_input(body: &PostFieldsRequest) -> Result<PostInput, ApiError> {
    let mut errors = Vec::new();
    let title = body.title.trim();
    let short_description = body.short_description.trim();
    let content = body.content.trim();

    if title.is_empty() || title.len() > 30 {
        errors.push(FieldError {
            message: "title must be 1-30 characters".into(),
            field: "title".into(),
        });
    }
    if short_description.is_empty() || short_description.len() > 100 {
        errors.push(FieldError {
            message: "shortDescription must be 1-100 characters".into(),
            field: "shortDescription".into(),
        });
    }
    if content.is_empty() || content.len() > 1000 {
        errors.push(FieldError {
            message: "content must be 1-1000 characters".into(),
            field: "content".into(),
        });
    }

    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }
    Ok(PostInput {
        title: title.to_string(),
        short_description: short_description.to_string(),
        content: content.to_string(),
    })
}

/// GET /posts
pub async fn list_posts(
    State(state): State<AppState>,
    Query(query): Query<PaginationQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let page = query.to_page_request();
    let posts = state.post_service.list(&page).await?;
    Ok(Json(posts))
}

/// POST /posts
///
/// A missing blog reference is a validation error against `blogId`.
pub async fn create_post(
    State(state): State<AppState>,
    Json(body): Json<PostRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let input = validate_post_input(&PostFieldsRequest {
        title: body.title.clone(),
        short_description: body.short_description.clone(),
        content: body.content.clone(),
    })?;

    let post = state
        .post_service
        .create(input, &body.blog_id)
        .await?
        .ok_or_else(|| ApiError::validation("blogId", "blog does not exist"))?;
    Ok((StatusCode::CREATED, Json(post)))
}

/// GET /posts/:id
pub async fn get_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let post = state
        .post_service
        .get_by_id(&id)
        .await?
        .ok_or_else(ApiError::not_found)?;
    Ok(Json(post))
}

/// PUT /posts/:id
pub async fn update_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<PostRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let input = validate_post_input(&PostFieldsRequest {
        title: body.title.clone(),
        short_description: body.short_description.clone(),
        content: body.content.clone(),
    })?;

    match state.post_service.update(&id, input, &body.blog_id).await? {
        PostUpdate::Updated => Ok(StatusCode::NO_CONTENT),
        PostUpdate::PostNotFound => Err(ApiError::not_found()),
        PostUpdate::BlogNotFound => Err(ApiError::validation("blogId", "blog does not exist")),
    }
}

/// DELETE /posts/:id
pub async fn delete_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    if !state.post_service.delete(&id).await? {
        return Err(ApiError::not_found());
    }
    Ok(StatusCode::NO_CONTENT)
}

/// GET /posts/:id/comments
pub async fn list_post_comments(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<PaginationQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let page = query.to_page_request();
    let comments = state
        .comment_service
        .list_by_post(&id, &page)
        .await?
        .ok_or_else(ApiError::not_found)?;
    Ok(Json(comments))
}

/// POST /posts/:id/comments
pub async fn create_post_comment(
    State(state): State<AppState>,
    Path(id): Path<String>,
    user: AuthenticatedUser,
    Json(body): Json<CommentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let comment = state
        .comment_service
        .create(&id, &body.content, &user.0)
        .await?
        .ok_or_else(ApiError::not_found)?;
    Ok((StatusCode::CREATED, Json(comment)))
}
