//! Blog API endpoints
//!
//! - GET    /blogs             - paginated list with optional name search
//! - POST   /blogs             - create (Basic auth)
//! - GET    /blogs/:id         - fetch one
//! - PUT    /blogs/:id         - update (Basic auth)
//! - DELETE /blogs/:id         - delete (Basic auth)
//! - GET    /blogs/:id/posts   - posts of one blog
//! - POST   /blogs/:id/posts   - create a post under the blog (Basic auth)

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

use crate::api::common::{BlogListQuery, PaginationQuery};
use crate::api::middleware::{ApiError, AppState, FieldError};
use crate::api::posts::{validate_post_input, PostFieldsRequest};
use crate::models::BlogInput;

static WEBSITE_URL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^https://([a-zA-Z0-9_-]+\.)+[a-zA-Z0-9_-]+(/.*)?$").expect("valid url regex")
});

/// Request body for creating or updating a blog
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogRequest {
    pub name: String,
    pub website_url: String,
}

fn validate_blog(body: &BlogRequest) -> Result<BlogInput, ApiError> {
    let mut errors = Vec::new();
    let name = body.name.trim();

    if name.is_empty() || name.len() > 15 {
        errors.push(FieldError {
            message: "name must be 1-15 characters".into(),
            field: "name".into(),
        });
    }
    if body.website_url.len() > 100 || !WEBSITE_URL_RE.is_match(&body.website_url) {
        errors.push(FieldError {
            message: "websiteUrl must be a https URL of at most 100 characters".into(),
            field: "websiteUrl".into(),
        });
    }

    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }
    Ok(BlogInput {
        name: name.to_string(),
        website_url: body.website_url.clone(),
    })
}

/// GET /blogs
pub async fn list_blogs(
    State(state): State<AppState>,
    Query(query): Query<BlogListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let page = query.to_page_request();
    let blogs = state
        .blog_service
        .list(&page, query.search_name_term.as_deref())
        .await?;
    Ok(Json(blogs))
}

/// POST /blogs
pub async fn create_blog(
    State(state): State<AppState>,
    Json(body): Json<BlogRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let input = validate_blog(&body)?;
    let blog = state.blog_service.create(input).await?;
    Ok((StatusCode::CREATED, Json(blog)))
}

/// GET /blogs/:id
pub async fn get_blog(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let blog = state
        .blog_service
        .get_by_id(&id)
        .await?
        .ok_or_else(ApiError::not_found)?;
    Ok(Json(blog))
}

/// PUT /blogs/:id
pub async fn update_blog(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<BlogRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let input = validate_blog(&body)?;
    if !state.blog_service.update(&id, input).await? {
        return Err(ApiError::not_found());
    }
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /blogs/:id
pub async fn delete_blog(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    if !state.blog_service.delete(&id).await? {
        return Err(ApiError::not_found());
    }
    Ok(StatusCode::NO_CONTENT)
}

/// GET /blogs/:id/posts
pub async fn list_blog_posts(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<PaginationQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let page = query.to_page_request();
    let posts = state
        .blog_service
        .list_posts(&id, &page)
        .await?
        .ok_or_else(ApiError::not_found)?;
    Ok(Json(posts))
}

/// POST /blogs/:id/posts
pub async fn create_blog_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<PostFieldsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let input = validate_post_input(&body)?;
    let post = state
        .blog_service
        .create_post(&id, input)
        .await?
        .ok_or_else(ApiError::not_found)?;
    Ok((StatusCode::CREATED, Json(post)))
}
