//! User administration API endpoints
//!
//! - GET    /users     - paginated list with login/email search
//! - POST   /users     - create a pre-confirmed account (Basic auth)
//! - DELETE /users/:id - delete an account (Basic auth)

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::api::common::UserListQuery;
use crate::api::middleware::{ApiError, AppState};
use crate::models::UserAccount;

/// Request body for admin user creation
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub login: String,
    pub email: String,
    pub password: String,
}

/// Admin view of an account
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: String,
    pub login: String,
    pub email: String,
    pub created_at: String,
}

impl From<UserAccount> for UserView {
    fn from(account: UserAccount) -> Self {
        Self {
            id: account.id,
            login: account.login,
            email: account.email,
            created_at: account.created_at.to_rfc3339(),
        }
    }
}

/// GET /users
pub async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<UserListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let page = query.to_page_request();
    let users = state
        .user_service
        .list(
            &page,
            query.search_login_term.as_deref(),
            query.search_email_term.as_deref(),
        )
        .await?;
    Ok(Json(users.map(UserView::from)))
}

/// POST /users
pub async fn create_user(
    State(state): State<AppState>,
    Json(body): Json<CreateUserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let account = state
        .account_service
        .create_confirmed(&body.login, &body.email, &body.password)
        .await?;
    Ok((StatusCode::CREATED, Json(UserView::from(account))))
}

/// DELETE /users/:id
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    if !state.user_service.delete(&id).await? {
        return Err(ApiError::not_found());
    }
    Ok(StatusCode::NO_CONTENT)
}
