use std::collections::BTreeSet;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::middleware::CurrentUser;
use crate::api::state::AppState;
use crate::application::UserChanges;
use crate::domain::user::{PlatformRole, User, UserStatus};

/// Public view of a user; never carries the password hash
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub avatar: Option<String>,
    pub github: Option<String>,
    pub linkedin: Option<String>,
    pub status: UserStatus,
    pub platform_roles: BTreeSet<PlatformRole>,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id(),
            username: user.username().to_string(),
            email: user.email().as_str().to_string(),
            avatar: user.avatar().map(str::to_string),
            github: user.github().map(str::to_string),
            linkedin: user.linkedin().map(str::to_string),
            status: user.status(),
            platform_roles: user.platform_roles().clone(),
            created_at: user.created_at(),
        }
    }
}

/// GET /api/users
pub async fn list_users(
    State(state): State<AppState>,
    _auth: CurrentUser,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    let users = state.users.list_users().await?;
    Ok(Json(users.iter().map(UserResponse::from).collect()))
}

/// GET /api/users/:id
pub async fn get_user(
    State(state): State<AppState>,
    _auth: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state.users.get_user(id).await?;
    Ok(Json(UserResponse::from(&user)))
}

/// PATCH /api/users/:id
pub async fn update_user(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<Uuid>,
    Json(changes): Json<UserChanges>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state.users.update_user(actor.id(), id, changes).await?;
    Ok(Json(UserResponse::from(&user)))
}

/// POST /api/users/:id/ban
pub async fn ban_user(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state.users.ban_user(actor.id(), id).await?;
    Ok(Json(UserResponse::from(&user)))
}

/// DELETE /api/users/:id
pub async fn delete_user(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.users.delete_user(actor.id(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}
