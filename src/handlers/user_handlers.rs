//! HTTP handlers for user accounts.
//!
//! Account creation and arbitrary-user updates are admin-only; `/users/me`
//! lets a user manage their own profile.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use uuid::Uuid;

use crate::errors::ApiError;
use crate::extract::CurrentUser;
use crate::handlers::file_handlers::Pagination;
use crate::models::user::{UserCreate, UserResponse, UserUpdate};
use crate::state::AppState;

/// `GET /users` — list accounts (admin only).
pub async fn list_users(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(page): Query<Pagination>,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    user.require_admin()?;
    let users = state
        .users
        .list(page.skip.unwrap_or(0), page.limit.unwrap_or(100))
        .await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

/// `POST /users` — create an account (admin only).
pub async fn create_user(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(new_user): Json<UserCreate>,
) -> Result<Json<UserResponse>, ApiError> {
    user.require_admin()?;
    let created = state.users.create(new_user).await?;
    Ok(Json(created.into()))
}

/// `GET /users/me` — the caller's own account.
pub async fn read_user_me(user: CurrentUser) -> Json<UserResponse> {
    Json(user.0.into())
}

/// `PUT /users/me` — update own email, password, or display name.
///
/// Role and active flags are not self-service; they are dropped here even
/// if present in the body.
pub async fn update_user_me(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(changes): Json<UserUpdate>,
) -> Result<Json<UserResponse>, ApiError> {
    let changes = UserUpdate {
        email: changes.email,
        password: changes.password,
        full_name: changes.full_name,
        is_active: None,
        is_superuser: None,
    };
    let updated = state.users.update(&user.0, changes).await?;
    Ok(Json(updated.into()))
}

/// `GET /users/{id}` — own account, or any account for admins.
pub async fn read_user_by_id(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<UserResponse>, ApiError> {
    if id == user.0.id {
        return Ok(Json(user.0.into()));
    }
    user.require_admin()
        .map_err(|_| ApiError::Forbidden("only administrators can access other users".into()))?;

    let found = state
        .users
        .get(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("user not found".into()))?;
    Ok(Json(found.into()))
}

/// `PUT /users/{id}` — update any account (admin only).
pub async fn update_user(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(changes): Json<UserUpdate>,
) -> Result<Json<UserResponse>, ApiError> {
    user.require_admin()?;
    let target = state
        .users
        .get(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("user not found".into()))?;
    let updated = state.users.update(&target, changes).await?;
    Ok(Json(updated.into()))
}
