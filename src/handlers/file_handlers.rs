//! HTTP handlers for file metadata and presigned-URL operations.
//!
//! Handlers fetch the record, consult the access policy, and delegate to
//! `FileService`. A missing record is a 404; an existing record the actor
//! may not touch is a 403. File bytes never pass through these handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::ApiError;
use crate::extract::CurrentUser;
use crate::models::file::{
    FileCreate, FileDownloadResponse, FileRecord, FileUpdate, FileUploadResponse,
};
use crate::policy::{Decision, FileAction, authorize};
use crate::state::AppState;

/// Pagination query params for `GET /files`.
#[derive(Debug, Deserialize)]
pub struct Pagination {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

/// Fetch a record and check `action` against the policy in one step.
async fn fetch_authorized(
    state: &AppState,
    user: &CurrentUser,
    id: Uuid,
    action: FileAction,
) -> Result<FileRecord, ApiError> {
    let record = state
        .files
        .get(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("file not found".into()))?;

    match authorize(user.actor(), record.owner_id, record.is_public, action) {
        Decision::Allow => Ok(record),
        Decision::Deny => Err(ApiError::Forbidden(
            "not enough permissions to access this file".into(),
        )),
    }
}

/// `POST /files/upload` — reserve a metadata record and mint a presigned
/// upload URL for it.
pub async fn create_upload_url(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(info): Json<FileCreate>,
) -> Result<Json<FileUploadResponse>, ApiError> {
    // A record is always created by its eventual owner; the policy check is
    // the same one every other operation goes through.
    if authorize(user.actor(), user.0.id, info.is_public, FileAction::Upload) == Decision::Deny {
        return Err(ApiError::Forbidden("not allowed to upload".into()));
    }
    let response = state.files.create_upload_url(info, user.0.id).await?;
    Ok(Json(response))
}

/// `GET /files` — list the caller's records, newest first.
pub async fn list_files(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(page): Query<Pagination>,
) -> Result<Json<Vec<FileRecord>>, ApiError> {
    let records = state
        .files
        .list_by_owner(user.0.id, page.skip.unwrap_or(0), page.limit.unwrap_or(100))
        .await?;
    Ok(Json(records))
}

/// `GET /files/{id}` — read one record, subject to the visibility policy.
pub async fn get_file(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<FileRecord>, ApiError> {
    let record = fetch_authorized(&state, &user, id, FileAction::ReadMetadata).await?;
    Ok(Json(record))
}

/// `PUT /files/{id}` — update filename/description/visibility.
pub async fn update_file(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(changes): Json<FileUpdate>,
) -> Result<Json<FileRecord>, ApiError> {
    let record = fetch_authorized(&state, &user, id, FileAction::UpdateMetadata).await?;
    let updated = state.files.update(&record, changes).await?;
    Ok(Json(updated))
}

/// `DELETE /files/{id}` — remove the record and best-effort reclaim the
/// backing object. Returns the removed record.
pub async fn delete_file(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<FileRecord>, ApiError> {
    let record = fetch_authorized(&state, &user, id, FileAction::Delete).await?;
    state.files.remove(&record).await?;
    Ok(Json(record))
}

/// `GET /files/download/{id}` — mint a presigned download URL. Gated by the
/// same rule as metadata reads.
pub async fn create_download_url(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<FileDownloadResponse>, ApiError> {
    let record = fetch_authorized(&state, &user, id, FileAction::Download).await?;
    let response = state.files.create_download_url(&record).await?;
    Ok(Json(response))
}
