//! Defines routes for authentication, file, user, and health operations.
//!
//! ## Structure
//! - **Auth**
//!   - `POST   /login` — exchange credentials for a bearer token
//!
//! - **Files** (bearer token required)
//!   - `POST   /files/upload` — reserve a record, mint a presigned upload URL
//!   - `GET    /files` — list own records (skip/limit pagination)
//!   - `GET    /files/download/{id}` — mint a presigned download URL
//!   - `GET    /files/{id}` — read one record
//!   - `PUT    /files/{id}` — update filename/description/visibility
//!   - `DELETE /files/{id}` — remove record + backing object
//!
//! - **Users** (bearer token required; most routes admin-only)
//!   - `GET/POST /users`, `GET/PUT /users/me`, `GET/PUT /users/{id}`
//!
//! - **Health** (no token)
//!   - `GET /health`, `GET /health/db`

use axum::{
    Router,
    routing::{get, post},
};

use crate::handlers::{
    auth_handlers::login,
    file_handlers::{
        create_download_url, create_upload_url, delete_file, get_file, list_files, update_file,
    },
    health_handlers::{health, health_db},
    user_handlers::{
        create_user, list_users, read_user_by_id, read_user_me, update_user, update_user_me,
    },
};
use crate::state::AppState;

/// Build and return the router for the whole API.
///
/// The router carries shared state (`AppState`) to all handlers. Routes
/// with literal segments are registered before the `{id}` captures.
pub fn routes() -> Router<AppState> {
    Router::new()
        // health endpoints (mounted at root, no auth)
        .route("/health", get(health))
        .route("/health/db", get(health_db))
        // auth
        .route("/login", post(login))
        // file-level routes
        .route("/files/upload", post(create_upload_url))
        .route("/files/download/{id}", get(create_download_url))
        .route("/files", get(list_files))
        .route(
            "/files/{id}",
            get(get_file).put(update_file).delete(delete_file),
        )
        // user-level routes
        .route("/users", get(list_users).post(create_user))
        .route("/users/me", get(read_user_me).put(update_user_me))
        .route("/users/{id}", get(read_user_by_id).put(update_user))
}
