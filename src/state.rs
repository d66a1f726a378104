//! Shared application state threaded through the router.

use sqlx::SqlitePool;
use std::sync::Arc;

use crate::services::{
    file_service::FileService, token_service::TokenService, user_service::UserService,
};

/// Everything a handler needs. Cheap to clone; each field is a thin handle.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<SqlitePool>,
    pub users: UserService,
    pub files: FileService,
    pub tokens: TokenService,
}
