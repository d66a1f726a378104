//! Core data models for the file sharing service.
//!
//! These entities represent user accounts and file metadata records. They
//! map cleanly to database tables via `sqlx::FromRow` and serialize
//! naturally as JSON via `serde`.

pub mod file;
pub mod user;
