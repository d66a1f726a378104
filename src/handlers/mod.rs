//! HTTP handlers, grouped by resource.

pub mod auth_handlers;
pub mod file_handlers;
pub mod health_handlers;
pub mod user_handlers;
