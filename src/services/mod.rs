//! Service layer: persistence, token issuance, and storage-gateway logic
//! behind the HTTP handlers.

pub mod file_service;
pub mod object_gateway;
pub mod token_service;
pub mod user_service;
