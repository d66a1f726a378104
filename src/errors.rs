//! Request-level error taxonomy.
//!
//! Every handler returns `Result<_, ApiError>`. Responses carry a stable
//! machine-readable `kind` plus a human-readable `detail`; internal errors
//! are logged but never echoed verbatim to the caller.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::services::object_gateway::GatewayError;
use crate::services::token_service::TokenError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Unauthenticated(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Validation(String),
    #[error("object storage unavailable: {0}")]
    StorageUnavailable(String),
    #[error("object storage rejected credentials: {0}")]
    StorageAuthFailed(String),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::StorageUnavailable(_) => StatusCode::BAD_GATEWAY,
            ApiError::StorageAuthFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Database(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::Unauthenticated(_) => "unauthenticated",
            ApiError::Forbidden(_) => "forbidden",
            ApiError::NotFound(_) => "not_found",
            ApiError::Conflict(_) => "conflict",
            ApiError::Validation(_) => "validation",
            ApiError::StorageUnavailable(_) => "storage_unavailable",
            ApiError::StorageAuthFailed(_) => "storage_auth_failed",
            ApiError::Database(_) => "database",
            ApiError::Internal(_) => "internal",
        }
    }

    /// Detail string sent to the caller. Server-side faults get a generic
    /// message; the full error stays in the logs.
    fn public_detail(&self) -> String {
        match self {
            ApiError::Database(_) | ApiError::Internal(_) => "internal server error".into(),
            ApiError::StorageAuthFailed(_) => {
                "object storage rejected the configured credentials".into()
            }
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(kind = self.kind(), error = %self, "request failed");
        }

        let body = Json(json!({
            "error": {
                "kind": self.kind(),
                "detail": self.public_detail(),
            }
        }));

        (status, body).into_response()
    }
}

impl From<TokenError> for ApiError {
    fn from(err: TokenError) -> Self {
        ApiError::Unauthenticated(err.to_string())
    }
}

impl From<GatewayError> for ApiError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::AuthFailed(detail) => ApiError::StorageAuthFailed(detail),
            GatewayError::BucketMissing(bucket) => {
                ApiError::StorageUnavailable(format!("bucket `{}` not found", bucket))
            }
            GatewayError::Unavailable(detail) | GatewayError::Presign(detail) => {
                ApiError::StorageUnavailable(detail)
            }
        }
    }
}

impl From<bcrypt::BcryptError> for ApiError {
    fn from(_: bcrypt::BcryptError) -> Self {
        ApiError::Internal("password hashing failed".into())
    }
}
