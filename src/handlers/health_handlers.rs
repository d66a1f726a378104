//! Health & liveness handlers.
//!
//! - GET /health     -> simple liveness ("ok")
//! - GET /health/db  -> checks database connectivity

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    service: &'static str,
}

#[derive(Serialize)]
struct DbHealthResponse {
    status: &'static str,
    database: &'static str,
    error: Option<String>,
}

/// `GET /health`
///
/// Cheap liveness probe; never performs I/O.
pub async fn health() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok",
            service: "we-upload-api",
        }),
    )
}

/// `GET /health/db`
///
/// Runs `SELECT 1` against the pool. HTTP 200 when it answers,
/// HTTP 503 otherwise.
pub async fn health_db(State(state): State<AppState>) -> impl IntoResponse {
    match sqlx::query_scalar::<_, i64>("SELECT 1")
        .fetch_one(&*state.db)
        .await
    {
        Ok(1) => (
            StatusCode::OK,
            Json(DbHealthResponse {
                status: "ok",
                database: "connected",
                error: None,
            }),
        ),
        Ok(other) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(DbHealthResponse {
                status: "error",
                database: "unexpected",
                error: Some(format!("unexpected result: {}", other)),
            }),
        ),
        Err(err) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(DbHealthResponse {
                status: "error",
                database: "unreachable",
                error: Some(err.to_string()),
            }),
        ),
    }
}
