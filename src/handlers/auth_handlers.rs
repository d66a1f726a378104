//! Login handler.

use axum::{Json, extract::State};

use crate::errors::ApiError;
use crate::models::user::{LoginRequest, TokenResponse};
use crate::state::AppState;

/// `POST /login` — exchange credentials for a bearer token.
///
/// Unknown email and wrong password answer identically so the endpoint does
/// not leak which accounts exist.
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let user = state
        .users
        .authenticate(&payload.email, &payload.password)
        .await?
        .ok_or_else(|| ApiError::Unauthenticated("incorrect email or password".into()))?;

    if !user.is_active {
        return Err(ApiError::Forbidden("inactive user".into()));
    }

    let access_token = state.tokens.issue(user.id)?;
    Ok(Json(TokenResponse {
        access_token,
        token_type: "bearer",
    }))
}
