//! Request extractors.

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::errors::ApiError;
use crate::models::user::User;
use crate::policy::Actor;
use crate::state::AppState;

/// The authenticated user behind a request.
///
/// Validates the `Authorization: Bearer` token, loads the account, and
/// rejects disabled users. Every non-health route except `/login` runs
/// through this.
pub struct CurrentUser(pub User);

impl CurrentUser {
    pub fn actor(&self) -> Actor {
        Actor {
            id: self.0.id,
            is_admin: self.0.is_superuser,
        }
    }

    /// Gate for admin-only endpoints.
    pub fn require_admin(&self) -> Result<(), ApiError> {
        if self.0.is_superuser {
            Ok(())
        } else {
            Err(ApiError::Forbidden(
                "this operation requires administrator privileges".into(),
            ))
        }
    }
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get("Authorization")
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| ApiError::Unauthenticated("missing bearer token".into()))?;

        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| ApiError::Unauthenticated("malformed authorization header".into()))?;

        let claims = state.tokens.validate(token)?;

        let user = state
            .users
            .get(claims.sub)
            .await?
            .ok_or_else(|| ApiError::Unauthenticated("user no longer exists".into()))?;

        if !user.is_active {
            return Err(ApiError::Forbidden("inactive user".into()));
        }

        Ok(CurrentUser(user))
    }
}
