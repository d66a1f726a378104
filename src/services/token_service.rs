//! Signed, time-limited bearer tokens for authenticated sessions.
//!
//! Stateless HS256 JWTs: the subject claim is trusted only after the
//! signature verifies against the server-held secret, and expiry is checked
//! on every validation. There is no revocation list; expiry is the only
//! invalidation mechanism.

use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token expired")]
    Expired,
    #[error("malformed token")]
    Malformed,
    #[error("invalid token")]
    Invalid,
    #[error("token signing failed")]
    Signing,
}

/// Claims embedded in every access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user id.
    pub sub: Uuid,
    /// Issued-at (Unix timestamp).
    pub iat: i64,
    /// Absolute expiry (Unix timestamp).
    pub exp: i64,
}

/// Issues and validates access tokens. Pure computation over the signing
/// secret; safe to clone into every request handler.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    lifetime: Duration,
}

impl TokenService {
    pub fn new(secret: &str, lifetime_minutes: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            lifetime: Duration::minutes(lifetime_minutes),
        }
    }

    /// Emit a signed token for a previously authenticated identity.
    pub fn issue(&self, user_id: Uuid) -> Result<String, TokenError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id,
            iat: now.timestamp(),
            exp: (now + self.lifetime).timestamp(),
        };
        encode(&Header::default(), &claims, &self.encoding_key).map_err(|_| TokenError::Signing)
    }

    /// Verify signature and expiry, returning the embedded claims.
    pub fn validate(&self, token: &str) -> Result<Claims, TokenError> {
        let validation = Validation::default();
        match decode::<Claims>(token, &self.decoding_key, &validation) {
            Ok(data) => Ok(data.claims),
            Err(err) => Err(match err.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
                jsonwebtoken::errors::ErrorKind::InvalidToken
                | jsonwebtoken::errors::ErrorKind::Base64(_)
                | jsonwebtoken::errors::ErrorKind::Json(_)
                | jsonwebtoken::errors::ErrorKind::Utf8(_) => TokenError::Malformed,
                _ => TokenError::Invalid,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issue_and_validate_roundtrip() {
        let service = TokenService::new("test-secret-at-least-32-bytes-long", 60);
        let user_id = Uuid::new_v4();

        let token = service.issue(user_id).unwrap();
        let claims = service.validate(&token).unwrap();

        assert_eq!(claims.sub, user_id);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn rejects_token_signed_with_other_secret() {
        let issuer = TokenService::new("secret-one-at-least-32-bytes-long!", 60);
        let verifier = TokenService::new("secret-two-at-least-32-bytes-long!", 60);

        let token = issuer.issue(Uuid::new_v4()).unwrap();
        assert!(matches!(verifier.validate(&token), Err(TokenError::Invalid)));
    }

    #[test]
    fn rejects_tampered_payload() {
        let service = TokenService::new("test-secret-at-least-32-bytes-long", 60);
        let token = service.issue(Uuid::new_v4()).unwrap();

        // Swap the payload segment for one signed nowhere.
        let other = service.issue(Uuid::new_v4()).unwrap();
        let parts: Vec<&str> = token.split('.').collect();
        let other_parts: Vec<&str> = other.split('.').collect();
        let tampered = format!("{}.{}.{}", parts[0], other_parts[1], parts[2]);

        assert!(service.validate(&tampered).is_err());
    }

    #[test]
    fn rejects_expired_token() {
        // Negative lifetime puts exp in the past at issue time.
        let service = TokenService::new("test-secret-at-least-32-bytes-long", -120);
        let token = service.issue(Uuid::new_v4()).unwrap();

        assert!(matches!(service.validate(&token), Err(TokenError::Expired)));
    }

    #[test]
    fn rejects_garbage() {
        let service = TokenService::new("test-secret-at-least-32-bytes-long", 60);
        assert!(matches!(
            service.validate("not-a-token"),
            Err(TokenError::Malformed)
        ));
        assert!(service.validate("").is_err());
    }
}
