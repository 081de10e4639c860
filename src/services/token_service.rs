use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use std::fmt;

use crate::errors::auth::AuthError;
use crate::types::internal::auth::Claims;

/// Manages JWT issuance and validation
pub struct TokenService {
    jwt_secret: String,
    ttl_minutes: i64,
}

impl TokenService {
    /// Create a new TokenService with the given signing secret and
    /// access-token lifetime in minutes
    pub fn new(jwt_secret: String, ttl_minutes: i64) -> Self {
        Self {
            jwt_secret,
            ttl_minutes,
        }
    }

    /// Issue a signed HS256 token for the given user id
    pub fn issue(&self, user_id: &str) -> Result<String, AuthError> {
        let now = Utc::now().timestamp();
        let expiration = now + (self.ttl_minutes * 60);

        let claims = Claims {
            sub: user_id.to_string(),
            exp: expiration,
            iat: now,
        };

        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )
        .map_err(|e| AuthError::internal_error(format!("Failed to issue token: {}", e)))?;

        Ok(token)
    }

    /// Validate a token and return its claims.
    ///
    /// Expired, malformed and wrongly-signed tokens all surface the same
    /// external error; the distinction is kept to internal logging only.
    pub fn validate(&self, token: &str) -> Result<Claims, AuthError> {
        let validation = Validation::new(Algorithm::HS256);

        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_bytes()),
            &validation,
        )
        .map_err(|e| {
            tracing::debug!(reason = %e, "token validation failed");
            AuthError::invalid_token()
        })?;

        Ok(token_data.claims)
    }

    /// Lifetime of issued tokens, in seconds
    pub fn expires_in(&self) -> i64 {
        self.ttl_minutes * 60
    }
}

impl fmt::Debug for TokenService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenService")
            .field("jwt_secret", &"<redacted>")
            .field("ttl_minutes", &self.ttl_minutes)
            .finish()
    }
}

impl fmt::Display for TokenService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TokenService {{ ttl: {}min }}", self.ttl_minutes)
    }
}
