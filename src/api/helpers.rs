use poem_openapi::{auth::Bearer, SecurityScheme};

use crate::errors::auth::AuthError;
use crate::services::TokenService;
use crate::stores::UserStore;
use crate::types::db::user;

/// JWT Bearer token authentication
#[derive(SecurityScheme)]
#[oai(
    ty = "bearer",
    key_name = "Authorization",
    key_in = "header",
    bearer_format = "JWT"
)]
pub struct BearerAuth(pub Bearer);

/// Resolve a bearer token to a live, active user.
///
/// A valid signature whose subject no longer maps to an active user is
/// the same 401 as a malformed token; the caller learns nothing about
/// which case it hit.
pub async fn current_user(
    tokens: &TokenService,
    users: &UserStore,
    token: &str,
) -> Result<user::Model, AuthError> {
    let claims = tokens.validate(token)?;

    let user_row = users.find_by_id(&claims.sub).await.map_err(|e| {
        tracing::error!(error = %e, "user lookup failed during token resolution");
        AuthError::service_unavailable()
    })?;

    match user_row {
        Some(u) if u.active => Ok(u),
        _ => {
            tracing::debug!("token subject does not resolve to an active user");
            Err(AuthError::invalid_token())
        }
    }
}
