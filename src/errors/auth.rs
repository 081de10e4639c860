use chrono::DateTime;
use poem_openapi::{payload::Json, ApiResponse, Object};
use std::fmt;

/// Standardized error response for authentication endpoints
#[derive(Object, Debug)]
pub struct AuthErrorResponse {
    /// Error code identifier
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// HTTP status code
    pub status_code: u16,
}

/// Authentication and authorization error types
#[derive(ApiResponse, Debug)]
pub enum AuthError {
    /// Invalid username or password
    #[oai(status = 401)]
    InvalidCredentials(Json<AuthErrorResponse>),

    /// Account is within a lockout window
    #[oai(status = 403)]
    AccountLocked(Json<AuthErrorResponse>),

    /// Invalid, expired or unresolvable bearer token
    #[oai(status = 401)]
    InvalidToken(Json<AuthErrorResponse>),

    /// Authenticated but lacking the required permission
    #[oai(status = 403)]
    Forbidden(Json<AuthErrorResponse>),

    /// Backing store unavailable; never reported as a denial
    #[oai(status = 503)]
    ServiceUnavailable(Json<AuthErrorResponse>),

    /// Internal server error
    #[oai(status = 500)]
    InternalError(Json<AuthErrorResponse>),
}

impl AuthError {
    /// Create an InvalidCredentials error
    ///
    /// The same constructor serves unknown usernames and wrong passwords,
    /// so the two cases are byte-identical on the wire.
    pub fn invalid_credentials() -> Self {
        AuthError::InvalidCredentials(Json(AuthErrorResponse {
            error: "invalid_credentials".to_string(),
            message: "Invalid username or password".to_string(),
            status_code: 401,
        }))
    }

    /// Create an AccountLocked error carrying the UTC unlock time
    pub fn account_locked(until: i64) -> Self {
        let unlock_time = DateTime::from_timestamp(until, 0)
            .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
            .unwrap_or_else(|| until.to_string());

        AuthError::AccountLocked(Json(AuthErrorResponse {
            error: "account_locked".to_string(),
            message: format!("Account locked until {}", unlock_time),
            status_code: 403,
        }))
    }

    /// Create an InvalidToken error
    ///
    /// One external shape for malformed, expired and unresolvable tokens;
    /// the distinction only exists in internal logs.
    pub fn invalid_token() -> Self {
        AuthError::InvalidToken(Json(AuthErrorResponse {
            error: "invalid_token".to_string(),
            message: "Invalid or expired token".to_string(),
            status_code: 401,
        }))
    }

    /// Create a Forbidden error naming the denied page and action,
    /// and nothing about why the check failed.
    pub fn forbidden(page: &str, action: &str) -> Self {
        AuthError::Forbidden(Json(AuthErrorResponse {
            error: "forbidden".to_string(),
            message: format!("Permission denied: {} on {}", action, page),
            status_code: 403,
        }))
    }

    /// Create a ServiceUnavailable error
    pub fn service_unavailable() -> Self {
        AuthError::ServiceUnavailable(Json(AuthErrorResponse {
            error: "service_unavailable".to_string(),
            message: "Service temporarily unavailable".to_string(),
            status_code: 503,
        }))
    }

    /// Create an InternalError
    pub fn internal_error(message: String) -> Self {
        AuthError::InternalError(Json(AuthErrorResponse {
            error: "internal_error".to_string(),
            message,
            status_code: 500,
        }))
    }

    /// Get the error message from the error variant
    pub fn message(&self) -> String {
        match self {
            AuthError::InvalidCredentials(json) => json.0.message.clone(),
            AuthError::AccountLocked(json) => json.0.message.clone(),
            AuthError::InvalidToken(json) => json.0.message.clone(),
            AuthError::Forbidden(json) => json.0.message.clone(),
            AuthError::ServiceUnavailable(json) => json.0.message.clone(),
            AuthError::InternalError(json) => json.0.message.clone(),
        }
    }
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message())
    }
}
