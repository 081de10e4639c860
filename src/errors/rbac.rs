use poem_openapi::{payload::Json, ApiResponse, Object};
use std::fmt;

use crate::errors::auth::AuthError;

/// Standardized error response for management endpoints
#[derive(Object, Debug)]
pub struct RbacErrorResponse {
    /// Error code identifier
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// HTTP status code
    pub status_code: u16,
}

/// Error types for role/page/permission and user management endpoints
#[derive(ApiResponse, Debug)]
pub enum RbacError {
    /// Missing or invalid bearer token
    #[oai(status = 401)]
    Unauthorized(Json<RbacErrorResponse>),

    /// Caller lacks the required privilege
    #[oai(status = 403)]
    Forbidden(Json<RbacErrorResponse>),

    /// Referenced role/page/user does not exist
    #[oai(status = 404)]
    NotFound(Json<RbacErrorResponse>),

    /// Uniqueness violation or conflicting state on a write
    #[oai(status = 409)]
    Conflict(Json<RbacErrorResponse>),

    /// Backing store unavailable
    #[oai(status = 503)]
    ServiceUnavailable(Json<RbacErrorResponse>),

    /// Internal server error
    #[oai(status = 500)]
    InternalError(Json<RbacErrorResponse>),
}

impl RbacError {
    /// Create an Unauthorized error
    pub fn unauthorized() -> Self {
        RbacError::Unauthorized(Json(RbacErrorResponse {
            error: "unauthorized".to_string(),
            message: "Invalid or expired token".to_string(),
            status_code: 401,
        }))
    }

    /// Create a Forbidden error
    pub fn forbidden(message: String) -> Self {
        RbacError::Forbidden(Json(RbacErrorResponse {
            error: "forbidden".to_string(),
            message,
            status_code: 403,
        }))
    }

    /// Create a Forbidden error for non-admin access to a management endpoint
    pub fn admin_required() -> Self {
        RbacError::forbidden("Administrator privileges required".to_string())
    }

    /// Create a NotFound error naming the missing resource
    pub fn not_found(what: &str) -> Self {
        RbacError::NotFound(Json(RbacErrorResponse {
            error: "not_found".to_string(),
            message: format!("{} not found", what),
            status_code: 404,
        }))
    }

    /// Create a Conflict error
    pub fn conflict(message: String) -> Self {
        RbacError::Conflict(Json(RbacErrorResponse {
            error: "conflict".to_string(),
            message,
            status_code: 409,
        }))
    }

    /// Create a ServiceUnavailable error
    pub fn service_unavailable() -> Self {
        RbacError::ServiceUnavailable(Json(RbacErrorResponse {
            error: "service_unavailable".to_string(),
            message: "Service temporarily unavailable".to_string(),
            status_code: 503,
        }))
    }

    /// Create an InternalError
    pub fn internal_error(message: String) -> Self {
        RbacError::InternalError(Json(RbacErrorResponse {
            error: "internal_error".to_string(),
            message,
            status_code: 500,
        }))
    }

    /// Get the error message from the error variant
    pub fn message(&self) -> String {
        match self {
            RbacError::Unauthorized(json) => json.0.message.clone(),
            RbacError::Forbidden(json) => json.0.message.clone(),
            RbacError::NotFound(json) => json.0.message.clone(),
            RbacError::Conflict(json) => json.0.message.clone(),
            RbacError::ServiceUnavailable(json) => json.0.message.clone(),
            RbacError::InternalError(json) => json.0.message.clone(),
        }
    }
}

impl fmt::Display for RbacError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl From<AuthError> for RbacError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials(_) | AuthError::InvalidToken(_) => {
                RbacError::unauthorized()
            }
            AuthError::AccountLocked(json) => RbacError::forbidden(json.0.message),
            AuthError::Forbidden(json) => RbacError::forbidden(json.0.message),
            AuthError::ServiceUnavailable(_) => RbacError::service_unavailable(),
            AuthError::InternalError(json) => RbacError::internal_error(json.0.message),
        }
    }
}
