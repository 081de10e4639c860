// Error types for the API surface
pub mod auth;
pub mod rbac;
