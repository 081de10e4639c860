// Request/response models (poem-openapi)
pub mod auth;
pub mod common;
pub mod rbac;
pub mod user;
