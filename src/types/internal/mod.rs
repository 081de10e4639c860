// Internal types shared across services
pub mod auth;
pub mod permissions;
