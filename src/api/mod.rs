// API layer - HTTP endpoints
pub mod auth;
pub mod health;
pub mod helpers;
pub mod rbac;
pub mod users;

pub use auth::AuthApi;
pub use health::HealthApi;
pub use rbac::RbacApi;
pub use users::UserApi;
