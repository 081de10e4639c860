// Business logic layer
pub mod auth_service;
pub mod authorization;
pub mod password;
pub mod token_service;

pub use auth_service::AuthService;
pub use authorization::AuthorizationService;
pub use token_service::TokenService;
