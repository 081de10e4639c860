// Database entities (SeaORM)
pub mod page;
pub mod role;
pub mod role_permission;
pub mod user;
pub mod user_permission_override;
