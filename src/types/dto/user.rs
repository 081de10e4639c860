use poem_openapi::Object;
use serde::{Deserialize, Serialize};

use crate::types::db::user;

/// Request model for creating a user
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct CreateUserRequest {
    /// Unique username
    pub username: String,

    /// Plaintext password, hashed before storage
    pub password: String,

    /// Full display name
    pub full_name: Option<String>,

    /// Unique contact email
    pub email: Option<String>,

    /// Contact phone
    pub phone: Option<String>,

    /// Role to assign, if any
    pub role_id: Option<i32>,
}

/// Request model for assigning or clearing a user's role
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct AssignRoleRequest {
    /// New role id; null clears the role
    pub role_id: Option<i32>,
}

/// Response model for a user
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct UserResponse {
    /// User id (UUID)
    pub id: String,

    /// Unique username
    pub username: String,

    /// Full display name
    pub full_name: Option<String>,

    /// Contact email
    pub email: Option<String>,

    /// Contact phone
    pub phone: Option<String>,

    /// Assigned role id, if any
    pub role_id: Option<i32>,

    /// Whether the account is active
    pub active: bool,

    /// Unix timestamp until which logins are rejected, if locked
    pub locked_until: Option<i64>,
}

impl From<&user::Model> for UserResponse {
    fn from(model: &user::Model) -> Self {
        UserResponse {
            id: model.id.clone(),
            username: model.username.clone(),
            full_name: model.full_name.clone(),
            email: model.email.clone(),
            phone: model.phone.clone(),
            role_id: model.role_id,
            active: model.active,
            locked_until: model.locked_until,
        }
    }
}
