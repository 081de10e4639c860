use poem_openapi::Object;
use serde::{Deserialize, Serialize};

use crate::types::db::{page, role, role_permission, user_permission_override};

/// Request model for creating or updating a role
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct RoleRequest {
    /// Unique role name
    pub name: String,

    /// Optional description
    pub description: Option<String>,
}

/// Response model for a role
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct RoleResponse {
    /// Role id
    pub id: i32,

    /// Unique role name
    pub name: String,

    /// Optional description
    pub description: Option<String>,

    /// Whether the role is active
    pub active: bool,
}

impl From<&role::Model> for RoleResponse {
    fn from(model: &role::Model) -> Self {
        RoleResponse {
            id: model.id,
            name: model.name.clone(),
            description: model.description.clone(),
            active: model.active,
        }
    }
}

/// Request model for creating or updating a page
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct PageRequest {
    /// Unique technical name
    pub name: String,

    /// Label shown in the client navigation
    pub display_name: String,

    /// Unique client route
    pub route: String,

    /// Optional icon identifier
    pub icon: Option<String>,

    /// Ascending display order
    pub sort_order: i32,
}

/// Response model for a page
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct PageResponse {
    /// Page id
    pub id: i32,

    /// Unique technical name
    pub name: String,

    /// Label shown in the client navigation
    pub display_name: String,

    /// Unique client route
    pub route: String,

    /// Optional icon identifier
    pub icon: Option<String>,

    /// Ascending display order
    pub sort_order: i32,

    /// Whether the page is active
    pub active: bool,
}

impl From<&page::Model> for PageResponse {
    fn from(model: &page::Model) -> Self {
        PageResponse {
            id: model.id,
            name: model.name.clone(),
            display_name: model.display_name.clone(),
            route: model.route.clone(),
            icon: model.icon.clone(),
            sort_order: model.sort_order,
            active: model.active,
        }
    }
}

/// Request model for a role-level grant (upserted on (role, page))
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct GrantRequest {
    /// Target page id
    pub page_id: i32,

    /// May view the page
    pub view: bool,

    /// May create records on the page
    pub create: bool,

    /// May edit records on the page
    pub edit: bool,

    /// May delete records on the page
    pub delete: bool,
}

/// Response model for a role-level grant
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct GrantResponse {
    /// Role id
    pub role_id: i32,

    /// Page id
    pub page_id: i32,

    /// May view the page
    pub view: bool,

    /// May create records on the page
    pub create: bool,

    /// May edit records on the page
    pub edit: bool,

    /// May delete records on the page
    pub delete: bool,
}

impl From<&role_permission::Model> for GrantResponse {
    fn from(model: &role_permission::Model) -> Self {
        GrantResponse {
            role_id: model.role_id,
            page_id: model.page_id,
            view: model.can_view,
            create: model.can_create,
            edit: model.can_edit,
            delete: model.can_delete,
        }
    }
}

/// One user-level override entry. Omitted (null) actions inherit from
/// the role grant.
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct OverrideRequest {
    /// Target page id
    pub page_id: i32,

    /// Tri-state view override
    pub view: Option<bool>,

    /// Tri-state create override
    pub create: Option<bool>,

    /// Tri-state edit override
    pub edit: Option<bool>,

    /// Tri-state delete override
    pub delete: Option<bool>,
}

/// Request model replacing all of a user's overrides in one atomic write
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct BulkOverrideRequest {
    /// Full new override set; existing rows for the user are discarded
    pub overrides: Vec<OverrideRequest>,
}

/// Response model for a user-level override
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct OverrideResponse {
    /// User id (UUID)
    pub user_id: String,

    /// Page id
    pub page_id: i32,

    /// Tri-state view override
    pub view: Option<bool>,

    /// Tri-state create override
    pub create: Option<bool>,

    /// Tri-state edit override
    pub edit: Option<bool>,

    /// Tri-state delete override
    pub delete: Option<bool>,
}

impl From<&user_permission_override::Model> for OverrideResponse {
    fn from(model: &user_permission_override::Model) -> Self {
        OverrideResponse {
            user_id: model.user_id.clone(),
            page_id: model.page_id,
            view: model.can_view,
            create: model.can_create,
            edit: model.can_edit,
            delete: model.can_delete,
        }
    }
}
