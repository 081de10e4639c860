use poem_openapi::Object;
use serde::{Deserialize, Serialize};

use crate::types::internal::permissions::EffectivePermissions;

/// Request model for user login
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct LoginRequest {
    /// Username for authentication
    pub username: String,

    /// Password for authentication
    pub password: String,
}

/// Response model containing the authentication token
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    /// JWT access token for API authentication
    pub access_token: String,

    /// Token type (always "Bearer")
    pub token_type: String,

    /// Number of seconds until the access token expires
    pub expires_in: i64,
}

/// Resolved permissions for one page.
///
/// Field names here are the boundary contract (`view`, `create`, ...);
/// storage columns use the `can_*` spelling and are remapped in the
/// `From` impls below, never inside the entities.
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct PagePermissions {
    /// Technical page name
    pub page: String,

    /// Page id in the catalog
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

impl From<&EffectivePermissions> for PagePermissions {
    fn from(effective: &EffectivePermissions) -> Self {
        PagePermissions {
            page: effective.page_name.clone(),
            page_id: effective.page_id,
            view: effective.permissions.view,
            create: effective.permissions.create,
            edit: effective.permissions.edit,
            delete: effective.permissions.delete,
        }
    }
}

/// Response model for the identity endpoint
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct MeResponse {
    /// User ID (UUID)
    pub id: String,

    /// Username
    pub username: String,

    /// Full display name
    pub full_name: Option<String>,

    /// Contact email
    pub email: Option<String>,

    /// Assigned role name, if any
    pub role: Option<String>,

    /// Effective permissions for every active page
    pub permissions: Vec<PagePermissions>,
}

/// One entry of the navigation menu
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct MenuItem {
    /// Technical page name
    pub name: String,

    /// Label shown in the client navigation
    pub display_name: String,

    /// Client route for the page
    pub route: String,

    /// Optional icon identifier
    pub icon: Option<String>,

    /// Ascending display order
    pub sort_order: i32,
}

impl From<&EffectivePermissions> for MenuItem {
    fn from(effective: &EffectivePermissions) -> Self {
        MenuItem {
            name: effective.page_name.clone(),
            display_name: effective.display_name.clone(),
            route: effective.route.clone(),
            icon: effective.icon.clone(),
            sort_order: effective.sort_order,
        }
    }
}
