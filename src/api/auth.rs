use poem_openapi::{payload::Json, OpenApi, Tags};
use std::sync::Arc;

use crate::api::helpers::{self, BearerAuth};
use crate::errors::auth::AuthError;
use crate::services::{AuthService, AuthorizationService, TokenService};
use crate::stores::{CatalogStore, UserStore};
use crate::types::dto::auth::{LoginRequest, MenuItem, MeResponse, PagePermissions, TokenResponse};

/// Route of the fixed menu entry every authenticated client receives,
/// whether or not an explicit grant exists for it
pub const DASHBOARD_ROUTE: &str = "/dashboard";

/// Authentication and identity endpoints
pub struct AuthApi {
    auth: Arc<AuthService>,
    authz: Arc<AuthorizationService>,
    tokens: Arc<TokenService>,
    users: Arc<UserStore>,
    catalog: Arc<CatalogStore>,
}

impl AuthApi {
    pub fn new(
        auth: Arc<AuthService>,
        authz: Arc<AuthorizationService>,
        tokens: Arc<TokenService>,
        users: Arc<UserStore>,
        catalog: Arc<CatalogStore>,
    ) -> Self {
        Self {
            auth,
            authz,
            tokens,
            users,
            catalog,
        }
    }
}

/// API tags for authentication endpoints
#[derive(Tags)]
enum AuthTags {
    /// Authentication endpoints
    Authentication,
}

#[OpenApi(prefix_path = "/auth")]
impl AuthApi {
    /// Login with username and password to receive an access token
    #[oai(path = "/login", method = "post", tag = "AuthTags::Authentication")]
    pub async fn login(&self, body: Json<LoginRequest>) -> Result<Json<TokenResponse>, AuthError> {
        let (_user, access_token) = self.auth.login(&body.username, &body.password).await?;

        Ok(Json(TokenResponse {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: self.tokens.expires_in(),
        }))
    }

    /// Return the authenticated user's profile with effective permissions
    #[oai(path = "/me", method = "get", tag = "AuthTags::Authentication")]
    pub async fn me(&self, auth: BearerAuth) -> Result<Json<MeResponse>, AuthError> {
        let user = helpers::current_user(&self.tokens, &self.users, &auth.0.token).await?;

        let role = match user.role_id {
            Some(role_id) => self
                .catalog
                .find_role(role_id)
                .await
                .map_err(|e| {
                    tracing::error!(error = %e, "role lookup failed");
                    AuthError::service_unavailable()
                })?
                .map(|r| r.name),
            None => None,
        };

        let effective = self.authz.effective_permissions(&user.id).await?;
        let permissions = effective.iter().map(PagePermissions::from).collect();

        Ok(Json(MeResponse {
            id: user.id,
            username: user.username,
            full_name: user.full_name,
            email: user.email,
            role,
            permissions,
        }))
    }

    /// Return the ordered navigation menu for the authenticated user.
    ///
    /// The dashboard entry is always present, injected here at the
    /// boundary rather than resolved from the catalog.
    #[oai(path = "/menu", method = "get", tag = "AuthTags::Authentication")]
    pub async fn menu(&self, auth: BearerAuth) -> Result<Json<Vec<MenuItem>>, AuthError> {
        let user = helpers::current_user(&self.tokens, &self.users, &auth.0.token).await?;

        let visible = self.authz.menu(&user.id).await?;
        let mut items: Vec<MenuItem> = visible.iter().map(MenuItem::from).collect();

        if !items.iter().any(|item| item.route == DASHBOARD_ROUTE) {
            items.insert(
                0,
                MenuItem {
                    name: "dashboard".to_string(),
                    display_name: "Dashboard".to_string(),
                    route: DASHBOARD_ROUTE.to_string(),
                    icon: None,
                    sort_order: 0,
                },
            );
        }

        Ok(Json(items))
    }
}
