use poem_openapi::{param::Path, payload::Json, OpenApi, Tags};
use sea_orm::DbErr;
use std::collections::HashSet;
use std::sync::Arc;

use crate::api::helpers::{self, BearerAuth};
use crate::errors::rbac::RbacError;
use crate::services::{AuthorizationService, TokenService};
use crate::stores::{CatalogStore, OverrideEntry, UserStore};
use crate::types::db::user;
use crate::types::dto::common::MessageResponse;
use crate::types::dto::rbac::{
    BulkOverrideRequest, GrantRequest, GrantResponse, OverrideResponse, PageRequest, PageResponse,
    RoleRequest, RoleResponse,
};
use crate::types::internal::permissions::{OverrideSet, PermissionSet};

/// Management endpoints for roles, pages, grants and overrides.
/// Every operation is reserved to administrators.
pub struct RbacApi {
    catalog: Arc<CatalogStore>,
    users: Arc<UserStore>,
    authz: Arc<AuthorizationService>,
    tokens: Arc<TokenService>,
}

/// API tags for management endpoints
#[derive(Tags)]
enum RbacTags {
    /// Role, page and permission management
    Rbac,
}

fn db_err(e: DbErr) -> RbacError {
    tracing::error!(error = %e, "catalog store failure");
    RbacError::service_unavailable()
}

impl RbacApi {
    pub fn new(
        catalog: Arc<CatalogStore>,
        users: Arc<UserStore>,
        authz: Arc<AuthorizationService>,
        tokens: Arc<TokenService>,
    ) -> Self {
        Self {
            catalog,
            users,
            authz,
            tokens,
        }
    }

    /// Resolve the caller and require the admin role
    async fn require_admin(&self, auth: &BearerAuth) -> Result<user::Model, RbacError> {
        let caller = helpers::current_user(&self.tokens, &self.users, &auth.0.token).await?;
        if !self.authz.is_admin_user(&caller).await? {
            return Err(RbacError::admin_required());
        }
        Ok(caller)
    }
}

#[OpenApi(prefix_path = "/rbac")]
impl RbacApi {
    /// List all roles
    #[oai(path = "/roles", method = "get", tag = "RbacTags::Rbac")]
    pub async fn list_roles(&self, auth: BearerAuth) -> Result<Json<Vec<RoleResponse>>, RbacError> {
        self.require_admin(&auth).await?;

        let roles = self.catalog.list_roles().await.map_err(db_err)?;
        Ok(Json(roles.iter().map(RoleResponse::from).collect()))
    }

    /// Create a role
    #[oai(path = "/roles", method = "post", tag = "RbacTags::Rbac")]
    pub async fn create_role(
        &self,
        auth: BearerAuth,
        body: Json<RoleRequest>,
    ) -> Result<Json<RoleResponse>, RbacError> {
        self.require_admin(&auth).await?;

        let existing = self
            .catalog
            .find_role_by_name(&body.name)
            .await
            .map_err(db_err)?;
        if existing.is_some() {
            return Err(RbacError::conflict(format!(
                "Role '{}' already exists",
                body.name
            )));
        }

        let role = self
            .catalog
            .create_role(body.name.clone(), body.description.clone())
            .await
            .map_err(db_err)?;

        tracing::info!(role = %role.name, "role created");
        Ok(Json(RoleResponse::from(&role)))
    }

    /// Update a role's name and description
    #[oai(path = "/roles/:id", method = "put", tag = "RbacTags::Rbac")]
    pub async fn update_role(
        &self,
        auth: BearerAuth,
        id: Path<i32>,
        body: Json<RoleRequest>,
    ) -> Result<Json<RoleResponse>, RbacError> {
        self.require_admin(&auth).await?;

        let role = self
            .catalog
            .find_role(id.0)
            .await
            .map_err(db_err)?
            .ok_or_else(|| RbacError::not_found("Role"))?;

        if let Some(other) = self
            .catalog
            .find_role_by_name(&body.name)
            .await
            .map_err(db_err)?
        {
            if other.id != role.id {
                return Err(RbacError::conflict(format!(
                    "Role '{}' already exists",
                    body.name
                )));
            }
        }

        let updated = self
            .catalog
            .update_role(role, body.name.clone(), body.description.clone())
            .await
            .map_err(db_err)?;

        Ok(Json(RoleResponse::from(&updated)))
    }

    /// Deactivate a role (soft delete).
    /// Refused while any active user still holds the role.
    #[oai(path = "/roles/:id", method = "delete", tag = "RbacTags::Rbac")]
    pub async fn delete_role(
        &self,
        auth: BearerAuth,
        id: Path<i32>,
    ) -> Result<Json<MessageResponse>, RbacError> {
        self.require_admin(&auth).await?;

        let role = self
            .catalog
            .find_role(id.0)
            .await
            .map_err(db_err)?
            .ok_or_else(|| RbacError::not_found("Role"))?;

        let holders = self
            .users
            .count_active_with_role(role.id)
            .await
            .map_err(db_err)?;
        if holders > 0 {
            return Err(RbacError::conflict(format!(
                "Role '{}' is assigned to {} active user(s)",
                role.name, holders
            )));
        }

        let name = role.name.clone();
        self.catalog.deactivate_role(role).await.map_err(db_err)?;

        tracing::info!(role = %name, "role deactivated");
        Ok(Json(MessageResponse {
            message: format!("Role '{}' deactivated", name),
        }))
    }

    /// List all pages, active or not
    #[oai(path = "/pages", method = "get", tag = "RbacTags::Rbac")]
    pub async fn list_pages(&self, auth: BearerAuth) -> Result<Json<Vec<PageResponse>>, RbacError> {
        self.require_admin(&auth).await?;

        let pages = self.catalog.list_pages().await.map_err(db_err)?;
        Ok(Json(pages.iter().map(PageResponse::from).collect()))
    }

    /// Create a page
    #[oai(path = "/pages", method = "post", tag = "RbacTags::Rbac")]
    pub async fn create_page(
        &self,
        auth: BearerAuth,
        body: Json<PageRequest>,
    ) -> Result<Json<PageResponse>, RbacError> {
        self.require_admin(&auth).await?;

        if self
            .catalog
            .find_page_by_name(&body.name)
            .await
            .map_err(db_err)?
            .is_some()
        {
            return Err(RbacError::conflict(format!(
                "Page '{}' already exists",
                body.name
            )));
        }
        if self
            .catalog
            .find_page_by_route(&body.route)
            .await
            .map_err(db_err)?
            .is_some()
        {
            return Err(RbacError::conflict(format!(
                "Route '{}' already exists",
                body.route
            )));
        }

        let page = self
            .catalog
            .create_page(
                body.name.clone(),
                body.display_name.clone(),
                body.route.clone(),
                body.icon.clone(),
                body.sort_order,
            )
            .await
            .map_err(db_err)?;

        tracing::info!(page = %page.name, "page created");
        Ok(Json(PageResponse::from(&page)))
    }

    /// Update a page's display attributes
    #[oai(path = "/pages/:id", method = "put", tag = "RbacTags::Rbac")]
    pub async fn update_page(
        &self,
        auth: BearerAuth,
        id: Path<i32>,
        body: Json<PageRequest>,
    ) -> Result<Json<PageResponse>, RbacError> {
        self.require_admin(&auth).await?;

        let page = self
            .catalog
            .find_page(id.0)
            .await
            .map_err(db_err)?
            .ok_or_else(|| RbacError::not_found("Page"))?;

        let updated = self
            .catalog
            .update_page(
                page,
                body.display_name.clone(),
                body.icon.clone(),
                body.sort_order,
            )
            .await
            .map_err(db_err)?;

        Ok(Json(PageResponse::from(&updated)))
    }

    /// Deactivate a page (soft delete). Grants and overrides on it stay
    /// in storage; the page just stops appearing in menus and checks.
    #[oai(path = "/pages/:id", method = "delete", tag = "RbacTags::Rbac")]
    pub async fn delete_page(
        &self,
        auth: BearerAuth,
        id: Path<i32>,
    ) -> Result<Json<MessageResponse>, RbacError> {
        self.require_admin(&auth).await?;

        let page = self
            .catalog
            .find_page(id.0)
            .await
            .map_err(db_err)?
            .ok_or_else(|| RbacError::not_found("Page"))?;

        let name = page.name.clone();
        self.catalog.deactivate_page(page).await.map_err(db_err)?;

        tracing::info!(page = %name, "page deactivated");
        Ok(Json(MessageResponse {
            message: format!("Page '{}' deactivated", name),
        }))
    }

    /// List the role-level grants of a role
    #[oai(path = "/roles/:id/permissions", method = "get", tag = "RbacTags::Rbac")]
    pub async fn list_grants(
        &self,
        auth: BearerAuth,
        id: Path<i32>,
    ) -> Result<Json<Vec<GrantResponse>>, RbacError> {
        self.require_admin(&auth).await?;

        self.catalog
            .find_role(id.0)
            .await
            .map_err(db_err)?
            .ok_or_else(|| RbacError::not_found("Role"))?;

        let grants = self.catalog.grants_for_role(id.0).await.map_err(db_err)?;
        Ok(Json(grants.iter().map(GrantResponse::from).collect()))
    }

    /// Create or update the grant for (role, page)
    #[oai(path = "/roles/:id/permissions", method = "put", tag = "RbacTags::Rbac")]
    pub async fn upsert_grant(
        &self,
        auth: BearerAuth,
        id: Path<i32>,
        body: Json<GrantRequest>,
    ) -> Result<Json<GrantResponse>, RbacError> {
        self.require_admin(&auth).await?;

        self.catalog
            .find_role(id.0)
            .await
            .map_err(db_err)?
            .ok_or_else(|| RbacError::not_found("Role"))?;
        self.catalog
            .find_page(body.page_id)
            .await
            .map_err(db_err)?
            .ok_or_else(|| RbacError::not_found("Page"))?;

        let permissions = PermissionSet {
            view: body.view,
            create: body.create,
            edit: body.edit,
            delete: body.delete,
        };

        let grant = self
            .catalog
            .upsert_grant(id.0, body.page_id, permissions)
            .await
            .map_err(db_err)?;

        Ok(Json(GrantResponse::from(&grant)))
    }

    /// List a user's permission overrides
    #[oai(path = "/users/:id/permissions", method = "get", tag = "RbacTags::Rbac")]
    pub async fn list_overrides(
        &self,
        auth: BearerAuth,
        id: Path<String>,
    ) -> Result<Json<Vec<OverrideResponse>>, RbacError> {
        self.require_admin(&auth).await?;

        self.users
            .find_by_id(&id.0)
            .await
            .map_err(db_err)?
            .ok_or_else(|| RbacError::not_found("User"))?;

        let rows = self.catalog.overrides_for_user(&id.0).await.map_err(db_err)?;
        Ok(Json(rows.iter().map(OverrideResponse::from).collect()))
    }

    /// Replace all of a user's overrides atomically.
    /// Existing rows are discarded; exactly the submitted set remains.
    #[oai(path = "/users/:id/permissions", method = "put", tag = "RbacTags::Rbac")]
    pub async fn replace_overrides(
        &self,
        auth: BearerAuth,
        id: Path<String>,
        body: Json<BulkOverrideRequest>,
    ) -> Result<Json<Vec<OverrideResponse>>, RbacError> {
        self.require_admin(&auth).await?;

        self.users
            .find_by_id(&id.0)
            .await
            .map_err(db_err)?
            .ok_or_else(|| RbacError::not_found("User"))?;

        let mut seen_pages = HashSet::new();
        let mut entries = Vec::with_capacity(body.overrides.len());
        for item in &body.overrides {
            if !seen_pages.insert(item.page_id) {
                return Err(RbacError::conflict(format!(
                    "Duplicate override for page {} in request",
                    item.page_id
                )));
            }

            self.catalog
                .find_page(item.page_id)
                .await
                .map_err(db_err)?
                .ok_or_else(|| RbacError::not_found("Page"))?;

            entries.push(OverrideEntry {
                page_id: item.page_id,
                actions: OverrideSet {
                    view: item.view,
                    create: item.create,
                    edit: item.edit,
                    delete: item.delete,
                },
            });
        }

        self.catalog
            .replace_user_overrides(&id.0, &entries)
            .await
            .map_err(db_err)?;

        let rows = self.catalog.overrides_for_user(&id.0).await.map_err(db_err)?;

        tracing::info!(user_id = %id.0, count = rows.len(), "overrides replaced");
        Ok(Json(rows.iter().map(OverrideResponse::from).collect()))
    }

    /// Delete one override, restoring role inheritance for that page
    #[oai(
        path = "/users/:id/permissions/:page_id",
        method = "delete",
        tag = "RbacTags::Rbac"
    )]
    pub async fn delete_override(
        &self,
        auth: BearerAuth,
        id: Path<String>,
        page_id: Path<i32>,
    ) -> Result<Json<MessageResponse>, RbacError> {
        self.require_admin(&auth).await?;

        let removed = self
            .catalog
            .delete_override(&id.0, page_id.0)
            .await
            .map_err(db_err)?;

        if removed == 0 {
            return Err(RbacError::not_found("Override"));
        }

        Ok(Json(MessageResponse {
            message: "Override removed".to_string(),
        }))
    }
}
