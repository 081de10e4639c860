use poem_openapi::{param::Path, payload::Json, OpenApi, Tags};
use sea_orm::DbErr;
use std::sync::Arc;

use crate::api::helpers::{self, BearerAuth};
use crate::errors::rbac::RbacError;
use crate::services::{password, AuthService, AuthorizationService, TokenService};
use crate::stores::{CatalogStore, NewUser, UserStore};
use crate::types::db::user;
use crate::types::dto::common::MessageResponse;
use crate::types::dto::user::{AssignRoleRequest, CreateUserRequest, UserResponse};
use crate::types::internal::permissions::Action;

/// Page name guarding the user listing
const USERS_PAGE: &str = "usuarios";

/// User management endpoints
pub struct UserApi {
    users: Arc<UserStore>,
    catalog: Arc<CatalogStore>,
    auth: Arc<AuthService>,
    authz: Arc<AuthorizationService>,
    tokens: Arc<TokenService>,
}

/// API tags for user management endpoints
#[derive(Tags)]
enum UserTags {
    /// User management
    Users,
}

fn db_err(e: DbErr) -> RbacError {
    tracing::error!(error = %e, "user store failure");
    RbacError::service_unavailable()
}

impl UserApi {
    pub fn new(
        users: Arc<UserStore>,
        catalog: Arc<CatalogStore>,
        auth: Arc<AuthService>,
        authz: Arc<AuthorizationService>,
        tokens: Arc<TokenService>,
    ) -> Self {
        Self {
            users,
            catalog,
            auth,
            authz,
            tokens,
        }
    }

    async fn require_admin(&self, auth: &BearerAuth) -> Result<user::Model, RbacError> {
        let caller = helpers::current_user(&self.tokens, &self.users, &auth.0.token).await?;
        if !self.authz.is_admin_user(&caller).await? {
            return Err(RbacError::admin_required());
        }
        Ok(caller)
    }
}

#[OpenApi(prefix_path = "/users")]
impl UserApi {
    /// List all users.
    ///
    /// Unlike the admin-only endpoints below, this one is mediated by
    /// the permission catalog: the caller needs view on the users page.
    #[oai(path = "/", method = "get", tag = "UserTags::Users")]
    pub async fn list_users(&self, auth: BearerAuth) -> Result<Json<Vec<UserResponse>>, RbacError> {
        let caller = helpers::current_user(&self.tokens, &self.users, &auth.0.token).await?;
        self.authz
            .require_permission(&caller.id, USERS_PAGE, Action::View)
            .await?;

        let users = self.users.list().await.map_err(db_err)?;
        Ok(Json(users.iter().map(UserResponse::from).collect()))
    }

    /// Create a user
    #[oai(path = "/", method = "post", tag = "UserTags::Users")]
    pub async fn create_user(
        &self,
        auth: BearerAuth,
        body: Json<CreateUserRequest>,
    ) -> Result<Json<UserResponse>, RbacError> {
        self.require_admin(&auth).await?;

        if self
            .users
            .find_by_username(&body.username)
            .await
            .map_err(db_err)?
            .is_some()
        {
            return Err(RbacError::conflict(format!(
                "Username '{}' already exists",
                body.username
            )));
        }

        if let Some(email) = &body.email {
            if self
                .users
                .find_by_email(email)
                .await
                .map_err(db_err)?
                .is_some()
            {
                return Err(RbacError::conflict(format!(
                    "Email '{}' already exists",
                    email
                )));
            }
        }

        if let Some(role_id) = body.role_id {
            self.catalog
                .find_role(role_id)
                .await
                .map_err(db_err)?
                .ok_or_else(|| RbacError::not_found("Role"))?;
        }

        let password_hash = password::hash_password(&body.password)?;

        let created = self
            .users
            .create(NewUser {
                username: body.username.clone(),
                password_hash,
                full_name: body.full_name.clone(),
                email: body.email.clone(),
                phone: body.phone.clone(),
                role_id: body.role_id,
            })
            .await
            .map_err(db_err)?;

        tracing::info!(username = %created.username, "user created");
        Ok(Json(UserResponse::from(&created)))
    }

    /// Assign or clear a user's role
    #[oai(path = "/:id/role", method = "put", tag = "UserTags::Users")]
    pub async fn assign_role(
        &self,
        auth: BearerAuth,
        id: Path<String>,
        body: Json<AssignRoleRequest>,
    ) -> Result<Json<UserResponse>, RbacError> {
        self.require_admin(&auth).await?;

        self.users
            .find_by_id(&id.0)
            .await
            .map_err(db_err)?
            .ok_or_else(|| RbacError::not_found("User"))?;

        if let Some(role_id) = body.role_id {
            self.catalog
                .find_role(role_id)
                .await
                .map_err(db_err)?
                .ok_or_else(|| RbacError::not_found("Role"))?;
        }

        self.users
            .set_role(&id.0, body.role_id)
            .await
            .map_err(db_err)?;

        let updated = self
            .users
            .find_by_id(&id.0)
            .await
            .map_err(db_err)?
            .ok_or_else(|| RbacError::not_found("User"))?;

        Ok(Json(UserResponse::from(&updated)))
    }

    /// Deactivate a user (soft delete)
    #[oai(path = "/:id", method = "delete", tag = "UserTags::Users")]
    pub async fn deactivate_user(
        &self,
        auth: BearerAuth,
        id: Path<String>,
    ) -> Result<Json<MessageResponse>, RbacError> {
        self.require_admin(&auth).await?;

        let target = self
            .users
            .find_by_id(&id.0)
            .await
            .map_err(db_err)?
            .ok_or_else(|| RbacError::not_found("User"))?;

        self.users.set_active(&id.0, false).await.map_err(db_err)?;

        tracing::info!(username = %target.username, "user deactivated");
        Ok(Json(MessageResponse {
            message: format!("User '{}' deactivated", target.username),
        }))
    }

    /// Force-unlock a user: reset failed attempts and clear the lockout
    /// window regardless of elapsed time
    #[oai(path = "/:id/unlock", method = "post", tag = "UserTags::Users")]
    pub async fn unlock_user(
        &self,
        auth: BearerAuth,
        id: Path<String>,
    ) -> Result<Json<MessageResponse>, RbacError> {
        self.require_admin(&auth).await?;

        let target = self
            .users
            .find_by_id(&id.0)
            .await
            .map_err(db_err)?
            .ok_or_else(|| RbacError::not_found("User"))?;

        self.auth.unlock(&target.id).await?;

        tracing::info!(username = %target.username, "user unlocked");
        Ok(Json(MessageResponse {
            message: format!("User '{}' unlocked", target.username),
        }))
    }
}
