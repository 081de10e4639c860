use std::collections::HashMap;
use std::sync::Arc;

use crate::errors::auth::AuthError;
use crate::stores::{CatalogStore, UserStore};
use crate::types::db::user;
use crate::types::internal::permissions::{
    Action, EffectivePermissions, OverrideSet, PermissionSet,
};

/// The distinguished role whose holders bypass the permission catalog.
/// Exact, case-sensitive match against the role name.
pub const ADMIN_ROLE_NAME: &str = "Administrador";

/// AuthorizationService merges role-level grants with user-level
/// tri-state overrides into concrete per-page, per-action decisions.
///
/// Every decision resolves to a boolean: a missing user, role, page,
/// grant or override never produces an error, only a denial. Store
/// failures are the one exception and surface as `ServiceUnavailable`.
pub struct AuthorizationService {
    users: Arc<UserStore>,
    catalog: Arc<CatalogStore>,
}

impl AuthorizationService {
    pub fn new(users: Arc<UserStore>, catalog: Arc<CatalogStore>) -> Self {
        Self { users, catalog }
    }

    fn store_failure(e: sea_orm::DbErr) -> AuthError {
        tracing::error!(error = %e, "catalog query failed during authorization");
        AuthError::service_unavailable()
    }

    /// True iff the user exists, has a role, and that role is the
    /// distinguished admin role
    pub async fn is_admin(&self, user_id: &str) -> Result<bool, AuthError> {
        let user_row = self
            .users
            .find_by_id(user_id)
            .await
            .map_err(Self::store_failure)?;

        match user_row {
            Some(u) => self.is_admin_user(&u).await,
            None => Ok(false),
        }
    }

    /// Admin predicate for an already-loaded user row
    pub async fn is_admin_user(&self, user_row: &user::Model) -> Result<bool, AuthError> {
        let Some(role_id) = user_row.role_id else {
            return Ok(false);
        };

        let role = self
            .catalog
            .find_role(role_id)
            .await
            .map_err(Self::store_failure)?;

        Ok(role.map(|r| r.name == ADMIN_ROLE_NAME).unwrap_or(false))
    }

    /// Decide whether a user may perform one action on one page.
    ///
    /// Missing or inactive user, unknown or inactive page: false, never
    /// an error. Admins short-circuit to true before any catalog lookup.
    pub async fn resolve(
        &self,
        user_id: &str,
        page_name: &str,
        action: Action,
    ) -> Result<bool, AuthError> {
        let user_row = self
            .users
            .find_by_id(user_id)
            .await
            .map_err(Self::store_failure)?;

        let Some(user_row) = user_row else {
            return Ok(false);
        };
        if !user_row.active {
            return Ok(false);
        }

        if self.is_admin_user(&user_row).await? {
            return Ok(true);
        }

        let page = self
            .catalog
            .find_page_by_name(page_name)
            .await
            .map_err(Self::store_failure)?;

        let Some(page) = page else {
            return Ok(false);
        };
        if !page.active {
            return Ok(false);
        }

        let base = match user_row.role_id {
            Some(role_id) => self
                .catalog
                .find_grant(role_id, page.id)
                .await
                .map_err(Self::store_failure)?
                .map(|g| PermissionSet::from(&g))
                .unwrap_or(PermissionSet::NONE),
            None => PermissionSet::NONE,
        };

        let overrides = self
            .catalog
            .find_override(&user_row.id, page.id)
            .await
            .map_err(Self::store_failure)?
            .map(|o| OverrideSet::from(&o))
            .unwrap_or(OverrideSet::INHERIT);

        Ok(overrides.apply_over(base).get(action))
    }

    /// Resolve the full permission set for every active page, in
    /// `(sort_order, id)` order.
    ///
    /// Missing or inactive users get an empty list. Admins get an
    /// all-true set per page without consulting grants, the materialized
    /// face of the same bypass `resolve` applies.
    pub async fn effective_permissions(
        &self,
        user_id: &str,
    ) -> Result<Vec<EffectivePermissions>, AuthError> {
        let user_row = self
            .users
            .find_by_id(user_id)
            .await
            .map_err(Self::store_failure)?;

        let Some(user_row) = user_row else {
            return Ok(Vec::new());
        };
        if !user_row.active {
            return Ok(Vec::new());
        }

        let pages = self
            .catalog
            .list_active_pages()
            .await
            .map_err(Self::store_failure)?;

        if self.is_admin_user(&user_row).await? {
            return Ok(pages
                .iter()
                .map(|p| EffectivePermissions::new(p, PermissionSet::ALL))
                .collect());
        }

        let grants: HashMap<i32, PermissionSet> = match user_row.role_id {
            Some(role_id) => self
                .catalog
                .grants_for_role(role_id)
                .await
                .map_err(Self::store_failure)?
                .iter()
                .map(|g| (g.page_id, PermissionSet::from(g)))
                .collect(),
            None => HashMap::new(),
        };

        let overrides: HashMap<i32, OverrideSet> = self
            .catalog
            .overrides_for_user(&user_row.id)
            .await
            .map_err(Self::store_failure)?
            .iter()
            .map(|o| (o.page_id, OverrideSet::from(o)))
            .collect();

        Ok(pages
            .iter()
            .map(|p| {
                let base = grants.get(&p.id).copied().unwrap_or(PermissionSet::NONE);
                let ovr = overrides.get(&p.id).copied().unwrap_or(OverrideSet::INHERIT);
                EffectivePermissions::new(p, ovr.apply_over(base))
            })
            .collect())
    }

    /// Pages the user may view, already in display order
    pub async fn menu(&self, user_id: &str) -> Result<Vec<EffectivePermissions>, AuthError> {
        let mut permissions = self.effective_permissions(user_id).await?;
        permissions.retain(|p| p.permissions.view);
        Ok(permissions)
    }

    /// Guard wrapper around `resolve`: a false result becomes a
    /// `Forbidden` error naming the denied page and action
    pub async fn require_permission(
        &self,
        user_id: &str,
        page_name: &str,
        action: Action,
    ) -> Result<(), AuthError> {
        if self.resolve(user_id, page_name, action).await? {
            Ok(())
        } else {
            tracing::info!(user_id = %user_id, page = %page_name, action = %action, "permission denied");
            Err(AuthError::forbidden(page_name, action.as_str()))
        }
    }
}

impl std::fmt::Debug for AuthorizationService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthorizationService").finish()
    }
}
