use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};

use crate::types::db::page::{self, Entity as Page};
use crate::types::db::role::{self, Entity as Role};
use crate::types::db::role_permission::{self, Entity as RolePermission};
use crate::types::db::user_permission_override::{self, Entity as UserPermissionOverride};
use crate::types::internal::permissions::{OverrideSet, PermissionSet};

/// One entry of a bulk override replacement
#[derive(Clone, Debug)]
pub struct OverrideEntry {
    pub page_id: i32,
    pub actions: OverrideSet,
}

/// CatalogStore is the read/write store for roles, pages, role-level
/// grants and user-level overrides.
///
/// Uniqueness is enforced by the callers via the `find_*_by_name` lookups
/// before writes; the unique indexes in the schema back them up.
pub struct CatalogStore {
    db: DatabaseConnection,
}

impl CatalogStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    // --- roles ---

    pub async fn list_roles(&self) -> Result<Vec<role::Model>, DbErr> {
        Role::find().order_by_asc(role::Column::Id).all(&self.db).await
    }

    pub async fn find_role(&self, role_id: i32) -> Result<Option<role::Model>, DbErr> {
        Role::find_by_id(role_id).one(&self.db).await
    }

    pub async fn find_role_by_name(&self, name: &str) -> Result<Option<role::Model>, DbErr> {
        Role::find()
            .filter(role::Column::Name.eq(name))
            .one(&self.db)
            .await
    }

    pub async fn create_role(
        &self,
        name: String,
        description: Option<String>,
    ) -> Result<role::Model, DbErr> {
        let row = role::ActiveModel {
            name: Set(name),
            description: Set(description),
            active: Set(true),
            created_at: Set(Utc::now().timestamp()),
            ..Default::default()
        };

        row.insert(&self.db).await
    }

    pub async fn update_role(
        &self,
        existing: role::Model,
        name: String,
        description: Option<String>,
    ) -> Result<role::Model, DbErr> {
        let mut row: role::ActiveModel = existing.into();
        row.name = Set(name);
        row.description = Set(description);
        row.update(&self.db).await
    }

    /// Soft-delete a role; grants on it stay in storage
    pub async fn deactivate_role(&self, existing: role::Model) -> Result<role::Model, DbErr> {
        let mut row: role::ActiveModel = existing.into();
        row.active = Set(false);
        row.update(&self.db).await
    }

    // --- pages ---

    pub async fn list_pages(&self) -> Result<Vec<page::Model>, DbErr> {
        Page::find().order_by_asc(page::Column::Id).all(&self.db).await
    }

    /// Active pages in menu display order, ties broken by id so repeated
    /// calls are deterministic
    pub async fn list_active_pages(&self) -> Result<Vec<page::Model>, DbErr> {
        Page::find()
            .filter(page::Column::Active.eq(true))
            .order_by_asc(page::Column::SortOrder)
            .order_by_asc(page::Column::Id)
            .all(&self.db)
            .await
    }

    pub async fn find_page(&self, page_id: i32) -> Result<Option<page::Model>, DbErr> {
        Page::find_by_id(page_id).one(&self.db).await
    }

    pub async fn find_page_by_name(&self, name: &str) -> Result<Option<page::Model>, DbErr> {
        Page::find()
            .filter(page::Column::Name.eq(name))
            .one(&self.db)
            .await
    }

    pub async fn find_page_by_route(&self, route: &str) -> Result<Option<page::Model>, DbErr> {
        Page::find()
            .filter(page::Column::Route.eq(route))
            .one(&self.db)
            .await
    }

    pub async fn create_page(
        &self,
        name: String,
        display_name: String,
        route: String,
        icon: Option<String>,
        sort_order: i32,
    ) -> Result<page::Model, DbErr> {
        let row = page::ActiveModel {
            name: Set(name),
            display_name: Set(display_name),
            route: Set(route),
            icon: Set(icon),
            sort_order: Set(sort_order),
            active: Set(true),
            created_at: Set(Utc::now().timestamp()),
            ..Default::default()
        };

        row.insert(&self.db).await
    }

    pub async fn update_page(
        &self,
        existing: page::Model,
        display_name: String,
        icon: Option<String>,
        sort_order: i32,
    ) -> Result<page::Model, DbErr> {
        let mut row: page::ActiveModel = existing.into();
        row.display_name = Set(display_name);
        row.icon = Set(icon);
        row.sort_order = Set(sort_order);
        row.update(&self.db).await
    }

    /// Soft-delete a page; grants and overrides on it stay in storage
    pub async fn deactivate_page(&self, existing: page::Model) -> Result<page::Model, DbErr> {
        let mut row: page::ActiveModel = existing.into();
        row.active = Set(false);
        row.update(&self.db).await
    }

    // --- role-level grants ---

    pub async fn find_grant(
        &self,
        role_id: i32,
        page_id: i32,
    ) -> Result<Option<role_permission::Model>, DbErr> {
        RolePermission::find()
            .filter(role_permission::Column::RoleId.eq(role_id))
            .filter(role_permission::Column::PageId.eq(page_id))
            .one(&self.db)
            .await
    }

    pub async fn grants_for_role(
        &self,
        role_id: i32,
    ) -> Result<Vec<role_permission::Model>, DbErr> {
        RolePermission::find()
            .filter(role_permission::Column::RoleId.eq(role_id))
            .all(&self.db)
            .await
    }

    /// Create-or-update the grant for (role, page)
    pub async fn upsert_grant(
        &self,
        role_id: i32,
        page_id: i32,
        permissions: PermissionSet,
    ) -> Result<role_permission::Model, DbErr> {
        match self.find_grant(role_id, page_id).await? {
            Some(existing) => {
                let mut row: role_permission::ActiveModel = existing.into();
                row.can_view = Set(permissions.view);
                row.can_create = Set(permissions.create);
                row.can_edit = Set(permissions.edit);
                row.can_delete = Set(permissions.delete);
                row.update(&self.db).await
            }
            None => {
                let row = role_permission::ActiveModel {
                    role_id: Set(role_id),
                    page_id: Set(page_id),
                    can_view: Set(permissions.view),
                    can_create: Set(permissions.create),
                    can_edit: Set(permissions.edit),
                    can_delete: Set(permissions.delete),
                    created_at: Set(Utc::now().timestamp()),
                    ..Default::default()
                };
                row.insert(&self.db).await
            }
        }
    }

    // --- user-level overrides ---

    pub async fn find_override(
        &self,
        user_id: &str,
        page_id: i32,
    ) -> Result<Option<user_permission_override::Model>, DbErr> {
        UserPermissionOverride::find()
            .filter(user_permission_override::Column::UserId.eq(user_id))
            .filter(user_permission_override::Column::PageId.eq(page_id))
            .one(&self.db)
            .await
    }

    pub async fn overrides_for_user(
        &self,
        user_id: &str,
    ) -> Result<Vec<user_permission_override::Model>, DbErr> {
        UserPermissionOverride::find()
            .filter(user_permission_override::Column::UserId.eq(user_id))
            .all(&self.db)
            .await
    }

    /// Replace every override the user has with the given set.
    ///
    /// Delete-then-insert runs inside one transaction; a concurrent reader
    /// sees either the old set or the new set, never a mix.
    pub async fn replace_user_overrides(
        &self,
        user_id: &str,
        entries: &[OverrideEntry],
    ) -> Result<(), DbErr> {
        let txn = self.db.begin().await?;
        let now = Utc::now().timestamp();

        UserPermissionOverride::delete_many()
            .filter(user_permission_override::Column::UserId.eq(user_id))
            .exec(&txn)
            .await?;

        for entry in entries {
            let row = user_permission_override::ActiveModel {
                user_id: Set(user_id.to_string()),
                page_id: Set(entry.page_id),
                can_view: Set(entry.actions.view),
                can_create: Set(entry.actions.create),
                can_edit: Set(entry.actions.edit),
                can_delete: Set(entry.actions.delete),
                created_at: Set(now),
                updated_at: Set(now),
                ..Default::default()
            };
            row.insert(&txn).await?;
        }

        txn.commit().await
    }

    /// Delete one override, restoring role inheritance for that page.
    /// Returns the number of rows removed.
    pub async fn delete_override(&self, user_id: &str, page_id: i32) -> Result<u64, DbErr> {
        let result = UserPermissionOverride::delete_many()
            .filter(user_permission_override::Column::UserId.eq(user_id))
            .filter(user_permission_override::Column::PageId.eq(page_id))
            .exec(&self.db)
            .await?;

        Ok(result.rows_affected)
    }
}

impl std::fmt::Debug for CatalogStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogStore")
            .field("db", &"<connection>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use migration::{Migrator, MigratorTrait};
    use sea_orm::Database;

    async fn setup_test_store() -> CatalogStore {
        let db = Database::connect("sqlite::memory:")
            .await
            .expect("Failed to create test database");

        Migrator::up(&db, None)
            .await
            .expect("Failed to run migrations");

        CatalogStore::new(db)
    }

    async fn seed_page(store: &CatalogStore, name: &str, sort_order: i32) -> page::Model {
        store
            .create_page(
                name.to_string(),
                name.to_uppercase(),
                format!("/{}", name),
                None,
                sort_order,
            )
            .await
            .expect("Failed to create page")
    }

    #[tokio::test]
    async fn test_role_crud_and_name_lookup() {
        let store = setup_test_store().await;

        let role = store
            .create_role("Operador".to_string(), Some("Operations staff".to_string()))
            .await
            .unwrap();
        assert!(role.active);

        let found = store.find_role_by_name("Operador").await.unwrap();
        assert_eq!(found.map(|r| r.id), Some(role.id));

        let updated = store
            .update_role(role, "Operador".to_string(), Some("Updated".to_string()))
            .await
            .unwrap();
        assert_eq!(updated.description.as_deref(), Some("Updated"));

        let deactivated = store.deactivate_role(updated).await.unwrap();
        assert!(!deactivated.active);
    }

    #[tokio::test]
    async fn test_active_pages_are_ordered_and_exclude_inactive() {
        let store = setup_test_store().await;

        let p_last = seed_page(&store, "reportes", 30).await;
        let p_first = seed_page(&store, "entregas", 10).await;
        let p_mid = seed_page(&store, "vehiculos", 20).await;
        let p_gone = seed_page(&store, "mantenimiento", 15).await;
        store.deactivate_page(p_gone).await.unwrap();

        let pages = store.list_active_pages().await.unwrap();

        let ids: Vec<i32> = pages.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![p_first.id, p_mid.id, p_last.id]);
    }

    #[tokio::test]
    async fn test_equal_sort_order_breaks_ties_by_id() {
        let store = setup_test_store().await;

        let a = seed_page(&store, "first", 5).await;
        let b = seed_page(&store, "second", 5).await;

        let pages = store.list_active_pages().await.unwrap();
        let ids: Vec<i32> = pages.iter().map(|p| p.id).collect();

        assert_eq!(ids, vec![a.id, b.id]);
    }

    #[tokio::test]
    async fn test_upsert_grant_creates_then_updates_single_row() {
        let store = setup_test_store().await;
        let role = store.create_role("Operador".to_string(), None).await.unwrap();
        let page = seed_page(&store, "entregas", 1).await;

        let created = store
            .upsert_grant(
                role.id,
                page.id,
                PermissionSet {
                    view: true,
                    create: false,
                    edit: false,
                    delete: false,
                },
            )
            .await
            .unwrap();
        assert!(created.can_view);
        assert!(!created.can_delete);

        let updated = store
            .upsert_grant(role.id, page.id, PermissionSet::ALL)
            .await
            .unwrap();
        assert_eq!(updated.id, created.id);
        assert!(updated.can_delete);

        let grants = store.grants_for_role(role.id).await.unwrap();
        assert_eq!(grants.len(), 1);
    }

    #[tokio::test]
    async fn test_replace_user_overrides_leaves_exactly_new_set() {
        let store = setup_test_store().await;
        let p1 = seed_page(&store, "entregas", 1).await;
        let p2 = seed_page(&store, "vehiculos", 2).await;
        let p3 = seed_page(&store, "reportes", 3).await;
        let user_id = "11111111-2222-3333-4444-555555555555";

        // Start with three overrides
        store
            .replace_user_overrides(
                user_id,
                &[
                    OverrideEntry {
                        page_id: p1.id,
                        actions: OverrideSet {
                            view: Some(true),
                            ..OverrideSet::INHERIT
                        },
                    },
                    OverrideEntry {
                        page_id: p2.id,
                        actions: OverrideSet::INHERIT,
                    },
                    OverrideEntry {
                        page_id: p3.id,
                        actions: OverrideSet {
                            delete: Some(false),
                            ..OverrideSet::INHERIT
                        },
                    },
                ],
            )
            .await
            .unwrap();
        assert_eq!(store.overrides_for_user(user_id).await.unwrap().len(), 3);

        // Replace with one; exactly one row must remain
        store
            .replace_user_overrides(
                user_id,
                &[OverrideEntry {
                    page_id: p2.id,
                    actions: OverrideSet {
                        create: Some(true),
                        ..OverrideSet::INHERIT
                    },
                }],
            )
            .await
            .unwrap();

        let rows = store.overrides_for_user(user_id).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].page_id, p2.id);
        assert_eq!(rows[0].can_create, Some(true));
        assert_eq!(rows[0].can_view, None);
    }

    #[tokio::test]
    async fn test_replace_user_overrides_with_empty_set_clears_all() {
        let store = setup_test_store().await;
        let page = seed_page(&store, "entregas", 1).await;
        let user_id = "99999999-8888-7777-6666-555555555555";

        store
            .replace_user_overrides(
                user_id,
                &[OverrideEntry {
                    page_id: page.id,
                    actions: OverrideSet {
                        view: Some(false),
                        ..OverrideSet::INHERIT
                    },
                }],
            )
            .await
            .unwrap();

        store.replace_user_overrides(user_id, &[]).await.unwrap();

        assert!(store.overrides_for_user(user_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_override_restores_inheritance() {
        let store = setup_test_store().await;
        let page = seed_page(&store, "entregas", 1).await;
        let user_id = "aaaa-bbbb";

        store
            .replace_user_overrides(
                user_id,
                &[OverrideEntry {
                    page_id: page.id,
                    actions: OverrideSet {
                        view: Some(false),
                        ..OverrideSet::INHERIT
                    },
                }],
            )
            .await
            .unwrap();

        let removed = store.delete_override(user_id, page.id).await.unwrap();
        assert_eq!(removed, 1);

        assert!(store.find_override(user_id, page.id).await.unwrap().is_none());

        // Deleting again is a no-op, reported as zero rows
        let removed_again = store.delete_override(user_id, page.id).await.unwrap();
        assert_eq!(removed_again, 0);
    }
}
