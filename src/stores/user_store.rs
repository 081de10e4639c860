use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, Set,
};
use uuid::Uuid;

use crate::types::db::user::{self, Entity as User};

/// Parameters for creating a user row. The password must already be hashed.
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub role_id: Option<i32>,
}

/// UserStore manages user rows, including the durable lockout counters.
///
/// Methods surface raw `DbErr`; callers decide whether a failure is a
/// 503-style outage or an internal error. Policy (uniqueness, lockout
/// thresholds) lives above this layer.
pub struct UserStore {
    db: DatabaseConnection,
}

impl UserStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn find_by_id(&self, user_id: &str) -> Result<Option<user::Model>, DbErr> {
        User::find_by_id(user_id.to_string()).one(&self.db).await
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<user::Model>, DbErr> {
        User::find()
            .filter(user::Column::Username.eq(username))
            .one(&self.db)
            .await
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<user::Model>, DbErr> {
        User::find()
            .filter(user::Column::Email.eq(email))
            .one(&self.db)
            .await
    }

    pub async fn list(&self) -> Result<Vec<user::Model>, DbErr> {
        User::find().all(&self.db).await
    }

    /// Insert a new user row and return it
    pub async fn create(&self, new_user: NewUser) -> Result<user::Model, DbErr> {
        let now = Utc::now().timestamp();

        let row = user::ActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            username: Set(new_user.username),
            password_hash: Set(new_user.password_hash),
            full_name: Set(new_user.full_name),
            email: Set(new_user.email),
            phone: Set(new_user.phone),
            role_id: Set(new_user.role_id),
            active: Set(true),
            failed_attempts: Set(0),
            locked_until: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };

        row.insert(&self.db).await
    }

    /// Increment the failed-login counter in the database.
    ///
    /// The increment runs as a single UPDATE so concurrent failed logins
    /// cannot lose updates; the new count is returned by re-reading the row.
    pub async fn record_failed_attempt(&self, user_id: &str) -> Result<i32, DbErr> {
        let now = Utc::now().timestamp();

        User::update_many()
            .col_expr(
                user::Column::FailedAttempts,
                Expr::col(user::Column::FailedAttempts).add(1),
            )
            .col_expr(user::Column::UpdatedAt, Expr::value(now))
            .filter(user::Column::Id.eq(user_id))
            .exec(&self.db)
            .await?;

        let attempts = User::find_by_id(user_id.to_string())
            .one(&self.db)
            .await?
            .map(|u| u.failed_attempts)
            .unwrap_or(0);

        Ok(attempts)
    }

    /// Set the lockout window end for a user
    pub async fn lock(&self, user_id: &str, until: i64) -> Result<(), DbErr> {
        let now = Utc::now().timestamp();

        User::update_many()
            .col_expr(user::Column::LockedUntil, Expr::value(Some(until)))
            .col_expr(user::Column::UpdatedAt, Expr::value(now))
            .filter(user::Column::Id.eq(user_id))
            .exec(&self.db)
            .await?;

        Ok(())
    }

    /// Reset failed attempts to zero and clear any lockout window
    pub async fn clear_lockout(&self, user_id: &str) -> Result<(), DbErr> {
        let now = Utc::now().timestamp();

        User::update_many()
            .col_expr(user::Column::FailedAttempts, Expr::value(0))
            .col_expr(user::Column::LockedUntil, Expr::value(None::<i64>))
            .col_expr(user::Column::UpdatedAt, Expr::value(now))
            .filter(user::Column::Id.eq(user_id))
            .exec(&self.db)
            .await?;

        Ok(())
    }

    /// Assign or clear a user's role
    pub async fn set_role(&self, user_id: &str, role_id: Option<i32>) -> Result<(), DbErr> {
        let now = Utc::now().timestamp();

        User::update_many()
            .col_expr(user::Column::RoleId, Expr::value(role_id))
            .col_expr(user::Column::UpdatedAt, Expr::value(now))
            .filter(user::Column::Id.eq(user_id))
            .exec(&self.db)
            .await?;

        Ok(())
    }

    /// Soft-delete (or reactivate) a user
    pub async fn set_active(&self, user_id: &str, active: bool) -> Result<(), DbErr> {
        let now = Utc::now().timestamp();

        User::update_many()
            .col_expr(user::Column::Active, Expr::value(active))
            .col_expr(user::Column::UpdatedAt, Expr::value(now))
            .filter(user::Column::Id.eq(user_id))
            .exec(&self.db)
            .await?;

        Ok(())
    }

    /// Count active users currently holding a role
    pub async fn count_active_with_role(&self, role_id: i32) -> Result<u64, DbErr> {
        User::find()
            .filter(user::Column::RoleId.eq(role_id))
            .filter(user::Column::Active.eq(true))
            .count(&self.db)
            .await
    }
}

impl std::fmt::Debug for UserStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserStore")
            .field("db", &"<connection>")
            .finish()
    }
}
