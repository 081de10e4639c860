use chrono::Utc;
use std::sync::Arc;

use crate::errors::auth::AuthError;
use crate::services::password;
use crate::services::token_service::TokenService;
use crate::stores::UserStore;
use crate::types::db::user;

/// Failed attempts that trip the lockout
pub const MAX_FAILED_ATTEMPTS: i32 = 5;

/// Length of the lockout window in seconds
pub const LOCKOUT_SECONDS: i64 = 15 * 60;

/// AuthService runs the login flow and the durable lockout state machine.
///
/// States per user row: attempts=0 active, 0<attempts<5 warned,
/// attempts>=5 with `locked_until` set locked. All transitions are
/// persisted; nothing is cached in the process.
pub struct AuthService {
    users: Arc<UserStore>,
    tokens: Arc<TokenService>,
}

impl AuthService {
    pub fn new(users: Arc<UserStore>, tokens: Arc<TokenService>) -> Self {
        Self { users, tokens }
    }

    /// Authenticate a user and issue an access token.
    ///
    /// Unknown usernames and wrong passwords produce the same
    /// `InvalidCredentials` error; a store failure is surfaced as
    /// `ServiceUnavailable`, never as a denial.
    pub async fn login(
        &self,
        username: &str,
        password_attempt: &str,
    ) -> Result<(user::Model, String), AuthError> {
        let found = self.users.find_by_username(username).await.map_err(|e| {
            tracing::error!(error = %e, "user lookup failed during login");
            AuthError::service_unavailable()
        })?;

        // Unknown username: no row, no counters to touch
        let user_row = found.ok_or_else(AuthError::invalid_credentials)?;

        let now = Utc::now().timestamp();

        // Locked: reject before touching the password or the counter
        if let Some(until) = user_row.locked_until {
            if now < until {
                tracing::info!(username = %username, "login rejected, account locked");
                return Err(AuthError::account_locked(until));
            }
        }

        if !password::verify_password(password_attempt, &user_row.password_hash) {
            let attempts = self
                .users
                .record_failed_attempt(&user_row.id)
                .await
                .map_err(|e| {
                    tracing::error!(error = %e, "failed to record login attempt");
                    AuthError::service_unavailable()
                })?;

            if attempts >= MAX_FAILED_ATTEMPTS {
                let until = now + LOCKOUT_SECONDS;
                self.users.lock(&user_row.id, until).await.map_err(|e| {
                    tracing::error!(error = %e, "failed to set lockout window");
                    AuthError::service_unavailable()
                })?;
                tracing::warn!(username = %username, attempts, "account locked");
                return Err(AuthError::account_locked(until));
            }

            return Err(AuthError::invalid_credentials());
        }

        // Successful verification clears any prior accounting
        if user_row.failed_attempts > 0 || user_row.locked_until.is_some() {
            self.users.clear_lockout(&user_row.id).await.map_err(|e| {
                tracing::error!(error = %e, "failed to reset lockout state");
                AuthError::service_unavailable()
            })?;
        }

        let token = self.tokens.issue(&user_row.id)?;
        tracing::info!(username = %username, "login succeeded");

        Ok((user_row, token))
    }

    /// Administrative force-unlock: zero attempts, clear the window,
    /// regardless of elapsed time
    pub async fn unlock(&self, user_id: &str) -> Result<(), AuthError> {
        self.users.clear_lockout(user_id).await.map_err(|e| {
            tracing::error!(error = %e, "failed to unlock account");
            AuthError::service_unavailable()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stores::NewUser;
    use migration::{Migrator, MigratorTrait};
    use sea_orm::Database;

    async fn setup() -> (Arc<UserStore>, AuthService) {
        let db = Database::connect("sqlite::memory:")
            .await
            .expect("Failed to create test database");

        Migrator::up(&db, None)
            .await
            .expect("Failed to run migrations");

        let users = Arc::new(UserStore::new(db));
        let tokens = Arc::new(TokenService::new(
            "test-secret-key-minimum-32-characters-long".to_string(),
            480,
        ));
        let service = AuthService::new(users.clone(), tokens);

        (users, service)
    }

    async fn seed_user(users: &UserStore, username: &str, password: &str) -> user::Model {
        users
            .create(NewUser {
                username: username.to_string(),
                password_hash: password::hash_password(password).unwrap(),
                full_name: None,
                email: None,
                phone: None,
                role_id: None,
            })
            .await
            .expect("Failed to seed user")
    }

    #[tokio::test]
    async fn test_login_succeeds_with_correct_password() {
        let (users, service) = setup().await;
        seed_user(&users, "ana", "correct-pass").await;

        let (user_row, token) = service.login("ana", "correct-pass").await.unwrap();

        assert_eq!(user_row.username, "ana");
        assert!(!token.is_empty());
    }

    #[tokio::test]
    async fn test_login_fails_with_wrong_password() {
        let (users, service) = setup().await;
        seed_user(&users, "ana", "correct-pass").await;

        let result = service.login("ana", "wrong-pass").await;

        match result {
            Err(AuthError::InvalidCredentials(_)) => {}
            _ => panic!("Expected InvalidCredentials error"),
        }
    }

    #[tokio::test]
    async fn test_unknown_user_and_wrong_password_are_byte_identical() {
        let (users, service) = setup().await;
        seed_user(&users, "ana", "correct-pass").await;

        let unknown = service.login("nobody", "whatever").await.unwrap_err();
        let wrong = service.login("ana", "wrong-pass").await.unwrap_err();

        let unknown_body = match unknown {
            AuthError::InvalidCredentials(json) => {
                serde_json::to_string(&serde_json::json!({
                    "error": json.0.error,
                    "message": json.0.message,
                    "status_code": json.0.status_code,
                }))
                .unwrap()
            }
            other => panic!("Expected InvalidCredentials, got {:?}", other),
        };
        let wrong_body = match wrong {
            AuthError::InvalidCredentials(json) => {
                serde_json::to_string(&serde_json::json!({
                    "error": json.0.error,
                    "message": json.0.message,
                    "status_code": json.0.status_code,
                }))
                .unwrap()
            }
            other => panic!("Expected InvalidCredentials, got {:?}", other),
        };

        assert_eq!(unknown_body, wrong_body);
    }

    #[tokio::test]
    async fn test_unknown_username_touches_no_counters() {
        let (users, service) = setup().await;
        let seeded = seed_user(&users, "ana", "correct-pass").await;

        let _ = service.login("nobody", "whatever").await;

        let row = users.find_by_id(&seeded.id).await.unwrap().unwrap();
        assert_eq!(row.failed_attempts, 0);
    }

    #[tokio::test]
    async fn test_fifth_failure_locks_the_account() {
        let (users, service) = setup().await;
        let seeded = seed_user(&users, "ana", "correct-pass").await;

        for _ in 0..4 {
            let result = service.login("ana", "wrong-pass").await;
            match result {
                Err(AuthError::InvalidCredentials(_)) => {}
                other => panic!("Expected InvalidCredentials, got {:?}", other),
            }
        }

        // Fifth failure trips the lock and reports the unlock time
        let fifth = service.login("ana", "wrong-pass").await;
        match fifth {
            Err(AuthError::AccountLocked(json)) => {
                assert!(json.0.message.contains("UTC"));
            }
            other => panic!("Expected AccountLocked, got {:?}", other),
        }

        let row = users.find_by_id(&seeded.id).await.unwrap().unwrap();
        assert_eq!(row.failed_attempts, 5);
        assert!(row.locked_until.is_some());
    }

    #[tokio::test]
    async fn test_locked_account_rejects_without_consuming_attempts() {
        let (users, service) = setup().await;
        let seeded = seed_user(&users, "ana", "correct-pass").await;

        for _ in 0..5 {
            let _ = service.login("ana", "wrong-pass").await;
        }

        // Sixth attempt during the window, even with the correct password
        let during_window = service.login("ana", "correct-pass").await;
        match during_window {
            Err(AuthError::AccountLocked(_)) => {}
            other => panic!("Expected AccountLocked, got {:?}", other),
        }

        let row = users.find_by_id(&seeded.id).await.unwrap().unwrap();
        assert_eq!(row.failed_attempts, 5);
    }

    #[tokio::test]
    async fn test_successful_login_after_window_resets_state() {
        let (users, service) = setup().await;
        let seeded = seed_user(&users, "ana", "correct-pass").await;

        for _ in 0..5 {
            let _ = service.login("ana", "wrong-pass").await;
        }

        // Simulate the window having elapsed
        let past = Utc::now().timestamp() - 1;
        users.lock(&seeded.id, past).await.unwrap();

        let result = service.login("ana", "correct-pass").await;
        assert!(result.is_ok());

        let row = users.find_by_id(&seeded.id).await.unwrap().unwrap();
        assert_eq!(row.failed_attempts, 0);
        assert_eq!(row.locked_until, None);
    }

    #[tokio::test]
    async fn test_successful_login_resets_warned_state() {
        let (users, service) = setup().await;
        let seeded = seed_user(&users, "ana", "correct-pass").await;

        let _ = service.login("ana", "wrong-pass").await;
        let _ = service.login("ana", "wrong-pass").await;

        service.login("ana", "correct-pass").await.unwrap();

        let row = users.find_by_id(&seeded.id).await.unwrap().unwrap();
        assert_eq!(row.failed_attempts, 0);
    }

    #[tokio::test]
    async fn test_unlock_force_resets_a_locked_account() {
        let (users, service) = setup().await;
        let seeded = seed_user(&users, "ana", "correct-pass").await;

        for _ in 0..5 {
            let _ = service.login("ana", "wrong-pass").await;
        }

        service.unlock(&seeded.id).await.unwrap();

        let row = users.find_by_id(&seeded.id).await.unwrap().unwrap();
        assert_eq!(row.failed_attempts, 0);
        assert_eq!(row.locked_until, None);

        // And the user can log in immediately
        assert!(service.login("ana", "correct-pass").await.is_ok());
    }

    #[tokio::test]
    async fn test_login_does_not_reject_inactive_users_itself() {
        // Deactivation is enforced at bearer resolution, not at login
        let (users, service) = setup().await;
        let seeded = seed_user(&users, "ana", "correct-pass").await;
        users.set_active(&seeded.id, false).await.unwrap();

        let result = service.login("ana", "correct-pass").await;
        assert!(result.is_ok());
    }
}
