// Common test utilities for integration tests

use std::sync::Arc;

use migration::{Migrator, MigratorTrait};
use sea_orm::{Database, DatabaseConnection};

use fleetops_backend::api::{AuthApi, RbacApi, UserApi};
use fleetops_backend::services::{
    password, AuthService, AuthorizationService, TokenService,
};
use fleetops_backend::stores::{CatalogStore, NewUser, UserStore};

/// Creates a test database with migrations applied
pub async fn setup_test_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to create test database");

    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");

    db
}

/// Fully wired application against an in-memory database
pub struct TestApp {
    pub users: Arc<UserStore>,
    pub catalog: Arc<CatalogStore>,
    pub tokens: Arc<TokenService>,
    pub auth: Arc<AuthService>,
    pub authz: Arc<AuthorizationService>,
    pub auth_api: AuthApi,
    pub rbac_api: RbacApi,
    pub user_api: UserApi,
}

pub async fn setup_test_app() -> TestApp {
    let db = setup_test_db().await;

    let users = Arc::new(UserStore::new(db.clone()));
    let catalog = Arc::new(CatalogStore::new(db));
    let tokens = Arc::new(TokenService::new(
        "integration-test-secret-at-least-32-chars".to_string(),
        480,
    ));
    let auth = Arc::new(AuthService::new(users.clone(), tokens.clone()));
    let authz = Arc::new(AuthorizationService::new(users.clone(), catalog.clone()));

    let auth_api = AuthApi::new(
        auth.clone(),
        authz.clone(),
        tokens.clone(),
        users.clone(),
        catalog.clone(),
    );
    let rbac_api = RbacApi::new(
        catalog.clone(),
        users.clone(),
        authz.clone(),
        tokens.clone(),
    );
    let user_api = UserApi::new(
        users.clone(),
        catalog.clone(),
        auth.clone(),
        authz.clone(),
        tokens.clone(),
    );

    TestApp {
        users,
        catalog,
        tokens,
        auth,
        authz,
        auth_api,
        rbac_api,
        user_api,
    }
}

/// Insert a user with the given role and the password "testpass"
pub async fn seed_user(app: &TestApp, username: &str, role_id: Option<i32>) -> String {
    app.users
        .create(NewUser {
            username: username.to_string(),
            password_hash: password::hash_password("testpass").expect("Failed to hash password"),
            full_name: Some(format!("{} (test)", username)),
            email: None,
            phone: None,
            role_id,
        })
        .await
        .expect("Failed to seed user")
        .id
}
