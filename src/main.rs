mod api;
mod config;
mod errors;
mod services;
mod stores;
mod types;

use std::sync::Arc;

use poem::{listener::TcpListener, Route, Server};
use poem_openapi::OpenApiService;
use sea_orm::{Database, DatabaseConnection};

use api::{AuthApi, HealthApi, RbacApi, UserApi};
use config::{init_logging, AppSettings};
use migration::{Migrator, MigratorTrait};
use services::{AuthService, AuthorizationService, TokenService};
use stores::{CatalogStore, UserStore};

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    // Refuse to start with a missing or weak JWT secret
    let settings = match AppSettings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = init_logging(&settings) {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    let db: DatabaseConnection = Database::connect(&settings.database_url)
        .await
        .expect("Failed to connect to database");

    tracing::info!(database_url = %settings.database_url, "Connected to database");

    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");

    tracing::info!("Database migrations completed");

    let users = Arc::new(UserStore::new(db.clone()));
    let catalog = Arc::new(CatalogStore::new(db));
    let tokens = Arc::new(TokenService::new(
        settings.jwt_secret.clone(),
        settings.token_ttl_minutes,
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
    let user_api = UserApi::new(users, catalog, auth, authz, tokens);

    let api_service = OpenApiService::new(
        (HealthApi, auth_api, rbac_api, user_api),
        "FleetOps Backend",
        "1.0.0",
    )
    .server("http://localhost:3000/api");

    let ui = api_service.swagger_ui();

    let app = Route::new().nest("/api", api_service).nest("/swagger", ui);

    tracing::info!(bind_address = %settings.bind_address, "Starting server");
    tracing::info!("Swagger UI available at /swagger");

    Server::new(TcpListener::bind(&settings.bind_address))
        .run(app)
        .await
}
