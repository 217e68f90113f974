use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::Method;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use tandem_api::AppState;
use tandem_auth::JwtConfig;
use tandem_core::Role;
use tandem_storage::StorageConfig;
use tandem_users::{UserCreateInput, UserStorage};

mod config;

use config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Config::from_env()?;

    let storage_config = StorageConfig {
        database_path: config.database_path.clone(),
        ..StorageConfig::default()
    };
    let pool = tandem_storage::connect(&storage_config).await?;

    seed_admin(&pool, &config).await;

    let jwt = JwtConfig::new(config.jwt_secret.clone(), config.token_expiry_mins);
    let state = AppState::with_collaborators(
        pool,
        jwt,
        Arc::new(tandem_documents::LocalFileStore::new(config.uploads_dir.clone())),
        Arc::new(tandem_notify::LogMailer),
    );

    let cors = CorsLayer::new()
        .allow_origin(config.cors_origin.parse::<axum::http::HeaderValue>()?)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any);

    let app = tandem_api::create_router(state).layer(cors);

    let addr = SocketAddr::from(([127, 0, 0, 1], config.port));
    info!("Tandem server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the initial admin account on an empty database, when configured.
async fn seed_admin(pool: &sqlx::SqlitePool, config: &Config) {
    let (Some(email), Some(password)) = (
        config.seed_admin_email.clone(),
        config.seed_admin_password.clone(),
    ) else {
        return;
    };

    let users = UserStorage::new(pool.clone());
    match users.list_users().await {
        Ok(existing) if existing.is_empty() => {
            match users
                .create_user(UserCreateInput {
                    email: email.clone(),
                    name: "Administrator".to_string(),
                    password,
                    role: Some(Role::Admin),
                })
                .await
            {
                Ok(user) => info!("Seeded admin account {} ({})", user.email, user.id),
                Err(e) => warn!("Could not seed admin account: {}", e),
            }
        }
        Ok(_) => {}
        Err(e) => warn!("Could not check for existing users: {}", e),
    }
}
