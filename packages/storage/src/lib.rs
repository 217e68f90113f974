// ABOUTME: Database connection management and shared storage error type
// ABOUTME: Every statement in the system runs through a pool created here

use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use sqlx::migrate::MigrateDatabase;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Storage errors shared by all entity storage layers
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Database error: {0}")]
    Database(String),
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
    #[error("Sqlx error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Not found")]
    NotFound,
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Storage configuration
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub database_path: PathBuf,
    pub enable_wal: bool,
    pub max_connections: u32,
    pub busy_timeout_seconds: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: tandem_core::tandem_dir().join("tandem.db"),
            enable_wal: true,
            max_connections: 10,
            busy_timeout_seconds: 30,
        }
    }
}

impl StorageConfig {
    /// In-memory database for tests. WAL mode doesn't work with :memory:,
    /// and more than one connection would see separate databases.
    pub fn in_memory() -> Self {
        Self {
            database_path: PathBuf::from(":memory:"),
            enable_wal: false,
            max_connections: 1,
            busy_timeout_seconds: 10,
        }
    }
}

/// Open (creating if necessary) the database, configure SQLite, and run
/// migrations. Returns a pool shared by every entity storage layer.
pub async fn connect(config: &StorageConfig) -> StorageResult<SqlitePool> {
    // Ensure parent directory exists
    if let Some(parent) = config.database_path.parent() {
        if parent != Path::new("") {
            std::fs::create_dir_all(parent).map_err(StorageError::Io)?;
        }
    }

    let database_url = format!("sqlite:{}", config.database_path.display());

    if !sqlx::Sqlite::database_exists(&database_url)
        .await
        .map_err(StorageError::Sqlx)?
    {
        debug!("Creating database at: {}", database_url);
        sqlx::Sqlite::create_database(&database_url)
            .await
            .map_err(StorageError::Sqlx)?;
    }

    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(std::time::Duration::from_secs(config.busy_timeout_seconds))
        .connect(&database_url)
        .await
        .map_err(StorageError::Sqlx)?;

    if config.enable_wal {
        sqlx::query("PRAGMA journal_mode = WAL")
            .execute(&pool)
            .await
            .map_err(StorageError::Sqlx)?;
    }

    sqlx::query("PRAGMA foreign_keys = ON")
        .execute(&pool)
        .await
        .map_err(StorageError::Sqlx)?;

    sqlx::query("PRAGMA synchronous = NORMAL")
        .execute(&pool)
        .await
        .map_err(StorageError::Sqlx)?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(StorageError::Migration)?;

    info!("Database connection established");
    Ok(pool)
}

/// Create a migrated in-memory pool for tests.
pub async fn connect_in_memory() -> StorageResult<SqlitePool> {
    connect(&StorageConfig::in_memory()).await
}
