// ABOUTME: Shared application state for API handlers
// ABOUTME: One SQLite pool, one storage layer per entity, plus the collaborator seams

use std::sync::Arc;

use sqlx::SqlitePool;

use tandem_auth::JwtConfig;
use tandem_documents::{DocumentStorage, FileStore, LocalFileStore};
use tandem_folders::FolderStorage;
use tandem_messages::MessageStorage;
use tandem_notify::{LogMailer, Mailer, ProjectEvents};
use tandem_projects::ProjectStorage;
use tandem_tasks::TaskStorage;
use tandem_users::UserStorage;

/// Shared state for API handlers
#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub projects: Arc<ProjectStorage>,
    pub tasks: Arc<TaskStorage>,
    pub folders: Arc<FolderStorage>,
    pub documents: Arc<DocumentStorage>,
    pub messages: Arc<MessageStorage>,
    pub users: Arc<UserStorage>,
    pub events: Arc<ProjectEvents>,
    pub files: Arc<dyn FileStore>,
    pub mailer: Arc<dyn Mailer>,
    pub jwt: JwtConfig,
}

impl AppState {
    /// Build state around an initialized pool with the default local file
    /// store and logging mailer.
    pub fn new(pool: SqlitePool, jwt: JwtConfig) -> Self {
        Self::with_collaborators(
            pool,
            jwt,
            Arc::new(LocalFileStore::new(tandem_core::constants::uploads_dir())),
            Arc::new(LogMailer),
        )
    }

    /// Build state with explicit collaborator implementations.
    pub fn with_collaborators(
        pool: SqlitePool,
        jwt: JwtConfig,
        files: Arc<dyn FileStore>,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        Self {
            projects: Arc::new(ProjectStorage::new(pool.clone())),
            tasks: Arc::new(TaskStorage::new(pool.clone())),
            folders: Arc::new(FolderStorage::new(pool.clone())),
            documents: Arc::new(DocumentStorage::new(pool.clone())),
            messages: Arc::new(MessageStorage::new(pool.clone())),
            users: Arc::new(UserStorage::new(pool.clone())),
            events: Arc::new(ProjectEvents::new()),
            files,
            mailer,
            jwt,
            pool,
        }
    }
}
