// ABOUTME: HTTP API layer for Tandem providing REST endpoints and routing
// ABOUTME: Integration layer that depends on all domain packages

use axum::{
    routing::{delete, get, post, put},
    Router,
};

pub mod auth;
pub mod auth_handlers;
pub mod documents_handlers;
pub mod folders_handlers;
pub mod messages_handlers;
pub mod projects_handlers;
pub mod response;
pub mod state;
pub mod stats_handlers;
pub mod tasks_handlers;
pub mod users_handlers;

pub use state::AppState;

/// Creates the auth API router
pub fn create_auth_router() -> Router<AppState> {
    Router::new()
        .route("/login", post(auth_handlers::login))
        .route("/me", get(auth_handlers::me))
        .route("/change-password", post(auth_handlers::change_password))
}

/// Creates the users API router
pub fn create_users_router() -> Router<AppState> {
    Router::new()
        .route("/", get(users_handlers::list_users))
        .route("/", post(users_handlers::create_user))
        .route("/{user_id}", get(users_handlers::get_user))
        .route("/{user_id}", put(users_handlers::update_user))
        .route("/{user_id}", delete(users_handlers::delete_user))
        .route("/{user_id}/role", put(users_handlers::set_role))
}

/// Creates the projects API router, tasks nested per project
pub fn create_projects_router() -> Router<AppState> {
    Router::new()
        .route("/", get(projects_handlers::list_projects))
        .route("/", post(projects_handlers::create_project))
        .route("/{id}", get(projects_handlers::get_project))
        .route("/{id}", put(projects_handlers::update_project))
        .route("/{id}", delete(projects_handlers::delete_project))
        // Task management endpoints
        .route("/{project_id}/tasks", get(tasks_handlers::list_tasks))
        .route("/{project_id}/tasks", post(tasks_handlers::create_task))
        .route("/{project_id}/tasks/{task_id}", get(tasks_handlers::get_task))
        .route("/{project_id}/tasks/{task_id}", put(tasks_handlers::update_task))
        .route(
            "/{project_id}/tasks/{task_id}",
            delete(tasks_handlers::delete_task),
        )
        .route(
            "/{project_id}/tasks/{task_id}/subtasks",
            post(tasks_handlers::create_subtask),
        )
        .route(
            "/{project_id}/tasks/{task_id}/progress",
            put(tasks_handlers::set_task_progress),
        )
}

/// Creates the folders API router
pub fn create_folders_router() -> Router<AppState> {
    Router::new()
        .route("/project/{project_id}", get(folders_handlers::folder_tree))
        .route("/project/{project_id}", post(folders_handlers::create_folder))
        .route("/{folder_id}", get(folders_handlers::get_folder))
        .route("/{folder_id}", put(folders_handlers::update_folder))
        .route("/{folder_id}", delete(folders_handlers::delete_folder))
        .route("/{folder_id}/move", put(folders_handlers::move_folder))
}

/// Creates the documents API router
pub fn create_documents_router() -> Router<AppState> {
    Router::new()
        .route("/project/{project_id}", get(documents_handlers::list_documents))
        .route("/project/{project_id}", post(documents_handlers::upload_document))
        .route("/{document_id}", get(documents_handlers::get_document))
        .route("/{document_id}", put(documents_handlers::update_document))
        .route("/{document_id}", delete(documents_handlers::delete_document))
        .route("/{document_id}/folder", put(documents_handlers::set_document_folder))
}

/// Creates the messages API router
pub fn create_messages_router() -> Router<AppState> {
    Router::new()
        .route("/", post(messages_handlers::send_message))
        .route("/inbox", get(messages_handlers::inbox))
        .route("/conversation/{user_id}", get(messages_handlers::conversation))
        .route("/project/{project_id}", get(messages_handlers::project_messages))
        .route("/{message_id}/read", put(messages_handlers::mark_read))
}

/// Creates the statistics API router
pub fn create_stats_router() -> Router<AppState> {
    Router::new()
        .route("/overview", get(stats_handlers::overview_stats))
        .route("/project/{project_id}", get(stats_handlers::project_stats))
}

/// Assemble the full API under `/api` with the given state.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/auth", create_auth_router())
        .nest("/api/users", create_users_router())
        .nest("/api/projects", create_projects_router())
        .nest("/api/folders", create_folders_router())
        .nest("/api/documents", create_documents_router())
        .nest("/api/messages", create_messages_router())
        .nest("/api/stats", create_stats_router())
        .route("/api/health", get(health))
        .with_state(state)
}

/// Liveness probe.
async fn health() -> &'static str {
    "ok"
}
