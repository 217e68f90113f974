// ABOUTME: HTTP request handlers for project operations
// ABOUTME: Role-scoped listing, admin-gated deletion, default-flag handling

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json as ResponseJson};
use axum::Json;
use tracing::info;

use tandem_core::Role;
use tandem_projects::{ProjectCreateInput, ProjectUpdateInput};

use crate::auth::{load_project_for_manage, load_project_for_view, CurrentUser, RequireAdmin, RequireManager};
use crate::response::{ApiResponse, ApiResult};
use crate::state::AppState;

/// List the projects visible to the caller.
pub async fn list_projects(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
) -> ApiResult<impl IntoResponse> {
    let projects = state.projects.list_projects_for(&principal).await?;
    info!("Retrieved {} projects for {}", projects.len(), principal.id);
    Ok((StatusCode::OK, ResponseJson(ApiResponse::success(projects))))
}

/// Get a single project.
pub async fn get_project(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let project = load_project_for_view(&state, &id, &principal).await?;
    Ok((StatusCode::OK, ResponseJson(ApiResponse::success(project))))
}

/// Create a project. A project manager always becomes the manager of
/// projects they create; admins may assign anyone.
pub async fn create_project(
    State(state): State<AppState>,
    RequireManager(principal): RequireManager,
    Json(mut input): Json<ProjectCreateInput>,
) -> ApiResult<impl IntoResponse> {
    if principal.role == Role::ProjectManager {
        input.manager_id = Some(principal.id.clone());
    }

    let project = state.projects.create_project(input, &principal.id).await?;
    info!("Created project: {} (ID: {})", project.name, project.id);
    Ok((
        StatusCode::CREATED,
        ResponseJson(ApiResponse::success(project)),
    ))
}

/// Update a project.
pub async fn update_project(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
    Path(id): Path<String>,
    Json(updates): Json<ProjectUpdateInput>,
) -> ApiResult<impl IntoResponse> {
    load_project_for_manage(&state, &id, &principal).await?;

    let project = state.projects.update_project(&id, updates).await?;
    info!("Updated project: {} (ID: {})", project.name, project.id);
    Ok((StatusCode::OK, ResponseJson(ApiResponse::success(project))))
}

/// Delete a project and everything it owns. Admin only.
pub async fn delete_project(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    state.projects.delete_project(&id).await?;
    info!("Deleted project: {}", id);
    Ok((
        StatusCode::OK,
        ResponseJson(ApiResponse::success("Project deleted successfully")),
    ))
}
