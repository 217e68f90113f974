// ABOUTME: HTTP request handlers for folder tree operations
// ABOUTME: Tree reads for viewers, structural mutations for managers

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json as ResponseJson};
use axum::Json;
use serde::Deserialize;
use tracing::info;

use tandem_folders::{FolderCreateInput, FolderUpdateInput};

use crate::auth::{load_project_for_manage, load_project_for_view, CurrentUser};
use crate::response::{ApiResponse, ApiResult};
use crate::state::AppState;

/// The project's nested folder tree.
pub async fn folder_tree(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
    Path(project_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    load_project_for_view(&state, &project_id, &principal).await?;

    let tree = state.folders.folder_tree(&project_id).await?;
    Ok((StatusCode::OK, ResponseJson(ApiResponse::success(tree))))
}

/// Create a folder in a project.
pub async fn create_folder(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
    Path(project_id): Path<String>,
    Json(input): Json<FolderCreateInput>,
) -> ApiResult<impl IntoResponse> {
    load_project_for_manage(&state, &project_id, &principal).await?;

    let folder = state.folders.create_folder(&project_id, &principal.id, input).await?;
    info!("Created folder '{}' in project {}", folder.name, project_id);
    Ok((
        StatusCode::CREATED,
        ResponseJson(ApiResponse::success(folder)),
    ))
}

/// Get a single folder.
pub async fn get_folder(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
    Path(folder_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let folder = state.folders.get_folder(&folder_id).await?;
    load_project_for_view(&state, &folder.project_id, &principal).await?;

    Ok((StatusCode::OK, ResponseJson(ApiResponse::success(folder))))
}

/// Rename or edit a folder; a supplied parent id is a move.
pub async fn update_folder(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
    Path(folder_id): Path<String>,
    Json(input): Json<FolderUpdateInput>,
) -> ApiResult<impl IntoResponse> {
    let folder = state.folders.get_folder(&folder_id).await?;
    load_project_for_manage(&state, &folder.project_id, &principal).await?;

    let folder = state.folders.update_folder(&folder_id, input).await?;
    Ok((StatusCode::OK, ResponseJson(ApiResponse::success(folder))))
}

#[derive(Deserialize)]
pub struct MoveFolderRequest {
    #[serde(rename = "newParentFolderId")]
    pub new_parent_folder_id: String,
}

/// Move a folder under a new parent.
pub async fn move_folder(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
    Path(folder_id): Path<String>,
    Json(request): Json<MoveFolderRequest>,
) -> ApiResult<impl IntoResponse> {
    let folder = state.folders.get_folder(&folder_id).await?;
    load_project_for_manage(&state, &folder.project_id, &principal).await?;

    state
        .folders
        .move_folder(&folder_id, &request.new_parent_folder_id)
        .await?;

    info!("Moved folder {} under {}", folder_id, request.new_parent_folder_id);
    Ok((
        StatusCode::OK,
        ResponseJson(ApiResponse::success("Folder moved")),
    ))
}

#[derive(Deserialize, Default)]
pub struct DeleteFolderParams {
    #[serde(default)]
    pub force: bool,
}

/// Delete a folder. With `?force=true` children and documents are
/// reparented one level up instead of blocking the delete.
pub async fn delete_folder(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
    Path(folder_id): Path<String>,
    Query(params): Query<DeleteFolderParams>,
) -> ApiResult<impl IntoResponse> {
    let folder = state.folders.get_folder(&folder_id).await?;
    load_project_for_manage(&state, &folder.project_id, &principal).await?;

    state.folders.delete_folder(&folder_id, params.force).await?;
    info!("Deleted folder {} (force: {})", folder_id, params.force);
    Ok((
        StatusCode::OK,
        ResponseJson(ApiResponse::success("Folder deleted")),
    ))
}
