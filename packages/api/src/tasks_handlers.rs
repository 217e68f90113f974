// ABOUTME: HTTP request handlers for task operations
// ABOUTME: Two update paths: full edit, and a quick progress slider

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json as ResponseJson};
use axum::Json;
use serde::Deserialize;
use tracing::{info, warn};

use tandem_notify::Event;
use tandem_tasks::{TaskCreateInput, TaskUpdateInput};

use crate::auth::{load_project_for_manage, load_project_for_view, CurrentUser};
use crate::response::{ApiResponse, ApiResult};
use crate::state::AppState;

/// Recompute the project's aggregate and broadcast it. Failures are logged
/// and never surface to the caller; the task mutation already committed.
async fn announce_progress(state: &AppState, project_id: &str) {
    match state.tasks.recompute_project_progress(project_id).await {
        Ok(progress) => {
            state
                .events
                .publish(
                    project_id,
                    Event::ProgressUpdated {
                        project_id: project_id.to_string(),
                        progress,
                    },
                )
                .await;
        }
        Err(e) => warn!("Progress refresh for project {} failed: {}", project_id, e),
    }
}

/// List all tasks for a project, main tasks grouped with their subtasks.
pub async fn list_tasks(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
    Path(project_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    load_project_for_view(&state, &project_id, &principal).await?;

    let tasks = state.tasks.list_tasks(&project_id).await?;
    Ok((StatusCode::OK, ResponseJson(ApiResponse::success(tasks))))
}

/// Get a single task.
pub async fn get_task(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
    Path((project_id, task_id)): Path<(String, String)>,
) -> ApiResult<impl IntoResponse> {
    load_project_for_view(&state, &project_id, &principal).await?;

    let task = state.tasks.get_task(&task_id).await?;
    Ok((StatusCode::OK, ResponseJson(ApiResponse::success(task))))
}

/// Create a main task.
pub async fn create_task(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
    Path(project_id): Path<String>,
    Json(input): Json<TaskCreateInput>,
) -> ApiResult<impl IntoResponse> {
    load_project_for_manage(&state, &project_id, &principal).await?;

    let task = state.tasks.create_main_task(&project_id, input).await?;
    announce_progress(&state, &project_id).await;

    info!("Created task '{}' for project {}", task.task_name, project_id);
    Ok((StatusCode::CREATED, ResponseJson(ApiResponse::success(task))))
}

/// Create a subtask under a main task.
pub async fn create_subtask(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
    Path((project_id, task_id)): Path<(String, String)>,
    Json(input): Json<TaskCreateInput>,
) -> ApiResult<impl IntoResponse> {
    load_project_for_manage(&state, &project_id, &principal).await?;

    let task = state.tasks.create_subtask(&project_id, &task_id, input).await?;
    info!("Created subtask '{}' under task {}", task.task_name, task_id);
    Ok((StatusCode::CREATED, ResponseJson(ApiResponse::success(task))))
}

/// Full edit: an explicit status wins over any supplied progress.
pub async fn update_task(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
    Path((project_id, task_id)): Path<(String, String)>,
    Json(input): Json<TaskUpdateInput>,
) -> ApiResult<impl IntoResponse> {
    load_project_for_manage(&state, &project_id, &principal).await?;

    let task = state.tasks.update_task(&task_id, input).await?;
    announce_progress(&state, &project_id).await;

    Ok((StatusCode::OK, ResponseJson(ApiResponse::success(task))))
}

#[derive(Deserialize)]
pub struct QuickProgressRequest {
    pub progress: i64,
}

/// Quick-update path: set progress alone, the status follows from it.
pub async fn set_task_progress(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
    Path((project_id, task_id)): Path<(String, String)>,
    Json(request): Json<QuickProgressRequest>,
) -> ApiResult<impl IntoResponse> {
    load_project_for_manage(&state, &project_id, &principal).await?;

    let task = state.tasks.set_task_progress(&task_id, request.progress).await?;
    announce_progress(&state, &project_id).await;

    Ok((StatusCode::OK, ResponseJson(ApiResponse::success(task))))
}

/// Delete a task and its subtasks.
pub async fn delete_task(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
    Path((project_id, task_id)): Path<(String, String)>,
) -> ApiResult<impl IntoResponse> {
    load_project_for_manage(&state, &project_id, &principal).await?;

    state.tasks.delete_task(&task_id).await?;
    announce_progress(&state, &project_id).await;

    info!("Deleted task {}", task_id);
    Ok((
        StatusCode::OK,
        ResponseJson(ApiResponse::success("Task deleted successfully")),
    ))
}
