// ABOUTME: HTTP request handlers for statistics
// ABOUTME: Aggregates are computed by SQL on demand, never cached

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json as ResponseJson};
use serde::Serialize;
use sqlx::Row;

use tandem_core::Role;
use tandem_projects::ProjectStatus;
use tandem_storage::StorageError;

use crate::auth::{load_project_for_view, CurrentUser, RequireManager};
use crate::response::{ApiResponse, ApiResult};
use crate::state::AppState;

#[derive(Serialize, Default)]
pub struct TaskCounts {
    pub todo: i64,
    #[serde(rename = "inProgress")]
    pub in_progress: i64,
    pub completed: i64,
    #[serde(rename = "onHold")]
    pub on_hold: i64,
    pub total: i64,
}

#[derive(Serialize)]
pub struct ProjectStats {
    #[serde(rename = "projectId")]
    pub project_id: String,
    pub progress: i64,
    pub tasks: TaskCounts,
}

/// Task counts and progress for one project.
pub async fn project_stats(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
    Path(project_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let project = load_project_for_view(&state, &project_id, &principal).await?;

    let rows = sqlx::query("SELECT status, COUNT(*) as count FROM tasks WHERE project_id = ? GROUP BY status")
        .bind(&project_id)
        .fetch_all(&state.pool)
        .await
        .map_err(StorageError::Sqlx)?;

    let mut tasks = TaskCounts::default();
    for row in rows {
        let status: String = row.try_get("status").map_err(StorageError::Sqlx)?;
        let count: i64 = row.try_get("count").map_err(StorageError::Sqlx)?;
        match status.as_str() {
            "todo" => tasks.todo = count,
            "in_progress" => tasks.in_progress = count,
            "completed" => tasks.completed = count,
            "on_hold" => tasks.on_hold = count,
            _ => {}
        }
        tasks.total += count;
    }

    let stats = ProjectStats {
        project_id,
        progress: project.progress,
        tasks,
    };

    Ok((StatusCode::OK, ResponseJson(ApiResponse::success(stats))))
}

#[derive(Serialize, Default)]
pub struct OverviewStats {
    #[serde(rename = "totalProjects")]
    pub total_projects: i64,
    #[serde(rename = "projectsByStatus")]
    pub projects_by_status: ProjectStatusCounts,
    #[serde(rename = "openTasks")]
    pub open_tasks: i64,
    #[serde(rename = "completedTasks")]
    pub completed_tasks: i64,
    #[serde(rename = "averageProgress")]
    pub average_progress: i64,
}

#[derive(Serialize, Default)]
pub struct ProjectStatusCounts {
    pub planning: i64,
    pub active: i64,
    #[serde(rename = "onHold")]
    pub on_hold: i64,
    pub completed: i64,
    pub archived: i64,
}

/// Cross-project overview for the caller's visible set. Admins see every
/// project; managers see the projects they manage.
pub async fn overview_stats(
    State(state): State<AppState>,
    RequireManager(principal): RequireManager,
) -> ApiResult<impl IntoResponse> {
    let projects = state.projects.list_projects_for(&principal).await?;

    let mut stats = OverviewStats {
        total_projects: projects.len() as i64,
        ..Default::default()
    };

    let mut progress_sum: i64 = 0;
    for project in &projects {
        progress_sum += project.progress;
        match project.status {
            ProjectStatus::Planning => stats.projects_by_status.planning += 1,
            ProjectStatus::Active => stats.projects_by_status.active += 1,
            ProjectStatus::OnHold => stats.projects_by_status.on_hold += 1,
            ProjectStatus::Completed => stats.projects_by_status.completed += 1,
            ProjectStatus::Archived => stats.projects_by_status.archived += 1,
        }
    }
    if !projects.is_empty() {
        stats.average_progress =
            (progress_sum as f64 / projects.len() as f64).round() as i64;
    }

    let (open, completed) = match principal.role {
        Role::Admin => {
            let row = sqlx::query(
                "SELECT \
                 SUM(CASE WHEN status != 'completed' THEN 1 ELSE 0 END) as open, \
                 SUM(CASE WHEN status = 'completed' THEN 1 ELSE 0 END) as done \
                 FROM tasks",
            )
            .fetch_one(&state.pool)
            .await
            .map_err(StorageError::Sqlx)?;
            (
                row.try_get::<Option<i64>, _>("open").map_err(StorageError::Sqlx)?,
                row.try_get::<Option<i64>, _>("done").map_err(StorageError::Sqlx)?,
            )
        }
        _ => {
            let row = sqlx::query(
                "SELECT \
                 SUM(CASE WHEN t.status != 'completed' THEN 1 ELSE 0 END) as open, \
                 SUM(CASE WHEN t.status = 'completed' THEN 1 ELSE 0 END) as done \
                 FROM tasks t JOIN projects p ON t.project_id = p.id \
                 WHERE p.manager_id = ?",
            )
            .bind(&principal.id)
            .fetch_one(&state.pool)
            .await
            .map_err(StorageError::Sqlx)?;
            (
                row.try_get::<Option<i64>, _>("open").map_err(StorageError::Sqlx)?,
                row.try_get::<Option<i64>, _>("done").map_err(StorageError::Sqlx)?,
            )
        }
    };

    stats.open_tasks = open.unwrap_or(0);
    stats.completed_tasks = completed.unwrap_or(0);

    Ok((StatusCode::OK, ResponseJson(ApiResponse::success(stats))))
}
