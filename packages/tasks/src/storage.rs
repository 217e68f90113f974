// ABOUTME: Task storage layer using SQLite
// ABOUTME: Enforces the two-level tree, status/progress coupling, and the project aggregate

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use thiserror::Error;
use tracing::{debug, warn};

use tandem_core::generate_id;
use tandem_storage::StorageError;

use super::types::{Task, TaskCreateInput, TaskStatus, TaskUpdateInput};

/// Task storage errors
#[derive(Error, Debug)]
pub enum TaskError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("Task not found: {0}")]
    NotFound(String),
    #[error("Parent task not found: {0}")]
    ParentNotFound(String),
    #[error("Parent task {0} belongs to a different project")]
    ParentProjectMismatch(String),
    #[error("Parent task {0} is itself a subtask; subtasks cannot nest")]
    NestedSubtask(String),
    #[error("Validation error: {0}")]
    Validation(String),
}

pub type TaskResult<T> = Result<T, TaskError>;

pub struct TaskStorage {
    pool: SqlitePool,
}

impl TaskStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a main task for a project.
    pub async fn create_main_task(
        &self,
        project_id: &str,
        input: TaskCreateInput,
    ) -> TaskResult<Task> {
        self.insert_task(project_id, None, input).await
    }

    /// Create a subtask under an existing main task.
    ///
    /// The parent must exist, belong to the stated project, and be a main
    /// task itself -- the tree is exactly two levels deep.
    pub async fn create_subtask(
        &self,
        project_id: &str,
        parent_task_id: &str,
        input: TaskCreateInput,
    ) -> TaskResult<Task> {
        let parent = self
            .get_task(parent_task_id)
            .await
            .map_err(|_| TaskError::ParentNotFound(parent_task_id.to_string()))?;

        if parent.project_id != project_id {
            return Err(TaskError::ParentProjectMismatch(parent_task_id.to_string()));
        }
        if parent.parent_task_id.is_some() {
            return Err(TaskError::NestedSubtask(parent_task_id.to_string()));
        }

        self.insert_task(project_id, Some(parent_task_id), input)
            .await
    }

    async fn insert_task(
        &self,
        project_id: &str,
        parent_task_id: Option<&str>,
        input: TaskCreateInput,
    ) -> TaskResult<Task> {
        if input.task_name.trim().is_empty() {
            return Err(TaskError::Validation("Task name is required".to_string()));
        }
        if let (Some(start), Some(due)) = (input.start_date, input.due_date) {
            if due < start {
                return Err(TaskError::Validation(
                    "Due date cannot be before start date".to_string(),
                ));
            }
        }

        let id = generate_id();
        let now = Utc::now();

        debug!("Creating task {} for project {}", id, project_id);

        sqlx::query(
            r#"
            INSERT INTO tasks (
                id, project_id, task_name, description, status, progress,
                parent_task_id, assigned_to, start_date, due_date, created_at, updated_at
            ) VALUES (?, ?, ?, ?, 'todo', 0, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(project_id)
        .bind(&input.task_name)
        .bind(&input.description)
        .bind(parent_task_id)
        .bind(&input.assigned_to)
        .bind(input.start_date.map(|d| d.to_rfc3339()))
        .bind(input.due_date.map(|d| d.to_rfc3339()))
        .bind(now.to_rfc3339())
        .bind(now.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(StorageError::Sqlx)?;

        self.refresh_project_progress(project_id).await;
        self.get_task(&id).await
    }

    pub async fn get_task(&self, task_id: &str) -> TaskResult<Task> {
        let row = sqlx::query("SELECT * FROM tasks WHERE id = ?")
            .bind(task_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?
            .ok_or_else(|| TaskError::NotFound(task_id.to_string()))?;

        Self::row_to_task(&row)
    }

    /// All tasks of a project, each main task immediately followed by its
    /// own subtasks, groups and siblings in creation order.
    pub async fn list_tasks(&self, project_id: &str) -> TaskResult<Vec<Task>> {
        let rows = sqlx::query(
            r#"
            SELECT t.* FROM tasks t
            LEFT JOIN tasks p ON t.parent_task_id = p.id
            WHERE t.project_id = ?
            ORDER BY
                COALESCE(p.created_at, t.created_at),
                COALESCE(t.parent_task_id, t.id),
                CASE WHEN t.parent_task_id IS NULL THEN 0 ELSE 1 END,
                t.created_at
            "#,
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await
        .map_err(StorageError::Sqlx)?;

        let mut tasks = Vec::new();
        for row in rows {
            tasks.push(Self::row_to_task(&row)?);
        }
        Ok(tasks)
    }

    /// Apply a partial update, then refresh the owning project's progress.
    ///
    /// Status resolution: an explicit `status` wins; otherwise a supplied
    /// `progress` derives one (0 todo, 100 completed, else in_progress);
    /// otherwise the stored status stands. Entering `completed` stamps
    /// `completed_at`; leaving it clears the stamp.
    pub async fn update_task(&self, task_id: &str, input: TaskUpdateInput) -> TaskResult<Task> {
        let existing = self.get_task(task_id).await?;

        if let Some(name) = &input.task_name {
            if name.trim().is_empty() {
                return Err(TaskError::Validation("Task name cannot be empty".to_string()));
            }
        }
        if let Some(progress) = input.progress {
            if !(0..=100).contains(&progress) {
                return Err(TaskError::Validation(format!(
                    "Progress must be between 0 and 100, got {progress}"
                )));
            }
        }

        let status = match (input.status, input.progress) {
            (Some(explicit), _) => explicit,
            (None, Some(progress)) => TaskStatus::from_progress(progress),
            (None, None) => existing.status,
        };

        let now = Utc::now();
        let completed_at = if status == TaskStatus::Completed {
            if existing.status == TaskStatus::Completed {
                existing.completed_at
            } else {
                Some(now)
            }
        } else {
            None
        };

        let mut query =
            String::from("UPDATE tasks SET updated_at = ?, status = ?, completed_at = ?");

        if input.task_name.is_some() {
            query.push_str(", task_name = ?");
        }
        if input.description.is_some() {
            query.push_str(", description = ?");
        }
        if input.progress.is_some() {
            query.push_str(", progress = ?");
        }
        if input.assigned_to.is_some() {
            query.push_str(", assigned_to = ?");
        }
        if input.start_date.is_some() {
            query.push_str(", start_date = ?");
        }
        if input.due_date.is_some() {
            query.push_str(", due_date = ?");
        }

        query.push_str(" WHERE id = ?");

        let mut q = sqlx::query(&query)
            .bind(now.to_rfc3339())
            .bind(Self::status_to_string(&status))
            .bind(completed_at.map(|d| d.to_rfc3339()));

        if let Some(task_name) = &input.task_name {
            q = q.bind(task_name);
        }
        if let Some(description) = &input.description {
            q = q.bind(description);
        }
        if let Some(progress) = input.progress {
            q = q.bind(progress);
        }
        if let Some(assigned_to) = &input.assigned_to {
            q = q.bind(assigned_to);
        }
        if let Some(start_date) = &input.start_date {
            q = q.bind(start_date.to_rfc3339());
        }
        if let Some(due_date) = &input.due_date {
            q = q.bind(due_date.to_rfc3339());
        }

        q.bind(task_id)
            .execute(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        self.refresh_project_progress(&existing.project_id).await;
        self.get_task(task_id).await
    }

    /// Quick-update path: set progress alone and let the status follow.
    pub async fn set_task_progress(&self, task_id: &str, progress: i64) -> TaskResult<Task> {
        self.update_task(
            task_id,
            TaskUpdateInput {
                progress: Some(progress),
                ..Default::default()
            },
        )
        .await
    }

    /// Delete a task and, when it is a main task, all of its subtasks, in
    /// one transaction. Absent tasks signal NotFound rather than silently
    /// succeeding.
    pub async fn delete_task(&self, task_id: &str) -> TaskResult<()> {
        let existing = self.get_task(task_id).await?;

        let mut tx = self.pool.begin().await.map_err(StorageError::Sqlx)?;

        sqlx::query("DELETE FROM tasks WHERE parent_task_id = ?")
            .bind(task_id)
            .execute(&mut *tx)
            .await
            .map_err(StorageError::Sqlx)?;

        sqlx::query("DELETE FROM tasks WHERE id = ?")
            .bind(task_id)
            .execute(&mut *tx)
            .await
            .map_err(StorageError::Sqlx)?;

        tx.commit().await.map_err(StorageError::Sqlx)?;

        debug!("Deleted task {}", task_id);
        self.refresh_project_progress(&existing.project_id).await;
        Ok(())
    }

    /// Recompute and persist a project's progress: the rounded mean of its
    /// main tasks' progress, 0 when the project has no main tasks.
    pub async fn recompute_project_progress(&self, project_id: &str) -> TaskResult<i64> {
        let avg: Option<f64> = sqlx::query_scalar(
            "SELECT AVG(progress) FROM tasks WHERE project_id = ? AND parent_task_id IS NULL",
        )
        .bind(project_id)
        .fetch_one(&self.pool)
        .await
        .map_err(StorageError::Sqlx)?;

        let progress = avg.map(|a| a.round() as i64).unwrap_or(0);

        sqlx::query("UPDATE projects SET progress = ? WHERE id = ?")
            .bind(progress)
            .bind(project_id)
            .execute(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        Ok(progress)
    }

    /// Fire-and-forget aggregate refresh after a task mutation. A failure
    /// here never rolls back the mutation that triggered it.
    async fn refresh_project_progress(&self, project_id: &str) {
        if let Err(e) = self.recompute_project_progress(project_id).await {
            warn!("Failed to refresh progress for project {}: {}", project_id, e);
        }
    }

    fn row_to_task(row: &SqliteRow) -> TaskResult<Task> {
        let status_str: String = row.try_get("status").map_err(StorageError::Sqlx)?;
        let status = match status_str.as_str() {
            "todo" => TaskStatus::Todo,
            "in_progress" => TaskStatus::InProgress,
            "completed" => TaskStatus::Completed,
            "on_hold" => TaskStatus::OnHold,
            _ => TaskStatus::Todo,
        };

        Ok(Task {
            id: row.try_get("id").map_err(StorageError::Sqlx)?,
            project_id: row.try_get("project_id").map_err(StorageError::Sqlx)?,
            task_name: row.try_get("task_name").map_err(StorageError::Sqlx)?,
            description: row.try_get("description").map_err(StorageError::Sqlx)?,
            status,
            progress: row.try_get("progress").map_err(StorageError::Sqlx)?,
            parent_task_id: row.try_get("parent_task_id").map_err(StorageError::Sqlx)?,
            assigned_to: row.try_get("assigned_to").map_err(StorageError::Sqlx)?,
            start_date: Self::optional_timestamp(row, "start_date")?,
            due_date: Self::optional_timestamp(row, "due_date")?,
            completed_at: Self::optional_timestamp(row, "completed_at")?,
            created_at: Self::timestamp(row, "created_at")?,
            updated_at: Self::timestamp(row, "updated_at")?,
        })
    }

    fn timestamp(row: &SqliteRow, column: &str) -> Result<DateTime<Utc>, StorageError> {
        let raw: String = row.try_get(column)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|_| StorageError::Database(format!("Invalid {column} timestamp")))
    }

    fn optional_timestamp(
        row: &SqliteRow,
        column: &str,
    ) -> Result<Option<DateTime<Utc>>, StorageError> {
        let raw: Option<String> = row.try_get(column)?;
        match raw {
            Some(s) => DateTime::parse_from_rfc3339(&s)
                .map(|dt| Some(dt.with_timezone(&Utc)))
                .map_err(|_| StorageError::Database(format!("Invalid {column} timestamp"))),
            None => Ok(None),
        }
    }

    fn status_to_string(status: &TaskStatus) -> &'static str {
        match status {
            TaskStatus::Todo => "todo",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Completed => "completed",
            TaskStatus::OnHold => "on_hold",
        }
    }
}
