use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use thiserror::Error;
use tracing::{debug, info};

use tandem_core::{generate_id, Principal, Role};
use tandem_storage::StorageError;

use crate::types::{Priority, Project, ProjectCreateInput, ProjectStatus, ProjectUpdateInput};
use crate::validator::{validate_project_data, validate_project_update, ValidationError};

/// Project storage errors
#[derive(Error, Debug)]
pub enum ProjectError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("Validation errors: {0:?}")]
    Validation(Vec<ValidationError>),
    #[error("Project not found: {0}")]
    NotFound(String),
}

pub type ProjectResult<T> = Result<T, ProjectError>;

/// Name given to the root folder created alongside every project.
const ROOT_FOLDER_NAME: &str = "Documents";

pub struct ProjectStorage {
    pool: SqlitePool,
}

impl ProjectStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a project and its root folder in one transaction.
    ///
    /// When `is_default` is requested, every other project's default flag is
    /// cleared inside the same transaction before the insert.
    pub async fn create_project(
        &self,
        input: ProjectCreateInput,
        created_by: &str,
    ) -> ProjectResult<Project> {
        let validation_errors = validate_project_data(&input);
        if !validation_errors.is_empty() {
            return Err(ProjectError::Validation(validation_errors));
        }

        let id = generate_id();
        let root_folder_id = generate_id();
        let now = Utc::now();
        let status = input.status.unwrap_or_default();
        let priority = input.priority.unwrap_or_default();
        let is_default = input.is_default.unwrap_or(false);

        let mut tx = self.pool.begin().await.map_err(StorageError::Sqlx)?;

        if is_default {
            sqlx::query("UPDATE projects SET is_default = 0 WHERE is_default = 1")
                .execute(&mut *tx)
                .await
                .map_err(StorageError::Sqlx)?;
        }

        sqlx::query(
            r#"
            INSERT INTO projects (
                id, name, description, status, priority,
                client_id, manager_id, progress, is_default, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, 0, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&input.name)
        .bind(&input.description)
        .bind(Self::status_to_string(&status))
        .bind(Self::priority_to_string(&priority))
        .bind(&input.client_id)
        .bind(&input.manager_id)
        .bind(is_default as i64)
        .bind(now.to_rfc3339())
        .bind(now.to_rfc3339())
        .execute(&mut *tx)
        .await
        .map_err(StorageError::Sqlx)?;

        sqlx::query(
            r#"
            INSERT INTO document_folders (
                id, project_id, name, parent_folder_id, is_root, created_by, created_at, updated_at
            ) VALUES (?, ?, ?, NULL, 1, ?, ?, ?)
            "#,
        )
        .bind(&root_folder_id)
        .bind(&id)
        .bind(ROOT_FOLDER_NAME)
        .bind(created_by)
        .bind(now.to_rfc3339())
        .bind(now.to_rfc3339())
        .execute(&mut *tx)
        .await
        .map_err(StorageError::Sqlx)?;

        tx.commit().await.map_err(StorageError::Sqlx)?;

        info!("Created project '{}' with ID {}", input.name, id);
        self.get_project(&id)
            .await?
            .ok_or_else(|| ProjectError::NotFound(id))
    }

    pub async fn get_project(&self, id: &str) -> ProjectResult<Option<Project>> {
        let row = sqlx::query("SELECT * FROM projects WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        match row {
            Some(row) => Ok(Some(Self::row_to_project(&row)?)),
            None => Ok(None),
        }
    }

    pub async fn get_default_project(&self) -> ProjectResult<Option<Project>> {
        let row = sqlx::query("SELECT * FROM projects WHERE is_default = 1")
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        match row {
            Some(row) => Ok(Some(Self::row_to_project(&row)?)),
            None => Ok(None),
        }
    }

    pub async fn list_projects(&self) -> ProjectResult<Vec<Project>> {
        let rows = sqlx::query("SELECT * FROM projects ORDER BY created_at")
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        let mut projects = Vec::new();
        for row in rows {
            projects.push(Self::row_to_project(&row)?);
        }

        debug!("Retrieved {} projects", projects.len());
        Ok(projects)
    }

    /// List the projects the principal may see: everything for admins, the
    /// managed set for project managers, the owned set for clients.
    pub async fn list_projects_for(&self, principal: &Principal) -> ProjectResult<Vec<Project>> {
        let rows = match principal.role {
            Role::Admin => {
                sqlx::query("SELECT * FROM projects ORDER BY created_at")
                    .fetch_all(&self.pool)
                    .await
            }
            Role::ProjectManager => {
                sqlx::query("SELECT * FROM projects WHERE manager_id = ? ORDER BY created_at")
                    .bind(&principal.id)
                    .fetch_all(&self.pool)
                    .await
            }
            Role::Client => {
                sqlx::query("SELECT * FROM projects WHERE client_id = ? ORDER BY created_at")
                    .bind(&principal.id)
                    .fetch_all(&self.pool)
                    .await
            }
        }
        .map_err(StorageError::Sqlx)?;

        let mut projects = Vec::new();
        for row in rows {
            projects.push(Self::row_to_project(&row)?);
        }
        Ok(projects)
    }

    /// Apply a partial update. `is_default = true` clears the flag on every
    /// other row first, inside one transaction.
    pub async fn update_project(
        &self,
        id: &str,
        input: ProjectUpdateInput,
    ) -> ProjectResult<Project> {
        let validation_errors = validate_project_update(&input);
        if !validation_errors.is_empty() {
            return Err(ProjectError::Validation(validation_errors));
        }

        let mut query = String::from("UPDATE projects SET updated_at = ?");
        let mut has_updates = false;

        if input.name.is_some() {
            query.push_str(", name = ?");
            has_updates = true;
        }
        if input.description.is_some() {
            query.push_str(", description = ?");
            has_updates = true;
        }
        if input.status.is_some() {
            query.push_str(", status = ?");
            has_updates = true;
        }
        if input.priority.is_some() {
            query.push_str(", priority = ?");
            has_updates = true;
        }
        if input.client_id.is_some() {
            query.push_str(", client_id = ?");
            has_updates = true;
        }
        if input.manager_id.is_some() {
            query.push_str(", manager_id = ?");
            has_updates = true;
        }
        if input.is_default.is_some() {
            query.push_str(", is_default = ?");
            has_updates = true;
        }

        query.push_str(" WHERE id = ?");

        if !has_updates {
            return self
                .get_project(id)
                .await?
                .ok_or_else(|| ProjectError::NotFound(id.to_string()));
        }

        let mut tx = self.pool.begin().await.map_err(StorageError::Sqlx)?;

        if input.is_default == Some(true) {
            sqlx::query("UPDATE projects SET is_default = 0 WHERE id != ?")
                .bind(id)
                .execute(&mut *tx)
                .await
                .map_err(StorageError::Sqlx)?;
        }

        let mut q = sqlx::query(&query).bind(Utc::now().to_rfc3339());

        if let Some(name) = &input.name {
            q = q.bind(name);
        }
        if let Some(description) = &input.description {
            q = q.bind(description);
        }
        if let Some(status) = &input.status {
            q = q.bind(Self::status_to_string(status));
        }
        if let Some(priority) = &input.priority {
            q = q.bind(Self::priority_to_string(priority));
        }
        if let Some(client_id) = &input.client_id {
            q = q.bind(client_id);
        }
        if let Some(manager_id) = &input.manager_id {
            q = q.bind(manager_id);
        }
        if let Some(is_default) = input.is_default {
            q = q.bind(is_default as i64);
        }

        let result = q
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(StorageError::Sqlx)?;

        if result.rows_affected() == 0 {
            return Err(ProjectError::NotFound(id.to_string()));
        }

        tx.commit().await.map_err(StorageError::Sqlx)?;

        info!("Updated project with ID {}", id);
        self.get_project(id)
            .await?
            .ok_or_else(|| ProjectError::NotFound(id.to_string()))
    }

    /// Delete a project and everything it owns: tasks, documents, folders,
    /// and messages, then the project row, all in one transaction.
    pub async fn delete_project(&self, id: &str) -> ProjectResult<()> {
        let mut tx = self.pool.begin().await.map_err(StorageError::Sqlx)?;

        sqlx::query("DELETE FROM tasks WHERE project_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(StorageError::Sqlx)?;

        sqlx::query("DELETE FROM documents WHERE project_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(StorageError::Sqlx)?;

        sqlx::query("DELETE FROM document_folders WHERE project_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(StorageError::Sqlx)?;

        sqlx::query("DELETE FROM messages WHERE project_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(StorageError::Sqlx)?;

        let result = sqlx::query("DELETE FROM projects WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(StorageError::Sqlx)?;

        if result.rows_affected() == 0 {
            return Err(ProjectError::NotFound(id.to_string()));
        }

        tx.commit().await.map_err(StorageError::Sqlx)?;

        info!("Deleted project with ID {}", id);
        Ok(())
    }

    fn row_to_project(row: &SqliteRow) -> Result<Project, StorageError> {
        let status_str: String = row.try_get("status")?;
        let status = match status_str.as_str() {
            "planning" => ProjectStatus::Planning,
            "active" => ProjectStatus::Active,
            "on_hold" => ProjectStatus::OnHold,
            "completed" => ProjectStatus::Completed,
            "archived" => ProjectStatus::Archived,
            _ => ProjectStatus::Planning,
        };

        let priority_str: String = row.try_get("priority")?;
        let priority = match priority_str.as_str() {
            "low" => Priority::Low,
            "medium" => Priority::Medium,
            "high" => Priority::High,
            _ => Priority::Medium,
        };

        let created_at_str: String = row.try_get("created_at")?;
        let updated_at_str: String = row.try_get("updated_at")?;

        let created_at = DateTime::parse_from_rfc3339(&created_at_str)
            .map_err(|_| StorageError::Database("Invalid created_at timestamp".to_string()))?
            .with_timezone(&Utc);
        let updated_at = DateTime::parse_from_rfc3339(&updated_at_str)
            .map_err(|_| StorageError::Database("Invalid updated_at timestamp".to_string()))?
            .with_timezone(&Utc);

        Ok(Project {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            status,
            priority,
            client_id: row.try_get("client_id")?,
            manager_id: row.try_get("manager_id")?,
            progress: row.try_get("progress")?,
            is_default: row.try_get::<i64, _>("is_default")? != 0,
            created_at,
            updated_at,
        })
    }

    fn status_to_string(status: &ProjectStatus) -> &'static str {
        match status {
            ProjectStatus::Planning => "planning",
            ProjectStatus::Active => "active",
            ProjectStatus::OnHold => "on_hold",
            ProjectStatus::Completed => "completed",
            ProjectStatus::Archived => "archived",
        }
    }

    fn priority_to_string(priority: &Priority) -> &'static str {
        match priority {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}
