// ABOUTME: Document metadata storage layer using SQLite
// ABOUTME: Enforces folder/project consistency and the is_public visibility filter

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use thiserror::Error;
use tracing::debug;

use tandem_core::generate_id;
use tandem_storage::StorageError;

use super::types::{Document, DocumentCreateInput, DocumentUpdateInput};

/// Document storage errors
#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("Document not found: {0}")]
    NotFound(String),
    #[error("Folder {0} belongs to a different project")]
    FolderProjectMismatch(String),
    #[error("Folder not found: {0}")]
    FolderNotFound(String),
    #[error("Validation error: {0}")]
    Validation(String),
}

pub type DocumentResult<T> = Result<T, DocumentError>;

pub struct DocumentStorage {
    pool: SqlitePool,
}

impl DocumentStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Register uploaded file metadata. A supplied folder must belong to
    /// the same project.
    pub async fn create_document(
        &self,
        project_id: &str,
        uploaded_by: &str,
        input: DocumentCreateInput,
    ) -> DocumentResult<Document> {
        if input.title.trim().is_empty() {
            return Err(DocumentError::Validation("Document title is required".to_string()));
        }

        if let Some(folder_id) = &input.folder_id {
            self.ensure_folder_in_project(folder_id, project_id).await?;
        }

        let id = generate_id();
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO documents (
                id, project_id, folder_id, title, content, file_path, file_type,
                file_size, category, is_public, uploaded_by, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(project_id)
        .bind(&input.folder_id)
        .bind(&input.title)
        .bind(&input.content)
        .bind(&input.file_path)
        .bind(&input.file_type)
        .bind(input.file_size)
        .bind(&input.category)
        .bind(input.is_public as i64)
        .bind(uploaded_by)
        .bind(now.to_rfc3339())
        .bind(now.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(StorageError::Sqlx)?;

        debug!("Created document '{}' with ID {}", input.title, id);
        self.get_document(&id).await
    }

    pub async fn get_document(&self, document_id: &str) -> DocumentResult<Document> {
        let row = sqlx::query("SELECT * FROM documents WHERE id = ?")
            .bind(document_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?
            .ok_or_else(|| DocumentError::NotFound(document_id.to_string()))?;

        Self::row_to_document(&row)
    }

    /// List a project's documents. With `include_private = false` only
    /// `is_public` rows are returned; the HTTP layer passes false for
    /// principals who can view but not manage the project.
    pub async fn list_documents(
        &self,
        project_id: &str,
        include_private: bool,
    ) -> DocumentResult<Vec<Document>> {
        let rows = if include_private {
            sqlx::query("SELECT * FROM documents WHERE project_id = ? ORDER BY created_at")
                .bind(project_id)
                .fetch_all(&self.pool)
                .await
        } else {
            sqlx::query(
                "SELECT * FROM documents WHERE project_id = ? AND is_public = 1 ORDER BY created_at",
            )
            .bind(project_id)
            .fetch_all(&self.pool)
            .await
        }
        .map_err(StorageError::Sqlx)?;

        let mut documents = Vec::new();
        for row in rows {
            documents.push(Self::row_to_document(&row)?);
        }
        Ok(documents)
    }

    /// List documents contained in one folder (None = project root level).
    pub async fn list_folder_documents(
        &self,
        project_id: &str,
        folder_id: Option<&str>,
        include_private: bool,
    ) -> DocumentResult<Vec<Document>> {
        let all = self.list_documents(project_id, include_private).await?;
        Ok(all
            .into_iter()
            .filter(|d| d.folder_id.as_deref() == folder_id)
            .collect())
    }

    /// Apply a partial metadata update.
    pub async fn update_document(
        &self,
        document_id: &str,
        input: DocumentUpdateInput,
    ) -> DocumentResult<Document> {
        if let Some(title) = &input.title {
            if title.trim().is_empty() {
                return Err(DocumentError::Validation("Document title cannot be empty".to_string()));
            }
        }

        let mut query = String::from("UPDATE documents SET updated_at = ?");
        let mut has_updates = false;

        if input.title.is_some() {
            query.push_str(", title = ?");
            has_updates = true;
        }
        if input.content.is_some() {
            query.push_str(", content = ?");
            has_updates = true;
        }
        if input.category.is_some() {
            query.push_str(", category = ?");
            has_updates = true;
        }
        if input.is_public.is_some() {
            query.push_str(", is_public = ?");
            has_updates = true;
        }

        query.push_str(" WHERE id = ?");

        if !has_updates {
            return self.get_document(document_id).await;
        }

        let mut q = sqlx::query(&query).bind(Utc::now().to_rfc3339());

        if let Some(title) = &input.title {
            q = q.bind(title);
        }
        if let Some(content) = &input.content {
            q = q.bind(content);
        }
        if let Some(category) = &input.category {
            q = q.bind(category);
        }
        if let Some(is_public) = input.is_public {
            q = q.bind(is_public as i64);
        }

        let result = q
            .bind(document_id)
            .execute(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        if result.rows_affected() == 0 {
            return Err(DocumentError::NotFound(document_id.to_string()));
        }

        self.get_document(document_id).await
    }

    /// Move a document between folders (None = project root). The target
    /// folder must belong to the document's project.
    pub async fn set_document_folder(
        &self,
        document_id: &str,
        folder_id: Option<&str>,
    ) -> DocumentResult<Document> {
        let document = self.get_document(document_id).await?;

        if let Some(folder_id) = folder_id {
            self.ensure_folder_in_project(folder_id, &document.project_id)
                .await?;
        }

        sqlx::query("UPDATE documents SET folder_id = ?, updated_at = ? WHERE id = ?")
            .bind(folder_id)
            .bind(Utc::now().to_rfc3339())
            .bind(document_id)
            .execute(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        self.get_document(document_id).await
    }

    /// Remove the metadata row, returning it so the caller can clean up the
    /// stored file afterwards.
    pub async fn delete_document(&self, document_id: &str) -> DocumentResult<Document> {
        let document = self.get_document(document_id).await?;

        sqlx::query("DELETE FROM documents WHERE id = ?")
            .bind(document_id)
            .execute(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        debug!("Deleted document {}", document_id);
        Ok(document)
    }

    async fn ensure_folder_in_project(
        &self,
        folder_id: &str,
        project_id: &str,
    ) -> DocumentResult<()> {
        let folder_project: Option<String> =
            sqlx::query_scalar("SELECT project_id FROM document_folders WHERE id = ?")
                .bind(folder_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(StorageError::Sqlx)?;

        match folder_project {
            None => Err(DocumentError::FolderNotFound(folder_id.to_string())),
            Some(p) if p != project_id => {
                Err(DocumentError::FolderProjectMismatch(folder_id.to_string()))
            }
            Some(_) => Ok(()),
        }
    }

    fn row_to_document(row: &SqliteRow) -> DocumentResult<Document> {
        Ok(Document {
            id: row.try_get("id").map_err(StorageError::Sqlx)?,
            project_id: row.try_get("project_id").map_err(StorageError::Sqlx)?,
            folder_id: row.try_get("folder_id").map_err(StorageError::Sqlx)?,
            title: row.try_get("title").map_err(StorageError::Sqlx)?,
            content: row.try_get("content").map_err(StorageError::Sqlx)?,
            file_path: row.try_get("file_path").map_err(StorageError::Sqlx)?,
            file_type: row.try_get("file_type").map_err(StorageError::Sqlx)?,
            file_size: row.try_get("file_size").map_err(StorageError::Sqlx)?,
            category: row.try_get("category").map_err(StorageError::Sqlx)?,
            is_public: row.try_get::<i64, _>("is_public").map_err(StorageError::Sqlx)? != 0,
            uploaded_by: row.try_get("uploaded_by").map_err(StorageError::Sqlx)?,
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
}
