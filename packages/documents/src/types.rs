use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An uploaded document's metadata. `folder_id = None` places the document
/// at the project root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    #[serde(rename = "projectId")]
    pub project_id: String,
    #[serde(rename = "folderId")]
    pub folder_id: Option<String>,
    pub title: String,
    pub content: Option<String>,
    #[serde(rename = "filePath")]
    pub file_path: String,
    #[serde(rename = "fileType")]
    pub file_type: Option<String>,
    #[serde(rename = "fileSize")]
    pub file_size: i64,
    pub category: Option<String>,
    #[serde(rename = "isPublic")]
    pub is_public: bool,
    #[serde(rename = "uploadedBy")]
    pub uploaded_by: Option<String>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

/// Input for registering an uploaded file's metadata. `file_path` and
/// `file_size` come from the file store, not the client.
#[derive(Debug, Clone, Default)]
pub struct DocumentCreateInput {
    pub folder_id: Option<String>,
    pub title: String,
    pub content: Option<String>,
    pub file_path: String,
    pub file_type: Option<String>,
    pub file_size: i64,
    pub category: Option<String>,
    pub is_public: bool,
}

/// Input for updating document metadata. Folder moves go through
/// [`DocumentStorage::set_document_folder`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DocumentUpdateInput {
    pub title: Option<String>,
    pub content: Option<String>,
    pub category: Option<String>,
    #[serde(rename = "isPublic")]
    pub is_public: Option<bool>,
}
