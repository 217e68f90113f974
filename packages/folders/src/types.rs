use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A document folder. Each project owns exactly one root folder
/// (`is_root = true`, `parent_folder_id = None`) created with the project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Folder {
    pub id: String,
    #[serde(rename = "projectId")]
    pub project_id: String,
    pub name: String,
    #[serde(rename = "parentFolderId")]
    pub parent_folder_id: Option<String>,
    pub description: Option<String>,
    pub color: Option<String>,
    pub icon: Option<String>,
    #[serde(rename = "isRoot")]
    pub is_root: bool,
    #[serde(rename = "createdBy")]
    pub created_by: Option<String>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a folder. `parent_folder_id = None` creates another
/// top-level folder; callers normally pass the root folder's id.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FolderCreateInput {
    pub name: String,
    #[serde(rename = "parentFolderId")]
    pub parent_folder_id: Option<String>,
    pub description: Option<String>,
    pub color: Option<String>,
    pub icon: Option<String>,
}

/// Input for editing a folder. A supplied `parent_folder_id` is a move and
/// goes through the same cycle checks as `move_folder`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FolderUpdateInput {
    pub name: Option<String>,
    #[serde(rename = "parentFolderId")]
    pub parent_folder_id: Option<String>,
    pub description: Option<String>,
    pub color: Option<String>,
    pub icon: Option<String>,
}

/// A folder with its nested children, in creation order.
#[derive(Debug, Clone, Serialize)]
pub struct FolderNode {
    #[serde(flatten)]
    pub folder: Folder,
    pub children: Vec<FolderNode>,
}
