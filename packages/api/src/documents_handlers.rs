// ABOUTME: HTTP request handlers for the document registry
// ABOUTME: Upload stores the payload first, then registers metadata; delete is the reverse

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json as ResponseJson};
use axum::Json;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use tandem_documents::{DocumentCreateInput, DocumentUpdateInput};
use tandem_projects::can_manage_project;

use crate::auth::{load_project_for_manage, load_project_for_view, CurrentUser};
use crate::response::{ApiError, ApiResponse, ApiResult};
use crate::state::AppState;

/// List a project's documents. Managers see everything; view-only
/// principals (the project's client) receive only public documents.
pub async fn list_documents(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
    Path(project_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let project = load_project_for_view(&state, &project_id, &principal).await?;
    let include_private = can_manage_project(&principal, &project);

    let documents = state.documents.list_documents(&project_id, include_private).await?;
    Ok((
        StatusCode::OK,
        ResponseJson(ApiResponse::success(documents)),
    ))
}

#[derive(Deserialize)]
pub struct UploadDocumentRequest {
    pub title: String,
    pub content: Option<String>,
    pub category: Option<String>,
    #[serde(rename = "folderId")]
    pub folder_id: Option<String>,
    #[serde(rename = "isPublic")]
    #[serde(default)]
    pub is_public: bool,
    #[serde(rename = "fileName")]
    pub file_name: String,
    #[serde(rename = "fileType")]
    pub file_type: Option<String>,
    /// Base64-encoded payload. Multipart termination happens upstream.
    pub data: String,
}

/// Upload a document: persist the payload via the file store, then register
/// its metadata. If registration fails the stored payload is removed on a
/// best-effort basis.
pub async fn upload_document(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
    Path(project_id): Path<String>,
    Json(request): Json<UploadDocumentRequest>,
) -> ApiResult<impl IntoResponse> {
    load_project_for_manage(&state, &project_id, &principal).await?;

    let bytes = BASE64
        .decode(request.data.as_bytes())
        .map_err(|_| ApiError::Validation("File data is not valid base64".to_string()))?;

    let stored = state.files.store(&request.file_name, &bytes).await?;

    let input = DocumentCreateInput {
        folder_id: request.folder_id,
        title: request.title,
        content: request.content,
        file_path: stored.path.clone(),
        file_type: request.file_type,
        file_size: stored.size,
        category: request.category,
        is_public: request.is_public,
    };

    match state.documents.create_document(&project_id, &principal.id, input).await {
        Ok(document) => {
            info!("Uploaded document '{}' to project {}", document.title, project_id);
            Ok((
                StatusCode::CREATED,
                ResponseJson(ApiResponse::success(document)),
            ))
        }
        Err(e) => {
            // The payload is on disk but the metadata write failed
            if let Err(cleanup) = state.files.remove(&stored.path).await {
                warn!("Orphaned upload at {}: {}", stored.path, cleanup);
            }
            Err(e.into())
        }
    }
}

/// Get a single document. Private documents require manage rights.
pub async fn get_document(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
    Path(document_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let document = state.documents.get_document(&document_id).await?;
    let project = load_project_for_view(&state, &document.project_id, &principal).await?;

    if !document.is_public && !can_manage_project(&principal, &project) {
        return Err(ApiError::NotFound(format!("Document not found: {document_id}")));
    }

    Ok((StatusCode::OK, ResponseJson(ApiResponse::success(document))))
}

/// Update document metadata.
pub async fn update_document(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
    Path(document_id): Path<String>,
    Json(input): Json<DocumentUpdateInput>,
) -> ApiResult<impl IntoResponse> {
    let document = state.documents.get_document(&document_id).await?;
    load_project_for_manage(&state, &document.project_id, &principal).await?;

    let document = state.documents.update_document(&document_id, input).await?;
    Ok((StatusCode::OK, ResponseJson(ApiResponse::success(document))))
}

#[derive(Deserialize)]
pub struct SetDocumentFolderRequest {
    /// Target folder; null moves the document to the project root level.
    #[serde(rename = "folderId")]
    pub folder_id: Option<String>,
}

/// Move a document between folders of its project.
pub async fn set_document_folder(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
    Path(document_id): Path<String>,
    Json(request): Json<SetDocumentFolderRequest>,
) -> ApiResult<impl IntoResponse> {
    let document = state.documents.get_document(&document_id).await?;
    load_project_for_manage(&state, &document.project_id, &principal).await?;

    let document = state
        .documents
        .set_document_folder(&document_id, request.folder_id.as_deref())
        .await?;

    Ok((StatusCode::OK, ResponseJson(ApiResponse::success(document))))
}

#[derive(Serialize)]
pub struct DeleteDocumentResponse {
    pub message: String,
    /// Whether the stored payload was removed along with the metadata.
    #[serde(rename = "fileRemoved")]
    pub file_removed: bool,
}

/// Delete a document. The metadata row is authoritative; removing the
/// stored payload is best-effort and its outcome is reported to the caller.
pub async fn delete_document(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
    Path(document_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let document = state.documents.get_document(&document_id).await?;
    load_project_for_manage(&state, &document.project_id, &principal).await?;

    let deleted = state.documents.delete_document(&document_id).await?;

    let file_removed = match state.files.remove(&deleted.file_path).await {
        Ok(()) => true,
        Err(e) => {
            warn!("Stored file {} not removed: {}", deleted.file_path, e);
            false
        }
    };

    info!("Deleted document {} (file removed: {})", document_id, file_removed);
    Ok((
        StatusCode::OK,
        ResponseJson(ApiResponse::success(DeleteDocumentResponse {
            message: "Document deleted".to_string(),
            file_removed,
        })),
    ))
}
