// ABOUTME: Shared API response envelope and error translation
// ABOUTME: Every domain error is recovered here into one consistent JSON shape

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json as ResponseJson, Response};
use serde::Serialize;
use tracing::error;

use tandem_auth::AuthError;
use tandem_documents::{DocumentError, FileStoreError};
use tandem_folders::FolderError;
use tandem_messages::MessageError;
use tandem_projects::ProjectError;
use tandem_storage::StorageError;
use tandem_tasks::TaskError;
use tandem_users::UserError;

/// Standard API response wrapper
#[derive(Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        ApiResponse {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: String) -> ApiResponse<()> {
        ApiResponse {
            success: false,
            data: None,
            error: Some(message),
        }
    }
}

/// Request-boundary error. Domain errors convert into this and nothing
/// below the HTTP layer ever builds a status code.
#[derive(Debug)]
pub enum ApiError {
    Validation(String),
    Unauthorized(String),
    Forbidden(String),
    NotFound(String),
    Conflict(String),
    /// A collaborator (file store, mailer) failed; the message states which
    /// half of the operation succeeded.
    Dependency(String),
    Internal(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::Dependency(msg) => (StatusCode::BAD_GATEWAY, msg),
            ApiError::Internal(msg) => {
                error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        (status, ResponseJson(ApiResponse::<()>::error(message))).into_response()
    }
}

impl From<StorageError> for ApiError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::NotFound => ApiError::NotFound("Not found".to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<ProjectError> for ApiError {
    fn from(e: ProjectError) -> Self {
        match e {
            ProjectError::NotFound(_) => ApiError::NotFound(e.to_string()),
            ProjectError::Validation(_) => ApiError::Validation(e.to_string()),
            ProjectError::Storage(inner) => inner.into(),
        }
    }
}

impl From<TaskError> for ApiError {
    fn from(e: TaskError) -> Self {
        match e {
            TaskError::NotFound(_) | TaskError::ParentNotFound(_) => ApiError::NotFound(e.to_string()),
            TaskError::NestedSubtask(_) | TaskError::ParentProjectMismatch(_) => {
                ApiError::Conflict(e.to_string())
            }
            TaskError::Validation(_) => ApiError::Validation(e.to_string()),
            TaskError::Storage(inner) => inner.into(),
        }
    }
}

impl From<FolderError> for ApiError {
    fn from(e: FolderError) -> Self {
        match e {
            FolderError::NotFound(_) => ApiError::NotFound(e.to_string()),
            FolderError::DuplicateName(_)
            | FolderError::SelfParent
            | FolderError::DescendantCycle
            | FolderError::RootImmutable
            | FolderError::NotEmpty => ApiError::Conflict(e.to_string()),
            FolderError::Validation(_) => ApiError::Validation(e.to_string()),
            FolderError::CorruptTree => ApiError::Internal(e.to_string()),
            FolderError::Storage(inner) => inner.into(),
        }
    }
}

impl From<DocumentError> for ApiError {
    fn from(e: DocumentError) -> Self {
        match e {
            DocumentError::NotFound(_) | DocumentError::FolderNotFound(_) => {
                ApiError::NotFound(e.to_string())
            }
            DocumentError::FolderProjectMismatch(_) => ApiError::Conflict(e.to_string()),
            DocumentError::Validation(_) => ApiError::Validation(e.to_string()),
            DocumentError::Storage(inner) => inner.into(),
        }
    }
}

impl From<MessageError> for ApiError {
    fn from(e: MessageError) -> Self {
        match e {
            MessageError::NotFound(_) => ApiError::NotFound(e.to_string()),
            MessageError::Validation(_) => ApiError::Validation(e.to_string()),
            MessageError::Storage(inner) => inner.into(),
        }
    }
}

impl From<UserError> for ApiError {
    fn from(e: UserError) -> Self {
        match e {
            UserError::NotFound(_) => ApiError::NotFound(e.to_string()),
            UserError::DuplicateEmail(_) => ApiError::Conflict(e.to_string()),
            UserError::InvalidCredentials => {
                ApiError::Unauthorized("Invalid credentials".to_string())
            }
            UserError::Validation(_) => ApiError::Validation(e.to_string()),
            UserError::Auth(inner) => inner.into(),
            UserError::Storage(inner) => inner.into(),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::InvalidCredentials | AuthError::InvalidToken => {
                ApiError::Unauthorized(e.to_string())
            }
            AuthError::WeakPassword(_) => ApiError::Validation(e.to_string()),
            AuthError::Hashing(_) | AuthError::Token(_) => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<FileStoreError> for ApiError {
    fn from(e: FileStoreError) -> Self {
        ApiError::Dependency(format!("File storage failed: {e}"))
    }
}
