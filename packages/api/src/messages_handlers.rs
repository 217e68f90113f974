// ABOUTME: HTTP request handlers for direct messages
// ABOUTME: Persist first, then best-effort broadcast on the project channel

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json as ResponseJson};
use axum::Json;
use serde::Serialize;
use tracing::info;

use tandem_messages::MessageCreateInput;
use tandem_notify::Event;

use crate::auth::{load_project_for_view, CurrentUser};
use crate::response::{ApiError, ApiResponse, ApiResult};
use crate::state::AppState;

/// Send a message. A project-scoped message requires view access to that
/// project; the broadcast fires after the row is durable.
pub async fn send_message(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
    Json(input): Json<MessageCreateInput>,
) -> ApiResult<impl IntoResponse> {
    if let Some(project_id) = &input.project_id {
        load_project_for_view(&state, project_id, &principal).await?;
    }

    let message = state.messages.create_message(&principal.id, input).await?;

    if let Some(project_id) = &message.project_id {
        state
            .events
            .publish(
                project_id,
                Event::NewMessage {
                    message_id: message.id.clone(),
                    sender_id: message.sender_id.clone(),
                    receiver_id: message.receiver_id.clone(),
                },
            )
            .await;
    }

    info!("Message {} sent by {}", message.id, principal.id);
    Ok((
        StatusCode::CREATED,
        ResponseJson(ApiResponse::success(message)),
    ))
}

#[derive(Serialize)]
pub struct InboxResponse {
    pub messages: Vec<tandem_messages::Message>,
    #[serde(rename = "unreadCount")]
    pub unread_count: i64,
}

/// The caller's inbox, newest first, with an unread counter.
pub async fn inbox(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
) -> ApiResult<impl IntoResponse> {
    let messages = state.messages.list_inbox(&principal.id).await?;
    let unread_count = state.messages.unread_count(&principal.id).await?;

    Ok((
        StatusCode::OK,
        ResponseJson(ApiResponse::success(InboxResponse {
            messages,
            unread_count,
        })),
    ))
}

/// The full exchange between the caller and one other user.
pub async fn conversation(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
    Path(user_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let messages = state.messages.list_conversation(&principal.id, &user_id).await?;
    Ok((StatusCode::OK, ResponseJson(ApiResponse::success(messages))))
}

/// Messages scoped to one project.
pub async fn project_messages(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
    Path(project_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    load_project_for_view(&state, &project_id, &principal).await?;

    let messages = state.messages.list_project_messages(&project_id).await?;
    Ok((StatusCode::OK, ResponseJson(ApiResponse::success(messages))))
}

/// Mark a message read. Only the receiver may do this.
pub async fn mark_read(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
    Path(message_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let message = state.messages.get_message(&message_id).await?;
    if message.receiver_id != principal.id {
        return Err(ApiError::Forbidden(
            "Only the receiver can mark a message read".to_string(),
        ));
    }

    let message = state.messages.mark_read(&message_id).await?;
    Ok((StatusCode::OK, ResponseJson(ApiResponse::success(message))))
}
