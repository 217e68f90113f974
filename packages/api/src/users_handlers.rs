// ABOUTME: HTTP handlers for user administration and self-service settings
// ABOUTME: Role changes are admin-only; settings are self-only

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json as ResponseJson};
use axum::Json;
use serde::Deserialize;
use tracing::{info, warn};

use tandem_core::Role;
use tandem_notify::OutboundEmail;
use tandem_users::{UserCreateInput, UserUpdateInput};

use crate::auth::{CurrentUser, RequireAdmin};
use crate::response::{ApiError, ApiResponse, ApiResult};
use crate::state::AppState;

/// List all accounts. Admin only.
pub async fn list_users(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> ApiResult<impl IntoResponse> {
    let users = state.users.list_users().await?;
    Ok((StatusCode::OK, ResponseJson(ApiResponse::success(users))))
}

/// Create an account. Admin only; the role in the input is honored.
pub async fn create_user(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Json(input): Json<UserCreateInput>,
) -> ApiResult<impl IntoResponse> {
    let user = state.users.create_user(input).await?;

    // Welcome email is best-effort; account creation already succeeded
    let email = OutboundEmail {
        to: user.email.clone(),
        subject: "Your Tandem account".to_string(),
        html: format!("<p>Hello {}, your account is ready.</p>", user.name),
    };
    if let Err(e) = state.mailer.send(&email).await {
        warn!("Welcome email to {} failed: {}", user.email, e);
    }

    info!("Created user {} ({})", user.id, user.email);
    Ok((StatusCode::CREATED, ResponseJson(ApiResponse::success(user))))
}

/// Fetch one account: self, or any account for admins.
pub async fn get_user(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
    Path(user_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    if principal.id != user_id && !principal.role.is_admin() {
        return Err(ApiError::Forbidden("You may only view your own account".to_string()));
    }

    let user = state.users.get_user(&user_id).await?;
    Ok((StatusCode::OK, ResponseJson(ApiResponse::success(user))))
}

/// Update display settings (name, theme, preferences) on your own account.
pub async fn update_user(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
    Path(user_id): Path<String>,
    Json(input): Json<UserUpdateInput>,
) -> ApiResult<impl IntoResponse> {
    if principal.id != user_id && !principal.role.is_admin() {
        return Err(ApiError::Forbidden("You may only update your own account".to_string()));
    }

    let user = state.users.update_user(&user_id, input).await?;
    Ok((StatusCode::OK, ResponseJson(ApiResponse::success(user))))
}

#[derive(Deserialize)]
pub struct SetRoleRequest {
    pub role: Role,
}

/// Change an account's role. Admin only -- roles are immutable by
/// self-service.
pub async fn set_role(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(user_id): Path<String>,
    Json(request): Json<SetRoleRequest>,
) -> ApiResult<impl IntoResponse> {
    let user = state.users.set_role(&user_id, request.role).await?;
    info!("User {} role set to {}", user_id, request.role);
    Ok((StatusCode::OK, ResponseJson(ApiResponse::success(user))))
}

/// Delete an account. Admin only.
pub async fn delete_user(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(user_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    if admin.id == user_id {
        return Err(ApiError::Conflict("You cannot delete your own account".to_string()));
    }

    state.users.delete_user(&user_id).await?;
    info!("Deleted user {}", user_id);
    Ok((
        StatusCode::OK,
        ResponseJson(ApiResponse::success("User deleted")),
    ))
}
