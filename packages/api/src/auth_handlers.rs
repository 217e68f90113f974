// ABOUTME: HTTP handlers for login, session introspection, and password change
// ABOUTME: Raw passwords never travel past this file

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json as ResponseJson};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;

use tandem_users::User;

use crate::auth::CurrentUser;
use crate::response::{ApiResponse, ApiResult};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

/// Verify credentials and issue an access token.
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> ApiResult<impl IntoResponse> {
    let user = state
        .users
        .verify_login(&request.email, &request.password)
        .await?;

    let token = tandem_auth::generate_access_token(&user.id, user.role, &state.jwt)?;

    info!("User {} logged in", user.id);
    Ok((
        StatusCode::OK,
        ResponseJson(ApiResponse::success(LoginResponse { token, user })),
    ))
}

/// Return the account behind the presented token.
pub async fn me(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
) -> ApiResult<impl IntoResponse> {
    let user = state.users.get_user(&principal.id).await?;
    Ok((StatusCode::OK, ResponseJson(ApiResponse::success(user))))
}

#[derive(Deserialize)]
pub struct ChangePasswordRequest {
    #[serde(rename = "currentPassword")]
    pub current_password: String,
    #[serde(rename = "newPassword")]
    pub new_password: String,
}

/// Change the caller's own password.
pub async fn change_password(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
    Json(request): Json<ChangePasswordRequest>,
) -> ApiResult<impl IntoResponse> {
    state
        .users
        .change_password(&principal.id, &request.current_password, &request.new_password)
        .await?;

    info!("User {} changed password", principal.id);
    Ok((
        StatusCode::OK,
        ResponseJson(ApiResponse::success("Password updated")),
    ))
}
