// ABOUTME: Authentication and role extractors plus the project access guards
// ABOUTME: Handlers receive a verified Principal; denial policy lives here in one place

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use tandem_core::Principal;
use tandem_projects::{can_manage_project, can_view_project, Project};

use crate::response::ApiError;
use crate::state::AppState;

/// Authenticated principal extracted from a Bearer token in the
/// `Authorization` header.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Principal);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::Unauthorized("Missing Authorization header".to_string()))?;

        let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
            ApiError::Unauthorized("Invalid Authorization format. Expected: Bearer <token>".to_string())
        })?;

        let principal = tandem_auth::validate_token(token, &state.jwt)
            .map_err(|_| ApiError::Unauthorized("Invalid or expired token".to_string()))?;

        Ok(CurrentUser(principal))
    }
}

/// Requires the admin role. Rejects with 403 Forbidden otherwise.
pub struct RequireAdmin(pub Principal);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let CurrentUser(principal) = CurrentUser::from_request_parts(parts, state).await?;
        if !principal.role.is_admin() {
            return Err(ApiError::Forbidden("Admin role required".to_string()));
        }
        Ok(RequireAdmin(principal))
    }
}

/// Requires admin or project_manager role. Says nothing about which
/// projects a manager may touch; per-project guards do that.
pub struct RequireManager(pub Principal);

impl FromRequestParts<AppState> for RequireManager {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let CurrentUser(principal) = CurrentUser::from_request_parts(parts, state).await?;
        if !principal.role.is_manager_or_admin() {
            return Err(ApiError::Forbidden("Manager or admin role required".to_string()));
        }
        Ok(RequireManager(principal))
    }
}

/// Load a project the principal may view.
///
/// Denial policy: a principal who cannot view a project is told it does not
/// exist, so unauthorized probes cannot distinguish "absent" from "hidden".
pub async fn load_project_for_view(
    state: &AppState,
    project_id: &str,
    principal: &Principal,
) -> Result<Project, ApiError> {
    let project = state
        .projects
        .get_project(project_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Project not found: {project_id}")))?;

    if !can_view_project(principal, &project) {
        return Err(ApiError::NotFound(format!("Project not found: {project_id}")));
    }

    Ok(project)
}

/// Load a project the principal may manage.
///
/// Viewers who lack manage rights get 403; principals who cannot even view
/// fall through to the 404 above.
pub async fn load_project_for_manage(
    state: &AppState,
    project_id: &str,
    principal: &Principal,
) -> Result<Project, ApiError> {
    let project = load_project_for_view(state, project_id, principal).await?;

    if !can_manage_project(principal, &project) {
        return Err(ApiError::Forbidden(
            "You do not have permission to manage this project".to_string(),
        ));
    }

    Ok(project)
}
