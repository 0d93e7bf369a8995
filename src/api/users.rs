//! User administration endpoints.

use axum::extract::{Path, State};

use super::{success, ApiResult, AppJson};
use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::models::{Role, UpdateRoleRequest, User};
use crate::AppState;

/// GET /api/users - List all users (admin).
pub async fn list_users(State(state): State<AppState>, user: AuthUser) -> ApiResult<Vec<User>> {
    user.require_admin()?;
    success(state.repo.list_users().await?)
}

/// PUT /api/users/{id}/role - Change a user's role (admin).
pub async fn update_user_role(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    AppJson(request): AppJson<UpdateRoleRequest>,
) -> ApiResult<User> {
    user.require_admin()?;

    if id == user.id && request.role != Role::Admin {
        return Err(AppError::Validation(
            "Administrators cannot demote themselves".to_string(),
        ));
    }

    let updated = state.repo.update_user_role(&id, request.role).await?;
    tracing::info!(
        user_id = %updated.id,
        role = updated.role.as_str(),
        by = %user.email,
        "User role changed"
    );
    success(updated)
}
