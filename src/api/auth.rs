//! Signup, login and current-user endpoints.

use axum::extract::State;

use super::{success, ApiResult, AppJson};
use crate::auth::{self, AuthUser};
use crate::errors::AppError;
use crate::models::{AuthResponse, LoginRequest, SignupRequest, User};
use crate::AppState;

/// POST /api/signup - Create an account and return a session token.
pub async fn signup(
    State(state): State<AppState>,
    AppJson(request): AppJson<SignupRequest>,
) -> ApiResult<AuthResponse> {
    let session = auth::signup(&state.repo, &state.jwt, state.config.bcrypt_cost, &request).await?;
    success(session)
}

/// POST /api/login - Exchange credentials for a session token.
pub async fn login(
    State(state): State<AppState>,
    AppJson(request): AppJson<LoginRequest>,
) -> ApiResult<AuthResponse> {
    let session = auth::login(&state.repo, &state.jwt, &request.email, &request.password).await?;
    tracing::info!(user_id = %session.user.id, "User logged in");
    success(session)
}

/// GET /api/me - The authenticated user.
pub async fn me(State(state): State<AppState>, user: AuthUser) -> ApiResult<User> {
    let current = state
        .repo
        .get_user(&user.id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Account no longer exists".to_string()))?;
    success(current)
}
