use axum::{
    extract::{Extension, State},
    Json,
};
use validator::Validate;

use crate::{
    error::AppError,
    models::user::{LoginRequest, LoginResponse, User, UserResponse},
    state::AppState,
    utils::credentials::{issue_access_token, verify_password},
};

const INVALID_CREDENTIALS: &str = "These credentials do not match our records.";

pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    payload.validate()?;

    let user = state
        .users
        .find_by_login(&state.pool, &payload.login)
        .await?
        .ok_or_else(|| AppError::Unauthorized(INVALID_CREDENTIALS.into()))?;

    if !verify_password(&payload.password, &user.password_hash)? {
        tracing::info!(user_id = %user.id, "login rejected");
        return Err(AppError::Unauthorized(INVALID_CREDENTIALS.into()));
    }

    let issued = issue_access_token(
        user.id,
        user.role,
        &state.config.jwt_secret,
        state.config.jwt_expiration_hours,
    )?;
    tracing::info!(user_id = %user.id, role = user.role.as_str(), "login succeeded");

    Ok(Json(LoginResponse {
        access_token: issued.token,
        token_type: "Bearer".to_string(),
        expires_at: issued.expires_at,
        user: UserResponse::from(user),
    }))
}

pub async fn me(Extension(user): Extension<User>) -> Json<UserResponse> {
    Json(UserResponse::from(user))
}
