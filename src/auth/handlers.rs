//! Auth HTTP handlers: register, login, logout, refresh-token.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;
use validator::Validate;

use crate::db::NewUser;
use crate::error::AppError;
use crate::handlers::http::{ApiResponse, AppState};
use crate::middleware::{AccessSession, RefreshSession};

use super::password;

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 3, max = 64))]
    pub username: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, max = 255))]
    pub full_name: String,
    #[validate(length(min = 8, max = 128))]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub full_name: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1))]
    pub username: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user_id: Uuid,
    pub username: String,
    pub full_name: String,
    pub email: String,
    pub token: String,
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
pub struct RefreshTokenResponse {
    pub token: String,
}

/// POST /user/v1/register
pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<Json<ApiResponse<RegisterResponse>>, AppError> {
    body.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    if state
        .store()
        .find_user_by_username(&body.username)
        .await?
        .is_some()
    {
        return Err(AppError::Validation("username already registered".to_string()));
    }
    if state.store().find_user_by_email(&body.email).await?.is_some() {
        return Err(AppError::Validation("email already registered".to_string()));
    }

    let password_hash = password::hash_password(&body.password)?;
    let user = state
        .store()
        .insert_user(NewUser {
            username: body.username,
            email: body.email,
            full_name: body.full_name,
            password_hash,
        })
        .await?;

    // Provisioning is reconciled out-of-band when the wallet service is down;
    // failing here would strand the created account behind a duplicate error
    // on retry.
    if let Err(e) = state.wallet().create_wallet(user.id).await {
        warn!(user_id = %user.id, error = %e, "wallet provisioning failed");
    }

    Ok(ApiResponse::success(RegisterResponse {
        id: user.id,
        username: user.username,
        email: user.email,
        full_name: user.full_name,
    }))
}

/// POST /user/v1/login
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<ApiResponse<LoginResponse>>, AppError> {
    body.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let outcome = state.sessions().login(&body.username, &body.password).await?;

    Ok(ApiResponse::success(LoginResponse {
        user_id: outcome.user_id,
        username: outcome.username,
        full_name: outcome.full_name,
        email: outcome.email,
        token: outcome.token,
        refresh_token: outcome.refresh_token,
    }))
}

/// DELETE /user/v1/logout — bearer access token, gate-checked.
pub async fn logout(
    State(state): State<AppState>,
    session: AccessSession,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    state.sessions().logout(&session.token).await?;
    Ok(ApiResponse::message_only())
}

/// PUT /user/v1/refresh-token — bearer refresh token, gate-checked.
pub async fn refresh_token(
    State(state): State<AppState>,
    session: RefreshSession,
) -> Result<Json<ApiResponse<RefreshTokenResponse>>, AppError> {
    let token = state
        .sessions()
        .refresh(&session.token, &session.claims)
        .await?;
    Ok(ApiResponse::success(RefreshTokenResponse { token }))
}
