//! Authentication gate: bearer extractors for protected routes.
//!
//! Check order for every protected call: non-empty bearer credential, a
//! matching session row by the relevant token column, a clean decode, then a
//! clock comparison against the embedded expiry. Any failure short-circuits
//! to an unauthorized response.

use axum::http::header::AUTHORIZATION;
use chrono::Utc;
use tracing::debug;

use crate::auth::Claims;
use crate::error::AppError;
use crate::handlers::http::AppState;

const BEARER_PREFIX: &str = "Bearer ";

/// Validated access credential: the raw token string plus its decoded claims.
#[derive(Debug, Clone)]
pub struct AccessSession {
    pub token: String,
    pub claims: Claims,
}

/// Validated refresh credential, gate-checked against the refresh-token
/// column instead of the access-token column.
#[derive(Debug, Clone)]
pub struct RefreshSession {
    pub token: String,
    pub claims: Claims,
}

fn bearer_token(parts: &axum::http::request::Parts) -> Result<String, AppError> {
    let value = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    let token = value.strip_prefix(BEARER_PREFIX).unwrap_or(value).trim();
    if token.is_empty() {
        return Err(AppError::EmptyToken);
    }
    Ok(token.to_string())
}

#[axum::async_trait]
impl axum::extract::FromRequestParts<AppState> for AccessSession {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;

        state
            .store()
            .find_session_by_access_token(&token)
            .await?
            .ok_or(AppError::SessionNotFound)?;

        let claims = state.sessions().codec().decode(&token)?;

        if claims.is_expired(Utc::now()) {
            debug!(user_id = %claims.sub, "access token expired");
            return Err(AppError::TokenExpired);
        }

        Ok(AccessSession { token, claims })
    }
}

#[axum::async_trait]
impl axum::extract::FromRequestParts<AppState> for RefreshSession {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;

        state
            .store()
            .find_session_by_refresh_token(&token)
            .await?
            .ok_or(AppError::SessionNotFound)?;

        let claims = state.sessions().codec().decode(&token)?;

        if claims.is_expired(Utc::now()) {
            debug!(user_id = %claims.sub, "refresh token expired");
            return Err(AppError::TokenExpired);
        }

        Ok(RefreshSession { token, claims })
    }
}
