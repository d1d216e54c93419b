//! Application error types for robust error handling.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Application-level errors.
///
/// Credential failures deliberately collapse to one opaque `unauthorized`
/// response so a caller cannot tell which check failed.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("account not found")]
    AccountNotFound,

    #[error("incorrect password")]
    InvalidCredentials,

    #[error("user session not found")]
    SessionNotFound,

    #[error("failed to persist session: {0}")]
    SessionPersistFailure(String),

    #[error("token signature invalid")]
    InvalidSignature,

    #[error("token malformed")]
    Malformed,

    #[error("token is empty")]
    EmptyToken,

    #[error("token expired")]
    TokenExpired,

    #[error("Database error: {0}")]
    Db(#[from] sqlx::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Wallet service error: {0}")]
    Wallet(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "bad request"),
            AppError::AccountNotFound
            | AppError::InvalidCredentials
            | AppError::SessionNotFound
            | AppError::InvalidSignature
            | AppError::Malformed
            | AppError::EmptyToken
            | AppError::TokenExpired => (StatusCode::UNAUTHORIZED, "unauthorized"),
            AppError::Config(_)
            | AppError::SessionPersistFailure(_)
            | AppError::Db(_)
            | AppError::Wallet(_)
            | AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal server error"),
        };

        let body = Json(json!({ "message": message, "data": null }));
        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
