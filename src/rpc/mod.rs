//! Internal RPC surface: token validation for sibling services.
//!
//! Served on its own listener so the endpoint is never reachable through the
//! public API port.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::handlers::http::{ApiResponse, AppState};

#[derive(Debug, Deserialize)]
pub struct ValidateTokenRequest {
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct ValidateTokenData {
    pub user_id: Uuid,
    pub username: String,
    pub full_name: String,
}

/// POST /internal/v1/validate-token
pub async fn validate_token(
    State(state): State<AppState>,
    Json(body): Json<ValidateTokenRequest>,
) -> Result<Json<ApiResponse<ValidateTokenData>>, AppError> {
    let claims = state.sessions().validate_token(&body.token).await?;

    Ok(ApiResponse::success(ValidateTokenData {
        user_id: claims.sub,
        username: claims.username,
        full_name: claims.full_name,
    }))
}
