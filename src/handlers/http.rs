//! Shared application state, the response envelope, and the health probe.

use std::sync::Arc;

use axum::{http::StatusCode, Json};
use serde::Serialize;
use serde_json::json;

use crate::auth::SessionService;
use crate::db::UserStore;
use crate::external::WalletClient;

/// Shared application state for the public API and the internal RPC surface.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn UserStore>,
    pub sessions: SessionService,
    pub wallet: WalletClient,
}

impl AppState {
    pub fn store(&self) -> &Arc<dyn UserStore> {
        &self.store
    }
    pub fn sessions(&self) -> &SessionService {
        &self.sessions
    }
    pub fn wallet(&self) -> &WalletClient {
        &self.wallet
    }
}

/// Uniform `{message, data}` envelope wrapping every successful response.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub message: String,
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Json<Self> {
        Json(Self {
            message: "success".to_string(),
            data: Some(data),
        })
    }
}

impl ApiResponse<serde_json::Value> {
    /// Envelope with no payload, for operations like logout.
    pub fn message_only() -> Json<Self> {
        Json(Self {
            message: "success".to_string(),
            data: None,
        })
    }
}

/// GET /health — liveness probe.
pub async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({ "status": "ok", "service": "ums" })),
    )
}
