//! Outbound client for the wallet-provisioning service.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// HTTP request timeout in seconds for wallet calls.
const REQUEST_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Serialize)]
struct CreateWalletRequest {
    user_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct Wallet {
    pub id: Uuid,
    pub user_id: Uuid,
    pub balance: f64,
}

/// Client for the sibling wallet service. Clone is cheap — reqwest::Client
/// shares its connection pool internally.
#[derive(Clone)]
pub struct WalletClient {
    client: Client,
    create_url: Option<String>,
}

impl WalletClient {
    /// An empty host disables provisioning (local development, tests).
    pub fn new(host: &str, create_path: &str) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| AppError::Wallet(format!("client init: {}", e)))?;
        let create_url = if host.is_empty() {
            None
        } else {
            Some(format!("{}{}", host, create_path))
        };
        Ok(Self { client, create_url })
    }

    pub fn is_enabled(&self) -> bool {
        self.create_url.is_some()
    }

    /// Provision a wallet for a freshly registered account. Returns `None`
    /// when the client is disabled.
    pub async fn create_wallet(&self, user_id: Uuid) -> AppResult<Option<Wallet>> {
        let Some(url) = &self.create_url else {
            return Ok(None);
        };

        let response = self
            .client
            .post(url)
            .json(&CreateWalletRequest { user_id })
            .send()
            .await
            .map_err(|e| AppError::Wallet(format!("failed to reach wallet service: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::Wallet(format!(
                "wallet service returned {}",
                response.status()
            )));
        }

        let wallet = response
            .json::<Wallet>()
            .await
            .map_err(|e| AppError::Wallet(format!("failed to read wallet response: {}", e)))?;
        Ok(Some(wallet))
    }
}
