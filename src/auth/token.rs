//! Token issue and decode (JWT, HS256).

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Which validity window a token is issued with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Access,
    Refresh,
}

/// Signing secret and validity windows, injected from `Config` at startup.
#[derive(Clone)]
pub struct TokenConfig {
    pub signing_key: String,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
}

/// Identity payload embedded in every token.
///
/// `jti` makes each issued token string unique even when two tokens for the
/// same account are stamped within the same second, which keeps the
/// one-session-row-per-token-value invariant intact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub username: String,
    pub full_name: String,
    pub email: String,
    pub jti: Uuid,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn expires_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.exp, 0).unwrap_or_else(|| DateTime::<Utc>::MIN_UTC)
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() > self.exp
    }
}

/// Signs and parses bearer tokens. Expiry is carried as data and enforced by
/// callers, so a cryptographically valid but stale token still decodes.
#[derive(Clone)]
pub struct TokenCodec {
    config: TokenConfig,
}

impl TokenCodec {
    pub fn new(config: TokenConfig) -> Self {
        Self { config }
    }

    /// Validity window for the given kind.
    pub fn ttl(&self, kind: TokenKind) -> Duration {
        match kind {
            TokenKind::Access => self.config.access_ttl,
            TokenKind::Refresh => self.config.refresh_ttl,
        }
    }

    pub fn issue(
        &self,
        user_id: Uuid,
        username: &str,
        full_name: &str,
        email: &str,
        kind: TokenKind,
        issued_at: DateTime<Utc>,
    ) -> AppResult<String> {
        let claims = Claims {
            sub: user_id,
            username: username.to_string(),
            full_name: full_name.to_string(),
            email: email.to_string(),
            jti: Uuid::new_v4(),
            iat: issued_at.timestamp(),
            exp: (issued_at + self.ttl(kind)).timestamp(),
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.config.signing_key.as_bytes()),
        )
        .map_err(|e| AppError::Internal(anyhow::anyhow!("token encode: {}", e)))
    }

    pub fn decode(&self, token: &str) -> AppResult<Claims> {
        let mut validation = Validation::default();
        // exp stays a plain claim here; the authentication gate compares it
        // against the clock.
        validation.validate_exp = false;
        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.signing_key.as_bytes()),
            &validation,
        )
        .map_err(|e| match e.kind() {
            ErrorKind::InvalidSignature => AppError::InvalidSignature,
            _ => AppError::Malformed,
        })?;
        Ok(data.claims)
    }
}
