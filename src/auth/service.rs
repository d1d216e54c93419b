//! Session lifecycle: login, logout, token refresh, token validation.

use std::sync::Arc;

use chrono::Utc;
use tracing::debug;
use uuid::Uuid;

use crate::db::{SessionRow, UserStore};
use crate::error::{AppError, AppResult};

use super::password;
use super::token::{Claims, TokenCodec, TokenKind};

/// Account profile plus the issued token pair, returned by a successful login.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub user_id: Uuid,
    pub username: String,
    pub full_name: String,
    pub email: String,
    pub token: String,
    pub refresh_token: String,
}

/// Orchestrates the session state machine over the store and the codec.
/// Holds no row state of its own; every operation re-reads the store, so
/// concurrent requests coordinate through the store's per-row semantics.
#[derive(Clone)]
pub struct SessionService {
    store: Arc<dyn UserStore>,
    codec: TokenCodec,
}

impl SessionService {
    pub fn new(store: Arc<dyn UserStore>, codec: TokenCodec) -> Self {
        Self { store, codec }
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    /// Verify credentials, issue an access/refresh pair stamped with one
    /// issuance instant, and persist the session row.
    pub async fn login(&self, username: &str, password: &str) -> AppResult<LoginOutcome> {
        let user = self
            .store
            .find_user_by_username(username)
            .await?
            .ok_or(AppError::AccountNotFound)?;

        if !password::verify_password(password, &user.password_hash)? {
            return Err(AppError::InvalidCredentials);
        }

        let now = Utc::now();
        let token = self.codec.issue(
            user.id,
            &user.username,
            &user.full_name,
            &user.email,
            TokenKind::Access,
            now,
        )?;
        let refresh_token = self.codec.issue(
            user.id,
            &user.username,
            &user.full_name,
            &user.email,
            TokenKind::Refresh,
            now,
        )?;

        let session = SessionRow {
            id: Uuid::new_v4(),
            user_id: user.id,
            token: token.clone(),
            refresh_token: refresh_token.clone(),
            token_expired: now + self.codec.ttl(TokenKind::Access),
            refresh_token_expired: now + self.codec.ttl(TokenKind::Refresh),
            created_at: now,
        };
        self.store
            .insert_session(&session)
            .await
            .map_err(|e| AppError::SessionPersistFailure(e.to_string()))?;

        debug!(user_id = %user.id, session_id = %session.id, "session created");

        Ok(LoginOutcome {
            user_id: user.id,
            username: user.username,
            full_name: user.full_name,
            email: user.email,
            token,
            refresh_token,
        })
    }

    /// Delete the session row matching the presented access token. The token
    /// is not decoded first and deleting a missing row is indistinguishable
    /// from deleting one, giving at-least-once logout semantics.
    pub async fn logout(&self, access_token: &str) -> AppResult<()> {
        self.store
            .delete_session_by_access_token(access_token)
            .await?;
        debug!("session removed");
        Ok(())
    }

    /// Re-issue the access token from an already-validated refresh claim and
    /// swap it into the row whose refresh_token column matches. The refresh
    /// token's own expiry was enforced by the gate that decoded the claim.
    pub async fn refresh(&self, refresh_token: &str, claims: &Claims) -> AppResult<String> {
        let now = Utc::now();
        let token = self.codec.issue(
            claims.sub,
            &claims.username,
            &claims.full_name,
            &claims.email,
            TokenKind::Access,
            now,
        )?;

        let updated = self
            .store
            .update_access_token(refresh_token, &token, now + self.codec.ttl(TokenKind::Access))
            .await?;
        if updated == 0 {
            return Err(AppError::SessionNotFound);
        }

        debug!(user_id = %claims.sub, "access token rotated");
        Ok(token)
    }

    /// Decode the token and confirm a backing session row still exists.
    /// Expiry is not re-checked here; the gate owns the clock comparison, so
    /// this path only distinguishes cryptographically-invalid from
    /// logged-out-or-never-issued.
    pub async fn validate_token(&self, token: &str) -> AppResult<Claims> {
        if token.is_empty() {
            return Err(AppError::EmptyToken);
        }

        let claims = self.codec.decode(token)?;

        self.store
            .find_session_by_access_token(token)
            .await?
            .ok_or(AppError::SessionNotFound)?;

        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::token::TokenConfig;
    use crate::db::{InMemoryUserStore, NewUser};
    use chrono::Duration;

    fn test_service() -> (Arc<InMemoryUserStore>, SessionService) {
        let store = Arc::new(InMemoryUserStore::new());
        let codec = TokenCodec::new(TokenConfig {
            signing_key: "test-jwt-secret-min-32-chars!!".to_string(),
            access_ttl: Duration::minutes(15),
            refresh_ttl: Duration::hours(72),
        });
        let service = SessionService::new(store.clone(), codec);
        (store, service)
    }

    async fn seed_user(store: &InMemoryUserStore, username: &str, email: &str, password: &str) {
        store
            .insert_user(NewUser {
                username: username.to_string(),
                email: email.to_string(),
                full_name: format!("{} Fullname", username),
                password_hash: password::hash_password(password).unwrap(),
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn login_issues_tokens_and_persists_session() {
        let (store, service) = test_service();
        seed_user(&store, "alice", "alice@x.com", "secret123").await;

        let outcome = service.login("alice", "secret123").await.unwrap();
        assert!(!outcome.token.is_empty());
        assert!(!outcome.refresh_token.is_empty());
        assert_eq!(outcome.username, "alice");

        let row = store
            .find_session_by_access_token(&outcome.token)
            .await
            .unwrap()
            .expect("session row should exist for the returned access token");
        assert_eq!(row.user_id, outcome.user_id);
        assert_eq!(row.refresh_token, outcome.refresh_token);
    }

    #[tokio::test]
    async fn login_wrong_password_is_invalid_credentials() {
        let (store, service) = test_service();
        seed_user(&store, "alice", "alice@x.com", "secret123").await;

        let result = service.login("alice", "wrong-password").await;
        assert!(matches!(result, Err(AppError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn login_unknown_username_is_account_not_found() {
        let (_store, service) = test_service();

        let result = service.login("nobody", "whatever").await;
        assert!(matches!(result, Err(AppError::AccountNotFound)));
    }

    #[tokio::test]
    async fn concurrent_logins_create_independent_sessions() {
        let (store, service) = test_service();
        seed_user(&store, "alice", "alice@x.com", "secret123").await;

        let first = service.login("alice", "secret123").await.unwrap();
        let second = service.login("alice", "secret123").await.unwrap();

        assert_ne!(first.token, second.token);
        assert_eq!(store.session_count(), 2);
        assert!(service.validate_token(&first.token).await.is_ok());
        assert!(service.validate_token(&second.token).await.is_ok());
    }

    #[tokio::test]
    async fn validate_after_login_returns_matching_claims() {
        let (store, service) = test_service();
        seed_user(&store, "alice", "alice@x.com", "secret123").await;

        let outcome = service.login("alice", "secret123").await.unwrap();
        let claims = service.validate_token(&outcome.token).await.unwrap();
        assert_eq!(claims.sub, outcome.user_id);
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.full_name, outcome.full_name);
    }

    #[tokio::test]
    async fn validate_after_logout_is_session_not_found() {
        let (store, service) = test_service();
        seed_user(&store, "alice", "alice@x.com", "secret123").await;

        let outcome = service.login("alice", "secret123").await.unwrap();
        service.logout(&outcome.token).await.unwrap();

        let result = service.validate_token(&outcome.token).await;
        assert!(matches!(result, Err(AppError::SessionNotFound)));
    }

    #[tokio::test]
    async fn logout_of_unknown_token_succeeds() {
        let (_store, service) = test_service();
        service.logout("never-issued").await.unwrap();
    }

    #[tokio::test]
    async fn validate_empty_token_is_rejected() {
        let (_store, service) = test_service();
        assert!(matches!(
            service.validate_token("").await,
            Err(AppError::EmptyToken)
        ));
    }

    #[tokio::test]
    async fn validate_tampered_token_is_invalid_signature() {
        let (store, service) = test_service();
        seed_user(&store, "alice", "alice@x.com", "secret123").await;
        let outcome = service.login("alice", "secret123").await.unwrap();

        let mut tampered = outcome.token.clone();
        tampered.push('x');
        let result = service.validate_token(&tampered).await;
        assert!(matches!(
            result,
            Err(AppError::InvalidSignature) | Err(AppError::Malformed)
        ));
    }

    #[tokio::test]
    async fn refresh_rotates_access_token_in_place() {
        let (store, service) = test_service();
        seed_user(&store, "alice", "alice@x.com", "secret123").await;

        let outcome = service.login("alice", "secret123").await.unwrap();
        let original_row = store
            .find_session_by_refresh_token(&outcome.refresh_token)
            .await
            .unwrap()
            .unwrap();

        let claims = service.codec().decode(&outcome.refresh_token).unwrap();
        let new_token = service.refresh(&outcome.refresh_token, &claims).await.unwrap();
        assert_ne!(new_token, outcome.token);

        let row = store
            .find_session_by_refresh_token(&outcome.refresh_token)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row.id, original_row.id);
        assert_eq!(row.token, new_token);
    }

    #[tokio::test]
    async fn refresh_unknown_token_is_session_not_found() {
        let (store, service) = test_service();
        seed_user(&store, "alice", "alice@x.com", "secret123").await;
        let outcome = service.login("alice", "secret123").await.unwrap();
        let claims = service.codec().decode(&outcome.refresh_token).unwrap();

        service.logout(&outcome.token).await.unwrap();

        let result = service.refresh(&outcome.refresh_token, &claims).await;
        assert!(matches!(result, Err(AppError::SessionNotFound)));
    }

    /// register alice -> login -> validate T1 -> refresh T2 -> validate T3 ->
    /// T1 no longer matches any row.
    #[tokio::test]
    async fn refresh_invalidates_previous_access_token() {
        let (store, service) = test_service();
        seed_user(&store, "alice", "alice@x.com", "secret123").await;

        let outcome = service.login("alice", "secret123").await.unwrap();
        let t1 = outcome.token.clone();
        let t2 = outcome.refresh_token.clone();

        assert!(service.validate_token(&t1).await.is_ok());

        let claims = service.codec().decode(&t2).unwrap();
        let t3 = service.refresh(&t2, &claims).await.unwrap();
        assert_ne!(t3, t1);

        assert!(service.validate_token(&t3).await.is_ok());
        assert!(matches!(
            service.validate_token(&t1).await,
            Err(AppError::SessionNotFound)
        ));
    }
}
