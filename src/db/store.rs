//! Credential store: account and session rows.
//!
//! `UserStore` is the capability the session layer is constructed with.
//! `PgUserStore` is the production implementation; `InMemoryUserStore` backs
//! unit and router tests without a live database.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

use super::DbPool;

#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Account fields supplied at registration; id and created_at are assigned by
/// the store.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub password_hash: String,
}

#[derive(Debug, Clone, FromRow)]
pub struct SessionRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token: String,
    pub refresh_token: String,
    pub token_expired: DateTime<Utc>,
    pub refresh_token_expired: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn insert_user(&self, user: NewUser) -> AppResult<UserRow>;
    async fn find_user_by_username(&self, username: &str) -> AppResult<Option<UserRow>>;
    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<UserRow>>;

    async fn insert_session(&self, session: &SessionRow) -> AppResult<()>;
    async fn find_session_by_access_token(&self, token: &str) -> AppResult<Option<SessionRow>>;
    async fn find_session_by_refresh_token(&self, token: &str) -> AppResult<Option<SessionRow>>;
    /// Row removal by access-token value. Deleting a missing row is not an
    /// error; logout is idempotent from the caller's side.
    async fn delete_session_by_access_token(&self, token: &str) -> AppResult<()>;
    /// Replaces the access token and its expiry on the row whose
    /// refresh_token column matches. Returns the number of rows updated.
    async fn update_access_token(
        &self,
        refresh_token: &str,
        token: &str,
        token_expired: DateTime<Utc>,
    ) -> AppResult<u64>;
}

// ---- PostgreSQL ----

pub struct PgUserStore {
    pool: DbPool,
}

impl PgUserStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn insert_user(&self, user: NewUser) -> AppResult<UserRow> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (username, email, full_name, password_hash)
            VALUES ($1, $2, $3, $4)
            RETURNING id, username, email, full_name, password_hash, created_at
            "#,
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.full_name)
        .bind(&user.password_hash)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn find_user_by_username(&self, username: &str) -> AppResult<Option<UserRow>> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, username, email, full_name, password_hash, created_at FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<UserRow>> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, username, email, full_name, password_hash, created_at FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn insert_session(&self, session: &SessionRow) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO user_sessions
                (id, user_id, token, refresh_token, token_expired, refresh_token_expired, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(session.id)
        .bind(session.user_id)
        .bind(&session.token)
        .bind(&session.refresh_token)
        .bind(session.token_expired)
        .bind(session.refresh_token_expired)
        .bind(session.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_session_by_access_token(&self, token: &str) -> AppResult<Option<SessionRow>> {
        let row = sqlx::query_as::<_, SessionRow>(
            r#"
            SELECT id, user_id, token, refresh_token, token_expired, refresh_token_expired, created_at
            FROM user_sessions WHERE token = $1
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn find_session_by_refresh_token(&self, token: &str) -> AppResult<Option<SessionRow>> {
        let row = sqlx::query_as::<_, SessionRow>(
            r#"
            SELECT id, user_id, token, refresh_token, token_expired, refresh_token_expired, created_at
            FROM user_sessions WHERE refresh_token = $1
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn delete_session_by_access_token(&self, token: &str) -> AppResult<()> {
        sqlx::query("DELETE FROM user_sessions WHERE token = $1")
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn update_access_token(
        &self,
        refresh_token: &str,
        token: &str,
        token_expired: DateTime<Utc>,
    ) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE user_sessions SET token = $1, token_expired = $2 WHERE refresh_token = $3",
        )
        .bind(token)
        .bind(token_expired)
        .bind(refresh_token)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}

// ---- In-memory ----

/// In-memory store for development and tests. Rows live in `Mutex`-guarded
/// maps keyed by id; lookups scan, which is fine at test scale.
#[derive(Default)]
pub struct InMemoryUserStore {
    users: Mutex<HashMap<Uuid, UserRow>>,
    sessions: Mutex<HashMap<Uuid, SessionRow>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn session_count(&self) -> usize {
        self.sessions.lock().unwrap().len()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn insert_user(&self, user: NewUser) -> AppResult<UserRow> {
        let mut users = self.users.lock().unwrap();
        if users
            .values()
            .any(|u| u.username == user.username || u.email == user.email)
        {
            return Err(AppError::Validation("account already exists".to_string()));
        }
        let row = UserRow {
            id: Uuid::new_v4(),
            username: user.username,
            email: user.email,
            full_name: user.full_name,
            password_hash: user.password_hash,
            created_at: Utc::now(),
        };
        users.insert(row.id, row.clone());
        Ok(row)
    }

    async fn find_user_by_username(&self, username: &str) -> AppResult<Option<UserRow>> {
        let users = self.users.lock().unwrap();
        Ok(users.values().find(|u| u.username == username).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<UserRow>> {
        let users = self.users.lock().unwrap();
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn insert_session(&self, session: &SessionRow) -> AppResult<()> {
        let mut sessions = self.sessions.lock().unwrap();
        sessions.insert(session.id, session.clone());
        Ok(())
    }

    async fn find_session_by_access_token(&self, token: &str) -> AppResult<Option<SessionRow>> {
        let sessions = self.sessions.lock().unwrap();
        Ok(sessions.values().find(|s| s.token == token).cloned())
    }

    async fn find_session_by_refresh_token(&self, token: &str) -> AppResult<Option<SessionRow>> {
        let sessions = self.sessions.lock().unwrap();
        Ok(sessions.values().find(|s| s.refresh_token == token).cloned())
    }

    async fn delete_session_by_access_token(&self, token: &str) -> AppResult<()> {
        let mut sessions = self.sessions.lock().unwrap();
        sessions.retain(|_, s| s.token != token);
        Ok(())
    }

    async fn update_access_token(
        &self,
        refresh_token: &str,
        token: &str,
        token_expired: DateTime<Utc>,
    ) -> AppResult<u64> {
        let mut sessions = self.sessions.lock().unwrap();
        let mut updated = 0;
        for session in sessions.values_mut() {
            if session.refresh_token == refresh_token {
                session.token = token.to_string();
                session.token_expired = token_expired;
                updated += 1;
            }
        }
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn test_session(user_id: Uuid, token: &str, refresh_token: &str) -> SessionRow {
        let now = Utc::now();
        SessionRow {
            id: Uuid::new_v4(),
            user_id,
            token: token.to_string(),
            refresh_token: refresh_token.to_string(),
            token_expired: now + Duration::minutes(15),
            refresh_token_expired: now + Duration::hours(72),
            created_at: now,
        }
    }

    fn test_user(username: &str, email: &str) -> NewUser {
        NewUser {
            username: username.to_string(),
            email: email.to_string(),
            full_name: "Test User".to_string(),
            password_hash: "$argon2$fake".to_string(),
        }
    }

    #[tokio::test]
    async fn insert_and_find_user() {
        let store = InMemoryUserStore::new();
        let created = store.insert_user(test_user("alice", "alice@x.com")).await.unwrap();

        let found = store.find_user_by_username("alice").await.unwrap().unwrap();
        assert_eq!(found.id, created.id);
        assert_eq!(found.email, "alice@x.com");

        assert!(store.find_user_by_username("bob").await.unwrap().is_none());
        assert!(store.find_user_by_email("alice@x.com").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn duplicate_user_is_rejected() {
        let store = InMemoryUserStore::new();
        store.insert_user(test_user("alice", "alice@x.com")).await.unwrap();

        let by_username = store.insert_user(test_user("alice", "other@x.com")).await;
        assert!(matches!(by_username, Err(AppError::Validation(_))));

        let by_email = store.insert_user(test_user("other", "alice@x.com")).await;
        assert!(matches!(by_email, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn session_lookup_by_either_token() {
        let store = InMemoryUserStore::new();
        let session = test_session(Uuid::new_v4(), "access-1", "refresh-1");
        store.insert_session(&session).await.unwrap();

        let by_access = store
            .find_session_by_access_token("access-1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_access.id, session.id);

        let by_refresh = store
            .find_session_by_refresh_token("refresh-1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_refresh.id, session.id);

        assert!(store
            .find_session_by_access_token("refresh-1")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn delete_session_is_idempotent() {
        let store = InMemoryUserStore::new();
        let session = test_session(Uuid::new_v4(), "access-1", "refresh-1");
        store.insert_session(&session).await.unwrap();

        store.delete_session_by_access_token("access-1").await.unwrap();
        assert_eq!(store.session_count(), 0);

        // Second delete of the same value is not an error.
        store.delete_session_by_access_token("access-1").await.unwrap();
    }

    #[tokio::test]
    async fn update_access_token_reports_rows_affected() {
        let store = InMemoryUserStore::new();
        let session = test_session(Uuid::new_v4(), "access-1", "refresh-1");
        store.insert_session(&session).await.unwrap();

        let expiry = Utc::now() + Duration::minutes(15);
        let updated = store
            .update_access_token("refresh-1", "access-2", expiry)
            .await
            .unwrap();
        assert_eq!(updated, 1);

        let row = store
            .find_session_by_access_token("access-2")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row.id, session.id);
        assert_eq!(row.refresh_token, "refresh-1");
        assert!(store
            .find_session_by_access_token("access-1")
            .await
            .unwrap()
            .is_none());

        let missed = store
            .update_access_token("refresh-unknown", "access-3", expiry)
            .await
            .unwrap();
        assert_eq!(missed, 0);
    }
}
