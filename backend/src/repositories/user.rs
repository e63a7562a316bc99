//! Credential store: identity records keyed by username

use super::{StoreError, StoreResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

/// User record from the credential store
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRecord {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Credential store operations
///
/// Records are insert-only: they are never updated or deleted.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a new identity. A taken username yields [`StoreError::Duplicate`].
    async fn create(&self, username: &str, password_hash: &str) -> StoreResult<UserRecord>;

    /// Find a user by username
    async fn find_by_username(&self, username: &str) -> StoreResult<Option<UserRecord>>;

    /// Check if a username is taken
    async fn username_exists(&self, username: &str) -> StoreResult<bool>;
}

/// Postgres-backed credential store
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for UserRepository {
    async fn create(&self, username: &str, password_hash: &str) -> StoreResult<UserRecord> {
        sqlx::query_as::<_, UserRecord>(
            r#"
            INSERT INTO users (username, password_hash)
            VALUES ($1, $2)
            RETURNING id, username, password_hash, created_at
            "#,
        )
        .bind(username)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                StoreError::Duplicate("Username already taken".to_string())
            }
            other => other.into(),
        })
    }

    async fn find_by_username(&self, username: &str) -> StoreResult<Option<UserRecord>> {
        let user = sqlx::query_as::<_, UserRecord>(
            r#"
            SELECT id, username, password_hash, created_at
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn username_exists(&self, username: &str) -> StoreResult<bool> {
        let result = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(SELECT 1 FROM users WHERE username = $1)
            "#,
        )
        .bind(username)
        .fetch_one(&self.pool)
        .await?;

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    // Integration tests require database - marked with #[ignore]
    // Run with: cargo test --features integration -- --ignored
}
