//! Session store for the session credential strategy
//!
//! A session id (held by the client in a cookie) maps to the username and
//! the opaque token currently bound to it. Entries expire with the store's
//! own TTL; `expires_at` is kept alongside so expiry can also be checked
//! explicitly.

use super::StoreResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Server-side session state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub username: String,
    /// Opaque token bound to the session; `None` once unbound
    pub token: Option<String>,
    pub expires_at: DateTime<Utc>,
}

impl SessionRecord {
    /// Whether the session still proves identity at `now`
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.token.is_some() && now <= self.expires_at
    }
}

/// Session store operations
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn load(&self, session_id: &str) -> StoreResult<Option<SessionRecord>>;

    /// Persist a session; the store drops it after `ttl`
    async fn save(&self, session_id: &str, record: &SessionRecord, ttl: Duration) -> StoreResult<()>;

    async fn delete(&self, session_id: &str) -> StoreResult<()>;
}

/// Redis-backed session store
#[derive(Clone)]
pub struct RedisSessionStore {
    conn: ConnectionManager,
}

impl RedisSessionStore {
    pub fn new(conn: ConnectionManager) -> Self {
        Self { conn }
    }

    fn key(session_id: &str) -> String {
        format!("session:{}", session_id)
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn load(&self, session_id: &str) -> StoreResult<Option<SessionRecord>> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn.get(Self::key(session_id)).await?;

        match raw {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    async fn save(&self, session_id: &str, record: &SessionRecord, ttl: Duration) -> StoreResult<()> {
        let mut conn = self.conn.clone();
        let value = serde_json::to_string(record)?;

        redis::cmd("SET")
            .arg(Self::key(session_id))
            .arg(value)
            .arg("EX")
            .arg(ttl.as_secs().max(1))
            .query_async::<_, ()>(&mut conn)
            .await?;

        Ok(())
    }

    async fn delete(&self, session_id: &str) -> StoreResult<()> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(Self::key(session_id)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_activity() {
        let now = Utc::now();
        let mut record = SessionRecord {
            username: "alice".to_string(),
            token: Some("tok".to_string()),
            expires_at: now + chrono::Duration::seconds(10),
        };
        assert!(record.is_active_at(now));
        assert!(record.is_active_at(record.expires_at));
        assert!(!record.is_active_at(record.expires_at + chrono::Duration::milliseconds(1)));

        record.token = None;
        assert!(!record.is_active_at(now));
    }

    #[test]
    fn test_session_key_is_namespaced() {
        assert_eq!(RedisSessionStore::key("abc"), "session:abc");
    }
}
