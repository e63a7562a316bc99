//! Cache backends
//!
//! The cache is an opaque key-value store: get, set, delete, with `None`
//! from `get` as the atomic "key absent" signal.

use crate::repositories::{StoreError, StoreResult};
use async_trait::async_trait;
use dashmap::DashMap;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Cache backend trait for pluggable cache implementations
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Get a value, `None` if the key is absent
    async fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// Store a value with no expiry
    async fn set(&self, key: &str, value: &str) -> StoreResult<()>;

    /// Remove a key. Returns whether the key existed.
    async fn delete(&self, key: &str) -> StoreResult<bool>;

    /// Check the cache is reachable
    async fn health_check(&self) -> StoreResult<()>;
}

/// Redis cache backend
#[derive(Clone)]
pub struct RedisCache {
    conn: ConnectionManager,
}

impl RedisCache {
    pub fn new(conn: ConnectionManager) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl CacheStore for RedisCache {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let mut conn = self.conn.clone();
        Ok(conn.get(key).await?)
    }

    async fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        let mut conn = self.conn.clone();
        conn.set::<_, _, ()>(key, value).await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> StoreResult<bool> {
        let mut conn = self.conn.clone();
        let removed: i64 = conn.del(key).await?;
        Ok(removed > 0)
    }

    async fn health_check(&self) -> StoreResult<()> {
        let mut conn = self.conn.clone();
        redis::cmd("PING")
            .query_async::<_, String>(&mut conn)
            .await?;
        Ok(())
    }
}

/// In-memory cache backend for development and testing
///
/// Counts deletes and can be switched to fail, so tests can observe the
/// invalidation path.
#[derive(Default)]
pub struct InMemoryCache {
    entries: DashMap<String, String>,
    deletes: AtomicUsize,
    unavailable: AtomicBool,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `delete` calls received so far
    pub fn delete_calls(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }

    /// Whether `key` currently holds a value
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Make every subsequent operation fail
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check(&self) -> StoreResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Backend(anyhow::anyhow!("cache is unavailable")));
        }
        Ok(())
    }
}

#[async_trait]
impl CacheStore for InMemoryCache {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        self.check()?;
        Ok(self.entries.get(key).map(|v| v.value().clone()))
    }

    async fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        self.check()?;
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> StoreResult<bool> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(self.entries.remove(key).is_some())
    }

    async fn health_check(&self) -> StoreResult<()> {
        self.check()
    }
}
