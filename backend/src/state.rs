//! Application state management
//!
//! This module provides the shared application state that is passed
//! to all request handlers via Axum's state extraction.
//!
//! # Design Principles
//!
//! 1. **Pre-compute expensive resources**: JWT keys, the dummy password
//!    hash and DB pools are created once
//! 2. **Cheap cloning**: All fields use Arc or are already Clone-cheap
//! 3. **Immutable after creation**: State is read-only during request handling

use crate::auth::{build_strategy, CredentialStrategy, PasswordService};
use crate::cache::{InMemoryCache, RecipeCache, RedisCache};
use crate::config::AppConfig;
use crate::repositories::{
    InMemoryRecipeStore, InMemorySessionStore, InMemoryUserStore, RecipeRepository, RecipeStore,
    RedisSessionStore, SessionStore, UserRepository, UserStore,
};
use anyhow::Result;
use metrics_exporter_prometheus::PrometheusHandle;
use redis::aio::ConnectionManager;
use sqlx::PgPool;
use std::sync::Arc;

/// The stores a running service talks to
#[derive(Clone)]
pub struct Backends {
    pub users: Arc<dyn UserStore>,
    pub recipes: Arc<dyn RecipeStore>,
    /// Only needed by the session strategy
    pub sessions: Option<Arc<dyn SessionStore>>,
    pub cache: RecipeCache,
}

impl Backends {
    /// Postgres for users and recipes, Redis (when reachable) for sessions
    /// and the listing cache
    pub fn connected(pool: PgPool, redis: Option<ConnectionManager>) -> Self {
        let (sessions, cache) = match redis {
            Some(conn) => (
                Some(Arc::new(RedisSessionStore::new(conn.clone())) as Arc<dyn SessionStore>),
                RecipeCache::new(Arc::new(RedisCache::new(conn))),
            ),
            None => (None, RecipeCache::disabled()),
        };

        Self {
            users: Arc::new(UserRepository::new(pool.clone())),
            recipes: Arc::new(RecipeRepository::new(pool)),
            sessions,
            cache,
        }
    }

    /// Everything in process memory
    pub fn in_memory() -> Self {
        Self {
            users: Arc::new(InMemoryUserStore::new()),
            recipes: Arc::new(InMemoryRecipeStore::new()),
            sessions: Some(Arc::new(InMemorySessionStore::new())),
            cache: RecipeCache::new(Arc::new(InMemoryCache::new())),
        }
    }
}

/// Shared application state
///
/// This struct holds all shared resources that handlers need access to.
/// All fields are designed for cheap cloning across async tasks.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserStore>,
    pub recipes: Arc<dyn RecipeStore>,
    pub cache: RecipeCache,
    /// The one credential strategy this deployment runs
    pub auth: Arc<dyn CredentialStrategy>,
    pub passwords: PasswordService,
    pub config: Arc<AppConfig>,
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Create a new application state
    ///
    /// # Note
    /// This pre-computes JWT keys and a dummy password hash, so it should
    /// only be called once at application startup.
    pub fn new(config: AppConfig, backends: Backends) -> Result<Self> {
        let auth = build_strategy(&config.auth, backends.sessions)?;
        let passwords = PasswordService::new(&config.password)?;

        Ok(Self {
            users: backends.users,
            recipes: backends.recipes,
            cache: backends.cache,
            auth,
            passwords,
            config: Arc::new(config),
            metrics: None,
        })
    }

    /// Attach the Prometheus handle rendered by `/metrics`
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }

    #[inline]
    pub fn users(&self) -> &dyn UserStore {
        self.users.as_ref()
    }

    #[inline]
    pub fn recipes(&self) -> &dyn RecipeStore {
        self.recipes.as_ref()
    }

    #[inline]
    pub fn cache(&self) -> &RecipeCache {
        &self.cache
    }

    #[inline]
    pub fn auth(&self) -> &dyn CredentialStrategy {
        self.auth.as_ref()
    }

    #[inline]
    pub fn passwords(&self) -> &PasswordService {
        &self.passwords
    }

    /// Get a reference to the configuration
    #[inline]
    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}
