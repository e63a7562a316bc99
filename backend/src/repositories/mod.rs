//! Data access layer
//!
//! Each store is a trait so the services can run against Postgres/Redis in
//! production and against the in-memory implementations in [`memory`] for
//! tests and local development.

pub mod memory;
pub mod recipe;
pub mod session;
pub mod user;

use thiserror::Error;

pub use memory::{InMemoryRecipeStore, InMemorySessionStore, InMemoryUserStore};
pub use recipe::{RecipeRepository, RecipeStore};
pub use session::{RedisSessionStore, SessionRecord, SessionStore};
pub use user::{UserRecord, UserRepository, UserStore};

/// Failure reported by a backing store
#[derive(Error, Debug)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write
    #[error("Duplicate: {0}")]
    Duplicate(String),

    /// The store could not be reached or returned an unexpected error
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Backend(err.into())
    }
}

impl From<redis::RedisError> for StoreError {
    fn from(err: redis::RedisError) -> Self {
        StoreError::Backend(err.into())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Backend(err.into())
    }
}

/// Result type alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;
