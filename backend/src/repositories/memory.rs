//! In-memory stores for development and testing
//!
//! These implement the same traits as the Postgres and Redis adapters, so a
//! router built over them behaves like production minus durability. The
//! recipe store counts reads, and every store can be switched to fail, which
//! lets tests observe whether a request touched the authoritative store.

use super::{
    RecipeStore, SessionRecord, SessionStore, StoreError, StoreResult, UserRecord, UserStore,
};
use async_trait::async_trait;
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use recipes_api_shared::{Recipe, RecipeRequest};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use uuid::Uuid;

fn unavailable(what: &str) -> StoreError {
    StoreError::Backend(anyhow::anyhow!("{} is unavailable", what))
}

/// In-memory credential store
#[derive(Default)]
pub struct InMemoryUserStore {
    users: DashMap<String, UserRecord>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn create(&self, username: &str, password_hash: &str) -> StoreResult<UserRecord> {
        match self.users.entry(username.to_string()) {
            Entry::Occupied(_) => Err(StoreError::Duplicate("Username already taken".to_string())),
            Entry::Vacant(slot) => {
                let record = UserRecord {
                    id: Uuid::new_v4(),
                    username: username.to_string(),
                    password_hash: password_hash.to_string(),
                    created_at: Utc::now(),
                };
                slot.insert(record.clone());
                Ok(record)
            }
        }
    }

    async fn find_by_username(&self, username: &str) -> StoreResult<Option<UserRecord>> {
        Ok(self.users.get(username).map(|u| u.value().clone()))
    }

    async fn username_exists(&self, username: &str) -> StoreResult<bool> {
        Ok(self.users.contains_key(username))
    }
}

/// In-memory recipe collection
#[derive(Default)]
pub struct InMemoryRecipeStore {
    recipes: DashMap<Uuid, Recipe>,
    reads: AtomicUsize,
    unavailable: AtomicBool,
}

impl InMemoryRecipeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `list` calls served so far
    pub fn list_calls(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Make every subsequent operation fail
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check(&self) -> StoreResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(unavailable("recipe store"));
        }
        Ok(())
    }

    fn sorted(mut recipes: Vec<Recipe>) -> Vec<Recipe> {
        recipes.sort_by(|a, b| a.published_at.cmp(&b.published_at).then(a.id.cmp(&b.id)));
        recipes
    }
}

#[async_trait]
impl RecipeStore for InMemoryRecipeStore {
    async fn list(&self) -> StoreResult<Vec<Recipe>> {
        self.check()?;
        self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(Self::sorted(
            self.recipes.iter().map(|r| r.value().clone()).collect(),
        ))
    }

    async fn search_by_tag(&self, tag: &str) -> StoreResult<Vec<Recipe>> {
        self.check()?;
        Ok(Self::sorted(
            self.recipes
                .iter()
                .filter(|r| r.has_tag(tag))
                .map(|r| r.value().clone())
                .collect(),
        ))
    }

    async fn insert(&self, recipe: &Recipe) -> StoreResult<()> {
        self.check()?;
        self.recipes.insert(recipe.id, recipe.clone());
        Ok(())
    }

    async fn update(&self, id: Uuid, changes: &RecipeRequest) -> StoreResult<Option<Recipe>> {
        self.check()?;
        Ok(self.recipes.get_mut(&id).map(|mut recipe| {
            recipe.name = changes.name.clone();
            recipe.tags = changes.tags.clone();
            recipe.ingredients = changes.ingredients.clone();
            recipe.instructions = changes.instructions.clone();
            recipe.clone()
        }))
    }

    async fn delete(&self, id: Uuid) -> StoreResult<bool> {
        self.check()?;
        Ok(self.recipes.remove(&id).is_some())
    }

    async fn health_check(&self) -> StoreResult<()> {
        self.check()
    }
}

/// In-memory session store
///
/// TTLs are not enforced by eviction; callers check `expires_at`.
#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: DashMap<String, SessionRecord>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn load(&self, session_id: &str) -> StoreResult<Option<SessionRecord>> {
        Ok(self.sessions.get(session_id).map(|s| s.value().clone()))
    }

    async fn save(&self, session_id: &str, record: &SessionRecord, _ttl: Duration) -> StoreResult<()> {
        self.sessions.insert(session_id.to_string(), record.clone());
        Ok(())
    }

    async fn delete(&self, session_id: &str) -> StoreResult<()> {
        self.sessions.remove(session_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recipe(name: &str, tags: &[&str]) -> Recipe {
        Recipe {
            id: Uuid::new_v4(),
            name: name.to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            ingredients: vec![],
            instructions: vec![],
            published_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_user_store_rejects_duplicates() {
        let store = InMemoryUserStore::new();
        store.create("alice", "hash").await.unwrap();

        let err = store.create("alice", "other").await.unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(_)));

        // The original record is untouched
        let user = store.find_by_username("alice").await.unwrap().unwrap();
        assert_eq!(user.password_hash, "hash");
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_recipe_store_crud() {
        let store = InMemoryRecipeStore::new();
        let soup = recipe("Soup", &["dinner"]);
        store.insert(&soup).await.unwrap();
        store.insert(&recipe("Toast", &["breakfast"])).await.unwrap();

        assert_eq!(store.list().await.unwrap().len(), 2);
        assert_eq!(store.search_by_tag("dinner").await.unwrap(), vec![soup.clone()]);

        let changes = RecipeRequest {
            name: "Tomato soup".to_string(),
            tags: vec!["dinner".to_string(), "vegan".to_string()],
            ingredients: vec!["tomato".to_string()],
            instructions: vec![],
        };
        let updated = store.update(soup.id, &changes).await.unwrap().unwrap();
        assert_eq!(updated.name, "Tomato soup");
        assert_eq!(updated.published_at, soup.published_at);

        assert!(store.update(Uuid::new_v4(), &changes).await.unwrap().is_none());
        assert!(store.delete(soup.id).await.unwrap());
        assert!(!store.delete(soup.id).await.unwrap());
        assert_eq!(store.list_calls(), 1);
    }

    #[tokio::test]
    async fn test_recipe_store_unavailable() {
        let store = InMemoryRecipeStore::new();
        store.set_unavailable(true);
        assert!(matches!(store.list().await, Err(StoreError::Backend(_))));
        assert!(store.health_check().await.is_err());
    }
}
