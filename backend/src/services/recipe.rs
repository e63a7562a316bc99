//! Recipe service
//!
//! Reads of the full listing go through the read-through cache. Every
//! accepted mutation invalidates that cache before returning, and a
//! mutation that changed nothing leaves it alone.

use crate::cache::{CacheStatus, RecipeCache};
use crate::error::ApiError;
use crate::repositories::RecipeStore;
use chrono::Utc;
use recipes_api_shared::validation::validate_tag;
use recipes_api_shared::{Recipe, RecipeRequest};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

/// Recipe service for listing and mutation operations
pub struct RecipeService;

impl RecipeService {
    /// Full listing, served from the cache when populated
    pub async fn list(
        recipes: &dyn RecipeStore,
        cache: &RecipeCache,
    ) -> Result<(Vec<Recipe>, CacheStatus), ApiError> {
        Ok(cache.list(recipes).await?)
    }

    /// Recipes carrying `tag`, always read from the store
    pub async fn search(recipes: &dyn RecipeStore, tag: Option<&str>) -> Result<Vec<Recipe>, ApiError> {
        let tag = tag.unwrap_or_default();
        validate_tag(tag).map_err(ApiError::Validation)?;
        Ok(recipes.search_by_tag(tag).await?)
    }

    /// Create a recipe; the server assigns its id and publish time
    pub async fn create(
        recipes: &dyn RecipeStore,
        cache: &RecipeCache,
        username: &str,
        request: RecipeRequest,
    ) -> Result<Recipe, ApiError> {
        request.validate()?;

        let recipe = Recipe {
            id: Uuid::new_v4(),
            name: request.name,
            tags: request.tags,
            ingredients: request.ingredients,
            instructions: request.instructions,
            published_at: Utc::now(),
        };

        recipes.insert(&recipe).await?;
        cache.invalidate().await?;

        info!(recipe_id = %recipe.id, username = %username, "Recipe created");
        Ok(recipe)
    }

    /// Replace a recipe's contents, keeping its id and publish time
    pub async fn update(
        recipes: &dyn RecipeStore,
        cache: &RecipeCache,
        username: &str,
        id: Uuid,
        request: RecipeRequest,
    ) -> Result<Recipe, ApiError> {
        request.validate()?;

        let recipe = recipes
            .update(id, &request)
            .await?
            .ok_or_else(|| ApiError::NotFound("Recipe not found".to_string()))?;
        cache.invalidate().await?;

        info!(recipe_id = %id, username = %username, "Recipe updated");
        Ok(recipe)
    }

    /// Delete a recipe
    ///
    /// An unknown id is reported as not found and does not touch the cache.
    pub async fn delete(
        recipes: &dyn RecipeStore,
        cache: &RecipeCache,
        username: &str,
        id: Uuid,
    ) -> Result<(), ApiError> {
        if !recipes.delete(id).await? {
            return Err(ApiError::NotFound("Recipe not found".to_string()));
        }
        cache.invalidate().await?;

        info!(recipe_id = %id, username = %username, "Recipe deleted");
        Ok(())
    }
}
