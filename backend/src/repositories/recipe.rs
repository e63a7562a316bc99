//! Recipe repository - the authoritative recipe collection

use super::StoreResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use recipes_api_shared::{Recipe, RecipeRequest};
use sqlx::PgPool;
use uuid::Uuid;

/// Recipe row from the database
#[derive(Debug, Clone, sqlx::FromRow)]
struct RecipeRow {
    id: Uuid,
    name: String,
    tags: Vec<String>,
    ingredients: Vec<String>,
    instructions: Vec<String>,
    published_at: DateTime<Utc>,
}

impl From<RecipeRow> for Recipe {
    fn from(row: RecipeRow) -> Self {
        Recipe {
            id: row.id,
            name: row.name,
            tags: row.tags,
            ingredients: row.ingredients,
            instructions: row.instructions,
            published_at: row.published_at,
        }
    }
}

/// Recipe collection operations
#[async_trait]
pub trait RecipeStore: Send + Sync {
    /// All recipes, oldest first
    async fn list(&self) -> StoreResult<Vec<Recipe>>;

    /// Recipes carrying `tag`
    async fn search_by_tag(&self, tag: &str) -> StoreResult<Vec<Recipe>>;

    /// Insert a fully formed recipe
    async fn insert(&self, recipe: &Recipe) -> StoreResult<()>;

    /// Replace the editable fields of a recipe. Returns `None` if no recipe has `id`.
    async fn update(&self, id: Uuid, changes: &RecipeRequest) -> StoreResult<Option<Recipe>>;

    /// Delete a recipe. Returns whether a recipe was removed.
    async fn delete(&self, id: Uuid) -> StoreResult<bool>;

    /// Check the store is reachable
    async fn health_check(&self) -> StoreResult<()>;
}

/// Postgres-backed recipe collection
#[derive(Clone)]
pub struct RecipeRepository {
    pool: PgPool,
}

impl RecipeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RecipeStore for RecipeRepository {
    async fn list(&self) -> StoreResult<Vec<Recipe>> {
        let rows = sqlx::query_as::<_, RecipeRow>(
            r#"
            SELECT id, name, tags, ingredients, instructions, published_at
            FROM recipes
            ORDER BY published_at, id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Recipe::from).collect())
    }

    async fn search_by_tag(&self, tag: &str) -> StoreResult<Vec<Recipe>> {
        let rows = sqlx::query_as::<_, RecipeRow>(
            r#"
            SELECT id, name, tags, ingredients, instructions, published_at
            FROM recipes
            WHERE $1 = ANY(tags)
            ORDER BY published_at, id
            "#,
        )
        .bind(tag)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Recipe::from).collect())
    }

    async fn insert(&self, recipe: &Recipe) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO recipes (id, name, tags, ingredients, instructions, published_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(recipe.id)
        .bind(&recipe.name)
        .bind(&recipe.tags)
        .bind(&recipe.ingredients)
        .bind(&recipe.instructions)
        .bind(recipe.published_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update(&self, id: Uuid, changes: &RecipeRequest) -> StoreResult<Option<Recipe>> {
        let row = sqlx::query_as::<_, RecipeRow>(
            r#"
            UPDATE recipes SET
                name = $2,
                tags = $3,
                ingredients = $4,
                instructions = $5
            WHERE id = $1
            RETURNING id, name, tags, ingredients, instructions, published_at
            "#,
        )
        .bind(id)
        .bind(&changes.name)
        .bind(&changes.tags)
        .bind(&changes.ingredients)
        .bind(&changes.instructions)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Recipe::from))
    }

    async fn delete(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM recipes WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn health_check(&self) -> StoreResult<()> {
        crate::db::health_check(&self.pool)
            .await
            .map_err(Into::into)
    }
}
