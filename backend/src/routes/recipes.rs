//! Recipe API routes
//!
//! Listing and search are public. Mutations sit behind the auth gate.

use crate::auth::{auth_middleware, AuthUser};
use crate::error::{ApiError, ApiResult};
use crate::services::RecipeService;
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use recipes_api_shared::{MessageResponse, Recipe, RecipeRequest, SearchQuery};
use uuid::Uuid;

/// Response header reporting whether the listing came from the cache
pub const CACHE_STATUS_HEADER: &str = "x-cache";

/// Create recipe routes
pub fn recipe_routes(state: AppState) -> Router<AppState> {
    let public = Router::new()
        .route("/", get(list_recipes))
        .route("/search", get(search_recipes));

    let protected = Router::new()
        .route("/", post(create_recipe))
        .route("/:id", put(update_recipe).delete(delete_recipe))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware));

    public.merge(protected)
}

fn parse_id(raw: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| ApiError::Validation("Invalid recipe id".to_string()))
}

/// GET /api/v1/recipes - List all recipes
async fn list_recipes(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let (recipes, status) = RecipeService::list(state.recipes(), state.cache()).await?;
    Ok(([(CACHE_STATUS_HEADER, status.as_str())], Json(recipes)))
}

/// GET /api/v1/recipes/search?tag= - Recipes carrying a tag
async fn search_recipes(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Json<Vec<Recipe>>> {
    let recipes = RecipeService::search(state.recipes(), query.tag.as_deref()).await?;
    Ok(Json(recipes))
}

/// POST /api/v1/recipes - Create a recipe
async fn create_recipe(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<RecipeRequest>,
) -> ApiResult<(StatusCode, Json<Recipe>)> {
    let recipe = RecipeService::create(state.recipes(), state.cache(), &auth.username, req).await?;
    Ok((StatusCode::CREATED, Json(recipe)))
}

/// PUT /api/v1/recipes/:id - Replace a recipe
async fn update_recipe(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    Json(req): Json<RecipeRequest>,
) -> ApiResult<Json<Recipe>> {
    let id = parse_id(&id)?;
    let recipe =
        RecipeService::update(state.recipes(), state.cache(), &auth.username, id, req).await?;
    Ok(Json(recipe))
}

/// DELETE /api/v1/recipes/:id - Delete a recipe
async fn delete_recipe(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    let id = parse_id(&id)?;
    RecipeService::delete(state.recipes(), state.cache(), &auth.username, id).await?;
    Ok(Json(MessageResponse::new("Recipe has been deleted")))
}
