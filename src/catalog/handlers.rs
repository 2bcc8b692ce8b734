use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use super::dto::{
    BlacklistRequest, FoodFilter, PutFoodRequest, PutRecipeRequest, SubstituteParams,
    SubstitutesResponse,
};
use super::services::{self, item_ref, substitute_options};
use crate::diet::{Blacklist, CatalogRead, Food, FoodId, Recipe, RecipeId, RecipeSpec};
use crate::errors::reject;
use crate::extractors::UserContext;
use crate::state::AppState;

pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/foods", get(list_foods))
        .route("/foods/:id", get(get_food).put(put_food).delete(delete_food))
        .route("/recipes", get(list_recipes))
        .route(
            "/recipes/:id",
            get(get_recipe).put(put_recipe).delete(delete_recipe),
        )
        .route("/substitutes/:kind/:id", get(get_substitutes))
}

pub fn blacklist_routes() -> Router<AppState> {
    Router::new()
        .route("/blacklist", get(get_blacklist).post(add_to_blacklist))
        .route("/blacklist/:food_id", delete(remove_from_blacklist))
}

// --- catalog ---

#[instrument(skip(state))]
pub async fn list_foods(
    State(state): State<AppState>,
    Query(filter): Query<FoodFilter>,
) -> Json<Vec<Food>> {
    let catalog = state.catalog.read().await;
    let foods = match filter.category {
        Some(category) => catalog.list_by_category(category),
        None => catalog.foods(),
    };
    Json(foods.into_iter().cloned().collect())
}

#[instrument(skip(state))]
pub async fn get_food(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Food>, (StatusCode, String)> {
    let catalog = state.catalog.read().await;
    let food = catalog.get_food(FoodId(id))?;
    Ok(Json(food.clone()))
}

#[instrument(skip(state, body))]
pub async fn put_food(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<PutFoodRequest>,
) -> Result<Json<Food>, (StatusCode, String)> {
    let food = Food {
        id: FoodId(id),
        name: body.name.trim().to_string(),
        category: body.category,
        macros: body.macros,
        unit: body.unit,
        tags: body.tags,
    };
    state.catalog.write().await.upsert_food(food.clone())?;
    info!(food = %food.id, name = %food.name, "food upserted");
    Ok(Json(food))
}

#[instrument(skip(state))]
pub async fn delete_food(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    let removed = state.catalog.write().await.remove_food(FoodId(id))?;
    info!(food = %removed.id, "food removed");
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn list_recipes(State(state): State<AppState>) -> Json<Vec<Recipe>> {
    let catalog = state.catalog.read().await;
    Json(catalog.recipes().cloned().collect())
}

#[instrument(skip(state))]
pub async fn get_recipe(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Recipe>, (StatusCode, String)> {
    let catalog = state.catalog.read().await;
    let recipe = catalog.get_recipe(RecipeId(id))?;
    Ok(Json(recipe.clone()))
}

#[instrument(skip(state, body))]
pub async fn put_recipe(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<PutRecipeRequest>,
) -> Result<Json<Recipe>, (StatusCode, String)> {
    let spec = RecipeSpec {
        id: RecipeId(id),
        name: body.name.trim().to_string(),
        ingredients: body.ingredients,
    };
    let mut catalog = state.catalog.write().await;
    let recipe = catalog.upsert_recipe(spec)?.clone();
    info!(recipe = %recipe.id(), totals = ?recipe.totals(), "recipe upserted");
    Ok(Json(recipe))
}

#[instrument(skip(state))]
pub async fn delete_recipe(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    let removed = state.catalog.write().await.remove_recipe(RecipeId(id))?;
    info!(recipe = %removed.id(), "recipe removed");
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn get_substitutes(
    State(state): State<AppState>,
    UserContext(user_id): UserContext,
    Path((kind, id)): Path<(String, Uuid)>,
    Query(params): Query<SubstituteParams>,
) -> Result<Json<SubstitutesResponse>, (StatusCode, String)> {
    let item = item_ref(&kind, id).map_err(reject)?;
    let options = substitute_options(state.policy().substitutes, params.tolerance, params.top_k)
        .map_err(reject)?;
    let candidates = services::substitutes(&state, user_id, item, options)
        .await
        .map_err(reject)?;
    Ok(Json(SubstitutesResponse {
        tolerance: options.tolerance,
        top_k: options.top_k,
        candidates,
    }))
}

// --- blacklist ---

#[instrument(skip(state))]
pub async fn get_blacklist(
    State(state): State<AppState>,
    UserContext(user_id): UserContext,
) -> Result<Json<Blacklist>, (StatusCode, String)> {
    let blacklist = state
        .store
        .get_blacklist(user_id)
        .await
        .map_err(|e| reject(e.into()))?;
    Ok(Json(blacklist))
}

#[instrument(skip(state, body))]
pub async fn add_to_blacklist(
    State(state): State<AppState>,
    UserContext(user_id): UserContext,
    Json(body): Json<BlacklistRequest>,
) -> Result<(StatusCode, Json<Blacklist>), (StatusCode, String)> {
    let (blacklist, added) = services::blacklist_food(&state, user_id, body.food_id, body.reason)
        .await
        .map_err(reject)?;
    let status = if added { StatusCode::CREATED } else { StatusCode::OK };
    Ok((status, Json(blacklist)))
}

#[instrument(skip(state))]
pub async fn remove_from_blacklist(
    State(state): State<AppState>,
    UserContext(user_id): UserContext,
    Path(food_id): Path<Uuid>,
) -> Result<Json<Blacklist>, (StatusCode, String)> {
    let blacklist = services::unblacklist_food(&state, user_id, FoodId(food_id))
        .await
        .map_err(reject)?;
    Ok(Json(blacklist))
}
