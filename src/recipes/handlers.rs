use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::extractors::AuthUser,
    error::{ApiError, Payload},
    state::AppState,
};

use super::dto::{RecipeDetail, RecipePayload, RecipeSummary, WriteMode};

pub fn recipe_routes() -> Router<AppState> {
    Router::new()
        .route("/recipe/recipes/", get(list_recipes).post(create_recipe))
        .route(
            "/recipe/recipes/:id/",
            get(get_recipe)
                .put(replace_recipe)
                .patch(update_recipe)
                .delete(delete_recipe),
        )
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn list_recipes(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<RecipeSummary>>, ApiError> {
    let recipes = state.recipes.list_recipes(user.id).await?;
    Ok(Json(recipes.into_iter().map(RecipeSummary::from).collect()))
}

#[instrument(skip(state, user, payload), fields(user_id = %user.id))]
pub async fn create_recipe(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Payload(payload): Payload<RecipePayload>,
) -> Result<(StatusCode, Json<RecipeDetail>), ApiError> {
    let new = payload.validate(WriteMode::Create)?.into_new(user.id);
    let recipe = state.recipes.insert_recipe(new).await?;
    info!(recipe_id = recipe.id, "recipe created");
    Ok((StatusCode::CREATED, Json(recipe.into())))
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn get_recipe(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<RecipeDetail>, ApiError> {
    let recipe = state
        .recipes
        .find_recipe(user.id, id)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(recipe.into()))
}

#[instrument(skip(state, user, payload), fields(user_id = %user.id))]
pub async fn replace_recipe(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
    Payload(payload): Payload<RecipePayload>,
) -> Result<Json<RecipeDetail>, ApiError> {
    write_recipe(&state, user.id, id, payload, WriteMode::Replace).await
}

#[instrument(skip(state, user, payload), fields(user_id = %user.id))]
pub async fn update_recipe(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
    Payload(payload): Payload<RecipePayload>,
) -> Result<Json<RecipeDetail>, ApiError> {
    write_recipe(&state, user.id, id, payload, WriteMode::Partial).await
}

async fn write_recipe(
    state: &AppState,
    owner: Uuid,
    id: i64,
    payload: RecipePayload,
    mode: WriteMode,
) -> Result<Json<RecipeDetail>, ApiError> {
    // look up first so that another owner's id is a 404 rather than a 400
    let mut recipe = state
        .recipes
        .find_recipe(owner, id)
        .await?
        .ok_or(ApiError::NotFound)?;

    payload.validate(mode)?.apply(&mut recipe);

    let recipe = state
        .recipes
        .save_recipe(&recipe)
        .await?
        .ok_or(ApiError::NotFound)?;
    info!(recipe_id = recipe.id, ?mode, "recipe updated");
    Ok(Json(recipe.into()))
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn delete_recipe(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    if !state.recipes.delete_recipe(user.id, id).await? {
        warn!(recipe_id = id, "delete of missing or foreign recipe");
        return Err(ApiError::NotFound);
    }
    info!(recipe_id = id, "recipe deleted");
    Ok(StatusCode::NO_CONTENT)
}
