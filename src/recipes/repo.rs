use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    recipes::repo_types::{NewRecipe, Recipe},
    store::{PgStore, RecipeRepository, StoreResult},
};

#[async_trait]
impl RecipeRepository for PgStore {
    async fn list_recipes(&self, owner: Uuid) -> StoreResult<Vec<Recipe>> {
        let rows = sqlx::query_as::<_, Recipe>(
            r#"
            SELECT id, user_id, title, description, time_taken, cost, link
            FROM recipes
            WHERE user_id = $1
            ORDER BY id DESC
            "#,
        )
        .bind(owner)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn find_recipe(&self, owner: Uuid, id: i64) -> StoreResult<Option<Recipe>> {
        let row = sqlx::query_as::<_, Recipe>(
            r#"
            SELECT id, user_id, title, description, time_taken, cost, link
            FROM recipes
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(id)
        .bind(owner)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    async fn insert_recipe(&self, recipe: NewRecipe) -> StoreResult<Recipe> {
        let row = sqlx::query_as::<_, Recipe>(
            r#"
            INSERT INTO recipes (user_id, title, description, time_taken, cost, link)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, user_id, title, description, time_taken, cost, link
            "#,
        )
        .bind(recipe.user_id)
        .bind(&recipe.title)
        .bind(&recipe.description)
        .bind(recipe.time_taken)
        .bind(recipe.cost)
        .bind(&recipe.link)
        .fetch_one(&self.db)
        .await?;
        Ok(row)
    }

    async fn save_recipe(&self, recipe: &Recipe) -> StoreResult<Option<Recipe>> {
        let row = sqlx::query_as::<_, Recipe>(
            r#"
            UPDATE recipes
               SET title = $3, description = $4, time_taken = $5, cost = $6, link = $7
             WHERE id = $1 AND user_id = $2
            RETURNING id, user_id, title, description, time_taken, cost, link
            "#,
        )
        .bind(recipe.id)
        .bind(recipe.user_id)
        .bind(&recipe.title)
        .bind(&recipe.description)
        .bind(recipe.time_taken)
        .bind(recipe.cost)
        .bind(&recipe.link)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    async fn delete_recipe(&self, owner: Uuid, id: i64) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM recipes WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(owner)
            .execute(&self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn recipe_exists(&self, id: i64) -> StoreResult<bool> {
        let (exists,): (bool,) =
            sqlx::query_as("SELECT EXISTS (SELECT 1 FROM recipes WHERE id = $1)")
                .bind(id)
                .fetch_one(&self.db)
                .await?;
        Ok(exists)
    }
}
