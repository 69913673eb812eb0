//! Persistence seams. Handlers only see the repository traits; the
//! PostgreSQL and in-memory backends live behind them.

use anyhow::Context;
use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool};
use thiserror::Error;
use uuid::Uuid;

use crate::{
    auth::repo_types::{NewUser, User, UserUpdate},
    recipes::repo_types::{NewRecipe, Recipe},
};

pub mod memory;

pub use memory::MemoryStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("email already registered")]
    DuplicateEmail,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl StoreError {
    /// Maps unique violations on `users.email` to `DuplicateEmail`.
    pub(crate) fn from_write(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &e {
            if db.is_unique_violation() {
                return StoreError::DuplicateEmail;
            }
        }
        StoreError::Database(e)
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn insert_user(&self, user: NewUser) -> StoreResult<User>;
    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>>;
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    /// All users, oldest first.
    async fn list_users(&self) -> StoreResult<Vec<User>>;
    /// Writes only the columns set in `changes`. Returns `None` if the row is gone.
    async fn update_user(&self, id: Uuid, changes: &UserUpdate) -> StoreResult<Option<User>>;
    /// Sets `last_login` to now without touching any other column.
    async fn touch_last_login(&self, id: Uuid) -> StoreResult<Option<User>>;
    /// Deletes the user and, with it, every recipe they own.
    async fn delete_user(&self, id: Uuid) -> StoreResult<bool>;
}

/// Every lookup is scoped by owner: a recipe that exists for someone else
/// is indistinguishable from one that does not exist at all.
#[async_trait]
pub trait RecipeRepository: Send + Sync {
    /// Owner's recipes, newest (highest id) first.
    async fn list_recipes(&self, owner: Uuid) -> StoreResult<Vec<Recipe>>;
    async fn find_recipe(&self, owner: Uuid, id: i64) -> StoreResult<Option<Recipe>>;
    async fn insert_recipe(&self, recipe: NewRecipe) -> StoreResult<Recipe>;
    /// Writes the mutable columns; `user_id` is only used to scope the update.
    async fn save_recipe(&self, recipe: &Recipe) -> StoreResult<Option<Recipe>>;
    async fn delete_recipe(&self, owner: Uuid, id: i64) -> StoreResult<bool>;
    async fn recipe_exists(&self, id: i64) -> StoreResult<bool>;
}

#[derive(Clone)]
pub struct PgStore {
    pub(crate) db: PgPool,
}

impl PgStore {
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let db = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .context("connect to database")?;
        Ok(Self { db })
    }

    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations").run(&self.db).await?;
        Ok(())
    }
}
