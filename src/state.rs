use std::sync::Arc;

use anyhow::Context;

use crate::config::AppConfig;
use crate::store::{MemoryStore, PgStore, RecipeRepository, UserRepository};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub users: Arc<dyn UserRepository>,
    pub recipes: Arc<dyn RecipeRepository>,
}

impl AppState {
    /// Connects to PostgreSQL using `config.database_url` and runs migrations.
    pub async fn init(config: AppConfig) -> anyhow::Result<Self> {
        let store = PgStore::connect(&config.database_url).await?;

        store.migrate().await.context("run migrations")?;
        tracing::info!("migrations applied");

        let store = Arc::new(store);
        Ok(Self::from_parts(
            Arc::new(config),
            store.clone() as Arc<dyn UserRepository>,
            store as Arc<dyn RecipeRepository>,
        ))
    }

    pub fn from_parts(
        config: Arc<AppConfig>,
        users: Arc<dyn UserRepository>,
        recipes: Arc<dyn RecipeRepository>,
    ) -> Self {
        Self {
            config,
            users,
            recipes,
        }
    }

    /// Memory-backed state with test JWT settings.
    pub fn fake() -> Self {
        Self::in_memory(AppConfig::for_tests())
    }

    pub fn in_memory(config: AppConfig) -> Self {
        let store = Arc::new(MemoryStore::new());
        Self::from_parts(
            Arc::new(config),
            store.clone() as Arc<dyn UserRepository>,
            store as Arc<dyn RecipeRepository>,
        )
    }
}
