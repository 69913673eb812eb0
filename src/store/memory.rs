use std::{collections::BTreeMap, sync::Arc};

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use tracing::{debug, trace};
use uuid::Uuid;

use super::{RecipeRepository, StoreError, StoreResult, UserRepository};
use crate::{
    auth::repo_types::{NewUser, User, UserUpdate},
    recipes::repo_types::{NewRecipe, Recipe},
};

#[derive(Default)]
struct Tables {
    // insertion order doubles as creation order
    users: Vec<User>,
    recipes: BTreeMap<i64, Recipe>,
    last_recipe_id: i64,
}

/// Process-local store used by tests and `AppState::fake`.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn insert_user(&self, user: NewUser) -> StoreResult<User> {
        let mut tables = self.tables.write().await;
        if tables.users.iter().any(|u| u.email == user.email) {
            return Err(StoreError::DuplicateEmail);
        }
        let user = user.into_user();
        tables.users.push(user.clone());
        debug!(user_id = %user.id, email = %user.email, "user saved to memory store");
        Ok(user)
    }

    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let tables = self.tables.read().await;
        trace!(email, "looking up user by email");
        Ok(tables.users.iter().find(|u| u.email == email).cloned())
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        Ok(self.tables.read().await.users.clone())
    }

    async fn update_user(&self, id: Uuid, changes: &UserUpdate) -> StoreResult<Option<User>> {
        let mut tables = self.tables.write().await;
        if let Some(email) = &changes.email {
            if tables.users.iter().any(|u| u.id != id && &u.email == email) {
                return Err(StoreError::DuplicateEmail);
            }
        }
        let Some(slot) = tables.users.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };
        changes.clone().apply(slot);
        Ok(Some(slot.clone()))
    }

    async fn touch_last_login(&self, id: Uuid) -> StoreResult<Option<User>> {
        let mut tables = self.tables.write().await;
        let Some(slot) = tables.users.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };
        slot.last_login = Some(OffsetDateTime::now_utc());
        Ok(Some(slot.clone()))
    }

    async fn delete_user(&self, id: Uuid) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        let before = tables.users.len();
        tables.users.retain(|u| u.id != id);
        if tables.users.len() == before {
            return Ok(false);
        }
        tables.recipes.retain(|_, r| r.user_id != id);
        debug!(user_id = %id, "user and owned recipes removed from memory store");
        Ok(true)
    }
}

#[async_trait]
impl RecipeRepository for MemoryStore {
    async fn list_recipes(&self, owner: Uuid) -> StoreResult<Vec<Recipe>> {
        let tables = self.tables.read().await;
        Ok(tables
            .recipes
            .values()
            .rev()
            .filter(|r| r.user_id == owner)
            .cloned()
            .collect())
    }

    async fn find_recipe(&self, owner: Uuid, id: i64) -> StoreResult<Option<Recipe>> {
        let tables = self.tables.read().await;
        Ok(tables
            .recipes
            .get(&id)
            .filter(|r| r.user_id == owner)
            .cloned())
    }

    async fn insert_recipe(&self, recipe: NewRecipe) -> StoreResult<Recipe> {
        let mut tables = self.tables.write().await;
        tables.last_recipe_id += 1;
        let recipe = recipe.with_id(tables.last_recipe_id);
        tables.recipes.insert(recipe.id, recipe.clone());
        Ok(recipe)
    }

    async fn save_recipe(&self, recipe: &Recipe) -> StoreResult<Option<Recipe>> {
        let mut tables = self.tables.write().await;
        match tables.recipes.get_mut(&recipe.id) {
            Some(slot) if slot.user_id == recipe.user_id => {
                *slot = recipe.clone();
                Ok(Some(slot.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn delete_recipe(&self, owner: Uuid, id: i64) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        let owned = tables.recipes.get(&id).is_some_and(|r| r.user_id == owner);
        if owned {
            tables.recipes.remove(&id);
        }
        Ok(owned)
    }

    async fn recipe_exists(&self, id: i64) -> StoreResult<bool> {
        Ok(self.tables.read().await.recipes.contains_key(&id))
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            email: email.into(),
            name: "Tester".into(),
            password_hash: "hash".into(),
            is_active: true,
            is_staff: false,
            is_superuser: false,
        }
    }

    fn new_recipe(owner: Uuid, title: &str) -> NewRecipe {
        NewRecipe {
            user_id: owner,
            title: title.into(),
            description: String::new(),
            time_taken: 10,
            cost: Decimal::new(525, 2),
            link: String::new(),
        }
    }

    #[tokio::test]
    async fn insert_user_rejects_duplicate_email() {
        let store = MemoryStore::new();
        store.insert_user(new_user("a@example.com")).await.unwrap();
        let err = store
            .insert_user(new_user("a@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateEmail));
    }

    #[tokio::test]
    async fn update_user_rejects_taking_another_users_email() {
        let store = MemoryStore::new();
        store.insert_user(new_user("a@example.com")).await.unwrap();
        let b = store.insert_user(new_user("b@example.com")).await.unwrap();
        let changes = UserUpdate {
            email: Some("a@example.com".into()),
            ..UserUpdate::default()
        };
        let err = store.update_user(b.id, &changes).await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateEmail));
    }

    #[tokio::test]
    async fn update_user_only_writes_supplied_columns() {
        let store = MemoryStore::new();
        let user = store.insert_user(new_user("a@example.com")).await.unwrap();

        // two edits prepared from the same snapshot must not undo each other
        let new_hash = UserUpdate {
            password_hash: Some("new-hash".into()),
            ..UserUpdate::default()
        };
        let deactivate = UserUpdate {
            is_active: Some(false),
            ..UserUpdate::default()
        };
        store.update_user(user.id, &new_hash).await.unwrap();
        store.update_user(user.id, &deactivate).await.unwrap();

        let stored = store.find_user_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(stored.password_hash, "new-hash");
        assert!(!stored.is_active);
        assert_eq!(stored.name, "Tester");
        assert_eq!(stored.created_at, user.created_at);
    }

    #[tokio::test]
    async fn touch_last_login_leaves_other_columns() {
        let store = MemoryStore::new();
        let user = store.insert_user(new_user("a@example.com")).await.unwrap();
        let deactivate = UserUpdate {
            is_active: Some(false),
            ..UserUpdate::default()
        };
        store.update_user(user.id, &deactivate).await.unwrap();

        let touched = store.touch_last_login(user.id).await.unwrap().unwrap();
        assert!(touched.last_login.is_some());
        assert!(!touched.is_active);
        assert!(store.touch_last_login(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn recipes_are_listed_newest_first_and_scoped() {
        let store = MemoryStore::new();
        let a = store.insert_user(new_user("a@example.com")).await.unwrap();
        let b = store.insert_user(new_user("b@example.com")).await.unwrap();
        let first = store.insert_recipe(new_recipe(a.id, "one")).await.unwrap();
        store.insert_recipe(new_recipe(b.id, "other")).await.unwrap();
        let second = store.insert_recipe(new_recipe(a.id, "two")).await.unwrap();

        let ids: Vec<i64> = store
            .list_recipes(a.id)
            .await
            .unwrap()
            .iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec![second.id, first.id]);
        assert!(store.find_recipe(b.id, first.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_recipe_requires_owner() {
        let store = MemoryStore::new();
        let a = store.insert_user(new_user("a@example.com")).await.unwrap();
        let b = store.insert_user(new_user("b@example.com")).await.unwrap();
        let recipe = store.insert_recipe(new_recipe(b.id, "mine")).await.unwrap();

        assert!(!store.delete_recipe(a.id, recipe.id).await.unwrap());
        assert!(store.recipe_exists(recipe.id).await.unwrap());
        assert!(store.delete_recipe(b.id, recipe.id).await.unwrap());
        assert!(!store.recipe_exists(recipe.id).await.unwrap());
    }

    #[tokio::test]
    async fn save_recipe_cannot_move_ownership() {
        let store = MemoryStore::new();
        let a = store.insert_user(new_user("a@example.com")).await.unwrap();
        let b = store.insert_user(new_user("b@example.com")).await.unwrap();
        let mut recipe = store.insert_recipe(new_recipe(a.id, "mine")).await.unwrap();
        recipe.user_id = b.id;
        assert!(store.save_recipe(&recipe).await.unwrap().is_none());
        let stored = store.find_recipe(a.id, recipe.id).await.unwrap().unwrap();
        assert_eq!(stored.user_id, a.id);
    }

    #[tokio::test]
    async fn deleting_user_cascades_to_recipes() {
        let store = MemoryStore::new();
        let a = store.insert_user(new_user("a@example.com")).await.unwrap();
        let recipe = store.insert_recipe(new_recipe(a.id, "mine")).await.unwrap();
        assert!(store.delete_user(a.id).await.unwrap());
        assert!(!store.recipe_exists(recipe.id).await.unwrap());
        assert!(store.find_user_by_id(a.id).await.unwrap().is_none());
        assert!(!store.delete_user(a.id).await.unwrap());
    }
}
