use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Recipe {
    pub id: i64,
    pub user_id: Uuid,
    pub title: String,
    pub description: String,
    pub time_taken: i32,
    pub cost: Decimal,
    pub link: String,
}

#[derive(Debug, Clone)]
pub struct NewRecipe {
    pub user_id: Uuid,
    pub title: String,
    pub description: String,
    pub time_taken: i32,
    pub cost: Decimal,
    pub link: String,
}

impl NewRecipe {
    pub fn with_id(self, id: i64) -> Recipe {
        Recipe {
            id,
            user_id: self.user_id,
            title: self.title,
            description: self.description,
            time_taken: self.time_taken,
            cost: self.cost,
            link: self.link,
        }
    }
}
