use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::{
    error::{non_blank_text, required_text, ApiError, FieldErrors, REQUIRED, TOO_LONG},
    fields,
    recipes::repo_types::{NewRecipe, Recipe},
};

const MAX_LEN: usize = 255;
const COST_MAX_DIGITS: u32 = 5;
const COST_DECIMAL_PLACES: u32 = 2;

pub const COST_TOO_MANY_DIGITS: &str = "Ensure that there are no more than 5 digits in total.";
pub const COST_TOO_PRECISE: &str = "Ensure that there are no more than 2 decimal places.";
pub const COST_TOO_LARGE: &str =
    "Ensure that there are no more than 3 digits before the decimal point.";

/// List view representation.
#[derive(Debug, Serialize)]
pub struct RecipeSummary {
    pub id: i64,
    pub title: String,
    pub time_taken: i32,
    pub cost: Decimal,
    pub link: String,
}

/// Detail view: the summary plus `description`.
#[derive(Debug, Serialize)]
pub struct RecipeDetail {
    pub id: i64,
    pub title: String,
    pub time_taken: i32,
    pub cost: Decimal,
    pub link: String,
    pub description: String,
}

impl From<Recipe> for RecipeSummary {
    fn from(r: Recipe) -> Self {
        Self {
            id: r.id,
            title: r.title,
            time_taken: r.time_taken,
            cost: r.cost,
            link: r.link,
        }
    }
}

impl From<Recipe> for RecipeDetail {
    fn from(r: Recipe) -> Self {
        Self {
            id: r.id,
            title: r.title,
            time_taken: r.time_taken,
            cost: r.cost,
            link: r.link,
            description: r.description,
        }
    }
}

/// Incoming recipe body. Unknown keys such as `id` or `user` are dropped by
/// serde, which is what keeps ownership out of the client's hands. Values stay
/// raw until `validate` so type errors land under the field's own key.
#[derive(Debug, Default, Deserialize)]
pub struct RecipePayload {
    pub title: Option<Value>,
    pub description: Option<Value>,
    pub time_taken: Option<Value>,
    pub cost: Option<Value>,
    pub link: Option<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// POST: required fields must be present, optional ones default to "".
    Create,
    /// PUT: required fields must be present, optional ones kept if absent.
    Replace,
    /// PATCH: everything optional.
    Partial,
}

/// Validated recipe fields; `None` means "not supplied".
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RecipeChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub time_taken: Option<i32>,
    pub cost: Option<Decimal>,
    pub link: Option<String>,
}

impl RecipePayload {
    pub fn validate(self, mode: WriteMode) -> Result<RecipeChanges, ApiError> {
        let required = mode != WriteMode::Partial;
        let mut errors = FieldErrors::default();

        let title = match self.title {
            Some(v) => fields::text(&mut errors, "title", v)
                .and_then(|t| non_blank_text(&mut errors, "title", t, MAX_LEN)),
            None if required => required_text(&mut errors, "title", None, MAX_LEN),
            None => None,
        };

        let time_taken = match self.time_taken {
            Some(v) => fields::integer(&mut errors, "time_taken", v),
            None => {
                if required {
                    errors.add("time_taken", REQUIRED);
                }
                None
            }
        };

        let cost = match self.cost {
            Some(v) => fields::decimal(&mut errors, "cost", v).and_then(|c| {
                normalize_cost(c)
                    .map_err(|msg| errors.add("cost", msg))
                    .ok()
            }),
            None => {
                if required {
                    errors.add("cost", REQUIRED);
                }
                None
            }
        };

        let description = self
            .description
            .and_then(|v| fields::text(&mut errors, "description", v))
            .map(|d| d.trim().to_string());
        let link = self
            .link
            .and_then(|v| fields::text(&mut errors, "link", v))
            .and_then(|l| {
                let l = l.trim().to_string();
                if l.chars().count() > MAX_LEN {
                    errors.add("link", TOO_LONG);
                    None
                } else {
                    Some(l)
                }
            });

        errors.into_result()?;

        let (description, link) = match mode {
            WriteMode::Create => (
                Some(description.unwrap_or_default()),
                Some(link.unwrap_or_default()),
            ),
            WriteMode::Replace | WriteMode::Partial => (description, link),
        };

        Ok(RecipeChanges {
            title,
            description,
            time_taken,
            cost,
            link,
        })
    }
}

impl RecipeChanges {
    /// Builds a row for `owner`. Only meaningful after `WriteMode::Create`
    /// validation, which guarantees the required fields are present.
    pub fn into_new(self, owner: Uuid) -> NewRecipe {
        NewRecipe {
            user_id: owner,
            title: self.title.unwrap_or_default(),
            description: self.description.unwrap_or_default(),
            time_taken: self.time_taken.unwrap_or_default(),
            cost: self.cost.unwrap_or_default(),
            link: self.link.unwrap_or_default(),
        }
    }

    /// Overwrites supplied fields; `id` and `user_id` are never touched.
    pub fn apply(self, recipe: &mut Recipe) {
        if let Some(title) = self.title {
            recipe.title = title;
        }
        if let Some(description) = self.description {
            recipe.description = description;
        }
        if let Some(time_taken) = self.time_taken {
            recipe.time_taken = time_taken;
        }
        if let Some(cost) = self.cost {
            recipe.cost = cost;
        }
        if let Some(link) = self.link {
            recipe.link = link;
        }
    }
}

/// Checks a cost against NUMERIC(5, 2) and rescales it to two places.
/// Trailing zeros are not counted.
pub fn normalize_cost(cost: Decimal) -> Result<Decimal, &'static str> {
    let normalized = cost.normalize();
    let decimal_places = normalized.scale();
    let whole = normalized.abs().trunc();
    let whole_digits = if whole.is_zero() {
        0
    } else {
        whole.normalize().to_string().len() as u32
    };

    if whole_digits + decimal_places > COST_MAX_DIGITS {
        return Err(COST_TOO_MANY_DIGITS);
    }
    if decimal_places > COST_DECIMAL_PLACES {
        return Err(COST_TOO_PRECISE);
    }
    if whole_digits > COST_MAX_DIGITS - COST_DECIMAL_PLACES {
        return Err(COST_TOO_LARGE);
    }
    let mut cost = normalized;
    cost.rescale(COST_DECIMAL_PLACES);
    Ok(cost)
}
