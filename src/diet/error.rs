use thiserror::Error;
use time::Date;

use super::types::{FoodId, ItemRef, RecipeId, TemplateId};

/// Failures the engine reports back to its caller. Nothing here is retried internally.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DietError {
    #[error("{0} not found")]
    NotFound(Missing),

    #[error("entry index {index} out of range (day has {len} entries)")]
    OutOfRange { index: usize, len: usize },

    #[error("day log for {0} is finalized")]
    AlreadyFinalized(Date),

    #[error("day log for {0} is not finalized")]
    NotFinalized(Date),

    #[error("quantity must be finite and greater than zero, got {0}")]
    InvalidQuantity(f64),

    #[error("food {food} is used by {} recipe(s)", recipes.len())]
    FoodInUse { food: FoodId, recipes: Vec<RecipeId> },

    #[error("{0} is blacklisted")]
    Blacklisted(ItemRef),

    #[error("no target macros supplied and template {0} has none configured")]
    MissingTarget(TemplateId),

    #[error("invalid macro values for {0}")]
    InvalidMacros(String),
}

/// What a `NotFound` refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Missing {
    Food(FoodId),
    Recipe(RecipeId),
    Template(TemplateId),
    DayLog(Date),
}

impl std::fmt::Display for Missing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Missing::Food(id) => write!(f, "food {id}"),
            Missing::Recipe(id) => write!(f, "recipe {id}"),
            Missing::Template(id) => write!(f, "template {id}"),
            Missing::DayLog(date) => write!(f, "day log {date}"),
        }
    }
}

impl From<ItemRef> for Missing {
    fn from(item: ItemRef) -> Self {
        match item {
            ItemRef::Food(id) => Missing::Food(id),
            ItemRef::Recipe(id) => Missing::Recipe(id),
        }
    }
}
