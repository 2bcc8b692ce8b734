//! Diet planning and substitution engine.
//!
//! Everything in here is synchronous and side-effect free: the HTTP layer
//! loads state, calls into [`DietEngine`], and persists what comes back.

pub mod aggregator;
pub mod blacklist;
pub mod catalog;
pub mod engine;
pub mod error;
pub mod log;
pub mod resolver;
pub mod template;
pub mod types;

pub use aggregator::{
    AdherencePolicy, AdherenceReport, AdherenceState, DayAward, DimensionReport, Finalized,
    Verdict,
};
pub use blacklist::{Blacklist, BlacklistEntry};
pub use catalog::{Catalog, CatalogRead, CatalogSeed, Food, IngredientLine, Recipe, RecipeSpec};
pub use engine::{DietEngine, DietPolicy};
pub use error::{DietError, Missing};
pub use log::{DayLog, DayStatus, EntryOrigin, EntryTag, LogEntry};
pub use resolver::{RankedCandidate, SubstituteOptions, SubstituteQuery};
pub use template::{MealSlot, Template, TemplateEngine, TemplateLookup};
pub use types::{
    Category, FoodId, ItemRef, Macro, MacroVector, MealTime, Quantity, RecipeId, TemplateId,
};
