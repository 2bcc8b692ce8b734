use serde::{Deserialize, Serialize};

use crate::diet::{Category, FoodId, IngredientLine, MacroVector, RankedCandidate};

#[derive(Debug, Deserialize)]
pub struct FoodFilter {
    pub category: Option<Category>,
}

#[derive(Debug, Deserialize)]
pub struct PutFoodRequest {
    pub name: String,
    pub category: Category,
    pub macros: MacroVector,
    pub unit: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct PutRecipeRequest {
    pub name: String,
    pub ingredients: Vec<IngredientLine>,
}

#[derive(Debug, Deserialize)]
pub struct SubstituteParams {
    pub tolerance: Option<f64>,
    pub top_k: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct SubstitutesResponse {
    pub tolerance: f64,
    pub top_k: usize,
    pub candidates: Vec<RankedCandidate>,
}

#[derive(Debug, Deserialize)]
pub struct BlacklistRequest {
    pub food_id: FoodId,
    pub reason: Option<String>,
}
