//! Ranking of substitute foods.
//!
//! Candidates are scored by a weighted sum of normalized absolute macro
//! differences against the source. Protein carries the highest weight:
//! keeping protein intact is what matters most when a food is replaced.
//! Calories are also a hard filter: anything deviating by more than the
//! tolerance fraction is dropped, not merely penalized.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::catalog::{CatalogRead, Food};
use super::types::{Category, FoodId, Macro, MacroVector};

pub const DEFAULT_TOLERANCE: f64 = 0.20;
pub const DEFAULT_TOP_K: usize = 5;

const WEIGHTS: [(Macro, f64); 4] = [
    (Macro::Protein, 0.40),
    (Macro::Calories, 0.30),
    (Macro::Carbs, 0.15),
    (Macro::Fat, 0.15),
];

/// Differences are normalized by the source value, floored so a zero
/// source dimension does not divide by zero.
const NORMALIZATION_FLOOR: f64 = 1.0;
const EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq)]
pub struct SubstituteQuery {
    /// Per-unit macros to match.
    pub source: MacroVector,
    /// Preferred pool; `None` searches every food in a single pass.
    pub category: Option<Category>,
    pub exclude: BTreeSet<FoodId>,
    pub tolerance: f64,
    pub top_k: usize,
}

impl SubstituteQuery {
    pub fn new(source: MacroVector, category: Option<Category>) -> Self {
        Self {
            source,
            category,
            exclude: BTreeSet::new(),
            tolerance: DEFAULT_TOLERANCE,
            top_k: DEFAULT_TOP_K,
        }
    }
}

/// Caller-facing knobs for a substitute search.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SubstituteOptions {
    pub tolerance: f64,
    pub top_k: usize,
}

impl Default for SubstituteOptions {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
            top_k: DEFAULT_TOP_K,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedCandidate {
    pub food: FoodId,
    pub name: String,
    pub category: Category,
    pub macros: MacroVector,
    pub score: f64,
    pub same_category: bool,
}

/// Same-category candidates first; other categories only when that pool is empty.
pub fn rank_substitutes<C: CatalogRead + ?Sized>(
    catalog: &C,
    query: &SubstituteQuery,
) -> Vec<RankedCandidate> {
    let (same, other): (Vec<&Food>, Vec<&Food>) = catalog
        .foods()
        .into_iter()
        .filter(|f| !query.exclude.contains(&f.id))
        .partition(|f| Some(f.category) == query.category);

    let mut ranked = rank_pool(&same, query, true);
    if ranked.is_empty() {
        ranked = rank_pool(&other, query, false);
    }
    ranked.truncate(query.top_k);
    ranked
}

fn rank_pool(pool: &[&Food], query: &SubstituteQuery, same_category: bool) -> Vec<RankedCandidate> {
    let mut ranked: Vec<RankedCandidate> = pool
        .iter()
        .filter(|f| within_calorie_tolerance(&query.source, &f.macros, query.tolerance))
        .map(|f| RankedCandidate {
            food: f.id,
            name: f.name.clone(),
            category: f.category,
            macros: f.macros,
            score: distance(&query.source, &f.macros),
            same_category,
        })
        .collect();
    ranked.sort_by(compare_ranked);
    ranked
}

fn compare_ranked(a: &RankedCandidate, b: &RankedCandidate) -> Ordering {
    a.score.total_cmp(&b.score).then_with(|| a.food.cmp(&b.food))
}

fn normalized_diff(source: f64, candidate: f64) -> f64 {
    (candidate - source).abs() / source.abs().max(NORMALIZATION_FLOOR)
}

pub fn distance(source: &MacroVector, candidate: &MacroVector) -> f64 {
    WEIGHTS
        .iter()
        .map(|(m, w)| w * normalized_diff(source.get(*m), candidate.get(*m)))
        .sum()
}

pub fn within_calorie_tolerance(source: &MacroVector, candidate: &MacroVector, tolerance: f64) -> bool {
    normalized_diff(source.calories, candidate.calories) <= tolerance + EPSILON
}
