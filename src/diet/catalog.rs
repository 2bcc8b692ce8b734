use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::error::{DietError, Missing};
use super::types::{Category, FoodId, ItemRef, MacroVector, Quantity, RecipeId};

/// A catalog food. `macros` are per `unit` (e.g. "100g", "1 piece").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Food {
    pub id: FoodId,
    pub name: String,
    pub category: Category,
    pub macros: MacroVector,
    pub unit: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IngredientLine {
    pub food: FoodId,
    pub quantity: Quantity,
}

/// A recipe whose totals are always derived from its ingredient lines.
///
/// Only the [`Catalog`] builds recipes, so the totals cannot go stale:
/// they are re-derived whenever the lines or one of the referenced foods change.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recipe {
    id: RecipeId,
    name: String,
    ingredients: Vec<IngredientLine>,
    totals: MacroVector,
}

impl Recipe {
    pub fn id(&self) -> RecipeId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ingredients(&self) -> &[IngredientLine] {
        &self.ingredients
    }

    /// Macros of one serving (the whole recipe).
    pub fn totals(&self) -> MacroVector {
        self.totals
    }

    pub fn uses(&self, food: FoodId) -> bool {
        self.ingredients.iter().any(|l| l.food == food)
    }
}

/// Recipe as written by a collaborator, before the catalog derives its totals.
#[derive(Debug, Clone, Deserialize)]
pub struct RecipeSpec {
    #[serde(default)]
    pub id: RecipeId,
    pub name: String,
    pub ingredients: Vec<IngredientLine>,
}

/// JSON shape of a catalog seed file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogSeed {
    #[serde(default)]
    pub foods: Vec<Food>,
    #[serde(default)]
    pub recipes: Vec<RecipeSpec>,
}

/// Read interface the engine consumes.
pub trait CatalogRead {
    fn get_food(&self, id: FoodId) -> Result<&Food, DietError>;
    fn get_recipe(&self, id: RecipeId) -> Result<&Recipe, DietError>;
    /// Foods of one category, in insertion order.
    fn list_by_category(&self, category: Category) -> Vec<&Food>;
    /// Every food, in insertion order.
    fn foods(&self) -> Vec<&Food>;

    /// Macros of a single unit/serving of `item`.
    fn unit_macros(&self, item: ItemRef) -> Result<MacroVector, DietError> {
        match item {
            ItemRef::Food(id) => Ok(self.get_food(id)?.macros),
            ItemRef::Recipe(id) => Ok(self.get_recipe(id)?.totals()),
        }
    }

    /// Per-unit macros scaled linearly by `quantity`.
    fn macros_of(&self, item: ItemRef, quantity: f64) -> Result<MacroVector, DietError> {
        Ok(self.unit_macros(item)?.scale(quantity))
    }

    /// Recipes carry no category of their own.
    fn category_of(&self, item: ItemRef) -> Result<Option<Category>, DietError> {
        match item {
            ItemRef::Food(id) => Ok(Some(self.get_food(id)?.category)),
            ItemRef::Recipe(id) => self.get_recipe(id).map(|_| None),
        }
    }

    fn name_of(&self, item: ItemRef) -> Result<&str, DietError> {
        match item {
            ItemRef::Food(id) => Ok(self.get_food(id)?.name.as_str()),
            ItemRef::Recipe(id) => Ok(self.get_recipe(id)?.name()),
        }
    }
}

/// In-memory nutrition catalog.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    foods: IndexMap<FoodId, Food>,
    recipes: IndexMap<RecipeId, Recipe>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_seed(seed: CatalogSeed) -> Result<Self, DietError> {
        let mut catalog = Self::new();
        for food in seed.foods {
            catalog.upsert_food(food)?;
        }
        for recipe in seed.recipes {
            catalog.upsert_recipe(recipe)?;
        }
        Ok(catalog)
    }

    pub fn recipes(&self) -> impl Iterator<Item = &Recipe> {
        self.recipes.values()
    }

    /// Insert or edit a food. Recipes using it get their totals re-derived.
    pub fn upsert_food(&mut self, food: Food) -> Result<(), DietError> {
        let m = food.macros;
        if !m.is_finite() || m.calories < 0.0 || m.protein_g < 0.0 || m.carbs_g < 0.0 || m.fat_g < 0.0
        {
            return Err(DietError::InvalidMacros(food.name));
        }
        let id = food.id;
        self.foods.insert(id, food);

        let foods = &self.foods;
        for recipe in self.recipes.values_mut().filter(|r| r.uses(id)) {
            recipe.totals = derive_totals(foods, &recipe.ingredients)?;
        }
        Ok(())
    }

    pub fn upsert_recipe(&mut self, spec: RecipeSpec) -> Result<&Recipe, DietError> {
        let totals = derive_totals(&self.foods, &spec.ingredients)?;
        let recipe = Recipe {
            id: spec.id,
            name: spec.name,
            ingredients: spec.ingredients,
            totals,
        };
        let (index, _) = self.recipes.insert_full(spec.id, recipe);
        self.recipes
            .get_index(index)
            .map(|(_, r)| r)
            .ok_or(DietError::NotFound(Missing::Recipe(spec.id)))
    }

    /// Deleting a food still referenced by a recipe is rejected.
    pub fn remove_food(&mut self, id: FoodId) -> Result<Food, DietError> {
        if !self.foods.contains_key(&id) {
            return Err(DietError::NotFound(Missing::Food(id)));
        }
        let mut users: Vec<RecipeId> = self
            .recipes
            .values()
            .filter(|r| r.uses(id))
            .map(|r| r.id)
            .collect();
        if !users.is_empty() {
            users.sort();
            return Err(DietError::FoodInUse {
                food: id,
                recipes: users,
            });
        }
        self.foods
            .shift_remove(&id)
            .ok_or(DietError::NotFound(Missing::Food(id)))
    }

    pub fn remove_recipe(&mut self, id: RecipeId) -> Result<Recipe, DietError> {
        self.recipes
            .shift_remove(&id)
            .ok_or(DietError::NotFound(Missing::Recipe(id)))
    }
}

fn derive_totals(
    foods: &IndexMap<FoodId, Food>,
    lines: &[IngredientLine],
) -> Result<MacroVector, DietError> {
    lines
        .iter()
        .map(|line| {
            foods
                .get(&line.food)
                .map(|f| f.macros.scale(line.quantity.value()))
                .ok_or(DietError::NotFound(Missing::Food(line.food)))
        })
        .sum()
}

impl CatalogRead for Catalog {
    fn get_food(&self, id: FoodId) -> Result<&Food, DietError> {
        self.foods
            .get(&id)
            .ok_or(DietError::NotFound(Missing::Food(id)))
    }

    fn get_recipe(&self, id: RecipeId) -> Result<&Recipe, DietError> {
        self.recipes
            .get(&id)
            .ok_or(DietError::NotFound(Missing::Recipe(id)))
    }

    fn list_by_category(&self, category: Category) -> Vec<&Food> {
        self.foods
            .values()
            .filter(|f| f.category == category)
            .collect()
    }

    fn foods(&self) -> Vec<&Food> {
        self.foods.values().collect()
    }
}
