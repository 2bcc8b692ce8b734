use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

id_type!(
    /// Stable identity of a catalog food.
    FoodId
);
id_type!(
    /// Stable identity of a catalog recipe.
    RecipeId
);
id_type!(
    /// Stable identity of a meal template.
    TemplateId
);

/// Calories (kcal) and macronutrients in grams.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MacroVector {
    pub calories: f64,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
}

impl MacroVector {
    pub const ZERO: MacroVector = MacroVector {
        calories: 0.0,
        protein_g: 0.0,
        carbs_g: 0.0,
        fat_g: 0.0,
    };

    pub const fn new(calories: f64, protein_g: f64, carbs_g: f64, fat_g: f64) -> Self {
        Self {
            calories,
            protein_g,
            carbs_g,
            fat_g,
        }
    }

    pub fn scale(self, factor: f64) -> Self {
        Self {
            calories: self.calories * factor,
            protein_g: self.protein_g * factor,
            carbs_g: self.carbs_g * factor,
            fat_g: self.fat_g * factor,
        }
    }

    /// Value of a single dimension.
    pub fn get(&self, dimension: Macro) -> f64 {
        match dimension {
            Macro::Calories => self.calories,
            Macro::Protein => self.protein_g,
            Macro::Carbs => self.carbs_g,
            Macro::Fat => self.fat_g,
        }
    }

    pub fn is_finite(&self) -> bool {
        Macro::ALL.iter().all(|m| self.get(*m).is_finite())
    }
}

impl Add for MacroVector {
    type Output = MacroVector;

    fn add(self, rhs: MacroVector) -> MacroVector {
        MacroVector {
            calories: self.calories + rhs.calories,
            protein_g: self.protein_g + rhs.protein_g,
            carbs_g: self.carbs_g + rhs.carbs_g,
            fat_g: self.fat_g + rhs.fat_g,
        }
    }
}

impl Sub for MacroVector {
    type Output = MacroVector;

    fn sub(self, rhs: MacroVector) -> MacroVector {
        self + rhs.scale(-1.0)
    }
}

impl AddAssign for MacroVector {
    fn add_assign(&mut self, rhs: MacroVector) {
        *self = *self + rhs;
    }
}

impl Mul<f64> for MacroVector {
    type Output = MacroVector;

    fn mul(self, rhs: f64) -> MacroVector {
        self.scale(rhs)
    }
}

impl Sum for MacroVector {
    fn sum<I: Iterator<Item = MacroVector>>(iter: I) -> MacroVector {
        iter.fold(MacroVector::ZERO, |acc, m| acc + m)
    }
}

impl<'a> Sum<&'a MacroVector> for MacroVector {
    fn sum<I: Iterator<Item = &'a MacroVector>>(iter: I) -> MacroVector {
        iter.copied().sum()
    }
}

/// One dimension of a [`MacroVector`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Macro {
    Calories,
    Protein,
    Carbs,
    Fat,
}

impl Macro {
    pub const ALL: [Macro; 4] = [Macro::Calories, Macro::Protein, Macro::Carbs, Macro::Fat];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Grain,
    Protein,
    Dairy,
    Vegetable,
    Fruit,
    Legume,
    Fat,
    Snack,
    Beverage,
    Other,
}

/// Time-of-day tag of a meal slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MealTime {
    Breakfast,
    Lunch,
    Snack,
    Dinner,
}

/// Reference to something edible in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum ItemRef {
    Food(FoodId),
    Recipe(RecipeId),
}

impl ItemRef {
    pub fn food_id(&self) -> Option<FoodId> {
        match self {
            ItemRef::Food(id) => Some(*id),
            ItemRef::Recipe(_) => None,
        }
    }
}

impl fmt::Display for ItemRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemRef::Food(id) => write!(f, "food:{id}"),
            ItemRef::Recipe(id) => write!(f, "recipe:{id}"),
        }
    }
}

/// Validated serving multiplier: finite and strictly positive.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Quantity(f64);

impl Quantity {
    pub fn new(value: f64) -> Result<Self, crate::diet::DietError> {
        if value.is_finite() && value > 0.0 {
            Ok(Self(value))
        } else {
            Err(crate::diet::DietError::InvalidQuantity(value))
        }
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for Quantity {
    type Error = crate::diet::DietError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Quantity::new(value)
    }
}

impl From<Quantity> for f64 {
    fn from(q: Quantity) -> f64 {
        q.0
    }
}
