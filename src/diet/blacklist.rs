use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::catalog::CatalogRead;
use super::error::DietError;
use super::types::{FoodId, ItemRef};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlacklistEntry {
    pub food: FoodId,
    pub reason: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl BlacklistEntry {
    pub fn new(food: FoodId, reason: Option<String>, created_at: OffsetDateTime) -> Self {
        let reason = reason
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty());
        Self {
            food,
            reason,
            created_at,
        }
    }
}

/// Foods the user will not eat. A food is blacklisted iff at least one entry names it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Blacklist {
    entries: Vec<BlacklistEntry>,
}

impl Blacklist {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: impl IntoIterator<Item = BlacklistEntry>) -> Self {
        let mut list = Self::new();
        for entry in entries {
            list.add(entry);
        }
        list
    }

    pub fn entries(&self) -> &[BlacklistEntry] {
        &self.entries
    }

    pub fn is_blacklisted(&self, food: FoodId) -> bool {
        self.entries.iter().any(|e| e.food == food)
    }

    pub fn reasons_for(&self, food: FoodId) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|e| e.food == food)
            .filter_map(|e| e.reason.as_deref())
            .collect()
    }

    /// Returns `false` when the entry added nothing new.
    ///
    /// A reason-less entry for an already blacklisted food is a no-op; a new
    /// distinct reason is kept alongside the existing ones.
    pub fn add(&mut self, entry: BlacklistEntry) -> bool {
        let entry = BlacklistEntry::new(entry.food, entry.reason, entry.created_at);
        let duplicate = match &entry.reason {
            None => self.is_blacklisted(entry.food),
            Some(reason) => self
                .entries
                .iter()
                .any(|e| e.food == entry.food && e.reason.as_deref() == Some(reason.as_str())),
        };
        if duplicate {
            return false;
        }
        self.entries.push(entry);
        true
    }

    /// Drops every entry for `food`, returning how many were removed.
    pub fn remove(&mut self, food: FoodId) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| e.food != food);
        before - self.entries.len()
    }

    pub fn food_ids(&self) -> BTreeSet<FoodId> {
        self.entries.iter().map(|e| e.food).collect()
    }

    /// A recipe is blocked when any of its ingredients is blacklisted.
    pub fn blocks<C: CatalogRead + ?Sized>(&self, catalog: &C, item: ItemRef) -> Result<bool, DietError> {
        match item {
            ItemRef::Food(id) => {
                catalog.get_food(id)?;
                Ok(self.is_blacklisted(id))
            }
            ItemRef::Recipe(id) => Ok(catalog
                .get_recipe(id)?
                .ingredients()
                .iter()
                .any(|line| self.is_blacklisted(line.food))),
        }
    }
}
