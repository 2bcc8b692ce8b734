use serde::{Deserialize, Serialize};
use time::Date;

use super::blacklist::Blacklist;
use super::catalog::CatalogRead;
use super::error::DietError;
use super::log::{DayLog, EntryOrigin, EntryTag, LogEntry};
use super::resolver::{rank_substitutes, RankedCandidate, SubstituteOptions, SubstituteQuery};
use super::types::{ItemRef, MacroVector, MealTime, Quantity, TemplateId};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MealSlot {
    pub time: MealTime,
    pub item: ItemRef,
    pub quantity: Quantity,
}

/// An ordered day plan. Slot order is the order meals are shown and eaten in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    #[serde(default)]
    pub id: TemplateId,
    pub name: String,
    pub slots: Vec<MealSlot>,
    #[serde(default)]
    pub target: Option<MacroVector>,
}

/// Where the engine finds templates by id.
pub trait TemplateLookup {
    fn find_template(&self, id: TemplateId) -> Option<&Template>;
}

impl TemplateLookup for [Template] {
    fn find_template(&self, id: TemplateId) -> Option<&Template> {
        self.iter().find(|t| t.id == id)
    }
}

/// Turns templates into day logs and edits their entries.
pub struct TemplateEngine<'a, C: CatalogRead + ?Sized> {
    catalog: &'a C,
    blacklist: &'a Blacklist,
    options: SubstituteOptions,
}

impl<'a, C: CatalogRead + ?Sized> TemplateEngine<'a, C> {
    pub fn new(catalog: &'a C, blacklist: &'a Blacklist, options: SubstituteOptions) -> Self {
        Self {
            catalog,
            blacklist,
            options,
        }
    }

    /// Build a draft for `date`. Blacklisted slot items are replaced by the
    /// best substitute, or kept as `Unresolved` entries when there is none.
    ///
    /// Pure with respect to its inputs: the same template, date, catalog and
    /// blacklist always yield the same draft.
    pub fn instantiate(
        &self,
        template: &Template,
        date: Date,
        target: Option<MacroVector>,
    ) -> Result<DayLog, DietError> {
        let target = target
            .or(template.target)
            .ok_or(DietError::MissingTarget(template.id))?;
        let mut day = DayLog::draft(date, Some(template.id), target);

        for (position, slot) in template.slots.iter().enumerate() {
            let tag = EntryTag::Slot {
                position,
                time: slot.time,
            };
            let entry = if self.blacklist.blocks(self.catalog, slot.item)? {
                match self.substitutes_for(slot.item, self.options)?.into_iter().next() {
                    Some(best) => LogEntry::snapshot(
                        self.catalog,
                        tag,
                        ItemRef::Food(best.food),
                        slot.quantity,
                        EntryOrigin::Substituted {
                            original: slot.item,
                        },
                    )?,
                    None => LogEntry::snapshot(
                        self.catalog,
                        tag,
                        slot.item,
                        slot.quantity,
                        EntryOrigin::Unresolved,
                    )?,
                }
            } else {
                LogEntry::snapshot(self.catalog, tag, slot.item, slot.quantity, EntryOrigin::Planned)?
            };
            day.push_planned(entry);
        }
        Ok(day)
    }

    /// Ranked replacements for `item`, never including the item itself or
    /// anything blacklisted.
    pub fn substitutes_for(
        &self,
        item: ItemRef,
        options: SubstituteOptions,
    ) -> Result<Vec<RankedCandidate>, DietError> {
        let mut exclude = self.blacklist.food_ids();
        exclude.extend(item.food_id());
        let query = SubstituteQuery {
            source: self.catalog.unit_macros(item)?,
            category: self.catalog.category_of(item)?,
            exclude,
            tolerance: options.tolerance,
            top_k: options.top_k,
        };
        Ok(rank_substitutes(self.catalog, &query))
    }

    /// Replace one entry, keeping its tag and every other entry in place.
    pub fn swap(
        &self,
        day: &DayLog,
        index: usize,
        item: ItemRef,
        quantity: f64,
    ) -> Result<DayLog, DietError> {
        day.ensure_mutable()?;
        let current = day.ensure_index(index)?;
        let entry = self.accept(
            current.tag.clone(),
            item,
            quantity,
            EntryOrigin::Swapped {
                replaced: current.item,
            },
        )?;
        let mut updated = day.clone();
        updated.replace(index, entry)?;
        Ok(updated)
    }

    /// Log something eaten outside the plan.
    pub fn add(
        &self,
        day: &DayLog,
        tag: EntryTag,
        item: ItemRef,
        quantity: f64,
    ) -> Result<DayLog, DietError> {
        day.ensure_mutable()?;
        let entry = self.accept(tag, item, quantity, EntryOrigin::Manual)?;
        let mut updated = day.clone();
        updated.push(entry)?;
        Ok(updated)
    }

    /// Amend a finalized day by appending a delta entry; history is left as is.
    pub fn correct(
        &self,
        day: &DayLog,
        index: usize,
        item: ItemRef,
        quantity: f64,
    ) -> Result<DayLog, DietError> {
        if !day.is_finalized() {
            return Err(DietError::NotFinalized(day.date()));
        }
        let (root, effective) = day.effective(index)?;
        let tag = day.ensure_index(root)?.tag.clone();
        let mut entry = self.accept(tag, item, quantity, EntryOrigin::Correction { corrects: root })?;
        entry.macros = entry.macros - effective;
        let mut updated = day.clone();
        updated.push_correction(entry)?;
        Ok(updated)
    }

    fn accept(
        &self,
        tag: EntryTag,
        item: ItemRef,
        quantity: f64,
        origin: EntryOrigin,
    ) -> Result<LogEntry, DietError> {
        let quantity = Quantity::new(quantity)?;
        if self.blacklist.blocks(self.catalog, item)? {
            return Err(DietError::Blacklisted(item));
        }
        LogEntry::snapshot(self.catalog, tag, item, quantity, origin)
    }
}
