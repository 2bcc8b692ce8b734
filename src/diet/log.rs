use serde::{Deserialize, Serialize};
use time::Date;

use super::catalog::CatalogRead;
use super::error::DietError;
use super::types::{ItemRef, MacroVector, MealTime, Quantity, TemplateId};

/// Lifecycle of a [`DayLog`]: `Draft -> Active -> Finalized`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayStatus {
    Draft,
    Active,
    Finalized,
}

/// Where an entry sits in the day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EntryTag {
    /// Copied from a template slot.
    Slot { position: usize, time: MealTime },
    Free { label: String },
}

/// How an entry came to be.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum EntryOrigin {
    Planned,
    /// The planned item was blacklisted and replaced by the top-ranked substitute.
    Substituted { original: ItemRef },
    /// The planned item was blacklisted and nothing qualified as a substitute.
    /// The entry keeps the original item but contributes nothing to totals.
    Unresolved,
    Swapped { replaced: ItemRef },
    Manual,
    /// Delta appended to a finalized day; `macros` holds the difference.
    Correction { corrects: usize },
}

/// One consumed (or planned) item. `macros` is frozen when the entry is created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub tag: EntryTag,
    pub item: ItemRef,
    pub name: String,
    pub quantity: Quantity,
    pub macros: MacroVector,
    pub origin: EntryOrigin,
}

impl LogEntry {
    /// Resolve `item` against the catalog and freeze its contribution.
    pub fn snapshot<C: CatalogRead + ?Sized>(
        catalog: &C,
        tag: EntryTag,
        item: ItemRef,
        quantity: Quantity,
        origin: EntryOrigin,
    ) -> Result<Self, DietError> {
        Ok(Self {
            tag,
            item,
            name: catalog.name_of(item)?.to_string(),
            quantity,
            macros: catalog.macros_of(item, quantity.value())?,
            origin,
        })
    }

    pub fn is_unresolved(&self) -> bool {
        matches!(self.origin, EntryOrigin::Unresolved)
    }

    /// What this entry adds to the day's totals.
    pub fn contribution(&self) -> MacroVector {
        if self.is_unresolved() {
            MacroVector::ZERO
        } else {
            self.macros
        }
    }
}

/// A single day's log. Totals are never stored; see [`crate::diet::aggregator::totals`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayLog {
    date: Date,
    template: Option<TemplateId>,
    target: MacroVector,
    status: DayStatus,
    entries: Vec<LogEntry>,
}

impl DayLog {
    /// An empty draft, for days logged without a template.
    pub fn new(date: Date, target: MacroVector) -> Self {
        Self::draft(date, None, target)
    }

    pub(crate) fn draft(date: Date, template: Option<TemplateId>, target: MacroVector) -> Self {
        Self {
            date,
            template,
            target,
            status: DayStatus::Draft,
            entries: Vec::new(),
        }
    }

    pub fn date(&self) -> Date {
        self.date
    }

    pub fn target(&self) -> MacroVector {
        self.target
    }

    pub fn status(&self) -> DayStatus {
        self.status
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn is_finalized(&self) -> bool {
        self.status == DayStatus::Finalized
    }

    /// Positions of entries the resolver could not fill.
    pub fn unresolved(&self) -> Vec<usize> {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.is_unresolved())
            .map(|(i, _)| i)
            .collect()
    }

    pub fn ensure_mutable(&self) -> Result<(), DietError> {
        if self.is_finalized() {
            return Err(DietError::AlreadyFinalized(self.date));
        }
        Ok(())
    }

    pub(crate) fn ensure_index(&self, index: usize) -> Result<&LogEntry, DietError> {
        self.entries.get(index).ok_or(DietError::OutOfRange {
            index,
            len: self.entries.len(),
        })
    }

    /// Accept the draft as-is.
    pub fn commit(&mut self) -> Result<(), DietError> {
        self.ensure_mutable()?;
        self.status = DayStatus::Active;
        Ok(())
    }

    /// Append while the day is still being built from its template.
    pub(crate) fn push_planned(&mut self, entry: LogEntry) {
        self.entries.push(entry);
    }

    pub(crate) fn push(&mut self, entry: LogEntry) -> Result<(), DietError> {
        self.ensure_mutable()?;
        self.entries.push(entry);
        self.status = DayStatus::Active;
        Ok(())
    }

    pub(crate) fn replace(&mut self, index: usize, entry: LogEntry) -> Result<LogEntry, DietError> {
        self.ensure_mutable()?;
        self.ensure_index(index)?;
        let old = std::mem::replace(&mut self.entries[index], entry);
        self.status = DayStatus::Active;
        Ok(old)
    }

    pub(crate) fn push_correction(&mut self, entry: LogEntry) -> Result<(), DietError> {
        if !self.is_finalized() {
            return Err(DietError::NotFinalized(self.date));
        }
        self.entries.push(entry);
        Ok(())
    }

    pub(crate) fn finalize(&mut self) -> Result<(), DietError> {
        self.ensure_mutable()?;
        self.status = DayStatus::Finalized;
        Ok(())
    }

    /// Current contribution of the entry at `index` including any corrections
    /// appended for it. Returns the index corrections should point at.
    pub(crate) fn effective(&self, index: usize) -> Result<(usize, MacroVector), DietError> {
        let entry = self.ensure_index(index)?;
        let root = match entry.origin {
            EntryOrigin::Correction { corrects } => corrects,
            _ => index,
        };
        let base = self.ensure_index(root)?.contribution();
        let deltas: MacroVector = self
            .entries
            .iter()
            .filter(|e| matches!(e.origin, EntryOrigin::Correction { corrects } if corrects == root))
            .map(|e| e.macros)
            .sum();
        Ok((root, base + deltas))
    }
}
