use time::Date;

use super::aggregator::{self, AdherencePolicy, AdherenceReport, AdherenceState, Finalized};
use super::blacklist::Blacklist;
use super::catalog::CatalogRead;
use super::error::{DietError, Missing};
use super::log::{DayLog, EntryTag};
use super::resolver::{RankedCandidate, SubstituteOptions};
use super::template::{TemplateEngine, TemplateLookup};
use super::types::{ItemRef, MacroVector, TemplateId};

/// Tunables of the engine, loaded from configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DietPolicy {
    pub substitutes: SubstituteOptions,
    pub adherence: AdherencePolicy,
}

/// Single entry point for collaborators. Every operation is a pure function of
/// its arguments; callers own persistence and must serialize writes per day,
/// and per user for the adherence state.
pub struct DietEngine<'a, C: CatalogRead + ?Sized> {
    catalog: &'a C,
    blacklist: &'a Blacklist,
    policy: DietPolicy,
}

impl<'a, C: CatalogRead + ?Sized> DietEngine<'a, C> {
    pub fn new(catalog: &'a C, blacklist: &'a Blacklist, policy: DietPolicy) -> Self {
        Self {
            catalog,
            blacklist,
            policy,
        }
    }

    pub fn policy(&self) -> &DietPolicy {
        &self.policy
    }

    fn templates(&self) -> TemplateEngine<'a, C> {
        TemplateEngine::new(self.catalog, self.blacklist, self.policy.substitutes)
    }

    pub fn instantiate_from_template<T: TemplateLookup + ?Sized>(
        &self,
        templates: &T,
        template_id: TemplateId,
        date: Date,
        target: Option<MacroVector>,
    ) -> Result<DayLog, DietError> {
        let template = templates
            .find_template(template_id)
            .ok_or(DietError::NotFound(Missing::Template(template_id)))?;
        self.templates().instantiate(template, date, target)
    }

    /// An empty day for logging without a template.
    pub fn open_day(&self, date: Date, target: MacroVector) -> DayLog {
        DayLog::new(date, target)
    }

    pub fn commit(&self, day: &DayLog) -> Result<DayLog, DietError> {
        let mut day = day.clone();
        day.commit()?;
        Ok(day)
    }

    pub fn swap_entry(
        &self,
        day: &DayLog,
        index: usize,
        replacement: ItemRef,
        quantity: f64,
    ) -> Result<DayLog, DietError> {
        self.templates().swap(day, index, replacement, quantity)
    }

    pub fn add_entry(
        &self,
        day: &DayLog,
        tag: EntryTag,
        item: ItemRef,
        quantity: f64,
    ) -> Result<DayLog, DietError> {
        self.templates().add(day, tag, item, quantity)
    }

    pub fn correct_entry(
        &self,
        day: &DayLog,
        index: usize,
        item: ItemRef,
        quantity: f64,
    ) -> Result<DayLog, DietError> {
        self.templates().correct(day, index, item, quantity)
    }

    /// Empty when nothing in the catalog is within tolerance.
    pub fn resolve_substitutes(
        &self,
        item: ItemRef,
        options: Option<SubstituteOptions>,
    ) -> Result<Vec<RankedCandidate>, DietError> {
        self.templates()
            .substitutes_for(item, options.unwrap_or(self.policy.substitutes))
    }

    pub fn compute_totals(&self, day: &DayLog) -> MacroVector {
        aggregator::totals(day)
    }

    pub fn evaluate_adherence(&self, day: &DayLog) -> AdherenceReport {
        aggregator::evaluate(day, &self.policy.adherence)
    }

    pub fn finalize(&self, day: &DayLog, state: &AdherenceState) -> Result<Finalized, DietError> {
        aggregator::finalize(day, state, &self.policy.adherence)
    }

    pub fn reevaluate(
        &self,
        day: &DayLog,
        state: &AdherenceState,
    ) -> Result<(AdherenceState, AdherenceReport), DietError> {
        aggregator::reevaluate(day, state, &self.policy.adherence)
    }
}
