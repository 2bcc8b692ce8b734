use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use time::{format_description::FormatItem, macros::format_description, Date};

use crate::diet::{aggregator, AdherenceReport, DayLog, ItemRef, MacroVector, TemplateId};

const DATE_FORMAT: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// Path dates are plain `YYYY-MM-DD`.
pub fn parse_date(raw: &str) -> Result<Date, (StatusCode, String)> {
    Date::parse(raw.trim(), DATE_FORMAT)
        .map_err(|_| (StatusCode::BAD_REQUEST, format!("invalid date {raw:?}, expected YYYY-MM-DD")))
}

#[derive(Debug, Deserialize)]
pub struct InstantiateRequest {
    pub template_id: TemplateId,
    /// Overrides the template's own target.
    pub target: Option<MacroVector>,
}

#[derive(Debug, Deserialize)]
pub struct AddEntryRequest {
    pub label: String,
    pub item: ItemRef,
    pub quantity: f64,
    /// Opens the day when nothing was instantiated for it yet.
    pub target: Option<MacroVector>,
}

#[derive(Debug, Deserialize)]
pub struct SwapEntryRequest {
    pub item: ItemRef,
    pub quantity: f64,
}

#[derive(Debug, Deserialize)]
pub struct CorrectionRequest {
    pub index: usize,
    pub item: ItemRef,
    pub quantity: f64,
}

#[derive(Debug, Serialize)]
pub struct DayView {
    #[serde(flatten)]
    pub day: DayLog,
    pub totals: MacroVector,
    pub unresolved: Vec<usize>,
}

impl From<DayLog> for DayView {
    fn from(day: DayLog) -> Self {
        Self {
            totals: aggregator::totals(&day),
            unresolved: day.unresolved(),
            day,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FinalizedView {
    pub day: DayView,
    pub report: AdherenceReport,
    pub streak: u32,
    pub xp: u64,
}
