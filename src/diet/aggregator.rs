use serde::{Deserialize, Serialize};
use time::Date;

use super::error::DietError;
use super::log::DayLog;
use super::types::{Macro, MacroVector};

pub const DEFAULT_ADHERENCE_TOLERANCE: f64 = 0.10;
pub const DEFAULT_MAX_DAILY_XP: u32 = 100;

const EPSILON: f64 = 1e-9;

/// Elementwise sum of the entries' frozen contributions. Never consults the catalog.
pub fn totals(day: &DayLog) -> MacroVector {
    day.entries().iter().map(|e| e.contribution()).sum()
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AdherencePolicy {
    /// Half-width of the on-target band, as a fraction of the target.
    pub tolerance: f64,
    pub max_daily_xp: u32,
}

impl Default for AdherencePolicy {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_ADHERENCE_TOLERANCE,
            max_daily_xp: DEFAULT_MAX_DAILY_XP,
        }
    }
}

/// Ordered best to worst; a day's verdict is the worst of its dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// Within half the band.
    Perfect,
    OnTarget,
    Excess,
    Deficient,
}

impl Verdict {
    pub fn keeps_streak(self) -> bool {
        self <= Verdict::OnTarget
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DimensionReport {
    pub dimension: Macro,
    pub actual: f64,
    pub target: f64,
    /// Signed relative deviation, `(actual - target) / target`.
    pub deviation: f64,
    pub verdict: Verdict,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdherenceReport {
    pub date: Date,
    pub totals: MacroVector,
    pub target: MacroVector,
    pub dimensions: Vec<DimensionReport>,
    pub verdict: Verdict,
    pub xp: u32,
}

fn judge(dimension: Macro, deviation: f64, tolerance: f64) -> Verdict {
    let off = deviation.abs();
    if off <= tolerance / 2.0 + EPSILON {
        Verdict::Perfect
    } else if off <= tolerance + EPSILON {
        Verdict::OnTarget
    } else if deviation < 0.0 {
        Verdict::Deficient
    } else if dimension == Macro::Protein {
        // surplus protein is not held against the day
        Verdict::OnTarget
    } else {
        Verdict::Excess
    }
}

/// Compare totals to the day's target. Dimensions with a zero target are skipped.
pub fn evaluate(day: &DayLog, policy: &AdherencePolicy) -> AdherenceReport {
    let totals = totals(day);
    let target = day.target();

    let dimensions: Vec<DimensionReport> = Macro::ALL
        .iter()
        .filter(|m| target.get(**m) > 0.0)
        .map(|m| {
            let (actual, goal) = (totals.get(*m), target.get(*m));
            let deviation = (actual - goal) / goal;
            DimensionReport {
                dimension: *m,
                actual,
                target: goal,
                deviation,
                verdict: judge(*m, deviation, policy.tolerance),
            }
        })
        .collect();

    let verdict = dimensions
        .iter()
        .map(|d| d.verdict)
        .max()
        .unwrap_or(Verdict::OnTarget);

    AdherenceReport {
        date: day.date(),
        totals,
        target,
        xp: xp_for(&dimensions, policy.max_daily_xp),
        dimensions,
        verdict,
    }
}

/// Closer to target earns more, never above `max`.
fn xp_for(dimensions: &[DimensionReport], max: u32) -> u32 {
    if dimensions.is_empty() {
        return 0;
    }
    let mean_off = dimensions.iter().map(|d| d.deviation.abs()).sum::<f64>() / dimensions.len() as f64;
    let closeness = (1.0 - mean_off).clamp(0.0, 1.0);
    (f64::from(max) * closeness).round() as u32
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DayAward {
    pub date: Date,
    pub verdict: Verdict,
    pub xp: u32,
}

/// Streak and XP for one user. Owned by the caller's persistence layer and
/// only changed through [`finalize`] and [`reevaluate`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdherenceState {
    streak: u32,
    xp: u64,
    awards: Vec<DayAward>,
}

impl AdherenceState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn streak(&self) -> u32 {
        self.streak
    }

    pub fn xp(&self) -> u64 {
        self.xp
    }

    /// Finalized days, ordered by date.
    pub fn awards(&self) -> &[DayAward] {
        &self.awards
    }

    fn record(&mut self, report: &AdherenceReport) {
        let award = DayAward {
            date: report.date,
            verdict: report.verdict,
            xp: report.xp,
        };
        match self.awards.binary_search_by_key(&award.date, |a| a.date) {
            Ok(i) => self.awards[i] = award,
            Err(i) => self.awards.insert(i, award),
        }
        self.rederive(report.date);
    }

    /// The streak is the run of consecutive calendar days, each on target or
    /// better, that contains the day just scored. It is zero when that day
    /// missed, whatever later days scored.
    fn rederive(&mut self, scored: Date) {
        self.xp = self.awards.iter().map(|a| u64::from(a.xp)).sum();

        let awards = &self.awards;
        let good = |i: usize| awards[i].verdict.keeps_streak();
        let adjacent = |a: usize, b: usize| awards[a].date.next_day() == Some(awards[b].date);

        self.streak = match awards.binary_search_by_key(&scored, |a| a.date) {
            Ok(at) if good(at) => {
                let mut start = at;
                while start > 0 && good(start - 1) && adjacent(start - 1, start) {
                    start -= 1;
                }
                let mut end = at;
                while end + 1 < awards.len() && good(end + 1) && adjacent(end, end + 1) {
                    end += 1;
                }
                u32::try_from(end - start + 1).unwrap_or(u32::MAX)
            }
            _ => 0,
        };
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Finalized {
    pub day: DayLog,
    pub state: AdherenceState,
    pub report: AdherenceReport,
}

/// Close a day and fold its verdict into the adherence state.
/// Nothing is changed when the day is already finalized.
pub fn finalize(
    day: &DayLog,
    state: &AdherenceState,
    policy: &AdherencePolicy,
) -> Result<Finalized, DietError> {
    let mut day = day.clone();
    day.finalize()?;
    let report = evaluate(&day, policy);
    let mut state = state.clone();
    state.record(&report);
    Ok(Finalized { day, state, report })
}

/// Re-score a finalized day, typically after a correction entry was appended.
pub fn reevaluate(
    day: &DayLog,
    state: &AdherenceState,
    policy: &AdherencePolicy,
) -> Result<(AdherenceState, AdherenceReport), DietError> {
    if !day.is_finalized() {
        return Err(DietError::NotFinalized(day.date()));
    }
    let report = evaluate(day, policy);
    let mut state = state.clone();
    state.record(&report);
    Ok((state, report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diet::catalog::fixtures::*;
    use crate::diet::log::{EntryOrigin, EntryTag, LogEntry};
    use crate::diet::types::{ItemRef, Quantity};
    use time::macros::date;

    fn entry(macros: MacroVector, origin: EntryOrigin) -> LogEntry {
        LogEntry {
            tag: EntryTag::Free {
                label: "meal".into(),
            },
            item: ItemRef::Food(fid(1)),
            name: "Food".into(),
            quantity: Quantity::new(1.0).unwrap(),
            macros,
            origin,
        }
    }

    fn day_with(date: Date, target: MacroVector, entries: &[(MacroVector, EntryOrigin)]) -> DayLog {
        let mut day = DayLog::new(date, target);
        for (m, o) in entries {
            day.push_planned(entry(*m, *o));
        }
        day
    }

    fn calories(c: f64) -> MacroVector {
        MacroVector::new(c, 0.0, 0.0, 0.0)
    }

    #[test]
    fn totals_skip_unresolved_entries() {
        let day = day_with(
            date!(2024 - 05 - 01),
            calories(2000.0),
            &[
                (MacroVector::new(500.0, 30.0, 60.0, 10.0), EntryOrigin::Planned),
                (MacroVector::new(700.0, 40.0, 50.0, 20.0), EntryOrigin::Unresolved),
                (MacroVector::new(300.0, 10.0, 40.0, 5.0), EntryOrigin::Manual),
            ],
        );
        assert_eq!(totals(&day), MacroVector::new(800.0, 40.0, 100.0, 15.0));
    }

    #[test]
    fn lower_band_edge_is_on_target() {
        let day = day_with(
            date!(2024 - 05 - 01),
            calories(2000.0),
            &[(calories(1800.0), EntryOrigin::Planned)],
        );
        let report = evaluate(&day, &AdherencePolicy::default());
        assert_eq!(report.dimensions.len(), 1);
        assert_eq!(report.dimensions[0].verdict, Verdict::OnTarget);
        assert_eq!(report.verdict, Verdict::OnTarget);
    }

    #[test]
    fn verdict_is_worst_dimension() {
        let target = MacroVector::new(2000.0, 100.0, 250.0, 60.0);
        let day = day_with(
            date!(2024 - 05 - 01),
            target,
            &[(MacroVector::new(2000.0, 70.0, 250.0, 60.0), EntryOrigin::Planned)],
        );
        let report = evaluate(&day, &AdherencePolicy::default());
        assert_eq!(report.verdict, Verdict::Deficient);

        let day = day_with(
            date!(2024 - 05 - 01),
            target,
            &[(MacroVector::new(2000.0, 150.0, 250.0, 60.0), EntryOrigin::Planned)],
        );
        assert_eq!(evaluate(&day, &AdherencePolicy::default()).verdict, Verdict::OnTarget);

        let day = day_with(
            date!(2024 - 05 - 01),
            target,
            &[(MacroVector::new(2600.0, 100.0, 250.0, 60.0), EntryOrigin::Planned)],
        );
        assert_eq!(evaluate(&day, &AdherencePolicy::default()).verdict, Verdict::Excess);
    }

    #[test]
    fn xp_grows_as_totals_approach_target() {
        let policy = AdherencePolicy::default();
        let xp_at = |c: f64| {
            evaluate(
                &day_with(date!(2024 - 05 - 01), calories(2000.0), &[(calories(c), EntryOrigin::Planned)]),
                &policy,
            )
            .xp
        };
        assert_eq!(xp_at(2000.0), 100);
        assert!(xp_at(1900.0) > xp_at(1500.0));
        assert!(xp_at(1500.0) > xp_at(1000.0));
        assert_eq!(xp_at(0.0), 0);
        assert_eq!(xp_at(6000.0), 0);
    }

    #[test]
    fn finalize_extends_streak_on_consecutive_good_days() {
        let policy = AdherencePolicy::default();
        let mut state = AdherenceState::new();
        for d in [date!(2024 - 05 - 01), date!(2024 - 05 - 02), date!(2024 - 05 - 03)] {
            let day = day_with(d, calories(2000.0), &[(calories(2000.0), EntryOrigin::Planned)]);
            state = finalize(&day, &state, &policy).unwrap().state;
        }
        assert_eq!(state.streak(), 3);
        assert_eq!(state.xp(), 300);

        let bad = day_with(date!(2024 - 05 - 04), calories(2000.0), &[(calories(900.0), EntryOrigin::Planned)]);
        let done = finalize(&bad, &state, &policy).unwrap();
        assert_eq!(done.report.verdict, Verdict::Deficient);
        assert_eq!(done.state.streak(), 0);
    }

    #[test]
    fn calendar_gap_restarts_streak() {
        let policy = AdherencePolicy::default();
        let mut state = AdherenceState::new();
        for d in [date!(2024 - 05 - 01), date!(2024 - 05 - 02), date!(2024 - 05 - 05)] {
            let day = day_with(d, calories(2000.0), &[(calories(2000.0), EntryOrigin::Planned)]);
            state = finalize(&day, &state, &policy).unwrap().state;
        }
        assert_eq!(state.streak(), 1);
    }

    #[test]
    fn late_finalized_day_sets_the_streak() {
        let policy = AdherencePolicy::default();
        let good = day_with(date!(2024 - 05 - 02), calories(2000.0), &[(calories(2000.0), EntryOrigin::Planned)]);
        let state = finalize(&good, &AdherenceState::new(), &policy).unwrap().state;
        assert_eq!(state.streak(), 1);

        let missed = day_with(date!(2024 - 05 - 01), calories(2000.0), &[(calories(400.0), EntryOrigin::Planned)]);
        let done = finalize(&missed, &state, &policy).unwrap();
        assert_eq!(done.report.verdict, Verdict::Deficient);
        assert_eq!(done.state.streak(), 0);

        let filled = day_with(date!(2024 - 05 - 01), calories(2000.0), &[(calories(2000.0), EntryOrigin::Planned)]);
        let done = finalize(&filled, &state, &policy).unwrap();
        assert_eq!(done.state.streak(), 2);
        assert_eq!(done.state.xp(), 200);
    }

    #[test]
    fn finalizing_twice_fails_without_touching_state() {
        let policy = AdherencePolicy::default();
        let day = day_with(date!(2024 - 05 - 01), calories(2000.0), &[(calories(2000.0), EntryOrigin::Planned)]);
        let done = finalize(&day, &AdherenceState::new(), &policy).unwrap();
        assert!(done.day.is_finalized());
        assert_eq!(
            finalize(&done.day, &done.state, &policy).unwrap_err(),
            DietError::AlreadyFinalized(date!(2024 - 05 - 01))
        );
        assert_eq!(done.state.awards().len(), 1);
    }

    #[test]
    fn reevaluate_replaces_the_award_for_that_day() {
        let policy = AdherencePolicy::default();
        let day = day_with(date!(2024 - 05 - 01), calories(2000.0), &[(calories(1000.0), EntryOrigin::Planned)]);
        let done = finalize(&day, &AdherenceState::new(), &policy).unwrap();
        assert_eq!(done.state.streak(), 0);

        let mut corrected = done.day.clone();
        corrected
            .push_correction(entry(calories(1000.0), EntryOrigin::Correction { corrects: 0 }))
            .unwrap();
        let (state, report) = reevaluate(&corrected, &done.state, &policy).unwrap();
        assert_eq!(report.verdict, Verdict::Perfect);
        assert_eq!(state.streak(), 1);
        assert_eq!(state.xp(), 100);
        assert_eq!(state.awards().len(), 1);

        assert!(matches!(
            reevaluate(&day, &state, &policy),
            Err(DietError::NotFinalized(_))
        ));
    }
}
