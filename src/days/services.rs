//! Day-log orchestration: every mutation loads the day under its
//! (user, date) lock, runs the engine, and persists the result before
//! the lock is released. Finalize and correct also hold the user lock
//! from reading the adherence state until it is saved.

use time::Date;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::diet::{
    AdherenceReport, AdherenceState, DayLog, DayStatus, DietEngine, DietError, EntryTag,
    Finalized, ItemRef, MacroVector, Missing, TemplateId,
};
use crate::errors::ServiceError;
use crate::state::AppState;

async fn load_day(state: &AppState, user: Uuid, date: Date) -> Result<DayLog, ServiceError> {
    state
        .store
        .get_day(user, date)
        .await?
        .ok_or(ServiceError::Diet(DietError::NotFound(Missing::DayLog(date))))
}

#[instrument(skip(state))]
pub async fn get_day(state: &AppState, user: Uuid, date: Date) -> Result<DayLog, ServiceError> {
    load_day(state, user, date).await
}

/// Build (or rebuild) the day's draft from a stored template. Only drafts
/// may be rebuilt; once the day is committed it belongs to the user.
#[instrument(skip(state))]
pub async fn instantiate(
    state: &AppState,
    user: Uuid,
    date: Date,
    template_id: TemplateId,
    target: Option<MacroVector>,
) -> Result<DayLog, ServiceError> {
    let _guard = state.day_locks.acquire((user, date)).await;

    if let Some(existing) = state.store.get_day(user, date).await? {
        match existing.status() {
            DayStatus::Draft => {}
            DayStatus::Active => {
                warn!(%user, %date, "day already committed");
                return Err(ServiceError::Conflict(format!(
                    "day log for {date} is already active"
                )));
            }
            DayStatus::Finalized => return Err(DietError::AlreadyFinalized(date).into()),
        }
    }

    let template = state
        .store
        .get_template(user, template_id)
        .await?
        .ok_or(DietError::NotFound(Missing::Template(template_id)))?;
    let blacklist = state.store.get_blacklist(user).await?;

    let day = {
        let catalog = state.catalog.read().await;
        let engine = DietEngine::new(&*catalog, &blacklist, state.policy());
        engine.instantiate_from_template(std::slice::from_ref(&template), template_id, date, target)?
    };

    state.store.save_day(user, &day).await?;
    let unresolved = day.unresolved();
    if unresolved.is_empty() {
        info!(%user, %date, template = %template_id, entries = day.entries().len(), "day instantiated");
    } else {
        warn!(%user, %date, template = %template_id, ?unresolved, "day instantiated with unresolved slots");
    }
    Ok(day)
}

#[instrument(skip(state))]
pub async fn commit(state: &AppState, user: Uuid, date: Date) -> Result<DayLog, ServiceError> {
    let _guard = state.day_locks.acquire((user, date)).await;
    let day = load_day(state, user, date).await?;
    let blacklist = state.store.get_blacklist(user).await?;

    let day = {
        let catalog = state.catalog.read().await;
        DietEngine::new(&*catalog, &blacklist, state.policy()).commit(&day)?
    };

    state.store.save_day(user, &day).await?;
    info!(%user, %date, "day committed");
    Ok(day)
}

/// Log a free-form entry; the day is opened on first use when a target is given.
#[instrument(skip(state))]
pub async fn add_entry(
    state: &AppState,
    user: Uuid,
    date: Date,
    label: String,
    item: ItemRef,
    quantity: f64,
    target: Option<MacroVector>,
) -> Result<DayLog, ServiceError> {
    let _guard = state.day_locks.acquire((user, date)).await;
    let existing = state.store.get_day(user, date).await?;
    let blacklist = state.store.get_blacklist(user).await?;

    let day = {
        let catalog = state.catalog.read().await;
        let engine = DietEngine::new(&*catalog, &blacklist, state.policy());
        let day = match (existing, target) {
            (Some(day), _) => day,
            (None, Some(target)) => engine.open_day(date, target),
            (None, None) => return Err(DietError::NotFound(Missing::DayLog(date)).into()),
        };
        engine.add_entry(&day, EntryTag::Free { label }, item, quantity)?
    };

    state.store.save_day(user, &day).await?;
    info!(%user, %date, %item, quantity, "entry added");
    Ok(day)
}

#[instrument(skip(state))]
pub async fn swap_entry(
    state: &AppState,
    user: Uuid,
    date: Date,
    index: usize,
    item: ItemRef,
    quantity: f64,
) -> Result<DayLog, ServiceError> {
    let _guard = state.day_locks.acquire((user, date)).await;
    let day = load_day(state, user, date).await?;
    let blacklist = state.store.get_blacklist(user).await?;

    let day = {
        let catalog = state.catalog.read().await;
        DietEngine::new(&*catalog, &blacklist, state.policy())
            .swap_entry(&day, index, item, quantity)?
    };

    state.store.save_day(user, &day).await?;
    info!(%user, %date, index, %item, "entry swapped");
    Ok(day)
}

/// Append a correction to a finalized day and re-score it.
#[instrument(skip(state))]
pub async fn correct_entry(
    state: &AppState,
    user: Uuid,
    date: Date,
    index: usize,
    item: ItemRef,
    quantity: f64,
) -> Result<Finalized, ServiceError> {
    let _guard = state.day_locks.acquire((user, date)).await;
    let day = load_day(state, user, date).await?;
    let blacklist = state.store.get_blacklist(user).await?;
    let _user_guard = state.user_locks.acquire(user).await;
    let adherence = state.store.get_adherence(user).await?;

    let (day, adherence, report) = {
        let catalog = state.catalog.read().await;
        let engine = DietEngine::new(&*catalog, &blacklist, state.policy());
        let day = engine.correct_entry(&day, index, item, quantity)?;
        let (adherence, report) = engine.reevaluate(&day, &adherence)?;
        (day, adherence, report)
    };

    state.store.save_finalized(user, &day, &adherence).await?;
    info!(%user, %date, index, verdict = ?report.verdict, xp = report.xp, "correction applied");
    Ok(Finalized {
        day,
        state: adherence,
        report,
    })
}

#[instrument(skip(state))]
pub async fn finalize(state: &AppState, user: Uuid, date: Date) -> Result<Finalized, ServiceError> {
    let _guard = state.day_locks.acquire((user, date)).await;
    let day = load_day(state, user, date).await?;
    let blacklist = state.store.get_blacklist(user).await?;
    let _user_guard = state.user_locks.acquire(user).await;
    let adherence = state.store.get_adherence(user).await?;

    let done = {
        let catalog = state.catalog.read().await;
        DietEngine::new(&*catalog, &blacklist, state.policy()).finalize(&day, &adherence)?
    };

    state
        .store
        .save_finalized(user, &done.day, &done.state)
        .await?;
    info!(
        %user,
        %date,
        verdict = ?done.report.verdict,
        xp = done.report.xp,
        streak = done.state.streak(),
        "day finalized"
    );
    Ok(done)
}

/// Score a day without closing it.
#[instrument(skip(state))]
pub async fn preview_report(
    state: &AppState,
    user: Uuid,
    date: Date,
) -> Result<AdherenceReport, ServiceError> {
    let day = load_day(state, user, date).await?;
    let blacklist = state.store.get_blacklist(user).await?;
    let catalog = state.catalog.read().await;
    Ok(DietEngine::new(&*catalog, &blacklist, state.policy()).evaluate_adherence(&day))
}

#[instrument(skip(state))]
pub async fn adherence(state: &AppState, user: Uuid) -> Result<AdherenceState, ServiceError> {
    Ok(state.store.get_adherence(user).await?)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::diet::catalog::fixtures::{fid, food};
    use crate::diet::{Catalog, Category};
    use crate::store::testing::SlowStore;
    use time::macros::date;

    fn slow_state() -> AppState {
        let mut catalog = Catalog::new();
        catalog
            .upsert_food(food(1, "Dal", Category::Legume, MacroVector::new(500.0, 30.0, 60.0, 10.0)))
            .unwrap();
        AppState {
            store: Arc::new(SlowStore::default()),
            ..AppState::in_memory(catalog)
        }
    }

    #[tokio::test]
    async fn concurrent_finalizes_keep_every_award() {
        let state = slow_state();
        let user = Uuid::new_v4();
        let target = MacroVector::new(1000.0, 60.0, 120.0, 20.0);
        for date in [date!(2024 - 05 - 01), date!(2024 - 05 - 02)] {
            add_entry(&state, user, date, "meals".into(), ItemRef::Food(fid(1)), 2.0, Some(target))
                .await
                .unwrap();
        }

        let (first, second) = tokio::join!(
            finalize(&state, user, date!(2024 - 05 - 01)),
            finalize(&state, user, date!(2024 - 05 - 02)),
        );
        first.unwrap();
        second.unwrap();

        let stored = adherence(&state, user).await.unwrap();
        assert_eq!(stored.awards().len(), 2);
        assert_eq!(stored.xp(), 200);
        assert_eq!(stored.streak(), 2);
    }
}
