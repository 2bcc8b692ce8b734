use time::OffsetDateTime;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::diet::{
    Blacklist, BlacklistEntry, CatalogRead, DietEngine, DietError, FoodId, ItemRef, Missing,
    RankedCandidate, RecipeId, SubstituteOptions,
};
use crate::errors::ServiceError;
use crate::state::AppState;

/// Parses the `:kind/:id` pair of the substitutes route.
pub fn item_ref(kind: &str, id: Uuid) -> Result<ItemRef, ServiceError> {
    match kind {
        "food" => Ok(ItemRef::Food(FoodId(id))),
        "recipe" => Ok(ItemRef::Recipe(RecipeId(id))),
        other => Err(ServiceError::Invalid(format!(
            "unknown item kind {other:?}, expected \"food\" or \"recipe\""
        ))),
    }
}

pub fn substitute_options(
    defaults: SubstituteOptions,
    tolerance: Option<f64>,
    top_k: Option<usize>,
) -> Result<SubstituteOptions, ServiceError> {
    let options = SubstituteOptions {
        tolerance: tolerance.unwrap_or(defaults.tolerance),
        top_k: top_k.unwrap_or(defaults.top_k),
    };
    if !options.tolerance.is_finite() || options.tolerance <= 0.0 {
        return Err(ServiceError::Invalid(format!(
            "tolerance must be positive, got {}",
            options.tolerance
        )));
    }
    if options.top_k == 0 {
        return Err(ServiceError::Invalid("top_k must be positive".into()));
    }
    Ok(options)
}

#[instrument(skip(state))]
pub async fn substitutes(
    state: &AppState,
    user: Uuid,
    item: ItemRef,
    options: SubstituteOptions,
) -> Result<Vec<RankedCandidate>, ServiceError> {
    let blacklist = state.store.get_blacklist(user).await?;
    let catalog = state.catalog.read().await;
    let engine = DietEngine::new(&*catalog, &blacklist, state.policy());
    Ok(engine.resolve_substitutes(item, Some(options))?)
}

/// Returns the updated list and whether anything was added.
#[instrument(skip(state, reason))]
pub async fn blacklist_food(
    state: &AppState,
    user: Uuid,
    food: FoodId,
    reason: Option<String>,
) -> Result<(Blacklist, bool), ServiceError> {
    state.catalog.read().await.get_food(food)?;

    let _guard = state.user_locks.acquire(user).await;
    let mut blacklist = state.store.get_blacklist(user).await?;
    let added = blacklist.add(BlacklistEntry::new(food, reason, OffsetDateTime::now_utc()));
    if added {
        state.store.save_blacklist(user, &blacklist).await?;
        info!(%user, %food, "food blacklisted");
    }
    Ok((blacklist, added))
}

#[instrument(skip(state))]
pub async fn unblacklist_food(
    state: &AppState,
    user: Uuid,
    food: FoodId,
) -> Result<Blacklist, ServiceError> {
    let _guard = state.user_locks.acquire(user).await;
    let mut blacklist = state.store.get_blacklist(user).await?;
    if blacklist.remove(food) == 0 {
        return Err(DietError::NotFound(Missing::Food(food)).into());
    }
    state.store.save_blacklist(user, &blacklist).await?;
    info!(%user, %food, "food removed from blacklist");
    Ok(blacklist)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::diet::catalog::fixtures::{fid, food};
    use crate::diet::{Catalog, Category, MacroVector};
    use crate::store::testing::SlowStore;

    fn slow_state() -> AppState {
        let mut catalog = Catalog::new();
        for (n, name) in [(1, "Egg"), (2, "Paneer")] {
            catalog
                .upsert_food(food(n, name, Category::Protein, MacroVector::new(150.0, 12.0, 1.0, 10.0)))
                .unwrap();
        }
        AppState {
            store: Arc::new(SlowStore::default()),
            ..AppState::in_memory(catalog)
        }
    }

    #[test]
    fn item_kind_is_validated() {
        let id = Uuid::from_u128(7);
        assert_eq!(item_ref("food", id).unwrap(), ItemRef::Food(FoodId(id)));
        assert!(matches!(item_ref("meal", id), Err(ServiceError::Invalid(_))));
    }

    #[test]
    fn query_overrides_fall_back_to_policy() {
        let defaults = SubstituteOptions::default();
        let merged = substitute_options(defaults, None, Some(2)).unwrap();
        assert_eq!(merged.tolerance, defaults.tolerance);
        assert_eq!(merged.top_k, 2);
        assert!(substitute_options(defaults, Some(-0.1), None).is_err());
        assert!(substitute_options(defaults, None, Some(0)).is_err());
    }

    #[tokio::test]
    async fn concurrent_blacklist_writes_are_not_lost() {
        let state = slow_state();
        let user = Uuid::new_v4();

        let (egg, paneer) = tokio::join!(
            blacklist_food(&state, user, fid(1), None),
            blacklist_food(&state, user, fid(2), Some("lactose".into())),
        );
        assert!(egg.unwrap().1);
        assert!(paneer.unwrap().1);
        let stored = state.store.get_blacklist(user).await.unwrap();
        assert!(stored.is_blacklisted(fid(1)));
        assert!(stored.is_blacklisted(fid(2)));

        let (removed, added) = tokio::join!(
            unblacklist_food(&state, user, fid(1)),
            blacklist_food(&state, user, fid(1), Some("again".into())),
        );
        removed.unwrap();
        added.unwrap();
        let stored = state.store.get_blacklist(user).await.unwrap();
        assert_eq!(stored.entries().len(), 2);
        assert_eq!(stored.reasons_for(fid(1)), vec!["again"]);
    }
}
