//! Property tests for the diet engine's invariants.

use dietplan::diet::resolver::rank_substitutes;
use dietplan::diet::{
    AdherenceState, Blacklist, BlacklistEntry, Catalog, CatalogRead, Category, DietEngine,
    DietError, DietPolicy, EntryTag, Food, FoodId, IngredientLine, ItemRef, MacroVector,
    MealSlot, MealTime, Quantity, RecipeId, RecipeSpec, SubstituteQuery, Template, TemplateId,
};
use proptest::collection::vec;
use proptest::prelude::*;
use time::macros::{date, datetime};
use uuid::Uuid;

const CATEGORIES: [Category; 4] = [
    Category::Grain,
    Category::Protein,
    Category::Dairy,
    Category::Legume,
];

fn macros() -> impl Strategy<Value = MacroVector> {
    (1.0f64..800.0, 0.0f64..60.0, 0.0f64..100.0, 0.0f64..50.0)
        .prop_map(|(c, p, cb, f)| MacroVector::new(c, p, cb, f))
}

fn catalog_strategy() -> impl Strategy<Value = Catalog> {
    vec((0usize..CATEGORIES.len(), macros()), 2..30).prop_map(|foods| {
        let mut catalog = Catalog::new();
        for (i, (cat, m)) in foods.into_iter().enumerate() {
            catalog
                .upsert_food(Food {
                    id: fid(i),
                    name: format!("food-{i}"),
                    category: CATEGORIES[cat],
                    macros: m,
                    unit: "100g".into(),
                    tags: Vec::new(),
                })
                .unwrap();
        }
        catalog
    })
}

fn fid(n: usize) -> FoodId {
    FoodId(Uuid::from_u128(n as u128 + 1))
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-6 * a.abs().max(b.abs()).max(1.0)
}

fn template_over(catalog: &Catalog) -> Template {
    Template {
        id: TemplateId(Uuid::from_u128(1)),
        name: "generated".into(),
        slots: catalog
            .foods()
            .iter()
            .take(4)
            .map(|f| MealSlot {
                time: MealTime::Lunch,
                item: ItemRef::Food(f.id),
                quantity: Quantity::new(1.5).unwrap(),
            })
            .collect(),
        target: Some(MacroVector::new(2000.0, 120.0, 250.0, 70.0)),
    }
}

fn blacklist_of(ids: &[FoodId]) -> Blacklist {
    Blacklist::from_entries(
        ids.iter()
            .map(|id| BlacklistEntry::new(*id, None, datetime!(2024-05-01 0:00 UTC))),
    )
}

proptest! {
    /// Scaling by a sum equals the sum of the scaled parts.
    #[test]
    fn macros_of_is_linear(catalog in catalog_strategy(), q1 in 0.1f64..10.0, q2 in 0.1f64..10.0) {
        let item = ItemRef::Food(fid(0));
        let whole = catalog.macros_of(item, q1 + q2).unwrap();
        let parts = catalog.macros_of(item, q1).unwrap() + catalog.macros_of(item, q2).unwrap();
        prop_assert!(close(whole.calories, parts.calories));
        prop_assert!(close(whole.protein_g, parts.protein_g));
        prop_assert!(close(whole.carbs_g, parts.carbs_g));
        prop_assert!(close(whole.fat_g, parts.fat_g));
    }

    /// A recipe built from catalog foods scales the same way.
    #[test]
    fn recipe_macros_are_linear(
        catalog in catalog_strategy(),
        lines in vec((0usize..30, 0.1f64..5.0), 1..6),
        q in 0.1f64..10.0,
    ) {
        let mut catalog = catalog;
        let count = catalog.foods().len();
        let id = RecipeId(Uuid::from_u128(1000));
        catalog
            .upsert_recipe(RecipeSpec {
                id,
                name: "generated".into(),
                ingredients: lines
                    .iter()
                    .map(|(n, qty)| IngredientLine {
                        food: fid(n % count),
                        quantity: Quantity::new(*qty).unwrap(),
                    })
                    .collect(),
            })
            .unwrap();

        let item = ItemRef::Recipe(id);
        let once = catalog.macros_of(item, q).unwrap();
        let twice = catalog.macros_of(item, 2.0 * q).unwrap();
        prop_assert!(close(twice.calories, 2.0 * once.calories));
        prop_assert!(close(twice.protein_g, 2.0 * once.protein_g));
        prop_assert!(close(twice.carbs_g, 2.0 * once.carbs_g));
        prop_assert!(close(twice.fat_g, 2.0 * once.fat_g));
    }

    /// Results skip excluded foods, respect the calorie band, and come out ordered.
    #[test]
    fn resolver_output_is_filtered_and_ordered(
        catalog in catalog_strategy(),
        source in macros(),
        excluded in vec(0usize..30, 0..10),
        tolerance in 0.05f64..0.5,
        top_k in 1usize..10,
    ) {
        let mut query = SubstituteQuery::new(source, Some(Category::Protein));
        query.exclude = excluded.iter().map(|n| fid(*n)).collect();
        query.tolerance = tolerance;
        query.top_k = top_k;

        let ranked = rank_substitutes(&catalog, &query);
        prop_assert!(ranked.len() <= top_k);
        for r in &ranked {
            prop_assert!(!query.exclude.contains(&r.food));
            let diff = (r.macros.calories - source.calories).abs() / source.calories.max(1.0);
            prop_assert!(diff <= tolerance + 1e-9);
        }
        for pair in ranked.windows(2) {
            prop_assert_eq!(pair[0].same_category, pair[1].same_category);
            prop_assert!(
                pair[0].score < pair[1].score
                    || (pair[0].score == pair[1].score && pair[0].food < pair[1].food)
            );
        }
    }

    /// Same template, date, catalog and blacklist give the same draft.
    #[test]
    fn instantiate_is_deterministic(catalog in catalog_strategy(), blocked in vec(0usize..6, 0..3)) {
        let blocked: Vec<FoodId> = blocked.iter().map(|n| fid(*n)).collect();
        let blacklist = blacklist_of(&blocked);
        let templates = [template_over(&catalog)];
        let engine = DietEngine::new(&catalog, &blacklist, DietPolicy::default());

        let first = engine
            .instantiate_from_template(&templates[..], templates[0].id, date!(2024 - 05 - 01), None)
            .unwrap();
        let second = engine
            .instantiate_from_template(&templates[..], templates[0].id, date!(2024 - 05 - 01), None)
            .unwrap();
        prop_assert_eq!(&first, &second);

        for entry in first.entries() {
            if let ItemRef::Food(id) = entry.item {
                prop_assert!(entry.is_unresolved() || !blacklist.is_blacklisted(id));
            }
        }
    }

    /// Entries keep the macros they were logged with.
    #[test]
    fn totals_survive_catalog_edits(catalog in catalog_strategy(), edited in macros()) {
        let mut catalog = catalog;
        let blacklist = Blacklist::new();
        let templates = [template_over(&catalog)];
        let (day, before) = {
            let engine = DietEngine::new(&catalog, &blacklist, DietPolicy::default());
            let day = engine
                .instantiate_from_template(&templates[..], templates[0].id, date!(2024 - 05 - 01), None)
                .unwrap();
            let before = engine.compute_totals(&day);
            (day, before)
        };

        let mut food = catalog.get_food(fid(0)).unwrap().clone();
        food.macros = edited;
        catalog.upsert_food(food).unwrap();

        let engine = DietEngine::new(&catalog, &blacklist, DietPolicy::default());
        prop_assert_eq!(engine.compute_totals(&day), before);
    }

    /// A finalized day rejects further edits.
    #[test]
    fn finalized_days_are_immutable(catalog in catalog_strategy(), q in 0.1f64..5.0) {
        let blacklist = Blacklist::new();
        let engine = DietEngine::new(&catalog, &blacklist, DietPolicy::default());
        let templates = [template_over(&catalog)];
        let day = engine
            .instantiate_from_template(&templates[..], templates[0].id, date!(2024 - 05 - 01), None)
            .unwrap();
        let done = engine.finalize(&day, &AdherenceState::new()).unwrap();

        let err = engine.swap_entry(&done.day, 0, ItemRef::Food(fid(1)), q).unwrap_err();
        prop_assert_eq!(err, DietError::AlreadyFinalized(date!(2024 - 05 - 01)));
        let err = engine.finalize(&done.day, &done.state).unwrap_err();
        prop_assert_eq!(err, DietError::AlreadyFinalized(date!(2024 - 05 - 01)));
    }

    /// Consecutive days that hit their target build a streak of the same length.
    #[test]
    fn streak_counts_consecutive_on_target_days(days in 1usize..15) {
        let mut catalog = Catalog::new();
        catalog
            .upsert_food(Food {
                id: fid(0),
                name: "Dal".into(),
                category: Category::Legume,
                macros: MacroVector::new(500.0, 30.0, 60.0, 10.0),
                unit: "bowl".into(),
                tags: Vec::new(),
            })
            .unwrap();
        let blacklist = Blacklist::new();
        let engine = DietEngine::new(&catalog, &blacklist, DietPolicy::default());

        let mut state = AdherenceState::new();
        let mut date = date!(2024 - 05 - 01);
        for _ in 0..days {
            let day = engine.open_day(date, MacroVector::new(1000.0, 60.0, 120.0, 20.0));
            let tag = EntryTag::Free { label: "meals".into() };
            let day = engine.add_entry(&day, tag, ItemRef::Food(fid(0)), 2.0).unwrap();
            state = engine.finalize(&day, &state).unwrap().state;
            date = date.next_day().unwrap();
        }
        prop_assert_eq!(state.streak() as usize, days);
        prop_assert_eq!(state.xp(), 100 * days as u64);
    }
}
