//! Property tests for the controller invariants.

use adaptive_core::{
    apply_logarithmic_scaling, AdaptiveEngine, ChurnMarkers, ChurnRiskAnalysis,
    ContentStrategy, ContentVarietyOptimizer, DifficultyController, EngineConfig,
    RewardScheduler,
};
use chrono::{Duration, TimeZone, Utc};
use player_model::{
    ActionType, ContentCategory, ContentExposureTable, DifficultyState, InMemoryRepository,
    PlayerAction, PlayerId, PlayerRepository,
};
use proptest::prelude::*;

fn action_type(code: u8) -> ActionType {
    match code % 9 {
        0 => ActionType::Combat,
        1 => ActionType::Exploration,
        2 => ActionType::Dialogue,
        3 => ActionType::Puzzle,
        4 => ActionType::Crafting,
        5 => ActionType::Quest,
        6 => ActionType::Trade,
        7 => ActionType::SessionStart,
        _ => ActionType::SessionEnd,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_adjustment_stays_in_band(base in 1.0f32..1000.0, measured in 0.0001f32..2.0) {
        let controller = DifficultyController::with_defaults();
        let state = DifficultyState::new(base);

        let adjusted = controller.calculate_difficulty_adjustment(&state, measured);
        prop_assert!((adjusted - base).abs() <= base * 0.15 * (1.0 + 1e-5));
    }

    #[test]
    fn prop_smoothing_extremes(current in 1.0f32..100.0, target in 1.0f32..100.0) {
        let controller = DifficultyController::with_defaults();
        let mut state = DifficultyState::new(50.0);
        state.current_difficulty = current;

        prop_assert_eq!(controller.apply_statistical_smoothing(&state, target, 1.0), current);
        prop_assert_eq!(controller.apply_statistical_smoothing(&state, target, 0.0), target);
    }

    #[test]
    fn prop_rare_probability_bounded_and_monotone(n in 0u32..10_000) {
        let scheduler = RewardScheduler::with_defaults();
        let p = scheduler.calculate_rare_reward_probability(n);
        let next = scheduler.calculate_rare_reward_probability(n + 1);

        prop_assert!(p >= 0.0 && p < 0.05);
        prop_assert!(next >= p);
    }

    #[test]
    fn prop_log_scaling_monotone(a in 0.01f32..1000.0, b in 0.01f32..1000.0) {
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(
            apply_logarithmic_scaling(low, 0.5, 0.01) <= apply_logarithmic_scaling(high, 0.5, 0.01)
        );
    }

    #[test]
    fn prop_novelty_strictly_decreasing(exposure in 0.0f32..100.0, amount in 0.1f32..10.0) {
        let optimizer = ContentVarietyOptimizer::with_defaults();
        let mut table = ContentExposureTable::new();
        table.add_exposure(ContentCategory::Puzzle, exposure).unwrap();

        let before = optimizer.calculate_content_novelty(&table, ContentCategory::Puzzle);
        optimizer
            .update_content_exposure(&mut table, ContentCategory::Puzzle, amount)
            .unwrap();
        let after = optimizer.calculate_content_novelty(&table, ContentCategory::Puzzle);

        prop_assert!(after < before);
    }

    #[test]
    fn prop_explore_picks_least_exposed(exposures in prop::collection::vec(0.0f32..50.0, 6)) {
        let optimizer = ContentVarietyOptimizer::with_defaults();
        let mut table = ContentExposureTable::new();
        for (category, amount) in ContentCategory::ALL.iter().zip(&exposures) {
            table.add_exposure(*category, *amount).unwrap();
        }

        let picked = optimizer.recommend_content(&table, ContentStrategy::Explore);
        let minimum = exposures.iter().cloned().fold(f32::INFINITY, f32::min);
        prop_assert_eq!(table.exposure(picked), minimum);
    }

    #[test]
    fn prop_churn_risk_in_unit_range(
        session in -1e6f32..1e6,
        success in -1e6f32..1e6,
        error in -1e6f32..1e6,
        login in -1e6f32..1e6,
    ) {
        let markers = ChurnMarkers {
            session_length_decline: session,
            success_decline: success,
            error_increase: error,
            login_frequency_decline: login,
        };
        let risk = ChurnRiskAnalysis::default().calculate_risk(&markers);
        prop_assert!((0.0..=1.0).contains(&risk));
    }

    #[test]
    fn prop_engine_difficulty_band_and_persistence(
        steps in prop::collection::vec((0u8..9, any::<bool>(), 0.0f32..120.0, 0.0f32..20.0), 1..40),
        seed in any::<u64>(),
    ) {
        let mut engine = AdaptiveEngine::with_seed(EngineConfig::default(), seed).unwrap();
        let mut repository = InMemoryRepository::new();
        let id = PlayerId::new();
        let start = Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap();

        for (index, (code, succeeded, secs, cost)) in steps.into_iter().enumerate() {
            let action = PlayerAction::new(action_type(code), succeeded, secs)
                .with_resource_cost(cost)
                .at(start + Duration::minutes(index as i64 * 7));
            let outcome = engine.process_player_action(id, action).unwrap();

            prop_assert!((outcome.difficulty - 50.0).abs() <= 7.5 + 1e-3);
            prop_assert!((0.0..=1.0).contains(&outcome.churn_risk));
            prop_assert!((0.0..=1.0).contains(&outcome.performance_score));
        }

        engine.save_player(&mut repository, id).unwrap();
        let loaded = repository.load(id).unwrap().unwrap();
        prop_assert_eq!(&loaded, engine.player(id).unwrap());
    }
}
