//! End-to-end scenarios through the engine facade.

use adaptive_core::{AdaptiveEngine, ContentStrategy, EngineConfig, EngineError};
use chrono::{DateTime, Duration, TimeZone, Utc};
use player_model::{
    ActionType, ContentCategory, EngagementSnapshot, FlowState, InMemoryRepository,
    InterventionType, PlayerAction, PlayerId, PlayerRepository, RewardTier,
};
use serde_json::json;
use std::collections::HashMap;

fn at(minutes: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap() + Duration::minutes(minutes)
}

fn engine(seed: u64) -> AdaptiveEngine {
    AdaptiveEngine::with_seed(EngineConfig::default(), seed).unwrap()
}

fn action(action_type: ActionType, succeeded: bool, minute: i64) -> PlayerAction {
    PlayerAction::new(action_type, succeeded, 20.0)
        .with_resource_cost(1.0)
        .at(at(minute))
}

fn engaged(error_rate: f32) -> EngagementSnapshot {
    EngagementSnapshot {
        actions_per_minute: 0.8,
        decision_accuracy: 0.9,
        error_rate,
        enjoyment: 0.9,
        frustration: 0.1,
        motivation: 0.85,
    }
}

fn no_rewards() -> EngineConfig {
    let mut config = EngineConfig::default();
    config.reward.base_probability = 0.0;
    config.reward.probability_increment = 0.0;
    config.reward.rare_ceiling = 0.0;
    config
}

#[test]
fn test_seeded_sessions_are_reproducible() {
    let id = PlayerId::new();
    let mut a = engine(42);
    let mut b = engine(42);

    for minute in 0..30 {
        let act = action(ActionType::Exploration, minute % 3 != 0, minute);
        let left = a.process_player_action(id, act.clone()).unwrap();
        let right = b.process_player_action(id, act).unwrap();
        assert_eq!(left, right);
    }
    assert_eq!(a.player(id), b.player(id));
}

#[test]
fn test_difficulty_band_holds_for_any_outcome_mix() {
    let mut engine = engine(3);
    let winner = PlayerId::new();
    let loser = PlayerId::new();

    for minute in 0..50 {
        let up = engine
            .process_player_action(winner, action(ActionType::Combat, true, minute))
            .unwrap();
        let down = engine
            .process_player_action(loser, action(ActionType::Combat, false, minute))
            .unwrap();
        for difficulty in [up.difficulty, down.difficulty] {
            assert!((difficulty - 50.0).abs() <= 50.0 * 0.15 + 0.001);
        }
    }
}

#[test]
fn test_failure_for_one_player_does_not_touch_another() {
    let mut engine = engine(5);
    let healthy = PlayerId::new();
    let broken = PlayerId::new();

    engine
        .process_player_action(healthy, action(ActionType::Puzzle, true, 0))
        .unwrap();
    let before = engine.player(healthy).unwrap().clone();

    let bad_snapshot = EngagementSnapshot {
        enjoyment: 1.5,
        ..EngagementSnapshot::default()
    };
    let result = engine.process_player_action(
        broken,
        action(ActionType::Puzzle, true, 1).with_snapshot(bad_snapshot),
    );

    assert!(matches!(result, Err(EngineError::Validation(_))));
    assert!(engine.player(broken).is_none());
    assert_eq!(engine.player(healthy).unwrap(), &before);

    let bad_cost = action(ActionType::Puzzle, true, 2).with_resource_cost(-3.0);
    assert!(engine.process_player_action(healthy, bad_cost).is_err());
    assert_eq!(engine.player(healthy).unwrap(), &before);
}

#[test]
fn test_reward_drought_triggers_inject_reward_with_cooldown() {
    let mut engine = AdaptiveEngine::with_seed(no_rewards(), 11).unwrap();
    let id = PlayerId::new();

    let mut fired = Vec::new();
    for minute in 0..30 {
        let outcome = engine
            .process_player_action(id, action(ActionType::Crafting, true, minute))
            .unwrap();
        assert!(outcome.reward.is_none());
        if let Some(decision) = outcome.intervention {
            assert_eq!(decision.intervention_type, InterventionType::InjectReward);
            fired.push(minute);
        }
    }

    // More than 15 dry actions, then at most one intervention per 6 actions.
    assert_eq!(fired, vec![15, 21, 27]);
    assert_eq!(engine.player(id).unwrap().interventions.len(), 3);
}

#[test]
fn test_persistent_anxiety_eases_difficulty() {
    let mut engine = engine(9);
    let id = PlayerId::new();
    engine.register_player(id, 0.5).unwrap();

    let anxious = EngagementSnapshot {
        actions_per_minute: 0.3,
        decision_accuracy: 0.3,
        error_rate: 0.8,
        enjoyment: 0.1,
        frustration: 0.9,
        motivation: 0.3,
    };

    let mut outcomes = Vec::new();
    for minute in 0..3 {
        let act = action(ActionType::Combat, false, minute).with_snapshot(anxious);
        outcomes.push(engine.process_player_action(id, act).unwrap());
    }

    for outcome in &outcomes {
        let flow = outcome.flow.unwrap();
        assert!(flow.disrupted);
        assert_eq!(flow.state, FlowState::Anxiety);
    }
    assert!(outcomes[0].intervention.is_none());
    assert!(outcomes[1].intervention.is_none());
    let decision = outcomes[2].intervention.as_ref().unwrap();
    assert_eq!(decision.intervention_type, InterventionType::EaseDifficulty);
}

fn distressed() -> EngagementSnapshot {
    EngagementSnapshot {
        enjoyment: 0.1,
        frustration: 0.9,
        error_rate: 0.8,
        ..EngagementSnapshot::default()
    }
}

#[test]
fn test_distressed_expert_is_eased_not_bored() {
    let mut engine = engine(43);
    let id = PlayerId::new();
    engine.register_player(id, 0.8).unwrap();

    let mut outcomes = Vec::new();
    for minute in 0..3 {
        let act = action(ActionType::Combat, false, minute).with_snapshot(distressed());
        outcomes.push(engine.process_player_action(id, act).unwrap());
    }

    for outcome in &outcomes {
        let flow = outcome.flow.unwrap();
        assert!(flow.disrupted);
        // Challenge stays inside the band, far below the 0.8 skill estimate.
        assert!(flow.gap > 0.1);
        assert_eq!(flow.state, FlowState::Anxiety);
    }
    assert!(outcomes[2].difficulty < 50.0, "difficulty was {}", outcomes[2].difficulty);
    assert_eq!(
        outcomes[2].intervention.as_ref().unwrap().intervention_type,
        InterventionType::EaseDifficulty
    );
}

#[test]
fn test_distressed_novice_is_eased() {
    let mut engine = engine(47);
    let id = PlayerId::new();
    engine.register_player(id, 0.2).unwrap();

    let act = action(ActionType::Puzzle, false, 0).with_snapshot(distressed());
    let outcome = engine.process_player_action(id, act).unwrap();

    let flow = outcome.flow.unwrap();
    assert!(flow.gap < -0.1);
    assert_eq!(flow.state, FlowState::Anxiety);
    assert!(outcome.difficulty < 50.0);
}

#[test]
fn test_calm_expert_is_bored_and_challenged() {
    let mut engine = engine(53);
    let id = PlayerId::new();
    engine.register_player(id, 0.9).unwrap();

    let bored = EngagementSnapshot {
        actions_per_minute: 0.1,
        decision_accuracy: 0.3,
        error_rate: 0.1,
        enjoyment: 0.1,
        frustration: 0.1,
        motivation: 0.1,
    };
    let act = action(ActionType::Combat, true, 0).with_snapshot(bored);
    let outcome = engine.process_player_action(id, act).unwrap();

    assert_eq!(outcome.flow.unwrap().state, FlowState::Boredom);
    assert!(outcome.difficulty > 50.0, "difficulty was {}", outcome.difficulty);
}

#[test]
fn test_persistent_boredom_switches_content() {
    let mut engine = engine(13);
    let id = PlayerId::new();
    engine.register_player(id, 0.5).unwrap();

    let bored = EngagementSnapshot {
        actions_per_minute: 0.1,
        decision_accuracy: 0.3,
        error_rate: 0.1,
        enjoyment: 0.1,
        frustration: 0.1,
        motivation: 0.1,
    };

    let mut last = None;
    for minute in 0..3 {
        let act = action(ActionType::Combat, true, minute).with_snapshot(bored);
        last = Some(engine.process_player_action(id, act).unwrap());
    }

    let outcome = last.unwrap();
    assert_eq!(outcome.flow.unwrap().state, FlowState::Boredom);
    assert_eq!(
        outcome.intervention.unwrap().intervention_type,
        InterventionType::RecommendContent
    );
    assert_eq!(outcome.content_strategy, ContentStrategy::Explore);
    assert_eq!(outcome.recommended_content, ContentCategory::Exploration);
    assert_eq!(
        engine.player(id).unwrap().recommended_content,
        Some(ContentCategory::Exploration)
    );
}

#[test]
fn test_disengaging_player_gets_nudged() {
    let mut engine = engine(17);
    let id = PlayerId::new();

    // Shrinking sessions, growing gaps, collapsing success, rising errors.
    let plan = [(0, 40), (90, 30), (270, 10), (630, 4), (1350, 2)];
    let mut nudged = false;
    for (index, (start, length)) in plan.into_iter().enumerate() {
        let early = index < 2;
        for offset in [0, length / 2, length] {
            let act = action(ActionType::Combat, early, start + offset)
                .with_snapshot(engaged(if early { 0.1 } else { 0.7 }));
            let outcome = engine.process_player_action(id, act).unwrap();
            if let Some(decision) = outcome.intervention {
                nudged |= decision.intervention_type == InterventionType::EngagementNudge;
            }
        }
    }

    assert!(nudged);
    let analytics = engine.get_player_analytics(id).unwrap();
    assert!(analytics.churn_risk > 0.6);
    assert!(analytics.engagement.engagement_score < 0.5);
    assert_eq!(analytics.engagement.sessions, 5);
    assert_eq!(engine.get_system_statistics().players_at_risk, 1);
}

#[test]
fn test_content_exposure_accumulates_per_category() {
    let mut engine = engine(19);
    let id = PlayerId::new();

    for minute in 0..4 {
        engine
            .process_player_action(id, action(ActionType::Dialogue, true, minute))
            .unwrap();
    }
    engine
        .process_player_action(id, action(ActionType::Trade, true, 4))
        .unwrap();
    engine
        .process_player_action(id, action(ActionType::Quest, false, 5))
        .unwrap();

    let analytics = engine.get_player_analytics(id).unwrap();
    assert!((analytics.exposure[&ContentCategory::Social] - 5.0).abs() < 0.001);
    assert!((analytics.exposure[&ContentCategory::Narrative] - 1.0).abs() < 0.001);
    assert_eq!(analytics.exposure[&ContentCategory::Combat], 0.0);
}

#[test]
fn test_record_action_positional_entry_point() {
    let mut engine = engine(23);
    let id = PlayerId::new();

    let mut metadata = HashMap::new();
    metadata.insert("quest".to_string(), json!("q-17"));

    let outcome = engine
        .record_action(
            id,
            ActionType::Quest,
            true,
            45.0,
            3.0,
            Some(EngagementSnapshot::default()),
            Some(metadata),
        )
        .unwrap();

    assert!(outcome.new_player);
    assert!(outcome.flow.is_some());
    let entry = engine.player(id).unwrap().behavior.latest().unwrap().clone();
    assert_eq!(entry.metadata["quest"], json!("q-17"));
    assert_eq!(entry.error_rate, Some(0.5));
}

#[test]
fn test_repository_load_before_save_after() {
    let mut repository = InMemoryRepository::new();
    let id = PlayerId::new();

    let mut first = engine(29);
    for minute in 0..3 {
        first
            .process_with_repository(&mut repository, id, action(ActionType::Combat, true, minute))
            .unwrap();
    }
    assert!(repository.raw(id).is_some());

    // A different engine picks up where the first left off.
    let mut second = engine(31);
    let outcome = second
        .process_with_repository(&mut repository, id, action(ActionType::Combat, true, 3))
        .unwrap();
    assert!(!outcome.new_player);
    assert_eq!(second.player(id).unwrap().total_actions, 4);

    let stored = repository.load(id).unwrap().unwrap();
    assert_eq!(&stored, second.player(id).unwrap());

    // Rejected actions save nothing.
    let bad = PlayerAction::new(ActionType::Combat, true, f32::NAN).at(at(4));
    assert!(second.process_with_repository(&mut repository, id, bad).is_err());
    assert_eq!(repository.load(id).unwrap().unwrap().total_actions, 4);
}

#[test]
fn test_partial_toml_config_drives_engine() {
    let config = EngineConfig::from_toml_str(
        r#"
        [difficulty]
        base_difficulty = 80.0

        [windows]
        behavior = 10
        "#,
    )
    .unwrap();
    let mut engine = AdaptiveEngine::with_seed(config, 37).unwrap();
    let id = PlayerId::new();

    for minute in 0..20 {
        let outcome = engine
            .process_player_action(id, action(ActionType::Combat, minute % 2 == 0, minute))
            .unwrap();
        assert!(outcome.difficulty >= 68.0 - 0.001 && outcome.difficulty <= 92.0 + 0.001);
    }
    let state = engine.player(id).unwrap();
    assert_eq!(state.behavior.len(), 10);
    assert_eq!(state.performance.history.capacity(), 20);
}

#[test]
fn test_system_statistics_aggregate_players() {
    let mut engine = engine(41);
    let players: Vec<PlayerId> = (0..3).map(|_| PlayerId::new()).collect();

    for (index, id) in players.iter().enumerate() {
        for minute in 0..(index as i64 + 2) {
            engine
                .process_player_action(*id, action(ActionType::Exploration, true, minute))
                .unwrap();
        }
    }

    let stats = engine.get_system_statistics();
    assert_eq!(stats.tracked_players, 3);
    assert_eq!(stats.total_actions, 2 + 3 + 4);
    assert!(stats.mean_difficulty >= 42.5 && stats.mean_difficulty <= 57.5);

    let granted: u64 = players
        .iter()
        .map(|id| {
            let state = engine.player(*id).unwrap();
            (state.common_rewards + state.rare_rewards) as u64
        })
        .sum();
    assert_eq!(stats.total_rewards(), granted);
    assert_eq!(
        stats.rewards_by_tier.get(&RewardTier::Rare).copied().unwrap_or(0),
        players
            .iter()
            .map(|id| engine.player(*id).unwrap().rare_rewards as u64)
            .sum::<u64>()
    );
}

#[test]
fn test_intervention_statistics_count_evicted_records() {
    let mut config = no_rewards();
    config.windows.interventions = 1;
    let mut engine = AdaptiveEngine::with_seed(config, 59).unwrap();
    let id = PlayerId::new();

    let mut fired = 0u64;
    for minute in 0..200 {
        let outcome = engine
            .process_player_action(id, action(ActionType::Combat, false, minute))
            .unwrap();
        if outcome.intervention.is_some() {
            fired += 1;
        }
    }

    assert!(fired > 1);
    assert_eq!(engine.player(id).unwrap().interventions.len(), 1);
    let stats = engine.get_system_statistics();
    assert_eq!(stats.total_interventions(), fired);
}
