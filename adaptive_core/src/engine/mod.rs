//! Adaptive Engine - the single entry point that sequences every controller
//! for one player action.
//!
//! One evaluation works as follows:
//! 1. **Validate**: reject malformed telemetry before any state is touched
//! 2. **Performance**: append the encounter and rescore the window
//! 3. **Difficulty**: proportional re-targeting, then streak micro-adjustments
//! 4. **Flow**: score the snapshot and rebalance challenge on disruption
//! 5. **Reward**: roll the variable-ratio and rare-reward schedules
//! 6. **Content**: record the play and recommend the next category
//! 7. **Churn**: log the behaviour, predict risk, and pick an intervention
//!
//! Session markers skip steps 2, 3 and 5.

mod analytics;

pub use analytics::*;

use player_model::{
    ActionType, BehaviorLogEntry, EngagementSnapshot, InterventionRecord, InterventionType,
    PerformanceRecord, PlayerAction, PlayerId, PlayerRegistry, PlayerRepository, PlayerState,
    RewardTier, ValidationError,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde_json::json;
use std::collections::HashMap;
use std::time::Duration;

use crate::churn::{ChurnMonitor, InterventionSignals};
use crate::config::EngineConfig;
use crate::difficulty::DifficultyController;
use crate::error::{EngineError, Result};
use crate::flow::FlowOptimizer;
use crate::performance::PerformanceTracker;
use crate::progress::ProgressVisualizer;
use crate::reward::{RewardContext, RewardScheduler};
use crate::variety::{ContentStrategy, ContentVarietyOptimizer};

/// Owns every player record and the controllers that act on them.
///
/// `&mut self` on every mutating call serializes evaluations; hosts that
/// shard players across threads give each shard its own engine.
pub struct AdaptiveEngine<R: Rng = ChaCha8Rng> {
    config: EngineConfig,
    performance: PerformanceTracker,
    difficulty: DifficultyController,
    flow: FlowOptimizer,
    rewards: RewardScheduler,
    variety: ContentVarietyOptimizer,
    churn: ChurnMonitor,
    progress: ProgressVisualizer,
    players: PlayerRegistry,
    rng: R,
}

impl AdaptiveEngine<ChaCha8Rng> {
    /// Engine with a seeded generator, reproducible across runs.
    pub fn with_seed(config: EngineConfig, seed: u64) -> Result<Self> {
        Self::new(config, ChaCha8Rng::seed_from_u64(seed))
    }

    /// Default configuration and an entropy-seeded generator.
    pub fn with_defaults() -> Self {
        Self::build(EngineConfig::default(), ChaCha8Rng::from_entropy())
    }
}

impl<R: Rng> AdaptiveEngine<R> {
    /// Validate the configuration and build the engine around `rng`.
    pub fn new(config: EngineConfig, rng: R) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config, rng))
    }

    fn build(config: EngineConfig, rng: R) -> Self {
        Self {
            performance: PerformanceTracker::new(config.performance.clone()),
            difficulty: DifficultyController::new(config.difficulty.clone()),
            flow: FlowOptimizer::new(config.flow.clone()),
            rewards: RewardScheduler::new(config.reward.clone()),
            variety: ContentVarietyOptimizer::new(config.variety.clone()),
            churn: ChurnMonitor::new(config.churn.clone()),
            progress: ProgressVisualizer::new(config.progress.clone()),
            players: PlayerRegistry::new(),
            config,
            rng,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Display scaling for progress bars; never feeds back into control.
    pub fn progress(&self) -> &ProgressVisualizer {
        &self.progress
    }

    pub fn players(&self) -> &PlayerRegistry {
        &self.players
    }

    pub fn player(&self, player_id: PlayerId) -> Option<&PlayerState> {
        self.players.get(player_id)
    }

    /// Forget a player's in-memory record.
    pub fn remove_player(&mut self, player_id: PlayerId) -> Option<PlayerState> {
        self.players.remove(player_id)
    }

    /// Start tracking a player with a known skill estimate.
    ///
    /// Returns true if the record was created. An existing record only has its
    /// skill estimate replaced.
    pub fn register_player(&mut self, player_id: PlayerId, skill: f32) -> Result<bool> {
        let skill = ValidationError::check_unit("skill_estimate", skill)?;
        let base_difficulty = self.config.difficulty.base_difficulty;
        let windows = self.config.windows;
        let (state, created) = self.players.get_or_insert_with(player_id, || {
            PlayerState::new(player_id, base_difficulty, windows)
        });
        state.skill_estimate = skill;
        if created {
            tracing::info!("Registered player {} with skill {:.2}", player_id, skill);
        }
        Ok(created)
    }

    /// Replace the externally maintained skill estimate of a tracked player.
    pub fn set_skill_estimate(&mut self, player_id: PlayerId, skill: f32) -> Result<()> {
        let state = self
            .players
            .get_mut(player_id)
            .ok_or(EngineError::UnknownPlayer(player_id))?;
        state.set_skill_estimate(skill)?;
        Ok(())
    }

    /// Telemetry entry point with positional fields, stamped with the current time.
    #[allow(clippy::too_many_arguments)]
    pub fn record_action(
        &mut self,
        player_id: PlayerId,
        action_type: ActionType,
        succeeded: bool,
        time_taken_secs: f32,
        resource_cost: f32,
        snapshot: Option<EngagementSnapshot>,
        metadata: Option<HashMap<String, serde_json::Value>>,
    ) -> Result<ActionOutcome> {
        let mut action = PlayerAction::new(action_type, succeeded, time_taken_secs)
            .with_resource_cost(resource_cost);
        action.snapshot = snapshot;
        if let Some(metadata) = metadata {
            action.metadata = metadata;
        }
        self.process_player_action(player_id, action)
    }

    /// Run one full evaluation for a player.
    ///
    /// The first action for an unknown player creates its record. An invalid
    /// action is rejected before any state changes.
    pub fn process_player_action(
        &mut self,
        player_id: PlayerId,
        action: PlayerAction,
    ) -> Result<ActionOutcome> {
        if let Err(err) = action.validate() {
            tracing::warn!("Rejected action for player {}: {}", player_id, err);
            return Err(err.into());
        }

        let base_difficulty = self.config.difficulty.base_difficulty;
        let windows = self.config.windows;
        let (state, new_player) = self.players.get_or_insert_with(player_id, || {
            PlayerState::new(player_id, base_difficulty, windows)
        });
        if new_player {
            tracing::info!("Initialized state for player {}", player_id);
        }

        let now = action.timestamp;
        let encounter = !action.action_type.is_session_marker();
        let skill = state.skill_estimate;

        // Performance and difficulty
        let mut difficulty_adjustment = None;
        let mut micro_adjustment = None;
        if encounter {
            let time_taken =
                Duration::try_from_secs_f32(action.time_taken_secs).unwrap_or(Duration::MAX);
            let record =
                PerformanceRecord::new(action.succeeded, time_taken, action.resource_cost).at(now);
            let score = self.performance.add_encounter(&mut state.performance, record);

            difficulty_adjustment = Some(self.difficulty.adjust(&mut state.difficulty, score, now));

            let recent = state.performance.history.to_vec();
            micro_adjustment = self
                .difficulty
                .should_apply_micro_adjustment(&state.difficulty, &recent);
            if let Some(adjustment) = &micro_adjustment {
                self.difficulty
                    .apply_micro_adjustment(&mut state.difficulty, adjustment, now);
            }
        }

        // Flow
        let flow = action.snapshot.as_ref().map(|snapshot| {
            let challenge = self
                .difficulty
                .to_normalized(state.difficulty.current_difficulty);
            let assessment = self.flow.detect_flow_disruption(snapshot, skill, challenge);
            state
                .flow
                .observe(assessment.score, assessment.state, assessment.disrupted);

            if assessment.disrupted {
                let rebalanced = self.flow.auto_rebalance(challenge, skill, &assessment);
                self.difficulty.set_difficulty(
                    &mut state.difficulty,
                    self.difficulty.from_normalized(rebalanced),
                    now,
                );
            }
            assessment
        });

        // Encounter difficulty and reward
        let mut encounter_difficulty = None;
        let mut reward = None;
        if encounter {
            let sampled = self.difficulty.generate_encounter_difficulty(
                skill,
                self.config.difficulty.encounter_sigma,
                &mut self.rng,
            );
            encounter_difficulty = Some(sampled);

            let context = RewardContext {
                action_type: action.action_type,
                difficulty: sampled,
                time_investment_secs: action.time_taken_secs,
                skill_required: action.skill_required,
            };
            reward = self
                .rewards
                .process_action(&mut state.rewards, &context, &mut self.rng);
            match reward.as_ref().map(|event| event.tier) {
                Some(RewardTier::Common) => state.common_rewards = state.common_rewards.saturating_add(1),
                Some(RewardTier::Rare) => state.rare_rewards = state.rare_rewards.saturating_add(1),
                None => {}
            }
        }

        // Content
        if let Some(category) = action.action_type.content_category() {
            self.variety.record_play(
                &mut state.content,
                category,
                action.succeeded,
                action.snapshot.as_ref(),
            )?;
        }
        let (mut recommended_content, mut content_strategy) =
            self.variety.recommend(&state.content, &mut self.rng);

        // Behaviour and churn
        let mut metadata = action.metadata;
        metadata
            .entry("difficulty".to_string())
            .or_insert_with(|| json!(state.difficulty.current_difficulty));
        let mut entry = BehaviorLogEntry::new(action.action_type, now).with_metadata(metadata);
        if encounter {
            entry = entry.with_outcome(action.succeeded);
        }
        if let Some(snapshot) = &action.snapshot {
            entry = entry.with_error_rate(snapshot.error_rate);
        }
        self.churn.track_behavior(&mut state.behavior, entry);

        let engagement = self.churn.calculate_engagement_metrics(&state.behavior);
        let churn_risk = self.churn.analysis().calculate_risk(&engagement.markers);
        state.churn_risk = churn_risk;

        let signals = InterventionSignals {
            churn_risk,
            flow_disruption_streak: state.flow.disruption_streak,
            flow_state: state.flow.last_state,
            actions_since_last_reward: state.rewards.actions_since_last_reward,
            actions_since_intervention: state.actions_since_intervention,
        };
        let intervention = self.churn.should_trigger_intervention(&signals);

        match &intervention {
            Some(decision) => {
                if decision.intervention_type == InterventionType::RecommendContent {
                    content_strategy = ContentStrategy::Explore;
                    recommended_content = self
                        .variety
                        .recommend_content(&state.content, content_strategy);
                }
                state.log_intervention(InterventionRecord {
                    intervention_type: decision.intervention_type,
                    context: decision.context.clone(),
                    timestamp: now,
                });
                tracing::info!(
                    "Intervention for player {}: {:?} ({})",
                    player_id,
                    decision.intervention_type,
                    decision.context
                );
            }
            None => {
                if let Some(since) = state.actions_since_intervention.as_mut() {
                    *since = since.saturating_add(1);
                }
            }
        }

        state.recommended_content = Some(recommended_content);
        state.total_actions = state.total_actions.saturating_add(1);

        Ok(ActionOutcome {
            player_id,
            new_player,
            performance_score: state.performance.score,
            difficulty: state.difficulty.current_difficulty,
            difficulty_adjustment,
            micro_adjustment,
            encounter_difficulty,
            flow,
            reward,
            recommended_content,
            content_strategy,
            engagement,
            churn_risk,
            intervention,
        })
    }

    /// Snapshot of one player's state. Never creates or mutates a record.
    pub fn get_player_analytics(&self, player_id: PlayerId) -> Option<PlayerAnalytics> {
        let state = self.players.get(player_id)?;
        let performance = self.performance.breakdown(&state.performance);

        Some(PlayerAnalytics {
            player_id,
            skill_estimate: state.skill_estimate,
            performance_score: performance.score,
            performance,
            current_difficulty: state.difficulty.current_difficulty,
            flow_score: state.flow.last_score,
            flow_state: state.flow.last_state,
            flow_disruption_streak: state.flow.disruption_streak,
            churn_risk: state.churn_risk,
            engagement: self.churn.calculate_engagement_metrics(&state.behavior),
            exposure: state.content.snapshot(),
            recommended_content: state.recommended_content,
            actions_since_last_reward: state.rewards.actions_since_last_reward,
            total_actions: state.total_actions,
            recent_interventions: state.interventions.to_vec(),
        })
    }

    /// Totals across every tracked player.
    pub fn get_system_statistics(&self) -> SystemStatistics {
        SystemStatistics::collect(self.players.iter(), self.config.churn.risk_threshold)
    }

    /// Load a player's record from the repository into the engine.
    ///
    /// Returns false, leaving the engine untouched, if the repository has none.
    pub fn load_player<P>(&mut self, repository: &P, player_id: PlayerId) -> Result<bool>
    where
        P: PlayerRepository + ?Sized,
    {
        match repository.load(player_id)? {
            Some(state) => {
                tracing::debug!("Loaded player {} from repository", player_id);
                self.players.insert(state);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Persist a tracked player's record.
    pub fn save_player<P>(&self, repository: &mut P, player_id: PlayerId) -> Result<()>
    where
        P: PlayerRepository + ?Sized,
    {
        let state = self
            .players
            .get(player_id)
            .ok_or(EngineError::UnknownPlayer(player_id))?;
        repository.save(state)?;
        Ok(())
    }

    /// Load-before, save-after around one evaluation.
    ///
    /// The repository copy, when present, replaces the in-memory record. A
    /// rejected action saves nothing.
    pub fn process_with_repository<P>(
        &mut self,
        repository: &mut P,
        player_id: PlayerId,
        action: PlayerAction,
    ) -> Result<ActionOutcome>
    where
        P: PlayerRepository + ?Sized,
    {
        self.load_player(&*repository, player_id)?;
        let outcome = self.process_player_action(player_id, action)?;
        self.save_player(repository, player_id)?;
        Ok(outcome)
    }
}
