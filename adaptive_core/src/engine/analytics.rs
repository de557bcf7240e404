//! Result bundles returned by the engine.

use player_model::{
    ContentCategory, FlowState, InterventionRecord, InterventionType, PlayerId, PlayerState,
    RewardTier,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::churn::{EngagementMetrics, InterventionDecision};
use crate::difficulty::{DifficultyAdjustment, MicroAdjustment};
use crate::flow::FlowAssessment;
use crate::performance::PerformanceBreakdown;
use crate::reward::RewardEvent;
use crate::variety::ContentStrategy;

/// Control signals produced by one evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionOutcome {
    pub player_id: PlayerId,
    /// The action created this player's record.
    pub new_player: bool,

    pub performance_score: f32,
    /// Current difficulty after every adjustment of this evaluation.
    pub difficulty: f32,
    pub difficulty_adjustment: Option<DifficultyAdjustment>,
    pub micro_adjustment: Option<MicroAdjustment>,
    /// Normalized challenge sampled for the next encounter.
    pub encounter_difficulty: Option<f32>,

    /// Present when the action carried an engagement snapshot.
    pub flow: Option<FlowAssessment>,
    pub reward: Option<RewardEvent>,

    pub recommended_content: ContentCategory,
    pub content_strategy: ContentStrategy,

    pub engagement: EngagementMetrics,
    pub churn_risk: f32,
    pub intervention: Option<InterventionDecision>,
}

/// Read-only view of one player for dashboards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerAnalytics {
    pub player_id: PlayerId,
    pub skill_estimate: f32,
    pub performance_score: f32,
    pub performance: PerformanceBreakdown,
    pub current_difficulty: f32,
    /// Score of the last flow evaluation, if any snapshot was seen.
    pub flow_score: Option<f32>,
    pub flow_state: FlowState,
    pub flow_disruption_streak: u32,
    pub churn_risk: f32,
    pub engagement: EngagementMetrics,
    pub exposure: BTreeMap<ContentCategory, f32>,
    pub recommended_content: Option<ContentCategory>,
    pub actions_since_last_reward: u32,
    pub total_actions: u64,
    pub recent_interventions: Vec<InterventionRecord>,
}

/// Aggregates across every tracked player. Holds no per-player identifiers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SystemStatistics {
    pub tracked_players: usize,
    pub total_actions: u64,
    pub rewards_by_tier: BTreeMap<RewardTier, u64>,
    /// Lifetime counts, including records evicted from the audit logs.
    pub interventions_by_type: BTreeMap<InterventionType, u64>,
    /// Mean current difficulty; 0.0 with no players.
    pub mean_difficulty: f32,
    /// Players whose last churn risk is above the intervention threshold.
    pub players_at_risk: usize,
}

impl SystemStatistics {
    /// Fold player records into totals.
    pub fn collect<'a>(players: impl IntoIterator<Item = &'a PlayerState>, risk_threshold: f32) -> Self {
        let mut stats = SystemStatistics::default();
        let mut difficulty_total = 0.0;

        for state in players {
            stats.tracked_players += 1;
            stats.total_actions += state.total_actions;
            *stats.rewards_by_tier.entry(RewardTier::Common).or_default() += state.common_rewards as u64;
            *stats.rewards_by_tier.entry(RewardTier::Rare).or_default() += state.rare_rewards as u64;
            for (intervention_type, count) in &state.intervention_counts {
                *stats.interventions_by_type.entry(*intervention_type).or_default() += count;
            }
            difficulty_total += state.difficulty.current_difficulty;
            if state.churn_risk > risk_threshold {
                stats.players_at_risk += 1;
            }
        }

        if stats.tracked_players > 0 {
            stats.mean_difficulty = difficulty_total / stats.tracked_players as f32;
        }
        stats
    }

    pub fn total_rewards(&self) -> u64 {
        self.rewards_by_tier.values().sum()
    }

    pub fn total_interventions(&self) -> u64 {
        self.interventions_by_type.values().sum()
    }
}
