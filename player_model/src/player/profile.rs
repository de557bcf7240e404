//! The aggregated per-player state record.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{
    BehaviorLogEntry, ContentExposureTable, DifficultyState, FlowTracking, InterventionRecord,
    PerformanceMetrics, PlayerId, RewardScheduleState, RollingWindow,
};
use crate::error::ValidationError;
use crate::telemetry::{ContentCategory, InterventionType};

/// Capacities of the bounded windows kept per player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowCapacities {
    pub performance: usize,
    pub behavior: usize,
    pub interventions: usize,
}

impl Default for WindowCapacities {
    fn default() -> Self {
        Self {
            performance: 20,
            behavior: 100,
            interventions: 50,
        }
    }
}

/// Everything the engine knows about one player.
///
/// Owned exclusively by the engine; controllers receive the pieces they need
/// as arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerState {
    pub id: PlayerId,

    /// Externally maintained skill estimate in [0, 1].
    pub skill_estimate: f32,

    pub performance: PerformanceMetrics,
    pub difficulty: DifficultyState,
    pub rewards: RewardScheduleState,
    pub content: ContentExposureTable,
    pub behavior: RollingWindow<BehaviorLogEntry>,
    pub flow: FlowTracking,

    /// Last computed churn risk in [0, 1].
    pub churn_risk: f32,

    /// Most recent interventions; older records are evicted at capacity.
    pub interventions: RollingWindow<InterventionRecord>,
    /// Lifetime count of fired interventions per type, never evicted.
    #[serde(default)]
    pub intervention_counts: BTreeMap<InterventionType, u64>,
    /// Actions processed since the last intervention; None if none has fired.
    pub actions_since_intervention: Option<u32>,

    pub recommended_content: Option<ContentCategory>,

    // Lifetime counters
    pub total_actions: u64,
    pub common_rewards: u32,
    pub rare_rewards: u32,
}

impl PlayerState {
    /// Create a fresh record for a player seen for the first time.
    pub fn new(id: PlayerId, base_difficulty: f32, capacities: WindowCapacities) -> Self {
        Self {
            id,
            skill_estimate: 0.5,
            performance: PerformanceMetrics::new(capacities.performance),
            difficulty: DifficultyState::new(base_difficulty),
            rewards: RewardScheduleState::default(),
            content: ContentExposureTable::new(),
            behavior: RollingWindow::new(capacities.behavior),
            flow: FlowTracking::default(),
            churn_risk: 0.0,
            interventions: RollingWindow::new(capacities.interventions),
            intervention_counts: BTreeMap::new(),
            actions_since_intervention: None,
            recommended_content: None,
            total_actions: 0,
            common_rewards: 0,
            rare_rewards: 0,
        }
    }

    /// Replace the skill estimate; values outside [0, 1] are rejected.
    pub fn set_skill_estimate(&mut self, skill: f32) -> Result<(), ValidationError> {
        self.skill_estimate = ValidationError::check_unit("skill_estimate", skill)?;
        Ok(())
    }

    /// Append an intervention to the audit log, count it, and restart the cooldown.
    pub fn log_intervention(&mut self, record: InterventionRecord) {
        *self
            .intervention_counts
            .entry(record.intervention_type)
            .or_default() += 1;
        self.interventions.push(record);
        self.actions_since_intervention = Some(0);
    }
}
