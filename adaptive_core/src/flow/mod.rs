//! Flow Optimizer - keeps challenge tracking skill.
//!
//! The flow score is a weighted mean of six normalized readings, with error
//! rate and frustration inverted. A score below the disruption threshold flags
//! the evaluation; the skill/challenge gap then says whether the player is
//! bored (challenge below skill) or anxious (challenge above skill).

use player_model::{EngagementSnapshot, FlowState};
use serde::{Deserialize, Serialize};

use crate::config::FlowConfig;

/// Outcome of one flow evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FlowAssessment {
    /// Flow score in [0, 1].
    pub score: f32,
    pub disrupted: bool,
    pub state: FlowState,
    /// `skill - challenge`, both normalized.
    pub gap: f32,
}

pub struct FlowOptimizer {
    config: FlowConfig,
}

impl FlowOptimizer {
    pub fn new(config: FlowConfig) -> Self {
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self::new(FlowConfig::default())
    }

    /// Recommended normalized challenge for a skill level.
    pub fn calculate_optimal_difficulty(&self, player_skill: f32) -> f32 {
        (player_skill * self.config.ideal_ratio).clamp(0.0, 1.0)
    }

    /// Weighted flow score in [0, 1].
    pub fn flow_score(&self, snapshot: &EngagementSnapshot) -> f32 {
        let c = &self.config;
        let components = [
            (snapshot.actions_per_minute, c.pace_weight),
            (snapshot.decision_accuracy, c.accuracy_weight),
            (1.0 - snapshot.error_rate, c.error_weight),
            (snapshot.enjoyment, c.enjoyment_weight),
            (1.0 - snapshot.frustration, c.frustration_weight),
            (snapshot.motivation, c.motivation_weight),
        ];

        let total_weight: f32 = components.iter().map(|(_, w)| w).sum();
        if total_weight <= 0.0 {
            return 0.0;
        }

        let weighted: f32 = components
            .iter()
            .map(|(value, weight)| value.clamp(0.0, 1.0) * weight)
            .sum();
        (weighted / total_weight).clamp(0.0, 1.0)
    }

    /// Score the snapshot and classify any disruption.
    ///
    /// Classification order for disrupted evaluations:
    /// 1. Distress (frustration and error rate averaging at least
    ///    `distress_threshold` with enjoyment below `distress_enjoyment_ceiling`)
    ///    is anxiety whatever the skill estimate says
    /// 2. Otherwise the sign of the skill/challenge gap decides
    /// 3. A gap within tolerance falls back to frustration and error rate alone
    pub fn detect_flow_disruption(
        &self,
        snapshot: &EngagementSnapshot,
        player_skill: f32,
        challenge: f32,
    ) -> FlowAssessment {
        let score = self.flow_score(snapshot);
        let disrupted = score < self.config.disruption_threshold;
        let gap = player_skill - challenge;

        let strain = (snapshot.frustration + snapshot.error_rate) / 2.0;
        let distressed = strain >= self.config.distress_threshold
            && snapshot.enjoyment < self.config.distress_enjoyment_ceiling;

        let state = if !disrupted {
            FlowState::Flow
        } else if distressed {
            FlowState::Anxiety
        } else if gap > self.config.gap_tolerance {
            FlowState::Boredom
        } else if gap < -self.config.gap_tolerance {
            FlowState::Anxiety
        } else if strain >= self.config.distress_threshold {
            FlowState::Anxiety
        } else {
            FlowState::Boredom
        };

        if disrupted {
            tracing::debug!(
                "Flow disruption: score {:.3}, gap {:+.3}, classified {:?}",
                score,
                gap,
                state
            );
        }

        FlowAssessment {
            score,
            disrupted,
            state,
            gap,
        }
    }

    /// Step the normalized challenge toward the optimum, at most
    /// `max_rebalance_step` per call. Undisrupted evaluations change nothing.
    ///
    /// When the classification contradicts the direction of the optimum
    /// (a distressed player whose skill estimate says the game is too easy),
    /// the classification wins and the challenge steps away from the optimum.
    pub fn auto_rebalance(
        &self,
        current_challenge: f32,
        player_skill: f32,
        assessment: &FlowAssessment,
    ) -> f32 {
        if !assessment.disrupted {
            return current_challenge;
        }

        let step = self.config.max_rebalance_step;
        let tolerance = self.config.gap_tolerance;
        let optimal = self.calculate_optimal_difficulty(player_skill);
        let distance = optimal - current_challenge;
        let toward_optimal = current_challenge + distance.clamp(-step, step);

        let delta = match assessment.state {
            FlowState::Anxiety => -step,
            FlowState::Boredom => step,
            FlowState::Flow => 0.0,
        };

        let next = match assessment.state {
            // Near the optimum: follow the classification inside the tolerance band.
            _ if distance.abs() <= tolerance => {
                (current_challenge + delta).clamp(optimal - tolerance, optimal + tolerance)
            }
            FlowState::Flow => toward_optimal,
            FlowState::Boredom if distance > 0.0 => toward_optimal,
            FlowState::Anxiety if distance < 0.0 => toward_optimal,
            _ => current_challenge + delta,
        };

        next.clamp(0.0, 1.0)
    }
}
