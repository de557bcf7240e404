//! Engagement & Churn Monitor - behavioural trends, churn risk, interventions.
//!
//! The monitor works in three steps:
//! 1. **Track**: append each action to the bounded behaviour window
//! 2. **Measure**: derive trend markers and a logistic churn risk from the window
//! 3. **Decide**: pick at most one intervention, by priority churn > flow > reward drought

mod markers;
mod risk;

pub use markers::*;
pub use risk::*;

use chrono::Duration;
use player_model::{BehaviorLogEntry, FlowState, InterventionType, RollingWindow};
use serde::{Deserialize, Serialize};

use crate::config::ChurnConfig;

/// Inputs to the intervention decision, gathered from the player's state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InterventionSignals {
    pub churn_risk: f32,
    pub flow_disruption_streak: u32,
    pub flow_state: FlowState,
    pub actions_since_last_reward: u32,
    /// None if no intervention has fired yet.
    pub actions_since_intervention: Option<u32>,
}

/// An intervention the monitor wants applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterventionDecision {
    pub intervention_type: InterventionType,
    pub context: String,
}

pub struct ChurnMonitor {
    config: ChurnConfig,
    analysis: ChurnRiskAnalysis,
}

impl ChurnMonitor {
    pub fn new(config: ChurnConfig) -> Self {
        let analysis = ChurnRiskAnalysis::from_config(&config);
        Self { config, analysis }
    }

    pub fn with_defaults() -> Self {
        Self::new(ChurnConfig::default())
    }

    pub fn analysis(&self) -> &ChurnRiskAnalysis {
        &self.analysis
    }

    /// Append an entry to the behaviour window, evicting the oldest at capacity.
    pub fn track_behavior(&self, log: &mut RollingWindow<BehaviorLogEntry>, entry: BehaviorLogEntry) {
        log.push(entry);
    }

    /// Trend markers and engagement score for the current window.
    pub fn calculate_engagement_metrics(&self, log: &RollingWindow<BehaviorLogEntry>) -> EngagementMetrics {
        let entries = log.to_vec();
        let (markers, sessions) = derive_markers(
            &entries,
            Duration::minutes(self.config.session_gap_minutes),
            self.config.min_trend_samples,
        );

        let weights = [
            (markers.session_length_decline, self.config.session_length_weight),
            (markers.success_decline, self.config.success_trend_weight),
            (markers.error_increase, self.config.error_trend_weight),
            (markers.login_frequency_decline, self.config.login_frequency_weight),
        ];
        let total: f32 = weights.iter().map(|(_, w)| w).sum();
        let disengagement = if total > 0.0 {
            weights.iter().map(|(m, w)| m * w).sum::<f32>() / total
        } else {
            0.0
        };

        EngagementMetrics {
            markers,
            engagement_score: (1.0 - disengagement).clamp(0.0, 1.0),
            sessions,
            entries: entries.len(),
        }
    }

    /// Churn probability in [0, 1] for the current window.
    pub fn predict_churn_risk(&self, log: &RollingWindow<BehaviorLogEntry>) -> f32 {
        let metrics = self.calculate_engagement_metrics(log);
        self.analysis.calculate_risk(&metrics.markers)
    }

    /// Pick an intervention, if any condition holds and the cooldown has passed.
    ///
    /// - churn risk above threshold: engagement nudge
    /// - flow disrupted for `flow_disruption_limit` evaluations: ease difficulty
    ///   when anxious, recommend different content when bored
    /// - more than `reward_drought_limit` unrewarded actions: inject a reward
    pub fn should_trigger_intervention(&self, signals: &InterventionSignals) -> Option<InterventionDecision> {
        if let Some(since) = signals.actions_since_intervention {
            if since < self.config.intervention_cooldown {
                return None;
            }
        }

        if signals.churn_risk > self.config.risk_threshold {
            return Some(InterventionDecision {
                intervention_type: InterventionType::EngagementNudge,
                context: format!(
                    "churn risk {:.2} above {:.2}",
                    signals.churn_risk, self.config.risk_threshold
                ),
            });
        }

        if signals.flow_disruption_streak >= self.config.flow_disruption_limit {
            let intervention_type = match signals.flow_state {
                FlowState::Anxiety => InterventionType::EaseDifficulty,
                FlowState::Boredom | FlowState::Flow => InterventionType::RecommendContent,
            };
            return Some(InterventionDecision {
                intervention_type,
                context: format!(
                    "flow disrupted ({:?}) for {} evaluations",
                    signals.flow_state, signals.flow_disruption_streak
                ),
            });
        }

        if signals.actions_since_last_reward > self.config.reward_drought_limit {
            return Some(InterventionDecision {
                intervention_type: InterventionType::InjectReward,
                context: format!(
                    "{} actions without a reward",
                    signals.actions_since_last_reward
                ),
            });
        }

        None
    }
}
