//! Performance Tracker - weighted score over the rolling encounter window.

use player_model::{PerformanceMetrics, PerformanceRecord};
use serde::{Deserialize, Serialize};

use crate::config::PerformanceConfig;

/// Breakdown of the performance score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerformanceBreakdown {
    pub success_rate: f32,
    pub speed_factor: f32,
    pub efficiency_factor: f32,
    pub score: f32,
}

/// Appends encounter outcomes and scores the window.
pub struct PerformanceTracker {
    config: PerformanceConfig,
}

impl PerformanceTracker {
    pub fn new(config: PerformanceConfig) -> Self {
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self::new(PerformanceConfig::default())
    }

    /// Append an encounter (evicting the oldest at capacity) and refresh the score.
    pub fn add_encounter(&self, metrics: &mut PerformanceMetrics, record: PerformanceRecord) -> f32 {
        metrics.history.push(record);
        metrics.score = self.calculate_score(metrics);
        metrics.score
    }

    /// Weighted score in [0, 1]; 0.0 on an empty history.
    pub fn calculate_score(&self, metrics: &PerformanceMetrics) -> f32 {
        self.breakdown(metrics).score
    }

    /// Each factor is clamped to [0, 1] before weighting.
    pub fn breakdown(&self, metrics: &PerformanceMetrics) -> PerformanceBreakdown {
        if metrics.history.is_empty() {
            return PerformanceBreakdown {
                success_rate: 0.0,
                speed_factor: 0.0,
                efficiency_factor: 0.0,
                score: 0.0,
            };
        }

        let success_rate = metrics.success_rate().clamp(0.0, 1.0);

        let mean_time = metrics.mean_time_secs().max(f32::EPSILON);
        let speed_factor = (self.config.reference_time_secs / mean_time).clamp(0.0, 1.0);

        let budget = self.config.resource_budget.max(f32::EPSILON);
        let efficiency_factor = (1.0 - metrics.mean_resource_cost() / budget).clamp(0.0, 1.0);

        let total_weight =
            self.config.success_weight + self.config.speed_weight + self.config.efficiency_weight;
        let score = if total_weight > 0.0 {
            (success_rate * self.config.success_weight
                + speed_factor * self.config.speed_weight
                + efficiency_factor * self.config.efficiency_weight)
                / total_weight
        } else {
            0.0
        };

        PerformanceBreakdown {
            success_rate,
            speed_factor,
            efficiency_factor,
            score: score.clamp(0.0, 1.0),
        }
    }
}
