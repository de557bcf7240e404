//! Record definitions for the per-player state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

use super::RollingWindow;
use crate::telemetry::{ActionType, FlowState, InterventionType};

/// Outcome of a single encounter. Immutable once recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceRecord {
    pub succeeded: bool,
    pub time_taken: Duration,
    pub resource_cost: f32,
    pub timestamp: DateTime<Utc>,
}

impl PerformanceRecord {
    pub fn new(succeeded: bool, time_taken: Duration, resource_cost: f32) -> Self {
        Self {
            succeeded,
            time_taken,
            resource_cost,
            timestamp: Utc::now(),
        }
    }

    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }
}

/// Rolling encounter history and the score derived from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub history: RollingWindow<PerformanceRecord>,
    /// Weighted score in [0, 1], recomputed on every append.
    pub score: f32,
}

impl PerformanceMetrics {
    pub fn new(capacity: usize) -> Self {
        Self {
            history: RollingWindow::new(capacity),
            score: 0.0,
        }
    }

    /// Fraction of successful encounters (0.0 when empty).
    pub fn success_rate(&self) -> f32 {
        if self.history.is_empty() {
            return 0.0;
        }
        let successes = self.history.iter().filter(|r| r.succeeded).count();
        successes as f32 / self.history.len() as f32
    }

    /// Mean time per encounter in seconds (0.0 when empty).
    pub fn mean_time_secs(&self) -> f32 {
        if self.history.is_empty() {
            return 0.0;
        }
        let total: f32 = self.history.iter().map(|r| r.time_taken.as_secs_f32()).sum();
        total / self.history.len() as f32
    }

    /// Mean resource cost per encounter (0.0 when empty).
    pub fn mean_resource_cost(&self) -> f32 {
        if self.history.is_empty() {
            return 0.0;
        }
        let total: f32 = self.history.iter().map(|r| r.resource_cost).sum();
        total / self.history.len() as f32
    }
}

/// Difficulty controller state.
///
/// `current_difficulty` never leaves the band around `base_difficulty`; the
/// controller re-clamps after every write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DifficultyState {
    pub base_difficulty: f32,
    pub current_difficulty: f32,
    pub last_adjustment_at: Option<DateTime<Utc>>,
}

impl DifficultyState {
    pub fn new(base_difficulty: f32) -> Self {
        Self {
            base_difficulty,
            current_difficulty: base_difficulty,
            last_adjustment_at: None,
        }
    }

    /// Lower and upper bound of the band for the given fraction.
    pub fn band(&self, fraction: f32) -> (f32, f32) {
        let half_width = self.base_difficulty.abs() * fraction;
        (
            self.base_difficulty - half_width,
            self.base_difficulty + half_width,
        )
    }

    /// Clamp a candidate difficulty into the band.
    pub fn clamp_to_band(&self, value: f32, fraction: f32) -> f32 {
        let (low, high) = self.band(fraction);
        value.clamp(low, high)
    }
}

/// Counters driving the reward schedule. Each only grows until its reward fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RewardScheduleState {
    pub actions_since_last_reward: u32,
    pub encounters_since_rare_reward: u32,
}

/// One entry of the behaviour window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BehaviorLogEntry {
    pub action_type: ActionType,
    pub timestamp: DateTime<Utc>,
    /// None for session markers.
    pub succeeded: Option<bool>,
    /// Error-rate reading from the engagement snapshot, when one was supplied.
    pub error_rate: Option<f32>,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl BehaviorLogEntry {
    pub fn new(action_type: ActionType, timestamp: DateTime<Utc>) -> Self {
        Self {
            action_type,
            timestamp,
            succeeded: None,
            error_rate: None,
            metadata: HashMap::new(),
        }
    }

    pub fn with_outcome(mut self, succeeded: bool) -> Self {
        self.succeeded = Some(succeeded);
        self
    }

    pub fn with_error_rate(mut self, error_rate: f32) -> Self {
        self.error_rate = Some(error_rate);
        self
    }

    pub fn with_metadata(mut self, metadata: HashMap<String, serde_json::Value>) -> Self {
        self.metadata.extend(metadata);
        self
    }
}

/// Audit record of a fired intervention.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterventionRecord {
    pub intervention_type: InterventionType,
    /// Human-readable reason, e.g. "churn risk 0.72".
    pub context: String,
    pub timestamp: DateTime<Utc>,
}

/// Flow evaluation carried across actions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct FlowTracking {
    pub last_score: Option<f32>,
    pub last_state: FlowState,
    /// Consecutive evaluations that flagged a disruption.
    pub disruption_streak: u32,
}

impl FlowTracking {
    /// Record one evaluation.
    pub fn observe(&mut self, score: f32, state: FlowState, disrupted: bool) {
        self.last_score = Some(score);
        self.last_state = state;
        if disrupted {
            self.disruption_streak = self.disruption_streak.saturating_add(1);
        } else {
            self.disruption_streak = 0;
        }
    }
}
