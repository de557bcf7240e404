//! Difficulty Controller - proportional re-targeting inside a hard band.
//!
//! One adjustment runs in three stages:
//! 1. **Target**: `base * (0.7 + 0.3 * target_performance / measured)`, clamped to the band
//! 2. **Smoothing**: exponential moving average against the current difficulty
//! 3. **Clamp**: the smoothed value is clamped again before it is stored
//!
//! Streaks of identical outcomes additionally nudge the difficulty by a small
//! fixed step, and per-encounter difficulty is sampled around the skill estimate.

mod micro;

pub use micro::*;

use chrono::{DateTime, Utc};
use player_model::{DifficultyState, PerformanceRecord};
use rand::Rng;
use rand_distr::{Distribution, Normal};

use crate::config::DifficultyConfig;

/// Result of one proportional adjustment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DifficultyAdjustment {
    pub previous: f32,
    /// Band-clamped output of the proportional formula.
    pub target: f32,
    /// Value stored after smoothing.
    pub applied: f32,
}

pub struct DifficultyController {
    config: DifficultyConfig,
}

impl DifficultyController {
    pub fn new(config: DifficultyConfig) -> Self {
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self::new(DifficultyConfig::default())
    }

    pub fn config(&self) -> &DifficultyConfig {
        &self.config
    }

    /// Proportional target for the measured performance, clamped to the band.
    ///
    /// Performance is floored to `performance_epsilon` so the ratio never
    /// divides by zero or a negative number.
    pub fn calculate_difficulty_adjustment(
        &self,
        state: &DifficultyState,
        measured_performance: f32,
    ) -> f32 {
        let measured = if measured_performance.is_finite() {
            measured_performance.max(self.config.performance_epsilon)
        } else {
            self.config.performance_epsilon
        };

        let ratio = self.config.target_performance / measured;
        let raw = state.base_difficulty * (0.7 + 0.3 * ratio);
        state.clamp_to_band(raw, self.config.band_fraction)
    }

    /// `smoothing * current + (1 - smoothing) * new`.
    ///
    /// A factor of 1.0 keeps the current difficulty, 0.0 takes the new one.
    pub fn apply_statistical_smoothing(
        &self,
        state: &DifficultyState,
        new_difficulty: f32,
        smoothing_factor: f32,
    ) -> f32 {
        let factor = if smoothing_factor.is_nan() {
            self.config.smoothing_factor
        } else {
            smoothing_factor.clamp(0.0, 1.0)
        };
        factor * state.current_difficulty + (1.0 - factor) * new_difficulty
    }

    /// Run target, smoothing, and clamp, and store the result.
    pub fn adjust(
        &self,
        state: &mut DifficultyState,
        measured_performance: f32,
        now: DateTime<Utc>,
    ) -> DifficultyAdjustment {
        let previous = state.current_difficulty;
        let target = self.calculate_difficulty_adjustment(state, measured_performance);
        let smoothed = self.apply_statistical_smoothing(state, target, self.config.smoothing_factor);
        let applied = self.set_difficulty(state, smoothed, now);

        tracing::debug!(
            "Difficulty re-targeted: performance {:.3}, {:.2} -> {:.2} (target {:.2})",
            measured_performance,
            previous,
            applied,
            target
        );

        DifficultyAdjustment {
            previous,
            target,
            applied,
        }
    }

    /// Store a difficulty, clamped to the band. Returns the stored value.
    pub fn set_difficulty(&self, state: &mut DifficultyState, value: f32, now: DateTime<Utc>) -> f32 {
        let value = if value.is_finite() {
            value
        } else {
            state.current_difficulty
        };
        state.current_difficulty = state.clamp_to_band(value, self.config.band_fraction);
        state.last_adjustment_at = Some(now);
        state.current_difficulty
    }

    /// A micro-adjustment when the newest outcomes form a streak of at least
    /// `streak_length`; None for shorter runs.
    pub fn should_apply_micro_adjustment(
        &self,
        state: &DifficultyState,
        recent_encounters: &[PerformanceRecord],
    ) -> Option<MicroAdjustment> {
        let streak = trailing_streak(recent_encounters)?;
        if streak.length < self.config.streak_length {
            return None;
        }
        Some(MicroAdjustment {
            streak,
            delta: streak.direction.sign() * self.config.micro_step * state.base_difficulty,
        })
    }

    /// Apply a micro-adjustment, staying inside the band.
    pub fn apply_micro_adjustment(
        &self,
        state: &mut DifficultyState,
        adjustment: &MicroAdjustment,
        now: DateTime<Utc>,
    ) -> f32 {
        let applied = self.set_difficulty(state, state.current_difficulty + adjustment.delta, now);
        tracing::debug!(
            "Micro-adjustment after {} {:?}: delta {:+.2}, now {:.2}",
            adjustment.streak.length,
            adjustment.streak.direction,
            adjustment.delta,
            applied
        );
        applied
    }

    /// Per-encounter normalized difficulty drawn from `Normal(skill, sigma)`,
    /// clamped to [0, 1].
    pub fn generate_encounter_difficulty<R: Rng + ?Sized>(
        &self,
        player_skill: f32,
        sigma: f32,
        rng: &mut R,
    ) -> f32 {
        let center = if player_skill.is_finite() {
            player_skill.clamp(0.0, 1.0)
        } else {
            0.5
        };
        let sample = match Normal::new(center, sigma.abs()) {
            Ok(normal) => normal.sample(rng),
            Err(_) => center,
        };
        if sample.is_finite() {
            sample.clamp(0.0, 1.0)
        } else {
            center
        }
    }

    /// Convert a difficulty value to a [0, 1] challenge level.
    pub fn to_normalized(&self, difficulty: f32) -> f32 {
        (difficulty / self.config.difficulty_scale).clamp(0.0, 1.0)
    }

    /// Convert a [0, 1] challenge level back to difficulty units.
    pub fn from_normalized(&self, challenge: f32) -> f32 {
        challenge * self.config.difficulty_scale
    }
}
