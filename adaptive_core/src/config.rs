//! Engine configuration.
//!
//! Every tunable constant of the control loop lives here. All sections and
//! fields default, so a TOML document only needs to name what it overrides:
//!
//! ```toml
//! [difficulty]
//! base_difficulty = 40.0
//!
//! [churn]
//! risk_threshold = 0.7
//! ```

use player_model::WindowCapacities;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Weights for the performance score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformanceConfig {
    pub success_weight: f32,
    pub speed_weight: f32,
    pub efficiency_weight: f32,
    /// Encounter time (seconds) that earns a full speed factor.
    pub reference_time_secs: f32,
    /// Resource cost at which efficiency reaches zero.
    pub resource_budget: f32,
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            success_weight: 0.6,
            speed_weight: 0.2,
            efficiency_weight: 0.2,
            reference_time_secs: 30.0,
            resource_budget: 10.0,
        }
    }
}

/// Difficulty controller constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DifficultyConfig {
    pub base_difficulty: f32,
    /// Upper end of the difficulty scale; normalized challenge is `difficulty / scale`.
    pub difficulty_scale: f32,
    /// Desired success rate.
    pub target_performance: f32,
    /// Half-width of the band around base difficulty, as a fraction of base.
    pub band_fraction: f32,
    /// Weight of the previous difficulty in the moving average.
    pub smoothing_factor: f32,
    /// Spread of per-encounter difficulty around skill.
    pub encounter_sigma: f32,
    /// Same-direction outcomes needed before a micro-adjustment.
    pub streak_length: usize,
    /// Micro-adjustment size as a fraction of base difficulty.
    pub micro_step: f32,
    /// Floor for measured performance in the ratio.
    pub performance_epsilon: f32,
}

impl Default for DifficultyConfig {
    fn default() -> Self {
        Self {
            base_difficulty: 50.0,
            difficulty_scale: 100.0,
            target_performance: 0.65,
            band_fraction: 0.15,
            smoothing_factor: 0.7,
            encounter_sigma: 0.15,
            streak_length: 3,
            micro_step: 0.02,
            performance_epsilon: 0.01,
        }
    }
}

/// Flow score weights and rebalancing constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowConfig {
    pub pace_weight: f32,
    pub accuracy_weight: f32,
    pub error_weight: f32,
    pub enjoyment_weight: f32,
    pub frustration_weight: f32,
    pub motivation_weight: f32,
    /// Flow scores below this flag a disruption.
    pub disruption_threshold: f32,
    /// Ideal challenge-to-skill ratio.
    pub ideal_ratio: f32,
    /// Skill/challenge gaps within this tolerance count as balanced.
    pub gap_tolerance: f32,
    /// Largest normalized step a single rebalance may take.
    pub max_rebalance_step: f32,
    /// Mean of frustration and error rate at or above which a disrupted
    /// player reads as distressed.
    pub distress_threshold: f32,
    /// Distress only overrides the skill/challenge gap below this enjoyment.
    pub distress_enjoyment_ceiling: f32,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            pace_weight: 0.15,
            accuracy_weight: 0.20,
            error_weight: 0.15,
            enjoyment_weight: 0.20,
            frustration_weight: 0.15,
            motivation_weight: 0.15,
            disruption_threshold: 0.5,
            ideal_ratio: 1.0,
            gap_tolerance: 0.1,
            max_rebalance_step: 0.05,
            distress_threshold: 0.5,
            distress_enjoyment_ceiling: 0.5,
        }
    }
}

/// Reward schedule constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardConfig {
    /// Reward probability right after a reward.
    pub base_probability: f32,
    /// Added probability per unrewarded action.
    pub probability_increment: f32,
    pub probability_ceiling: f32,
    /// Asymptote of the rare-reward curve.
    pub rare_ceiling: f32,
    /// Dry-streak length at which the rare curve reaches ~63% of its ceiling.
    pub rare_horizon: f32,
    pub base_magnitude: f32,
    pub rare_multiplier: f32,
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            base_probability: 0.1,
            probability_increment: 0.05,
            probability_ceiling: 0.6,
            rare_ceiling: 0.05,
            rare_horizon: 20.0,
            base_magnitude: 10.0,
            rare_multiplier: 5.0,
        }
    }
}

/// Content variety constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VarietyConfig {
    /// Probability of recommending novel content instead of the favourite.
    pub exploration_rate: f32,
    /// Exposure added per action in a category.
    pub exposure_per_action: f32,
}

impl Default for VarietyConfig {
    fn default() -> Self {
        Self {
            exploration_rate: 0.2,
            exposure_per_action: 1.0,
        }
    }
}

/// Churn model weights and intervention triggers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChurnConfig {
    /// Idle gap that splits two sessions.
    pub session_gap_minutes: i64,
    /// Samples needed on each side of a trend comparison.
    pub min_trend_samples: usize,
    pub session_length_weight: f32,
    pub success_trend_weight: f32,
    pub error_trend_weight: f32,
    pub login_frequency_weight: f32,
    /// Logistic intercept; risk with all markers at zero is `sigmoid(bias)`.
    pub bias: f32,
    pub risk_threshold: f32,
    /// Consecutive disrupted flow evaluations that warrant an intervention.
    pub flow_disruption_limit: u32,
    /// Unrewarded actions that count as a reward drought.
    pub reward_drought_limit: u32,
    /// Actions to wait after an intervention before firing another.
    pub intervention_cooldown: u32,
}

impl Default for ChurnConfig {
    fn default() -> Self {
        Self {
            session_gap_minutes: 30,
            min_trend_samples: 2,
            session_length_weight: 2.0,
            success_trend_weight: 1.5,
            error_trend_weight: 1.5,
            login_frequency_weight: 2.0,
            bias: -3.0,
            risk_threshold: 0.6,
            flow_disruption_limit: 3,
            reward_drought_limit: 15,
            intervention_cooldown: 5,
        }
    }
}

/// Logarithmic display scaling constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressConfig {
    pub k: f32,
    pub s0: f32,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self { k: 0.5, s0: 0.01 }
    }
}

/// Complete engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct EngineConfig {
    pub performance: PerformanceConfig,
    pub difficulty: DifficultyConfig,
    pub flow: FlowConfig,
    pub reward: RewardConfig,
    pub variety: VarietyConfig,
    pub churn: ChurnConfig,
    pub progress: ProgressConfig,
    pub windows: WindowCapacities,
}

impl EngineConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse, and validate a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Check every constant against its admissible range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let p = &self.performance;
        non_negative("performance.success_weight", p.success_weight)?;
        non_negative("performance.speed_weight", p.speed_weight)?;
        non_negative("performance.efficiency_weight", p.efficiency_weight)?;
        positive("performance.reference_time_secs", p.reference_time_secs)?;
        positive("performance.resource_budget", p.resource_budget)?;

        let d = &self.difficulty;
        positive("difficulty.base_difficulty", d.base_difficulty)?;
        positive("difficulty.difficulty_scale", d.difficulty_scale)?;
        unit("difficulty.target_performance", d.target_performance)?;
        positive("difficulty.target_performance", d.target_performance)?;
        unit("difficulty.band_fraction", d.band_fraction)?;
        positive("difficulty.band_fraction", d.band_fraction)?;
        unit("difficulty.smoothing_factor", d.smoothing_factor)?;
        non_negative("difficulty.encounter_sigma", d.encounter_sigma)?;
        non_negative("difficulty.micro_step", d.micro_step)?;
        positive("difficulty.performance_epsilon", d.performance_epsilon)?;
        if d.streak_length == 0 {
            return Err(invalid("difficulty.streak_length", "must be at least 1"));
        }

        let f = &self.flow;
        for (field, weight) in [
            ("flow.pace_weight", f.pace_weight),
            ("flow.accuracy_weight", f.accuracy_weight),
            ("flow.error_weight", f.error_weight),
            ("flow.enjoyment_weight", f.enjoyment_weight),
            ("flow.frustration_weight", f.frustration_weight),
            ("flow.motivation_weight", f.motivation_weight),
        ] {
            non_negative(field, weight)?;
        }
        unit("flow.disruption_threshold", f.disruption_threshold)?;
        positive("flow.ideal_ratio", f.ideal_ratio)?;
        unit("flow.gap_tolerance", f.gap_tolerance)?;
        unit("flow.max_rebalance_step", f.max_rebalance_step)?;
        unit("flow.distress_threshold", f.distress_threshold)?;
        unit("flow.distress_enjoyment_ceiling", f.distress_enjoyment_ceiling)?;

        let r = &self.reward;
        unit("reward.base_probability", r.base_probability)?;
        unit("reward.probability_increment", r.probability_increment)?;
        unit("reward.probability_ceiling", r.probability_ceiling)?;
        unit("reward.rare_ceiling", r.rare_ceiling)?;
        positive("reward.rare_horizon", r.rare_horizon)?;
        non_negative("reward.base_magnitude", r.base_magnitude)?;
        non_negative("reward.rare_multiplier", r.rare_multiplier)?;

        let v = &self.variety;
        unit("variety.exploration_rate", v.exploration_rate)?;
        non_negative("variety.exposure_per_action", v.exposure_per_action)?;

        let c = &self.churn;
        if c.session_gap_minutes <= 0 {
            return Err(invalid("churn.session_gap_minutes", "must be positive"));
        }
        if c.min_trend_samples == 0 {
            return Err(invalid("churn.min_trend_samples", "must be at least 1"));
        }
        non_negative("churn.session_length_weight", c.session_length_weight)?;
        non_negative("churn.success_trend_weight", c.success_trend_weight)?;
        non_negative("churn.error_trend_weight", c.error_trend_weight)?;
        non_negative("churn.login_frequency_weight", c.login_frequency_weight)?;
        if !c.bias.is_finite() {
            return Err(invalid("churn.bias", "must be finite"));
        }
        unit("churn.risk_threshold", c.risk_threshold)?;

        positive("progress.k", self.progress.k)?;
        positive("progress.s0", self.progress.s0)?;

        let w = &self.windows;
        if w.performance == 0 || w.behavior == 0 || w.interventions == 0 {
            return Err(invalid("windows", "capacities must be at least 1"));
        }

        Ok(())
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

fn non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(invalid(field, format!("{} must be finite and >= 0", value)))
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(field, format!("{} must be finite and > 0", value)))
    }
}

fn unit(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(invalid(field, format!("{} must lie in [0, 1]", value)))
    }
}
