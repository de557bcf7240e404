//! Logistic churn-risk model.

use serde::{Deserialize, Serialize};

use super::ChurnMarkers;
use crate::config::ChurnConfig;

/// Fixed-weight logistic combination of churn markers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChurnRiskAnalysis {
    pub session_length_weight: f32,
    pub success_trend_weight: f32,
    pub error_trend_weight: f32,
    pub login_frequency_weight: f32,
    pub bias: f32,
}

impl ChurnRiskAnalysis {
    pub fn from_config(config: &ChurnConfig) -> Self {
        Self {
            session_length_weight: config.session_length_weight,
            success_trend_weight: config.success_trend_weight,
            error_trend_weight: config.error_trend_weight,
            login_frequency_weight: config.login_frequency_weight,
            bias: config.bias,
        }
    }

    /// `sigmoid(bias + sum(weight * marker))` over markers clamped to [0, 1].
    pub fn calculate_risk(&self, markers: &ChurnMarkers) -> f32 {
        let m = markers.clamped();
        let z = self.bias
            + self.session_length_weight * m.session_length_decline
            + self.success_trend_weight * m.success_decline
            + self.error_trend_weight * m.error_increase
            + self.login_frequency_weight * m.login_frequency_decline;
        sigmoid(z)
    }

    /// Risk with every marker at zero.
    pub fn baseline_risk(&self) -> f32 {
        sigmoid(self.bias)
    }
}

impl Default for ChurnRiskAnalysis {
    fn default() -> Self {
        Self::from_config(&ChurnConfig::default())
    }
}

fn sigmoid(z: f32) -> f32 {
    if z.is_nan() {
        return 0.5;
    }
    (1.0 / (1.0 + (-z).exp())).clamp(0.0, 1.0)
}
