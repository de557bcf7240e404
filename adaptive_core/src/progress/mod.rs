//! Progress Visualization - perceptual scaling for display only.
//!
//! Nothing here feeds back into the control loop.

use crate::config::ProgressConfig;

pub struct ProgressVisualizer {
    config: ProgressConfig,
}

impl ProgressVisualizer {
    pub fn new(config: ProgressConfig) -> Self {
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self::new(ProgressConfig::default())
    }

    /// `k * ln(progress / s0)` with the configured constants.
    pub fn scale(&self, progress: f32) -> f32 {
        apply_logarithmic_scaling(progress, self.config.k, self.config.s0)
    }

    /// Map a completion fraction onto a perceptual [0, 1] bar.
    ///
    /// Fractions at or below `s0` show as empty, 1.0 shows as full.
    pub fn scale_completion(&self, fraction: f32) -> f32 {
        let fraction = if fraction.is_finite() {
            fraction.clamp(0.0, 1.0)
        } else {
            0.0
        };
        let full = self.scale(1.0);
        if full <= 0.0 {
            return fraction;
        }
        (self.scale(fraction) / full).clamp(0.0, 1.0)
    }

    /// Perceptual fill of an experience bar.
    pub fn scale_experience(&self, current: f32, required: f32) -> f32 {
        if required.is_nan() || required <= 0.0 {
            return 1.0;
        }
        self.scale_completion(current / required)
    }
}

/// `scaled = k * ln(progress / s0)`, with `progress` floored to `s0`.
///
/// Non-finite progress is treated as `s0`, so the result is never NaN for
/// positive `k` and `s0`.
pub fn apply_logarithmic_scaling(progress: f32, k: f32, s0: f32) -> f32 {
    let floored = if progress.is_finite() {
        progress.max(s0)
    } else {
        s0
    };
    k * (floored / s0).ln()
}
