//! Validation and persistence errors raised at the player-model boundary.

use thiserror::Error;

/// Rejection of a caller-supplied value. Values are reported as received,
/// never clamped first.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("{field} = {value} is outside [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: f32,
        min: f32,
        max: f32,
    },

    #[error("{field} is not a finite number")]
    NotFinite { field: &'static str },

    #[error("{field} = {value} must not be negative")]
    Negative { field: &'static str, value: f32 },
}

impl ValidationError {
    /// Check that a normalized scalar lies in [0, 1].
    pub fn check_unit(field: &'static str, value: f32) -> Result<f32, ValidationError> {
        Self::check_range(field, value, 0.0, 1.0)
    }

    /// Check that a value is finite and lies in `[min, max]`.
    pub fn check_range(
        field: &'static str,
        value: f32,
        min: f32,
        max: f32,
    ) -> Result<f32, ValidationError> {
        if !value.is_finite() {
            return Err(ValidationError::NotFinite { field });
        }
        if value < min || value > max {
            return Err(ValidationError::OutOfRange {
                field,
                value,
                min,
                max,
            });
        }
        Ok(value)
    }

    /// Check that a value is finite and not negative.
    pub fn check_non_negative(field: &'static str, value: f32) -> Result<f32, ValidationError> {
        if !value.is_finite() {
            return Err(ValidationError::NotFinite { field });
        }
        if value < 0.0 {
            return Err(ValidationError::Negative { field, value });
        }
        Ok(value)
    }
}

/// Failures of the external persistence collaborator.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Storage error: {0}")]
    Storage(String),
}
