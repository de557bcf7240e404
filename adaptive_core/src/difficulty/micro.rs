//! Streak detection for micro-adjustments.

use player_model::PerformanceRecord;
use serde::{Deserialize, Serialize};

/// Direction of a run of identical outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StreakDirection {
    Successes,
    Failures,
}

impl StreakDirection {
    /// +1.0 for successes (harder), -1.0 for failures (easier).
    pub fn sign(&self) -> f32 {
        match self {
            StreakDirection::Successes => 1.0,
            StreakDirection::Failures => -1.0,
        }
    }
}

/// A trailing run of same-direction outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Streak {
    pub direction: StreakDirection,
    pub length: usize,
}

/// A micro-adjustment the controller decided to apply.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MicroAdjustment {
    pub streak: Streak,
    /// Signed change in difficulty units.
    pub delta: f32,
}

/// Length and direction of the run ending at the newest record.
pub fn trailing_streak(records: &[PerformanceRecord]) -> Option<Streak> {
    let last = records.last()?;
    let length = records
        .iter()
        .rev()
        .take_while(|r| r.succeeded == last.succeeded)
        .count();
    let direction = if last.succeeded {
        StreakDirection::Successes
    } else {
        StreakDirection::Failures
    };
    Some(Streak { direction, length })
}
