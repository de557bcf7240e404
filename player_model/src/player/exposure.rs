//! Exposure and affinity bookkeeping per content category.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::ValidationError;
use crate::telemetry::ContentCategory;

/// Running satisfaction total for one category.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Affinity {
    pub total: f32,
    pub samples: u32,
}

impl Affinity {
    pub fn mean(&self) -> Option<f32> {
        if self.samples == 0 {
            None
        } else {
            Some(self.total / self.samples as f32)
        }
    }
}

/// Tracks how much of each content category a player has seen.
///
/// Exposure only accumulates; novelty decay is derived from it, never
/// written back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ContentExposureTable {
    exposure: BTreeMap<ContentCategory, f32>,
    affinity: BTreeMap<ContentCategory, Affinity>,
}

impl ContentExposureTable {
    /// Create a new empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Accumulated exposure (0.0 for unseen categories).
    pub fn exposure(&self, category: ContentCategory) -> f32 {
        self.exposure.get(&category).copied().unwrap_or(0.0)
    }

    /// Add exposure to a category. Negative or non-finite amounts are rejected.
    pub fn add_exposure(
        &mut self,
        category: ContentCategory,
        amount: f32,
    ) -> Result<f32, ValidationError> {
        let amount = ValidationError::check_non_negative("exposure_amount", amount)?;
        let current = self.exposure.entry(category).or_insert(0.0);
        *current += amount;
        Ok(*current)
    }

    /// Record a satisfaction sample (0.0 to 1.0) for a category.
    pub fn record_affinity(
        &mut self,
        category: ContentCategory,
        satisfaction: f32,
    ) -> Result<(), ValidationError> {
        let satisfaction = ValidationError::check_unit("satisfaction", satisfaction)?;
        let entry = self.affinity.entry(category).or_default();
        entry.total += satisfaction;
        entry.samples = entry.samples.saturating_add(1);
        Ok(())
    }

    /// Mean satisfaction for a category, if any samples exist.
    pub fn mean_affinity(&self, category: ContentCategory) -> Option<f32> {
        self.affinity.get(&category).and_then(Affinity::mean)
    }

    /// The least-exposed category; ties resolve in declaration order.
    pub fn least_exposed(&self) -> ContentCategory {
        let mut best = ContentCategory::ALL[0];
        let mut best_exposure = self.exposure(best);
        for category in ContentCategory::ALL.iter().skip(1) {
            let exposure = self.exposure(*category);
            if exposure < best_exposure {
                best = *category;
                best_exposure = exposure;
            }
        }
        best
    }

    /// Total exposure across all categories.
    pub fn total_exposure(&self) -> f32 {
        self.exposure.values().sum()
    }

    /// Exposure for every category, unseen ones included, in declaration order.
    pub fn snapshot(&self) -> BTreeMap<ContentCategory, f32> {
        ContentCategory::ALL
            .iter()
            .map(|c| (*c, self.exposure(*c)))
            .collect()
    }
}
