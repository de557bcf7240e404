//! Content Variety Optimizer - novelty decay and explore/exploit recommendation.

use player_model::{ContentCategory, ContentExposureTable, EngagementSnapshot, ValidationError};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::VarietyConfig;

/// Which branch of the epsilon-greedy rule produced a recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContentStrategy {
    /// Least-exposed category.
    Explore,
    /// Best-liked category.
    Exploit,
}

pub struct ContentVarietyOptimizer {
    config: VarietyConfig,
}

impl ContentVarietyOptimizer {
    pub fn new(config: VarietyConfig) -> Self {
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self::new(VarietyConfig::default())
    }

    /// `1 / (1 + exposure)`: 1.0 for unseen content, strictly decreasing with exposure.
    pub fn calculate_content_novelty(
        &self,
        table: &ContentExposureTable,
        category: ContentCategory,
    ) -> f32 {
        1.0 / (1.0 + table.exposure(category))
    }

    /// Explore with probability `exploration_rate`, otherwise exploit.
    pub fn should_exploit_or_explore<R: Rng + ?Sized>(&self, rng: &mut R) -> ContentStrategy {
        if rng.gen::<f32>() < self.config.exploration_rate {
            ContentStrategy::Explore
        } else {
            ContentStrategy::Exploit
        }
    }

    /// Apply a strategy to the table.
    ///
    /// Exploit picks the highest mean affinity, breaking ties by novelty; with
    /// no affinity data yet it falls back to exploring.
    pub fn recommend_content(
        &self,
        table: &ContentExposureTable,
        strategy: ContentStrategy,
    ) -> ContentCategory {
        match strategy {
            ContentStrategy::Explore => table.least_exposed(),
            ContentStrategy::Exploit => self
                .favourite(table)
                .unwrap_or_else(|| table.least_exposed()),
        }
    }

    /// Roll the strategy and recommend.
    pub fn recommend<R: Rng + ?Sized>(
        &self,
        table: &ContentExposureTable,
        rng: &mut R,
    ) -> (ContentCategory, ContentStrategy) {
        let strategy = self.should_exploit_or_explore(rng);
        (self.recommend_content(table, strategy), strategy)
    }

    /// Add exposure to a category. Exposure never decreases.
    pub fn update_content_exposure(
        &self,
        table: &mut ContentExposureTable,
        category: ContentCategory,
        amount: f32,
    ) -> Result<f32, ValidationError> {
        table.add_exposure(category, amount)
    }

    /// Record one play of a category: exposure plus a satisfaction sample.
    pub fn record_play(
        &self,
        table: &mut ContentExposureTable,
        category: ContentCategory,
        succeeded: bool,
        snapshot: Option<&EngagementSnapshot>,
    ) -> Result<(), ValidationError> {
        self.update_content_exposure(table, category, self.config.exposure_per_action)?;
        table.record_affinity(category, satisfaction(succeeded, snapshot))
    }

    fn favourite(&self, table: &ContentExposureTable) -> Option<ContentCategory> {
        let mut best: Option<(ContentCategory, f32, f32)> = None;
        for category in ContentCategory::ALL {
            let Some(affinity) = table.mean_affinity(category) else {
                continue;
            };
            let novelty = self.calculate_content_novelty(table, category);
            let better = match best {
                None => true,
                Some((_, best_affinity, best_novelty)) => {
                    affinity > best_affinity || (affinity == best_affinity && novelty > best_novelty)
                }
            };
            if better {
                best = Some((category, affinity, novelty));
            }
        }
        best.map(|(category, _, _)| category)
    }
}

/// Satisfaction sample in [0, 1]: the outcome, averaged with enjoyment when known.
pub fn satisfaction(succeeded: bool, snapshot: Option<&EngagementSnapshot>) -> f32 {
    let outcome = if succeeded { 1.0 } else { 0.0 };
    match snapshot {
        Some(s) => (0.5 * outcome + 0.5 * s.enjoyment).clamp(0.0, 1.0),
        None => outcome,
    }
}
