//! Reward Scheduler - variable-ratio rewards with a saturating rare-reward curve.

use player_model::{ActionType, RewardScheduleState, RewardTier};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::RewardConfig;

/// What the action was worth, as seen by the scheduler.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RewardContext {
    pub action_type: ActionType,
    /// Normalized challenge of the encounter, 0.0 to 1.0.
    pub difficulty: f32,
    /// Seconds invested in the action.
    pub time_investment_secs: f32,
    /// Skill the action demanded, 0.0 to 1.0.
    pub skill_required: f32,
}

/// A granted reward.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RewardEvent {
    pub tier: RewardTier,
    pub magnitude: f32,
    pub action_type: ActionType,
    /// Probability the winning roll was made against.
    pub probability: f32,
}

pub struct RewardScheduler {
    config: RewardConfig,
}

impl RewardScheduler {
    pub fn new(config: RewardConfig) -> Self {
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self::new(RewardConfig::default())
    }

    /// Variable-ratio probability: grows linearly with the unrewarded streak,
    /// capped at `probability_ceiling`.
    pub fn reward_probability(&self, actions_since_last_reward: u32) -> f32 {
        let growth = self.config.probability_increment * actions_since_last_reward as f32;
        (self.config.base_probability + growth).min(self.config.probability_ceiling)
    }

    /// Roll the variable-ratio schedule once.
    pub fn should_reward<R: Rng + ?Sized>(&self, actions_since_last_reward: u32, rng: &mut R) -> bool {
        rng.gen::<f32>() < self.reward_probability(actions_since_last_reward)
    }

    /// `ceiling * (1 - e^(-n / horizon))`: zero at n = 0, non-decreasing, and
    /// strictly below the ceiling (0.05 by default) for every n.
    ///
    /// Evaluated in f64; once the curve rounds up to the ceiling in f32 the
    /// result is pinned to the largest f32 below it.
    pub fn calculate_rare_reward_probability(&self, encounters_since_last: u32) -> f32 {
        let ceiling = self.config.rare_ceiling;
        let n = encounters_since_last as f64;
        let horizon = self.config.rare_horizon as f64;
        let p = (ceiling as f64 * (1.0 - (-n / horizon).exp())) as f32;
        if p >= ceiling {
            just_below(ceiling)
        } else {
            p.max(0.0)
        }
    }

    /// Decide whether this action pays out.
    ///
    /// One roll covers both sources: the rare band `[0, p_rare)` is checked
    /// first, then the common band of width `(1 - p_rare) * p_common`. A rare
    /// reward resets both counters, a common one resets only the action
    /// counter, and a miss increments both.
    pub fn process_action<R: Rng + ?Sized>(
        &self,
        state: &mut RewardScheduleState,
        context: &RewardContext,
        rng: &mut R,
    ) -> Option<RewardEvent> {
        let rare_p = self.calculate_rare_reward_probability(state.encounters_since_rare_reward);
        let common_p = self.reward_probability(state.actions_since_last_reward);
        let roll: f32 = rng.gen();

        let (tier, probability) = if roll < rare_p {
            (RewardTier::Rare, rare_p)
        } else if roll < rare_p + (1.0 - rare_p) * common_p {
            (RewardTier::Common, common_p)
        } else {
            state.actions_since_last_reward = state.actions_since_last_reward.saturating_add(1);
            state.encounters_since_rare_reward = state.encounters_since_rare_reward.saturating_add(1);
            return None;
        };

        match tier {
            RewardTier::Rare => {
                state.actions_since_last_reward = 0;
                state.encounters_since_rare_reward = 0;
            }
            RewardTier::Common => {
                state.actions_since_last_reward = 0;
                state.encounters_since_rare_reward = state.encounters_since_rare_reward.saturating_add(1);
            }
        }

        let event = RewardEvent {
            tier,
            magnitude: self.magnitude(tier, context),
            action_type: context.action_type,
            probability,
        };
        tracing::debug!(
            "Reward granted: {:?} x{:.1} for {:?} (p = {:.3})",
            event.tier,
            event.magnitude,
            event.action_type,
            event.probability
        );
        Some(event)
    }

    /// Harder, more skilled, and longer actions pay more; time counts up to ten minutes.
    pub fn magnitude(&self, tier: RewardTier, context: &RewardContext) -> f32 {
        let difficulty = context.difficulty.clamp(0.0, 1.0);
        let skill = context.skill_required.clamp(0.0, 1.0);
        let minutes = (context.time_investment_secs.max(0.0) / 60.0).min(10.0);

        let base = self.config.base_magnitude
            * (1.0 + difficulty)
            * (1.0 + 0.5 * skill)
            * (1.0 + 0.05 * minutes);

        match tier {
            RewardTier::Common => base,
            RewardTier::Rare => base * self.config.rare_multiplier,
        }
    }
}

/// Largest f32 strictly below a non-negative `value`; 0.0 stays 0.0.
fn just_below(value: f32) -> f32 {
    if value > 0.0 {
        f32::from_bits(value.to_bits() - 1)
    } else {
        0.0
    }
}
