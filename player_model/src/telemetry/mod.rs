//! Inbound telemetry: action kinds, content categories, and the engagement snapshot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::ValidationError;

/// Kinds of player actions reported by the surrounding game systems.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionType {
    // Encounters
    Combat,
    Exploration,
    Dialogue,
    Puzzle,
    Crafting,
    Quest,
    Trade,

    // Session markers
    SessionStart,
    SessionEnd,
}

impl ActionType {
    /// Session markers carry no encounter outcome.
    pub fn is_session_marker(&self) -> bool {
        matches!(self, ActionType::SessionStart | ActionType::SessionEnd)
    }

    /// The content category this action exercises, if any.
    pub fn content_category(&self) -> Option<ContentCategory> {
        match self {
            ActionType::Combat => Some(ContentCategory::Combat),
            ActionType::Exploration => Some(ContentCategory::Exploration),
            ActionType::Dialogue | ActionType::Trade => Some(ContentCategory::Social),
            ActionType::Puzzle => Some(ContentCategory::Puzzle),
            ActionType::Crafting => Some(ContentCategory::Crafting),
            ActionType::Quest => Some(ContentCategory::Narrative),
            ActionType::SessionStart | ActionType::SessionEnd => None,
        }
    }
}

/// Content categories the variety optimizer balances between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ContentCategory {
    Combat,
    Exploration,
    Social,
    Puzzle,
    Crafting,
    Narrative,
}

impl ContentCategory {
    /// Every category, in declaration order (used for deterministic tie-breaks).
    pub const ALL: [ContentCategory; 6] = [
        ContentCategory::Combat,
        ContentCategory::Exploration,
        ContentCategory::Social,
        ContentCategory::Puzzle,
        ContentCategory::Crafting,
        ContentCategory::Narrative,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContentCategory::Combat => "combat",
            ContentCategory::Exploration => "exploration",
            ContentCategory::Social => "social",
            ContentCategory::Puzzle => "puzzle",
            ContentCategory::Crafting => "crafting",
            ContentCategory::Narrative => "narrative",
        }
    }
}

impl std::fmt::Display for ContentCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Corrective directives the churn monitor can issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum InterventionType {
    EaseDifficulty,
    InjectReward,
    RecommendContent,
    EngagementNudge,
}

/// Reward tiers granted by the reward scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RewardTier {
    /// Variable-ratio reward.
    Common,
    /// Pity-curve reward.
    Rare,
}

/// Challenge/skill classification of an engagement evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum FlowState {
    #[default]
    Flow,
    /// Challenge below skill.
    Boredom,
    /// Challenge above skill.
    Anxiety,
}

/// Normalized engagement readings derived externally from UI/session telemetry.
///
/// Every field must lie in [0, 1]. Used transiently for one flow evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EngagementSnapshot {
    pub actions_per_minute: f32,
    pub decision_accuracy: f32,
    pub error_rate: f32,
    pub enjoyment: f32,
    pub frustration: f32,
    pub motivation: f32,
}

impl Default for EngagementSnapshot {
    fn default() -> Self {
        Self {
            actions_per_minute: 0.5,
            decision_accuracy: 0.5,
            error_rate: 0.5,
            enjoyment: 0.5,
            frustration: 0.5,
            motivation: 0.5,
        }
    }
}

impl EngagementSnapshot {
    /// Reject any reading outside [0, 1].
    pub fn validate(&self) -> Result<(), ValidationError> {
        ValidationError::check_unit("actions_per_minute", self.actions_per_minute)?;
        ValidationError::check_unit("decision_accuracy", self.decision_accuracy)?;
        ValidationError::check_unit("error_rate", self.error_rate)?;
        ValidationError::check_unit("enjoyment", self.enjoyment)?;
        ValidationError::check_unit("frustration", self.frustration)?;
        ValidationError::check_unit("motivation", self.motivation)?;
        Ok(())
    }
}

/// One action reported by a combat/quest/shop collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerAction {
    pub action_type: ActionType,
    pub succeeded: bool,
    /// Seconds spent on the action.
    pub time_taken_secs: f32,
    pub resource_cost: f32,
    /// How much skill the action demanded, 0.0 to 1.0.
    pub skill_required: f32,
    pub snapshot: Option<EngagementSnapshot>,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
    pub timestamp: DateTime<Utc>,
}

impl PlayerAction {
    /// Create an action stamped with the current time.
    pub fn new(action_type: ActionType, succeeded: bool, time_taken_secs: f32) -> Self {
        Self {
            action_type,
            succeeded,
            time_taken_secs,
            resource_cost: 0.0,
            skill_required: 0.5,
            snapshot: None,
            metadata: HashMap::new(),
            timestamp: Utc::now(),
        }
    }

    pub fn with_resource_cost(mut self, cost: f32) -> Self {
        self.resource_cost = cost;
        self
    }

    pub fn with_skill_required(mut self, skill: f32) -> Self {
        self.skill_required = skill;
        self
    }

    pub fn with_snapshot(mut self, snapshot: EngagementSnapshot) -> Self {
        self.snapshot = Some(snapshot);
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Reject negative durations and costs and out-of-range normalized readings.
    pub fn validate(&self) -> Result<(), ValidationError> {
        ValidationError::check_non_negative("time_taken_secs", self.time_taken_secs)?;
        ValidationError::check_non_negative("resource_cost", self.resource_cost)?;
        ValidationError::check_unit("skill_required", self.skill_required)?;
        if let Some(snapshot) = &self.snapshot {
            snapshot.validate()?;
        }
        Ok(())
    }
}
