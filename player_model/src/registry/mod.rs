//! Player registry - every tracked player's state, keyed by identity - and the
//! persistence boundary.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::RepositoryError;
use crate::player::{PlayerId, PlayerState};

/// All player records held in memory by the engine.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PlayerRegistry {
    players: HashMap<PlayerId, PlayerState>,
}

impl PlayerRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a player's state by ID.
    pub fn get(&self, id: PlayerId) -> Option<&PlayerState> {
        self.players.get(&id)
    }

    /// Get a player's mutable state by ID.
    pub fn get_mut(&mut self, id: PlayerId) -> Option<&mut PlayerState> {
        self.players.get_mut(&id)
    }

    /// Get a player's state, creating it with `init` on first sight.
    ///
    /// The flag is true when the record was just created.
    pub fn get_or_insert_with(
        &mut self,
        id: PlayerId,
        init: impl FnOnce() -> PlayerState,
    ) -> (&mut PlayerState, bool) {
        let mut created = false;
        let state = self.players.entry(id).or_insert_with(|| {
            created = true;
            init()
        });
        (state, created)
    }

    /// Insert or replace a player's state.
    pub fn insert(&mut self, state: PlayerState) -> PlayerId {
        let id = state.id;
        self.players.insert(id, state);
        id
    }

    /// Remove a player's state.
    pub fn remove(&mut self, id: PlayerId) -> Option<PlayerState> {
        self.players.remove(&id)
    }

    pub fn contains(&self, id: PlayerId) -> bool {
        self.players.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Iterate over all player records.
    pub fn iter(&self) -> impl Iterator<Item = &PlayerState> {
        self.players.values()
    }
}

/// External store for player records, called synchronously at the
/// evaluation boundary (load before, save after).
pub trait PlayerRepository {
    /// Load a player's record, or None if it was never saved.
    fn load(&self, id: PlayerId) -> Result<Option<PlayerState>, RepositoryError>;

    /// Persist a player's record, replacing any previous version.
    fn save(&mut self, state: &PlayerState) -> Result<(), RepositoryError>;
}

/// Repository keeping serialized JSON records in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRepository {
    records: HashMap<PlayerId, String>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Raw serialized record, for inspection.
    pub fn raw(&self, id: PlayerId) -> Option<&str> {
        self.records.get(&id).map(String::as_str)
    }
}

impl PlayerRepository for InMemoryRepository {
    fn load(&self, id: PlayerId) -> Result<Option<PlayerState>, RepositoryError> {
        match self.records.get(&id) {
            Some(json) => Ok(Some(serde_json::from_str(json)?)),
            None => Ok(None),
        }
    }

    fn save(&mut self, state: &PlayerState) -> Result<(), RepositoryError> {
        let json = serde_json::to_string(state)?;
        self.records.insert(state.id, json);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::{BehaviorLogEntry, PerformanceRecord, WindowCapacities};
    use crate::telemetry::{ActionType, ContentCategory};
    use chrono::{TimeZone, Utc};
    use std::time::Duration;

    fn sample_state() -> PlayerState {
        let mut state = PlayerState::new(PlayerId::new(), 50.0, WindowCapacities::default());
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        state.performance.history.push(
            PerformanceRecord::new(true, Duration::from_millis(12_500), 3.25).at(at),
        );
        state.performance.score = 0.7125;
        state.difficulty.current_difficulty = 53.4;
        state.rewards.actions_since_last_reward = 4;
        state
            .content
            .add_exposure(ContentCategory::Puzzle, 2.5)
            .unwrap();
        state.behavior.push(
            BehaviorLogEntry::new(ActionType::Puzzle, at)
                .with_outcome(true)
                .with_error_rate(0.2),
        );
        state.churn_risk = 0.31;
        state
    }

    #[test]
    fn test_registry_get_or_insert() {
        let mut registry = PlayerRegistry::new();
        let id = PlayerId::new();

        let (_, created) = registry
            .get_or_insert_with(id, || PlayerState::new(id, 50.0, WindowCapacities::default()));
        assert!(created);

        let (state, created) = registry
            .get_or_insert_with(id, || PlayerState::new(id, 10.0, WindowCapacities::default()));
        assert!(!created);
        assert_eq!(state.difficulty.base_difficulty, 50.0);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_repository_round_trip() {
        let mut repo = InMemoryRepository::new();
        let state = sample_state();

        repo.save(&state).unwrap();
        let loaded = repo.load(state.id).unwrap().unwrap();

        assert_eq!(loaded, state);
    }

    #[test]
    fn test_repository_missing_player() {
        let repo = InMemoryRepository::new();
        assert!(repo.load(PlayerId::new()).unwrap().is_none());
    }
}
