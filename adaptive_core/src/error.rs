//! Engine error type.

use player_model::{PlayerId, RepositoryError, ValidationError};
use thiserror::Error;

use crate::config::ConfigError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationError),

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Unknown player: {0}")]
    UnknownPlayer(PlayerId),
}

pub type Result<T> = std::result::Result<T, EngineError>;
