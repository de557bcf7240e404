//! # Adaptive Core
//!
//! The control loop of the engagement engine. This crate reads the per-player
//! records from `player_model`, re-targets difficulty toward a challenge band,
//! schedules variable-ratio rewards, balances content novelty, and predicts
//! churn to trigger interventions.
//!
//! ## Core Components
//!
//! - **performance**: Weighted performance score over a rolling encounter window
//! - **difficulty**: Proportional re-targeting, smoothing, band clamp, micro-adjustments
//! - **flow**: Flow score, boredom/anxiety detection, bounded rebalancing
//! - **reward**: Variable-ratio schedule and saturating rare-reward curve
//! - **variety**: Novelty decay and explore/exploit content recommendation
//! - **churn**: Behavioural markers, churn risk, intervention selection
//! - **progress**: Logarithmic display scaling
//! - **engine**: The facade that sequences all of the above per player action
//!
//! ## Design Philosophy
//!
//! - **Record-per-player**: Controllers are stateless; all mutable state lives in `PlayerState`
//! - **Injected randomness**: Every stochastic decision draws from a caller-supplied `Rng`
//! - **Closed-form**: All parameters are fixed, tunable constants in `EngineConfig`

pub mod churn;
pub mod config;
pub mod difficulty;
pub mod engine;
pub mod error;
pub mod flow;
pub mod performance;
pub mod progress;
pub mod reward;
pub mod variety;

pub use churn::*;
pub use config::*;
pub use difficulty::*;
pub use engine::*;
pub use error::*;
pub use flow::*;
pub use performance::*;
pub use progress::*;
pub use reward::*;
pub use variety::*;
