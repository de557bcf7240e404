//! # Player Model
//!
//! The player ledger - every record the adaptive engine keeps about a player.
//! This crate is the single source of truth for per-player state and does not
//! contain any control logic: the controllers in `adaptive_core` read and mutate
//! these records but never hold them.

pub mod error;
pub mod player;
pub mod registry;
pub mod telemetry;

pub use error::*;
pub use player::*;
pub use registry::*;
pub use telemetry::*;
