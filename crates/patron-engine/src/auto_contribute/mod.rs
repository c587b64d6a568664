//! Auto-contribute: weight-proportional background contributions.

pub mod calculator;
pub mod processor;

pub use processor::{initialize, send_contributions, spawn_contributions};
