//! # patron-engine
//!
//! The contribution engine: a durable, resumable pipeline that moves BAT
//! from the user to content publishers under three policies (one-time tips,
//! recurring tips and weight-proportional auto-contribute).
//!
//! A tick from the [`scheduler`] or an explicit engine call builds a
//! [`patron_types::Contribution`] and hands it to the [`router`], which
//! picks a funding source and dispatches to a processor. Long-running work
//! (token purchases, auto-contribute rounds, scheduled contribution runs)
//! runs as resumable jobs that checkpoint their state to the job table on
//! every advancement; after a restart the engine re-reads all unfinished
//! jobs and resumes each at its last snapshot.

pub mod auto_contribute;
pub mod context;
pub mod engine;
mod jobs;
pub mod processor;
pub mod router;
pub mod scheduler;
pub mod store;
pub mod tokens;
pub mod user_prefs;
pub mod vendor;

pub use context::{Collaborators, Context, EngineOptions};
pub use engine::ContributionEngine;
pub use store::ContributionStore;
pub use tokens::{TokenHold, TokenManager};
