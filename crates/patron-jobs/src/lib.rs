//! # patron-jobs
//!
//! Support for long-running, checkpointed workflows: durable job records
//! ([`JobStore`]), wall-clock access ([`Clock`]), randomness
//! ([`Randomizer`]) and the delay primitives every retrying job shares
//! ([`DelayGenerator`], [`BackoffDelay`]).
//!
//! A job checkpoints by serializing its state to JSON and upserting it
//! into the `job_state` table before issuing any I/O that depends on the
//! new state being durable. After a restart, unfinished jobs of a known
//! type are re-read and resumed from their last snapshot.

pub mod clock;
pub mod delay;
pub mod random;
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use delay::{BackoffDelay, DelayGenerator};
pub use random::{OsRandomizer, Randomizer, SeededRandomizer};
pub use store::{JobStore, StoredJob};

/// Error types for the job runtime.
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error("database error: {0}")]
    Db(#[from] patron_db::DbError),

    /// The persisted state blob does not decode to the job's state type.
    #[error("invalid persisted state for job {job_id}: {source}")]
    InvalidState {
        job_id: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("unknown job: {0}")]
    UnknownJob(String),

    #[error("state serialization failed: {0}")]
    Serialize(#[source] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, JobError>;
