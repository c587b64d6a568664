//! Durable job records.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use patron_db::{queries, Db};

use crate::clock::Clock;
use crate::{JobError, Result};

/// A job loaded from the store.
#[derive(Clone, Debug)]
pub struct StoredJob<S> {
    pub id: String,
    pub state: S,
}

/// Persists job state snapshots in the `job_state` table.
///
/// Snapshots are written synchronously: once a call returns, the checkpoint
/// is durable and the job may issue I/O that depends on it.
#[derive(Clone)]
pub struct JobStore {
    db: Db,
    clock: Arc<dyn Clock>,
}

impl JobStore {
    pub fn new(db: Db, clock: Arc<dyn Clock>) -> Self {
        Self { db, clock }
    }

    /// Write a new pending job record and return its id. The job is not
    /// started.
    pub fn create<S: Serialize>(&self, job_type: &str, state: &S) -> Result<String> {
        let job_id = uuid::Uuid::new_v4().to_string();
        let blob = serde_json::to_string(state).map_err(JobError::Serialize)?;
        let now = self.clock.now_secs();
        self.db
            .with(|conn| queries::jobs::insert(conn, &job_id, job_type, &blob, now))?;
        Ok(job_id)
    }

    /// Replace the job's state snapshot.
    pub fn save_state<S: Serialize>(&self, job_id: &str, state: &S) -> Result<()> {
        let blob = serde_json::to_string(state).map_err(JobError::Serialize)?;
        self.db
            .with(|conn| queries::jobs::update_state(conn, job_id, &blob))?;
        Ok(())
    }

    /// Load and decode a job's state.
    ///
    /// # Errors
    ///
    /// - [`JobError::UnknownJob`] if no record exists
    /// - [`JobError::InvalidState`] if the blob does not decode; the caller
    ///   must fail the job without side effects
    pub fn load_state<S: DeserializeOwned>(&self, job_id: &str) -> Result<StoredJob<S>> {
        let row = self
            .db
            .with(|conn| queries::jobs::get(conn, job_id))?
            .ok_or_else(|| JobError::UnknownJob(job_id.to_string()))?;

        let state = serde_json::from_str(&row.state).map_err(|source| JobError::InvalidState {
            job_id: job_id.to_string(),
            source,
        })?;

        Ok(StoredJob {
            id: row.job_id,
            state,
        })
    }

    /// Mark a job terminal.
    pub fn complete(&self, job_id: &str, error: Option<&str>) -> Result<()> {
        let now = self.clock.now_secs();
        self.db
            .with(|conn| queries::jobs::complete(conn, job_id, error, now))?;
        Ok(())
    }

    /// Ids of all resumable jobs with the given type tag.
    pub fn active_jobs(&self, job_type: &str) -> Result<Vec<String>> {
        Ok(self
            .db
            .with(|conn| queries::jobs::active_ids(conn, job_type))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct TestState {
        step: u32,
        note: String,
    }

    fn store() -> JobStore {
        JobStore::new(
            Db::open_memory().expect("open db"),
            Arc::new(ManualClock::new(1_000)),
        )
    }

    #[test]
    fn test_create_save_load_round_trip() {
        let store = store();
        let state = TestState {
            step: 1,
            note: "start".to_string(),
        };

        let id = store.create("test-job", &state).expect("create");
        let loaded: StoredJob<TestState> = store.load_state(&id).expect("load");
        assert_eq!(loaded.state, state);

        let advanced = TestState {
            step: 2,
            note: "advanced".to_string(),
        };
        store.save_state(&id, &advanced).expect("save");
        let loaded: StoredJob<TestState> = store.load_state(&id).expect("reload");
        assert_eq!(loaded.state, advanced);
    }

    #[test]
    fn test_load_unknown_job() {
        let store = store();
        let result: Result<StoredJob<TestState>> = store.load_state("missing");
        assert!(matches!(result, Err(JobError::UnknownJob(_))));
    }

    #[test]
    fn test_load_invalid_state() {
        let store = store();
        let id = store
            .create("test-job", &serde_json::json!({"step": "not a number"}))
            .expect("create");

        let result: Result<StoredJob<TestState>> = store.load_state(&id);
        assert!(matches!(result, Err(JobError::InvalidState { .. })));
    }

    #[test]
    fn test_unknown_json_keys_ignored() {
        let store = store();
        let id = store
            .create(
                "test-job",
                &serde_json::json!({"step": 3, "note": "n", "extra": true}),
            )
            .expect("create");

        let loaded: StoredJob<TestState> = store.load_state(&id).expect("load");
        assert_eq!(loaded.state.step, 3);
    }

    #[test]
    fn test_complete_removes_from_active() {
        let store = store();
        let id = store
            .create("test-job", &TestState { step: 1, note: String::new() })
            .expect("create");

        assert_eq!(store.active_jobs("test-job").expect("active"), vec![id.clone()]);
        store.complete(&id, None).expect("complete");
        assert!(store.active_jobs("test-job").expect("active").is_empty());
    }
}
