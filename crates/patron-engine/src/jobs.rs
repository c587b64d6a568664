//! The resumable-job driver.
//!
//! A resumable job is a finite workflow whose state is a serializable
//! snapshot. The entry point is `resume`: it inspects the persisted status
//! and continues from there, so a job can be restarted from its last
//! checkpoint any number of times. Jobs resolve to a `bool` success;
//! failures are logged, never thrown.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

use patron_jobs::JobError;

use crate::context::Context;

/// A checkpointed workflow.
#[async_trait]
pub(crate) trait ResumableJob: Send + Sync + 'static {
    /// Tag stored in the `job_type` column.
    const JOB_TYPE: &'static str;

    /// Serializable checkpoint state.
    type State: Serialize + DeserializeOwned + Send + Sync;

    /// Continue the workflow from the persisted state. Called for fresh
    /// starts and for restarts alike.
    async fn resume(ctx: &Context, job: &mut JobData<Self::State>) -> bool;
}

/// A job's identity plus its in-memory state.
pub(crate) struct JobData<S> {
    pub id: String,
    pub state: S,
}

impl<S: Serialize> JobData<S> {
    /// Persist the current state. Durable once this returns; every status
    /// transition calls this before issuing dependent I/O.
    pub fn save(&self, ctx: &Context) -> bool {
        match ctx.jobs().save_state(&self.id, &self.state) {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(job_id = %self.id, error = %e, "state save failed");
                false
            }
        }
    }
}

/// Write a new pending job record without starting it.
pub(crate) fn initialize_job<J: ResumableJob>(ctx: &Context, state: &J::State) -> Option<String> {
    match ctx.jobs().create(J::JOB_TYPE, state) {
        Ok(id) => Some(id),
        Err(e) => {
            tracing::error!(job_type = J::JOB_TYPE, error = %e, "job creation failed");
            None
        }
    }
}

/// Resume a job by id and record its outcome.
pub(crate) async fn start_job<J: ResumableJob>(ctx: &Context, job_id: &str) -> bool {
    let stored = match ctx.jobs().load_state::<J::State>(job_id) {
        Ok(stored) => stored,
        Err(e @ JobError::InvalidState { .. }) => {
            // Fail the job without side effects; the row stays terminal
            // for inspection.
            tracing::error!(job_type = J::JOB_TYPE, job_id, error = %e, "invalid job state");
            if let Err(e) = ctx.jobs().complete(job_id, Some("invalid job state")) {
                tracing::error!(job_id, error = %e, "job completion failed");
            }
            return false;
        }
        Err(e) => {
            tracing::error!(job_type = J::JOB_TYPE, job_id, error = %e, "job load failed");
            return false;
        }
    };

    let mut job = JobData {
        id: stored.id,
        state: stored.state,
    };

    let success = J::resume(ctx, &mut job).await;

    let error = if success { None } else { Some("job failed") };
    if let Err(e) = ctx.jobs().complete(job_id, error) {
        tracing::error!(job_id, error = %e, "job completion failed");
    }

    success
}

/// Initialize and immediately resume a job, awaiting its result.
pub(crate) async fn start_job_with_state<J: ResumableJob>(ctx: &Context, state: J::State) -> bool {
    match initialize_job::<J>(ctx, &state) {
        Some(id) => start_job::<J>(ctx, &id).await,
        None => false,
    }
}

/// Initialize a job and run it in the background.
pub(crate) fn spawn_job_with_state<J: ResumableJob>(
    ctx: &Context,
    state: J::State,
) -> Option<String> {
    let id = initialize_job::<J>(ctx, &state)?;
    spawn_job::<J>(ctx, id.clone());
    Some(id)
}

/// Resume every unfinished job of this type (startup).
pub(crate) fn resume_jobs<J: ResumableJob>(ctx: &Context) {
    match ctx.jobs().active_jobs(J::JOB_TYPE) {
        Ok(ids) => {
            for id in ids {
                tracing::info!(job_type = J::JOB_TYPE, job_id = %id, "resuming job");
                spawn_job::<J>(ctx, id);
            }
        }
        Err(e) => {
            tracing::error!(job_type = J::JOB_TYPE, error = %e, "job enumeration failed");
        }
    }
}

fn spawn_job<J: ResumableJob>(ctx: &Context, job_id: String) {
    let ctx = ctx.clone();
    tokio::spawn(async move {
        start_job::<J>(&ctx, &job_id).await;
    });
}
