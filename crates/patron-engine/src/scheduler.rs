//! The contribution scheduler.
//!
//! A long-lived loop fires one contribution round per interval: it reads
//! the recurring contributions and accumulated publisher activity, resets
//! the activity counters, and starts a resumable [`ContributionJob`] that
//! sends each recurring contribution and then hands off to
//! auto-contribute. The loop itself is not persisted; after a restart it
//! re-derives its wait from the stored last-fired timestamp, so an
//! interrupted sleep never double-fires.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use patron_types::{ContributionType, PublisherActivity};

use crate::auto_contribute;
use crate::context::Context;
use crate::jobs::{self, JobData, ResumableJob};
use crate::router;

const CONTRIBUTION_DELAY: Duration = Duration::from_secs(45);

#[derive(Clone, Debug, Serialize, Deserialize)]
struct RecurringContributionState {
    publisher_id: String,
    amount: f64,
    #[serde(default)]
    completed: bool,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct ScheduledContributionState {
    contributions: Vec<RecurringContributionState>,
    activity: Vec<PublisherActivity>,
    #[serde(default)]
    error: String,
}

struct ContributionJob;

#[async_trait]
impl ResumableJob for ContributionJob {
    const JOB_TYPE: &'static str = "scheduled-contribution";
    type State = ScheduledContributionState;

    async fn resume(ctx: &Context, job: &mut JobData<ScheduledContributionState>) -> bool {
        loop {
            let Some(index) = job.state.contributions.iter().position(|c| !c.completed)
            else {
                break;
            };

            let (publisher_id, amount) = {
                let contribution = &job.state.contributions[index];
                (contribution.publisher_id.clone(), contribution.amount)
            };

            let sent =
                router::send_contribution(ctx, ContributionType::Recurring, &publisher_id, amount)
                    .await;
            if !sent {
                // Treat the failure as unrecoverable for this cycle (e.g.
                // the publisher is not registered or has no matching wallet
                // provider) and move on; the next scheduled round retries.
                tracing::error!(publisher_id = %publisher_id, "unable to send recurring contribution");
            }

            job.state.contributions[index].completed = true;
            job.save(ctx);

            ctx.delays().random_delay(CONTRIBUTION_DELAY).await;
        }

        start_auto_contribute(ctx, job).await;
        true
    }
}

/// Kick off auto-contribute for the activity this round collected.
/// Auto-contribute maintains its own resumable state, so the contribution
/// job completes as soon as the round is handed off.
async fn start_auto_contribute(ctx: &Context, job: &mut JobData<ScheduledContributionState>) {
    let prefs = ctx.user_prefs();

    if !prefs.ac_enabled() {
        tracing::debug!("auto contribute is not enabled");
        return;
    }

    if !ctx.options().auto_contribute_allowed {
        tracing::debug!("auto contribute is not allowed for this client");
        return;
    }

    // Publishers that are not yet registered are removed from the activity
    // list before any votes are allocated.
    let publisher_ids: Vec<String> = job
        .state
        .activity
        .iter()
        .map(|entry| entry.publisher_id.clone())
        .collect();

    let publishers = ctx.publishers().get_publishers(&publisher_ids).await;

    let filtered_activity: Vec<PublisherActivity> = job
        .state
        .activity
        .iter()
        .filter(|entry| {
            publishers
                .get(&entry.publisher_id)
                .is_some_and(|p| p.registered)
        })
        .cloned()
        .collect();

    let source = router::get_current_source(ctx).await;

    auto_contribute::spawn_contributions(
        ctx,
        source,
        filtered_activity,
        prefs.ac_minimum_visits(),
        prefs.ac_minimum_duration_secs(),
        auto_contribute_amount(ctx),
    );
}

fn auto_contribute_amount(ctx: &Context) -> f64 {
    let amount = ctx.user_prefs().ac_amount();
    if amount > 0.0 {
        amount
    } else {
        ctx.options().default_contribution_amount
    }
}

/// Wait out the current interval, then collect state and start one
/// contribution round.
pub async fn run_tick(ctx: &Context) {
    let last = ctx.store().get_last_scheduled_contribution_time();
    let next = last + ctx.options().contribution_interval.as_secs();
    let wait = next.saturating_sub(ctx.clock().now_secs());
    ctx.delays().delay(Duration::from_secs(wait)).await;

    let contributions = ctx.store().get_recurring_contributions();
    let activity = ctx.store().get_publisher_activity();

    ctx.store().update_last_scheduled_contribution_time();
    ctx.store().reset_publisher_activity();

    tracing::debug!(
        recurring = contributions.len(),
        publishers = activity.len(),
        "starting recurring contributions"
    );

    let state = ScheduledContributionState {
        contributions: contributions
            .into_iter()
            .map(|c| RecurringContributionState {
                publisher_id: c.publisher_id,
                amount: c.amount,
                completed: false,
            })
            .collect(),
        activity,
        error: String::new(),
    };

    let _ = jobs::spawn_job_with_state::<ContributionJob>(ctx, state);
}

/// Resume any interrupted contribution round and start the scheduler loop.
pub fn initialize(ctx: &Context) {
    jobs::resume_jobs::<ContributionJob>(ctx);

    let ctx = ctx.clone();
    tokio::spawn(async move {
        loop {
            run_tick(&ctx).await;
        }
    });
}
