//! The auto-contribute processor.
//!
//! Runs one weight-proportional contribution round as a resumable job:
//! acquire tokens (purchasing them through the vendor when the funding
//! source is an external wallet), allocate votes across publishers by
//! weight, then send one token contribution per publisher with jittered
//! spacing and per-publisher retry.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use patron_jobs::BackoffDelay;
use patron_types::{Contribution, ContributionSource, ContributionType, PublisherActivity, TokenType};

use crate::auto_contribute::calculator;
use crate::context::Context;
use crate::jobs::{self, JobData, ResumableJob};
use crate::processor::token;
use crate::tokens::TokenHold;
use crate::vendor;

const CONTRIBUTION_DELAY: Duration = Duration::from_secs(45);
const MIN_RETRY_DELAY: Duration = Duration::from_secs(15);
const MAX_RETRY_DELAY: Duration = Duration::from_secs(30 * 60);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
enum AcStatus {
    #[serde(rename = "pending")]
    Pending,
    #[serde(rename = "purchasing")]
    Purchasing,
    #[serde(rename = "purchased")]
    Purchased,
    #[serde(rename = "sending")]
    Sending,
    #[serde(rename = "complete")]
    Complete,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct PublisherState {
    publisher_id: String,
    weight: f64,
    #[serde(default)]
    votes: usize,
    #[serde(default)]
    completed: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct AcState {
    status: AcStatus,
    source: ContributionSource,
    publishers: Vec<PublisherState>,
    amount: f64,
    #[serde(default)]
    purchase_job_id: String,
    #[serde(default)]
    reserved_tokens: Vec<i64>,
}

fn token_type(source: ContributionSource) -> TokenType {
    match source {
        ContributionSource::VgTokens => TokenType::Vg,
        ContributionSource::SkuTokens | ContributionSource::External => TokenType::Sku,
    }
}

/// Token-funded contributions record the token source, not the external
/// wallet that funded the purchase.
fn contribution_source(source: ContributionSource) -> ContributionSource {
    match source {
        ContributionSource::External => ContributionSource::SkuTokens,
        other => other,
    }
}

struct AcJob;

#[async_trait]
impl ResumableJob for AcJob {
    const JOB_TYPE: &'static str = "auto-contribute";
    type State = AcState;

    async fn resume(ctx: &Context, job: &mut JobData<AcState>) -> bool {
        if job.state.publishers.is_empty() {
            tracing::error!("auto contribute job without publishers");
            return false;
        }

        let mut hold: Option<TokenHold> = None;

        loop {
            match job.state.status {
                AcStatus::Pending => match job.state.source {
                    ContributionSource::VgTokens => {
                        job.state.status = AcStatus::Purchased;
                    }
                    ContributionSource::SkuTokens => {
                        tracing::error!("cannot perform auto contribute with sku tokens");
                        return false;
                    }
                    ContributionSource::External => {
                        let balance = ctx.wallet().get_balance().await;
                        let Some(balance) = balance.filter(|b| *b > 0.0) else {
                            tracing::info!("insufficient funds for auto contribution");
                            return true;
                        };

                        let amount = job.state.amount.min(balance);
                        let Some(purchase_job_id) = vendor::start_purchase(ctx, amount) else {
                            tracing::error!("unable to start token purchase");
                            return false;
                        };

                        job.state.purchase_job_id = purchase_job_id;
                        job.state.status = AcStatus::Purchasing;
                        job.save(ctx);
                    }
                },
                AcStatus::Purchasing => {
                    if job.state.purchase_job_id.is_empty() {
                        tracing::error!("auto contribute state missing purchase job");
                        return false;
                    }
                    if !vendor::complete_purchase(ctx, &job.state.purchase_job_id).await {
                        tracing::error!("error purchasing contribution tokens");
                        return false;
                    }
                    job.state.status = AcStatus::Purchased;
                    job.save(ctx);
                }
                AcStatus::Purchased => {
                    let reserved = ctx
                        .tokens()
                        .reserve_tokens(token_type(job.state.source), job.state.amount);

                    if reserved.is_empty() {
                        tracing::info!("no tokens available for auto contribution");
                        return true;
                    }

                    job.state.reserved_tokens = reserved.token_ids();
                    allocate_votes(ctx, job, reserved.tokens().len());
                    job.state.status = AcStatus::Sending;
                    job.save(ctx);
                    hold = Some(reserved);
                }
                AcStatus::Sending => {
                    let sending_hold = match hold.take() {
                        Some(h) => h,
                        // Resumption: re-claim the exact tokens recorded
                        // before the restart.
                        None => ctx.tokens().reserve_token_ids(&job.state.reserved_tokens),
                    };
                    return send_all(ctx, job, sending_hold).await;
                }
                AcStatus::Complete => return true,
            }
        }
    }
}

fn allocate_votes(ctx: &Context, job: &mut JobData<AcState>, total_votes: usize) {
    let weights: BTreeMap<String, f64> = job
        .state
        .publishers
        .iter()
        .map(|p| (p.publisher_id.clone(), p.weight))
        .collect();

    let votes = calculator::allocate_votes(ctx.randomizer(), &weights, total_votes);

    for publisher in &mut job.state.publishers {
        publisher.votes = votes.get(&publisher.publisher_id).copied().unwrap_or(0);
    }
}

async fn send_all(ctx: &Context, job: &mut JobData<AcState>, mut hold: TokenHold) -> bool {
    let mut backoff = BackoffDelay::new(MIN_RETRY_DELAY, MAX_RETRY_DELAY);

    loop {
        let Some(index) = job.state.publishers.iter().position(|p| !p.completed) else {
            job.state.status = AcStatus::Complete;
            job.save(ctx);
            return true;
        };

        let (publisher_id, votes) = {
            let publisher = &job.state.publishers[index];
            (publisher.publisher_id.clone(), publisher.votes)
        };

        let sent = if votes == 0 {
            true
        } else {
            let publisher_hold = hold.split(votes);
            let contribution = Contribution::new(
                ContributionType::AutoContribute,
                &publisher_id,
                contribution_source(job.state.source),
                publisher_hold.total_value(),
            );
            token::process_contribution_with_hold(ctx, contribution, publisher_hold).await
        };

        if !sent {
            // Keep retrying this publisher; the hold still owns its
            // tokens because the split is re-made on the next pass.
            tracing::warn!(publisher_id = %publisher_id, "auto contribution failed, backing off");
            ctx.delays().random_delay(backoff.next_delay()).await;
            hold = ctx.tokens().reserve_token_ids(&job.state.reserved_tokens);
            continue;
        }

        backoff.reset();
        job.state.publishers[index].completed = true;
        job.save(ctx);

        ctx.delays().random_delay(CONTRIBUTION_DELAY).await;
    }
}

/// Start an auto-contribute round over the given activity. Returns once
/// the round's job completes; a round that has nothing to do completes
/// successfully right away.
pub async fn send_contributions(
    ctx: &Context,
    source: ContributionSource,
    activity: &[PublisherActivity],
    min_visits: i64,
    min_duration_secs: f64,
    amount: f64,
) -> bool {
    if amount <= 0.0 {
        tracing::info!("auto contribute amount is zero");
        return true;
    }

    let weights = calculator::calculate_weights(activity, min_visits, min_duration_secs);
    if weights.is_empty() {
        tracing::info!("no publisher activity for auto contribute");
        return true;
    }

    let state = AcState {
        status: AcStatus::Pending,
        source,
        publishers: weights
            .into_iter()
            .map(|(publisher_id, weight)| PublisherState {
                publisher_id,
                weight,
                votes: 0,
                completed: false,
            })
            .collect(),
        amount,
        purchase_job_id: String::new(),
        reserved_tokens: Vec::new(),
    };

    jobs::start_job_with_state::<AcJob>(ctx, state).await
}

/// Start an auto-contribute round in the background.
pub fn spawn_contributions(
    ctx: &Context,
    source: ContributionSource,
    activity: Vec<PublisherActivity>,
    min_visits: i64,
    min_duration_secs: f64,
    amount: f64,
) {
    let ctx = ctx.clone();
    tokio::spawn(async move {
        send_contributions(&ctx, source, &activity, min_visits, min_duration_secs, amount)
            .await;
    });
}

/// Resume unfinished auto-contribute rounds after a restart.
pub fn initialize(ctx: &Context) {
    jobs::resume_jobs::<AcJob>(ctx);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ac_status_strings() {
        let statuses = [
            (AcStatus::Pending, "pending"),
            (AcStatus::Purchasing, "purchasing"),
            (AcStatus::Purchased, "purchased"),
            (AcStatus::Sending, "sending"),
            (AcStatus::Complete, "complete"),
        ];

        for (status, expected) in statuses {
            let json = serde_json::to_string(&status).expect("serialize");
            assert_eq!(json, format!("\"{expected}\""));
            let parsed: AcStatus = serde_json::from_str(&json).expect("parse");
            assert_eq!(parsed, status);
        }
    }

    #[test]
    fn test_ac_state_round_trip() {
        let state = AcState {
            status: AcStatus::Sending,
            source: ContributionSource::External,
            publishers: vec![PublisherState {
                publisher_id: "pub-a".to_string(),
                weight: 0.6,
                votes: 13,
                completed: false,
            }],
            amount: 5.0,
            purchase_job_id: "purchase-1".to_string(),
            reserved_tokens: vec![1, 2, 3],
        };

        let json = serde_json::to_string(&state).expect("serialize");
        let parsed: AcState = serde_json::from_str(&json).expect("parse");
        assert_eq!(parsed.status, AcStatus::Sending);
        assert_eq!(parsed.source, ContributionSource::External);
        assert_eq!(parsed.publishers[0].votes, 13);
        assert_eq!(parsed.reserved_tokens, vec![1, 2, 3]);
    }

    #[test]
    fn test_missing_required_keys_rejected() {
        let result: Result<AcState, _> = serde_json::from_str(r#"{"status": "pending"}"#);
        assert!(result.is_err());

        let state: AcState = serde_json::from_str(
            r#"{"status": "pending", "source": "vg-tokens", "publishers": [], "amount": 1.0}"#,
        )
        .expect("parse");
        assert!(state.purchase_job_id.is_empty());
        assert!(state.reserved_tokens.is_empty());
    }

    #[test]
    fn test_token_type_per_source() {
        assert_eq!(token_type(ContributionSource::VgTokens), TokenType::Vg);
        assert_eq!(token_type(ContributionSource::External), TokenType::Sku);
        assert_eq!(token_type(ContributionSource::SkuTokens), TokenType::Sku);
    }

    #[test]
    fn test_contribution_source_mapping() {
        assert_eq!(
            contribution_source(ContributionSource::External),
            ContributionSource::SkuTokens
        );
        assert_eq!(
            contribution_source(ContributionSource::VgTokens),
            ContributionSource::VgTokens
        );
    }
}
