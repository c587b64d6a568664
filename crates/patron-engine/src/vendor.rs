//! The contribution token vendor.
//!
//! Acquires SKU tokens by purchasing them with the connected external
//! wallet. A purchase is a resumable job that walks through order
//! creation, funds transfer, transaction settlement, blinded token
//! creation, claiming and unblinding; each stage persists its state
//! before the next network call is issued.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use patron_jobs::BackoffDelay;
use patron_payments::NewOrderItem;
use patron_types::token::TOKEN_VALUE;
use patron_types::{TokenType, WalletProvider};

use crate::context::Context;
use crate::jobs::{self, JobData, ResumableJob};
use crate::tokens::NewToken;

const MIN_RETRY_DELAY: Duration = Duration::from_secs(15);
const MAX_RETRY_DELAY: Duration = Duration::from_secs(30 * 60);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
enum PurchaseStatus {
    #[serde(rename = "pending")]
    Pending,
    #[serde(rename = "order-created")]
    OrderCreated,
    #[serde(rename = "transfer-completed")]
    TransferCompleted,
    #[serde(rename = "transaction-sent")]
    TransactionSent,
    #[serde(rename = "tokens-created")]
    TokensCreated,
    #[serde(rename = "tokens-claimed")]
    TokensClaimed,
    #[serde(rename = "complete")]
    Complete,
}

#[derive(Debug, Serialize, Deserialize)]
struct PurchaseState {
    quantity: i32,
    status: PurchaseStatus,
    #[serde(default)]
    order_id: String,
    #[serde(default)]
    order_item_id: String,
    #[serde(default)]
    external_provider: Option<WalletProvider>,
    #[serde(default)]
    external_transaction_id: String,
    #[serde(default)]
    tokens: Vec<String>,
    #[serde(default)]
    blinded_tokens: Vec<String>,
}

struct PurchaseJob;

#[async_trait]
impl ResumableJob for PurchaseJob {
    const JOB_TYPE: &'static str = "contribution-token-purchase";
    type State = PurchaseState;

    async fn resume(ctx: &Context, job: &mut JobData<PurchaseState>) -> bool {
        let mut backoff = BackoffDelay::new(MIN_RETRY_DELAY, MAX_RETRY_DELAY);

        loop {
            match job.state.status {
                PurchaseStatus::Pending => {
                    if !create_order(ctx, job).await {
                        return false;
                    }
                }
                PurchaseStatus::OrderCreated => {
                    if !transfer_funds(ctx, job).await {
                        return false;
                    }
                }
                PurchaseStatus::TransferCompleted => {
                    match send_transaction(ctx, job).await {
                        StageOutcome::Advanced => backoff.reset(),
                        StageOutcome::Retry => wait_for_retry(ctx, &mut backoff).await,
                        StageOutcome::Failed => return false,
                    }
                }
                PurchaseStatus::TransactionSent => {
                    create_tokens(ctx, job);
                }
                PurchaseStatus::TokensCreated => {
                    match claim_tokens(ctx, job).await {
                        StageOutcome::Advanced => backoff.reset(),
                        StageOutcome::Retry => wait_for_retry(ctx, &mut backoff).await,
                        StageOutcome::Failed => return false,
                    }
                }
                PurchaseStatus::TokensClaimed => {
                    match fetch_signed_tokens(ctx, job).await {
                        StageOutcome::Advanced => backoff.reset(),
                        StageOutcome::Retry => wait_for_retry(ctx, &mut backoff).await,
                        StageOutcome::Failed => return false,
                    }
                }
                PurchaseStatus::Complete => return true,
            }
        }
    }
}

enum StageOutcome {
    Advanced,
    Retry,
    Failed,
}

async fn create_order(ctx: &Context, job: &mut JobData<PurchaseState>) -> bool {
    if job.state.quantity <= 0 {
        tracing::error!(quantity = job.state.quantity, "invalid token order quantity");
        return false;
    }

    let items = [NewOrderItem {
        sku: ctx.config().auto_contribute_sku.to_string(),
        quantity: job.state.quantity,
    }];

    let Some(order) = ctx.payment().post_order(&items).await else {
        tracing::error!("error attempting to create token order");
        return false;
    };

    if order.items.len() != 1 {
        tracing::error!(items = order.items.len(), "unexpected number of order items");
        return false;
    }

    let item = &order.items[0];
    if (item.price - TOKEN_VALUE).abs() > f64::EPSILON {
        tracing::error!(price = item.price, "unexpected token price for order item");
        return false;
    }

    job.state.order_id = order.id;
    job.state.order_item_id = item.id.clone();
    job.state.status = PurchaseStatus::OrderCreated;
    job.save(ctx);
    true
}

async fn transfer_funds(ctx: &Context, job: &mut JobData<PurchaseState>) -> bool {
    let Some(destination) = ctx.wallet().get_contribution_token_order_address().await else {
        tracing::error!("external provider does not support contribution token orders");
        return false;
    };

    let transfer_amount = f64::from(job.state.quantity) * TOKEN_VALUE;
    let Some(transfer) = ctx
        .wallet()
        .transfer_bat(&destination, transfer_amount, "token order")
        .await
    else {
        tracing::error!("external transfer failed");
        return false;
    };

    job.state.external_provider = Some(transfer.provider);
    job.state.external_transaction_id = transfer.transaction_id;
    job.state.status = PurchaseStatus::TransferCompleted;
    job.save(ctx);
    true
}

async fn send_transaction(ctx: &Context, job: &mut JobData<PurchaseState>) -> StageOutcome {
    let Some(provider) = job.state.external_provider else {
        tracing::error!("purchase state missing external wallet provider");
        return StageOutcome::Failed;
    };

    if provider == WalletProvider::Bitflyer {
        tracing::error!("invalid external wallet provider for token orders");
        return StageOutcome::Failed;
    }

    let sent = ctx
        .payment()
        .post_external_transaction(
            &job.state.order_id,
            &job.state.external_transaction_id,
            provider,
        )
        .await;

    if !sent {
        tracing::error!("unable to send external transaction id");
        return StageOutcome::Retry;
    }

    job.state.status = PurchaseStatus::TransactionSent;
    job.save(ctx);
    StageOutcome::Advanced
}

fn create_tokens(ctx: &Context, job: &mut JobData<PurchaseState>) {
    let batch = ctx
        .privacy_pass()
        .create_blinded_tokens(job.state.quantity as usize);

    job.state.tokens = batch.tokens;
    job.state.blinded_tokens = batch.blinded_tokens;
    job.state.status = PurchaseStatus::TokensCreated;
    job.save(ctx);
}

async fn claim_tokens(ctx: &Context, job: &mut JobData<PurchaseState>) -> StageOutcome {
    // Claiming fails while the order payment is unsettled; the claim is
    // retried with backoff until the payment service reports it paid.
    let claimed = ctx
        .payment()
        .post_credentials(
            &job.state.order_id,
            &job.state.order_item_id,
            &job.state.blinded_tokens,
        )
        .await;

    if !claimed {
        tracing::error!(order_id = %job.state.order_id, "unable to claim signed tokens");
        return StageOutcome::Retry;
    }

    job.state.status = PurchaseStatus::TokensClaimed;
    job.save(ctx);
    StageOutcome::Advanced
}

async fn fetch_signed_tokens(ctx: &Context, job: &mut JobData<PurchaseState>) -> StageOutcome {
    let Some(creds) = ctx
        .payment()
        .get_credentials(&job.state.order_id, &job.state.order_item_id)
        .await
    else {
        tracing::error!(order_id = %job.state.order_id, "unable to fetch signed tokens");
        return StageOutcome::Retry;
    };

    let unblinded = match ctx.privacy_pass().unblind_tokens(
        &job.state.tokens,
        &job.state.blinded_tokens,
        &creds.signed_creds,
        &creds.batch_proof,
        &creds.public_key,
    ) {
        Ok(unblinded) => unblinded,
        Err(e) => {
            tracing::error!(error = %e, "token unblinding failed");
            return StageOutcome::Failed;
        }
    };

    let new_tokens: Vec<NewToken> = unblinded
        .into_iter()
        .map(|unblinded_token| NewToken {
            value: TOKEN_VALUE,
            unblinded_token,
            public_key: creds.public_key.clone(),
        })
        .collect();

    if !ctx.tokens().insert_tokens(&new_tokens, TokenType::Sku) {
        tracing::error!("unable to store purchased tokens");
    }

    job.state.status = PurchaseStatus::Complete;
    job.save(ctx);
    StageOutcome::Advanced
}

async fn wait_for_retry(ctx: &Context, backoff: &mut BackoffDelay) {
    ctx.delays().delay(backoff.next_delay()).await;
}

/// Initialize a purchase of `amount` BAT worth of SKU tokens. Returns the
/// purchase job id; the job is not started.
pub fn start_purchase(ctx: &Context, amount: f64) -> Option<String> {
    let quantity = (amount / TOKEN_VALUE).floor().max(0.0) as i32;
    jobs::initialize_job::<PurchaseJob>(
        ctx,
        &PurchaseState {
            quantity,
            status: PurchaseStatus::Pending,
            order_id: String::new(),
            order_item_id: String::new(),
            external_provider: None,
            external_transaction_id: String::new(),
            tokens: Vec::new(),
            blinded_tokens: Vec::new(),
        },
    )
}

/// Run a previously initialized purchase to completion.
pub async fn complete_purchase(ctx: &Context, job_id: &str) -> bool {
    jobs::start_job::<PurchaseJob>(ctx, job_id).await
}

/// Resume unfinished purchases after a restart.
pub fn initialize(ctx: &Context) {
    jobs::resume_jobs::<PurchaseJob>(ctx);
}
