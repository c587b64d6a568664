//! Token purchase scenarios: resumption after a crash and claim retry
//! while the order payment settles.

mod support;

use patron_crypto::PrivacyPass;
use patron_engine::vendor;
use patron_types::TokenType;

use support::TestBed;

#[tokio::test(start_paused = true)]
async fn purchase_resumes_after_crash_without_duplicates() {
    let bed = TestBed::new();

    // A purchase died at `tokens-claimed` for order O1: the order exists,
    // the transfer went out and the blinded tokens were claimed before the
    // crash. Only the signed credentials are outstanding.
    let batch = PrivacyPass::new().create_blinded_tokens(20);
    let signed: Vec<String> = batch
        .blinded_tokens
        .iter()
        .map(|b| format!("signed:{b}"))
        .collect();
    bed.fetcher.set_signed_creds(signed);

    let state = serde_json::json!({
        "quantity": 20,
        "status": "tokens-claimed",
        "order_id": "O1",
        "order_item_id": "I1",
        "external_provider": "uphold",
        "external_transaction_id": "tx-0",
        "tokens": batch.tokens,
        "blinded_tokens": batch.blinded_tokens,
    });
    let job_id = bed
        .ctx
        .jobs()
        .create("contribution-token-purchase", &state)
        .expect("insert interrupted job");

    assert!(vendor::complete_purchase(&bed.ctx, &job_id).await);

    // The resumed job went straight to fetching signed credentials: no new
    // order, no new transfer.
    let creds_fetches = bed.fetcher.requests_matching("GET", "/v1/orders/O1/credentials/I1");
    assert_eq!(creds_fetches.len(), 1);
    assert!(bed.fetcher.requests_matching("POST", "").is_empty());
    assert!(bed.wallet_handler.transfers().is_empty());

    // All twenty tokens landed in inventory at 0.25 each.
    assert!(
        (bed.ctx.tokens().get_available_token_balance(TokenType::Sku) - 5.0).abs() < 1e-9
    );
    assert!(bed
        .ctx
        .jobs()
        .active_jobs("contribution-token-purchase")
        .expect("active jobs")
        .is_empty());

    // Resuming a finished purchase is a no-op.
    let requests_before = bed.fetcher.requests().len();
    assert!(vendor::complete_purchase(&bed.ctx, &job_id).await);
    assert_eq!(bed.fetcher.requests().len(), requests_before);
}

#[tokio::test(start_paused = true)]
async fn claim_backs_off_until_order_is_paid() {
    let bed = TestBed::new();
    bed.connect_uphold_wallet(10.0).await;

    // The first two claims race ahead of transaction settlement.
    bed.fetcher.fail_claims(2);

    let job_id = vendor::start_purchase(&bed.ctx, 5.0).expect("start purchase");

    let started = tokio::time::Instant::now();
    assert!(vendor::complete_purchase(&bed.ctx, &job_id).await);

    // Two failures backed off 15 s then 30 s before the third claim.
    assert_eq!(started.elapsed(), std::time::Duration::from_secs(45));
    let claims = bed.fetcher.requests_matching("POST", "/credentials");
    assert_eq!(claims.len(), 3);

    // Tokens only arrived after the signed credentials did.
    assert!(
        (bed.ctx.tokens().get_available_token_balance(TokenType::Sku) - 5.0).abs() < 1e-9
    );
}

#[tokio::test(start_paused = true)]
async fn purchase_validates_order_shape() {
    let bed = TestBed::new();
    bed.connect_uphold_wallet(10.0).await;

    // A zero-quantity purchase is a precondition failure, not a retry.
    let job_id = vendor::start_purchase(&bed.ctx, 0.1).expect("start purchase");
    assert!(!vendor::complete_purchase(&bed.ctx, &job_id).await);
    assert!(bed.wallet_handler.transfers().is_empty());
}

#[tokio::test(start_paused = true)]
async fn purchase_requires_order_capable_provider() {
    let bed = TestBed::new();

    // No wallet connected: the transfer stage cannot resolve an order
    // address.
    let job_id = vendor::start_purchase(&bed.ctx, 5.0).expect("start purchase");
    assert!(!vendor::complete_purchase(&bed.ctx, &job_id).await);

    let row = bed
        .ctx
        .db()
        .with(|conn| patron_db::queries::jobs::get(conn, &job_id))
        .expect("job row")
        .expect("job exists");
    assert!(row.completed_at.is_some());
    assert!(row.error.is_some());
}

#[tokio::test(start_paused = true)]
async fn invalid_persisted_state_fails_without_side_effects() {
    let bed = TestBed::new();

    let job_id = bed
        .ctx
        .jobs()
        .create(
            "contribution-token-purchase",
            &serde_json::json!({"quantity": "twenty"}),
        )
        .expect("insert bad job");

    assert!(!vendor::complete_purchase(&bed.ctx, &job_id).await);
    assert!(bed.fetcher.requests().is_empty());
    assert!(bed.wallet_handler.transfers().is_empty());

    let row = bed
        .ctx
        .db()
        .with(|conn| patron_db::queries::jobs::get(conn, &job_id))
        .expect("job row")
        .expect("job exists");
    assert_eq!(row.error.as_deref(), Some("invalid job state"));
}
