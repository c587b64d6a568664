//! Shared fakes for the end-to-end scenarios: an in-memory service
//! fetcher, a scripted wallet handler, a manual clock and a seeded RNG.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use patron_db::Db;
use patron_engine::{Collaborators, Context, EngineOptions};
use patron_jobs::{ManualClock, SeededRandomizer};
use patron_payments::{Environment, FetchOptions, UrlFetcher, UrlRequest, UrlResponse};
use patron_types::{ExternalWallet, PublisherStatus, WalletProvider};
use patron_wallet::{ExternalWalletManager, WalletHandler};

/// Base timestamp for test scenarios.
pub const BASE_TIME: u64 = 1_700_000_000;

/// One recorded HTTP exchange.
#[derive(Clone, Debug)]
pub struct RecordedRequest {
    pub method: String,
    pub url: String,
    pub body: String,
}

#[derive(Clone)]
struct FakePublisher {
    registered: bool,
    status: PublisherStatus,
    address: String,
}

/// Serves the payment, promotion and publisher endpoints from memory.
#[derive(Default)]
pub struct FakeFetcher {
    requests: Mutex<Vec<RecordedRequest>>,
    publishers: Mutex<HashMap<String, FakePublisher>>,
    blinded_creds: Mutex<Vec<String>>,
    signed_creds_override: Mutex<Option<Vec<String>>>,
    claim_failures: AtomicUsize,
    next_order: AtomicUsize,
}

impl FakeFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_publisher(
        &self,
        publisher_id: &str,
        registered: bool,
        status: PublisherStatus,
        address: &str,
    ) {
        self.publishers.lock().expect("lock").insert(
            publisher_id.to_string(),
            FakePublisher {
                registered,
                status,
                address: address.to_string(),
            },
        );
    }

    /// Make the next `count` credential claims fail with a settlement
    /// error.
    pub fn fail_claims(&self, count: usize) {
        self.claim_failures.store(count, Ordering::SeqCst);
    }

    /// Serve these signed credentials instead of signing whatever was
    /// claimed (for resumed purchases that never claim in-test).
    pub fn set_signed_creds(&self, signed: Vec<String>) {
        *self.signed_creds_override.lock().expect("lock") = Some(signed);
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().expect("lock").clone()
    }

    pub fn requests_matching(&self, method: &str, url_part: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == method && r.url.contains(url_part))
            .collect()
    }

    fn sign(blinded: &str) -> String {
        format!("signed:{blinded}")
    }

    fn respond(&self, request: &UrlRequest) -> UrlResponse {
        let url = &request.url;
        let body: serde_json::Value =
            serde_json::from_str(&request.content).unwrap_or(serde_json::Value::Null);

        // Publisher lookups.
        if url.contains("/v1/publishers") {
            let ids: Vec<String> = body["publisherIds"]
                .as_array()
                .map(|ids| {
                    ids.iter()
                        .filter_map(|v| v.as_str().map(str::to_string))
                        .collect()
                })
                .unwrap_or_default();

            let publishers = self.publishers.lock().expect("lock");
            let rows: Vec<serde_json::Value> = ids
                .iter()
                .filter_map(|id| {
                    publishers.get(id).map(|p| {
                        serde_json::json!({
                            "publisherId": id,
                            "registered": p.registered,
                            "status": p.status.as_str(),
                            "address": p.address,
                        })
                    })
                })
                .collect();

            return ok(serde_json::Value::Array(rows));
        }

        // Vote and suggestion redemptions.
        if url.contains("/v1/votes") || url.contains("/v1/suggestions") {
            return ok(serde_json::json!({}));
        }

        // Credential claim (POST) and fetch (GET).
        if url.contains("/credentials") {
            if request.method == "POST" {
                if self
                    .claim_failures
                    .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                    .is_ok()
                {
                    return UrlResponse {
                        status_code: 400,
                        body: r#"{"message": "order not yet paid"}"#.to_string(),
                    };
                }

                let blinded: Vec<String> = body["blindedCreds"]
                    .as_array()
                    .map(|creds| {
                        creds
                            .iter()
                            .filter_map(|v| v.as_str().map(str::to_string))
                            .collect()
                    })
                    .unwrap_or_default();
                *self.blinded_creds.lock().expect("lock") = blinded;
                return ok(serde_json::json!({}));
            }

            let signed: Vec<String> = self
                .signed_creds_override
                .lock()
                .expect("lock")
                .clone()
                .unwrap_or_else(|| {
                    self.blinded_creds
                        .lock()
                        .expect("lock")
                        .iter()
                        .map(|b| Self::sign(b))
                        .collect()
                });

            return ok(serde_json::json!({
                "publicKey": "pk-test",
                "batchProof": "proof-test",
                "signedCreds": signed,
            }));
        }

        // Provider transaction settlement.
        if url.contains("/transactions/") {
            return ok(serde_json::json!({}));
        }

        // Order creation.
        if url.contains("/v1/orders") && request.method == "POST" {
            let quantity = body["items"][0]["quantity"].as_i64().unwrap_or(0);
            let sku = body["items"][0]["sku"].as_str().unwrap_or_default();
            let order = self.next_order.fetch_add(1, Ordering::SeqCst) + 1;

            return ok(serde_json::json!({
                "id": format!("order-{order}"),
                "status": "pending",
                "totalPrice": quantity as f64 * 0.25,
                "items": [{
                    "id": format!("item-{order}"),
                    "sku": sku,
                    "quantity": quantity,
                    "price": 0.25,
                }],
            }));
        }

        UrlResponse {
            status_code: 404,
            body: String::new(),
        }
    }
}

fn ok(body: serde_json::Value) -> UrlResponse {
    UrlResponse {
        status_code: 200,
        body: body.to_string(),
    }
}

#[async_trait]
impl UrlFetcher for FakeFetcher {
    async fn fetch(&self, request: UrlRequest, _options: FetchOptions) -> UrlResponse {
        let response = self.respond(&request);
        self.requests.lock().expect("lock").push(RecordedRequest {
            method: request.method.to_string(),
            url: request.url.clone(),
            body: request.content.clone(),
        });
        response
    }
}

/// A scripted provider handler shared across all three provider slots.
#[derive(Clone, Default)]
pub struct FakeWalletHandler {
    balance: Arc<Mutex<Option<f64>>>,
    transfers: Arc<Mutex<Vec<(String, f64, String)>>>,
    next_tx: Arc<AtomicUsize>,
}

impl FakeWalletHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_balance(&self, balance: Option<f64>) {
        *self.balance.lock().expect("lock") = balance;
    }

    /// All `(destination, amount, memo)` transfers issued so far.
    pub fn transfers(&self) -> Vec<(String, f64, String)> {
        self.transfers.lock().expect("lock").clone()
    }
}

#[async_trait]
impl WalletHandler for FakeWalletHandler {
    async fn get_balance(&self, _wallet: &ExternalWallet) -> Option<f64> {
        *self.balance.lock().expect("lock")
    }

    async fn transfer_bat(
        &self,
        _wallet: &ExternalWallet,
        destination: &str,
        amount: f64,
        memo: &str,
    ) -> Option<String> {
        self.transfers.lock().expect("lock").push((
            destination.to_string(),
            amount,
            memo.to_string(),
        ));
        let n = self.next_tx.fetch_add(1, Ordering::SeqCst) + 1;
        Some(format!("tx-{n}"))
    }

    async fn handle_authorization_response(
        &self,
        _auth_params: &HashMap<String, String>,
    ) -> Option<ExternalWallet> {
        None
    }

    fn contribution_fee_address(&self) -> String {
        "fee-address-test".to_string()
    }

    fn contribution_token_order_address(&self) -> Option<String> {
        Some("order-address-test".to_string())
    }
}

/// A fully wired engine context over in-memory collaborators.
pub struct TestBed {
    pub ctx: Context,
    pub fetcher: Arc<FakeFetcher>,
    pub wallet_handler: FakeWalletHandler,
    pub clock: Arc<ManualClock>,
}

impl TestBed {
    pub fn new() -> Self {
        Self::with_seed(42)
    }

    pub fn with_seed(seed: u64) -> Self {
        let db = Db::open_memory().expect("open test db");
        let fetcher = Arc::new(FakeFetcher::new());
        let wallet_handler = FakeWalletHandler::new();
        let clock = Arc::new(ManualClock::new(BASE_TIME));

        let wallet = ExternalWalletManager::with_handlers(
            Box::new(wallet_handler.clone()),
            Box::new(wallet_handler.clone()),
            Box::new(wallet_handler.clone()),
        );

        let ctx = Context::new(Collaborators {
            db,
            options: EngineOptions {
                environment: Environment::Development,
                contribution_interval: Duration::from_secs(30 * 24 * 60 * 60),
                auto_contribute_allowed: true,
                default_contribution_amount: 10.0,
            },
            fetcher: fetcher.clone(),
            wallet: Arc::new(wallet),
            randomizer: Arc::new(SeededRandomizer::new(seed)),
            clock: clock.clone(),
        });

        Self {
            ctx,
            fetcher,
            wallet_handler,
            clock,
        }
    }

    /// Connect an uphold wallet with the given balance.
    pub async fn connect_uphold_wallet(&self, balance: f64) {
        self.wallet_handler.set_balance(Some(balance));
        self.ctx
            .wallet()
            .connect_wallet(ExternalWallet {
                provider: WalletProvider::Uphold,
                address: "user-card".to_string(),
                access_token: "token".to_string(),
            })
            .await;
    }

    /// Seed `count` free tokens of the given type at 0.25 each.
    pub fn seed_tokens(&self, count: usize, token_type: patron_types::TokenType) {
        let tokens: Vec<patron_engine::tokens::NewToken> = (0..count)
            .map(|i| patron_engine::tokens::NewToken {
                value: 0.25,
                unblinded_token: format!("seed-token-{i}"),
                public_key: "seed-pk".to_string(),
            })
            .collect();
        assert!(self.ctx.tokens().insert_tokens(&tokens, token_type));
    }
}
