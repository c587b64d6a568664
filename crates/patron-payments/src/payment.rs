//! Payment service client: SKU orders, provider transactions, credentials
//! and publisher votes.

use std::sync::Arc;

use serde::Deserialize;

use patron_types::{PaymentOrder, PaymentOrderItem, PaymentOrderStatus, WalletProvider};

use crate::environment::EnvironmentConfig;
use crate::fetcher::{FetchOptions, UrlFetcher, UrlRequest};

/// A vote to cast: one redeemed token bound to a publisher.
#[derive(Clone, Debug)]
pub struct PaymentVote {
    pub unblinded_token: String,
    pub public_key: String,
}

/// How a batch of votes should be attributed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PaymentVoteType {
    OneOffTip,
    RecurringTip,
    AutoContribute,
}

impl PaymentVoteType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentVoteType::OneOffTip => "one-off-tip",
            PaymentVoteType::RecurringTip => "recurring-tip",
            PaymentVoteType::AutoContribute => "auto-contribute",
        }
    }
}

/// A line item for a new SKU order.
#[derive(Clone, Debug)]
pub struct NewOrderItem {
    pub sku: String,
    pub quantity: i32,
}

/// Signed credentials for one order item.
#[derive(Clone, Debug)]
pub struct CredsBatch {
    pub public_key: String,
    pub batch_proof: String,
    pub signed_creds: Vec<String>,
}

#[derive(Deserialize)]
struct OrderItemResponse {
    id: String,
    sku: String,
    quantity: i32,
    price: f64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct OrderResponse {
    id: String,
    status: Option<String>,
    #[serde(default)]
    total_price: f64,
    items: Vec<OrderItemResponse>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CredsResponse {
    public_key: String,
    batch_proof: String,
    signed_creds: Vec<String>,
}

/// Typed access to the payment service.
#[derive(Clone)]
pub struct PaymentService {
    fetcher: Arc<dyn UrlFetcher>,
    config: EnvironmentConfig,
}

impl PaymentService {
    pub fn new(fetcher: Arc<dyn UrlFetcher>, config: EnvironmentConfig) -> Self {
        Self { fetcher, config }
    }

    /// Create an SKU order.
    pub async fn post_order(&self, items: &[NewOrderItem]) -> Option<PaymentOrder> {
        let body = serde_json::json!({
            "items": items
                .iter()
                .map(|item| serde_json::json!({"sku": item.sku, "quantity": item.quantity}))
                .collect::<Vec<_>>(),
        });

        let request = UrlRequest::post(self.config.payment_url("/v1/orders")).with_json(&body);
        let response = self.fetcher.fetch(request, FetchOptions::default()).await;
        if !response.succeeded() {
            tracing::error!(status = response.status_code, "order creation failed");
            return None;
        }

        response.read_body_json::<OrderResponse>().map(map_order)
    }

    /// Fetch an existing order.
    pub async fn get_order(&self, order_id: &str) -> Option<PaymentOrder> {
        let request = UrlRequest::get(
            self.config.payment_url(&format!("/v1/orders/{order_id}")),
        );
        let response = self.fetcher.fetch(request, FetchOptions::default()).await;
        if !response.succeeded() {
            tracing::error!(status = response.status_code, "order fetch failed");
            return None;
        }

        response.read_body_json::<OrderResponse>().map(map_order)
    }

    /// Attach an external-wallet transaction to an order. Only uphold and
    /// gemini settle token orders.
    pub async fn post_external_transaction(
        &self,
        order_id: &str,
        external_transaction_id: &str,
        provider: WalletProvider,
    ) -> bool {
        let path = match provider {
            WalletProvider::Uphold => format!("/v1/orders/{order_id}/transactions/uphold"),
            WalletProvider::Gemini => format!("/v1/orders/{order_id}/transactions/gemini"),
            WalletProvider::Bitflyer => {
                tracing::error!("bitflyer cannot settle token orders");
                return false;
            }
        };

        let body = serde_json::json!({
            "externalTransactionId": external_transaction_id,
            "kind": provider.as_str(),
        });

        let request = UrlRequest::post(self.config.payment_url(&path)).with_json(&body);
        let response = self.fetcher.fetch(request, FetchOptions::default()).await;
        response.succeeded()
    }

    /// Submit blinded tokens as single-use credentials for an order item.
    pub async fn post_credentials(
        &self,
        order_id: &str,
        item_id: &str,
        blinded_tokens: &[String],
    ) -> bool {
        let body = serde_json::json!({
            "itemId": item_id,
            "type": "single-use",
            "blindedCreds": blinded_tokens,
        });

        let request = UrlRequest::post(
            self.config.payment_url(&format!("/v1/orders/{order_id}/credentials")),
        )
        .with_json(&body);

        let options = FetchOptions {
            disable_logging: true,
            ..Default::default()
        };
        let response = self.fetcher.fetch(request, options).await;
        response.succeeded()
    }

    /// Fetch signed credentials for an order item. Returns `None` until the
    /// signer has produced them.
    pub async fn get_credentials(&self, order_id: &str, item_id: &str) -> Option<CredsBatch> {
        let request = UrlRequest::get(self.config.payment_url(&format!(
            "/v1/orders/{order_id}/credentials/{item_id}"
        )));

        let options = FetchOptions {
            disable_logging: true,
            ..Default::default()
        };
        let response = self.fetcher.fetch(request, options).await;
        if !response.succeeded() || response.status_code == 202 {
            return None;
        }

        response
            .read_body_json::<CredsResponse>()
            .map(|creds| CredsBatch {
                public_key: creds.public_key,
                batch_proof: creds.batch_proof,
                signed_creds: creds.signed_creds,
            })
    }

    /// Cast redeemed tokens as votes for a publisher.
    pub async fn post_publisher_votes(
        &self,
        publisher_id: &str,
        vote_type: PaymentVoteType,
        votes: &[PaymentVote],
    ) -> bool {
        let body = serde_json::json!({
            "channel": publisher_id,
            "type": vote_type.as_str(),
            "credentials": votes
                .iter()
                .map(|vote| serde_json::json!({
                    "t": vote.unblinded_token,
                    "publicKey": vote.public_key,
                }))
                .collect::<Vec<_>>(),
        });

        let request = UrlRequest::post(self.config.payment_url("/v1/votes")).with_json(&body);
        let options = FetchOptions {
            disable_logging: true,
            ..Default::default()
        };
        let response = self.fetcher.fetch(request, options).await;
        response.succeeded()
    }
}

fn map_order(response: OrderResponse) -> PaymentOrder {
    PaymentOrder {
        id: response.id,
        status: response.status.and_then(|s| s.parse::<PaymentOrderStatus>().ok()),
        total_price: response.total_price,
        items: response
            .items
            .into_iter()
            .map(|item| PaymentOrderItem {
                id: item.id,
                sku: item.sku,
                quantity: item.quantity,
                price: item.price,
            })
            .collect(),
    }
}
