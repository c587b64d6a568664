//! Uphold wallet handler.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use patron_payments::{EnvironmentConfig, FetchOptions, UrlFetcher, UrlRequest};
use patron_types::{ExternalWallet, WalletProvider};

use crate::handler::WalletHandler;

#[derive(Deserialize)]
struct CardResponse {
    available: String,
}

#[derive(Deserialize)]
struct TransactionResponse {
    id: String,
}

/// Talks to the Uphold card API.
pub struct UpholdHandler {
    fetcher: Arc<dyn UrlFetcher>,
    config: EnvironmentConfig,
}

impl UpholdHandler {
    pub fn new(fetcher: Arc<dyn UrlFetcher>, config: EnvironmentConfig) -> Self {
        Self { fetcher, config }
    }

    fn api_url(&self, path: &str) -> String {
        format!("https://{}{}", self.config.uphold_api_host, path)
    }
}

#[async_trait]
impl WalletHandler for UpholdHandler {
    async fn get_balance(&self, wallet: &ExternalWallet) -> Option<f64> {
        let request = UrlRequest::get(
            self.api_url(&format!("/v0/me/cards/{}", wallet.address)),
        )
        .with_header("authorization", &format!("Bearer {}", wallet.access_token));

        let options = FetchOptions {
            disable_logging: true,
            ..Default::default()
        };
        let response = self.fetcher.fetch(request, options).await;
        if !response.succeeded() {
            tracing::error!(status = response.status_code, "uphold balance read failed");
            return None;
        }

        let card: CardResponse = response.read_body_json()?;
        card.available.parse().ok()
    }

    async fn transfer_bat(
        &self,
        wallet: &ExternalWallet,
        destination: &str,
        amount: f64,
        memo: &str,
    ) -> Option<String> {
        let body = serde_json::json!({
            "denomination": {
                "amount": format!("{amount:.6}"),
                "currency": "BAT",
            },
            "destination": destination,
            "message": memo,
        });

        let request = UrlRequest::post(self.api_url(&format!(
            "/v0/me/cards/{}/transactions?commit=true",
            wallet.address
        )))
        .with_header("authorization", &format!("Bearer {}", wallet.access_token))
        .with_json(&body);

        let options = FetchOptions {
            disable_logging: true,
            ..Default::default()
        };
        let response = self.fetcher.fetch(request, options).await;
        if !response.succeeded() {
            tracing::error!(status = response.status_code, "uphold transfer failed");
            return None;
        }

        let transaction: TransactionResponse = response.read_body_json()?;
        Some(transaction.id)
    }

    async fn handle_authorization_response(
        &self,
        auth_params: &HashMap<String, String>,
    ) -> Option<ExternalWallet> {
        // The embedder completes the OAuth code exchange; the handler only
        // validates the parameters it needs to form a wallet.
        let address = auth_params.get("address")?;
        let access_token = auth_params.get("access_token")?;
        if address.is_empty() || access_token.is_empty() {
            return None;
        }

        Some(ExternalWallet {
            provider: WalletProvider::Uphold,
            address: address.clone(),
            access_token: access_token.clone(),
        })
    }

    fn contribution_fee_address(&self) -> String {
        self.config
            .contribution_fee_address(WalletProvider::Uphold)
            .to_string()
    }

    fn contribution_token_order_address(&self) -> Option<String> {
        self.config
            .token_order_address(WalletProvider::Uphold)
            .map(str::to_string)
    }
}
