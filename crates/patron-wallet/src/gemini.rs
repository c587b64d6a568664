//! Gemini wallet handler.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use patron_payments::{EnvironmentConfig, FetchOptions, UrlFetcher, UrlRequest};
use patron_types::{ExternalWallet, WalletProvider};

use crate::handler::WalletHandler;

#[derive(Deserialize)]
struct BalanceEntry {
    currency: String,
    available: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PayResponse {
    tx_ref: String,
}

/// Talks to the Gemini payments API.
pub struct GeminiHandler {
    fetcher: Arc<dyn UrlFetcher>,
    config: EnvironmentConfig,
}

impl GeminiHandler {
    pub fn new(fetcher: Arc<dyn UrlFetcher>, config: EnvironmentConfig) -> Self {
        Self { fetcher, config }
    }

    fn api_url(&self, path: &str) -> String {
        format!("https://{}{}", self.config.gemini_api_host, path)
    }
}

#[async_trait]
impl WalletHandler for GeminiHandler {
    async fn get_balance(&self, wallet: &ExternalWallet) -> Option<f64> {
        let request = UrlRequest::post(self.api_url("/v1/balances"))
            .with_header("authorization", &format!("Bearer {}", wallet.access_token));

        let options = FetchOptions {
            disable_logging: true,
            ..Default::default()
        };
        let response = self.fetcher.fetch(request, options).await;
        if !response.succeeded() {
            tracing::error!(status = response.status_code, "gemini balance read failed");
            return None;
        }

        let balances: Vec<BalanceEntry> = response.read_body_json()?;
        balances
            .iter()
            .find(|entry| entry.currency == "BAT")
            .and_then(|entry| entry.available.parse().ok())
            .or(Some(0.0))
    }

    async fn transfer_bat(
        &self,
        wallet: &ExternalWallet,
        destination: &str,
        amount: f64,
        memo: &str,
    ) -> Option<String> {
        let body = serde_json::json!({
            "tx_ref": uuid::Uuid::new_v4().to_string(),
            "amount": format!("{amount:.6}"),
            "currency": "BAT",
            "destination": destination,
            "memo": memo,
        });

        let request = UrlRequest::post(self.api_url("/v1/payments/pay"))
            .with_header("authorization", &format!("Bearer {}", wallet.access_token))
            .with_json(&body);

        let options = FetchOptions {
            disable_logging: true,
            ..Default::default()
        };
        let response = self.fetcher.fetch(request, options).await;
        if !response.succeeded() {
            tracing::error!(status = response.status_code, "gemini transfer failed");
            return None;
        }

        let pay: PayResponse = response.read_body_json()?;
        Some(pay.tx_ref)
    }

    async fn handle_authorization_response(
        &self,
        auth_params: &HashMap<String, String>,
    ) -> Option<ExternalWallet> {
        let address = auth_params.get("address")?;
        let access_token = auth_params.get("access_token")?;
        if address.is_empty() || access_token.is_empty() {
            return None;
        }

        Some(ExternalWallet {
            provider: WalletProvider::Gemini,
            address: address.clone(),
            access_token: access_token.clone(),
        })
    }

    fn contribution_fee_address(&self) -> String {
        self.config
            .contribution_fee_address(WalletProvider::Gemini)
            .to_string()
    }

    fn contribution_token_order_address(&self) -> Option<String> {
        self.config
            .token_order_address(WalletProvider::Gemini)
            .map(str::to_string)
    }
}
