//! bitFlyer wallet handler.
//!
//! bitFlyer wallets can tip and receive, but do not support contribution
//! token orders.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use patron_payments::{EnvironmentConfig, FetchOptions, UrlFetcher, UrlRequest};
use patron_types::{ExternalWallet, WalletProvider};

use crate::handler::WalletHandler;

#[derive(Deserialize)]
struct InventoryEntry {
    currency_code: String,
    available: f64,
}

#[derive(Deserialize)]
struct InventoryResponse {
    inventory: Vec<InventoryEntry>,
}

#[derive(Deserialize)]
struct WithdrawResponse {
    transfer_id: String,
}

/// Talks to the bitFlyer Link API.
pub struct BitflyerHandler {
    fetcher: Arc<dyn UrlFetcher>,
    config: EnvironmentConfig,
}

impl BitflyerHandler {
    pub fn new(fetcher: Arc<dyn UrlFetcher>, config: EnvironmentConfig) -> Self {
        Self { fetcher, config }
    }

    fn api_url(&self, path: &str) -> String {
        format!("https://{}{}", self.config.bitflyer_api_host, path)
    }
}

#[async_trait]
impl WalletHandler for BitflyerHandler {
    async fn get_balance(&self, wallet: &ExternalWallet) -> Option<f64> {
        let request = UrlRequest::get(self.api_url("/api/link/v1/account/inventory"))
            .with_header("authorization", &format!("Bearer {}", wallet.access_token));

        let options = FetchOptions {
            disable_logging: true,
            ..Default::default()
        };
        let response = self.fetcher.fetch(request, options).await;
        if !response.succeeded() {
            tracing::error!(status = response.status_code, "bitflyer balance read failed");
            return None;
        }

        let body: InventoryResponse = response.read_body_json()?;
        Some(
            body.inventory
                .iter()
                .find(|entry| entry.currency_code == "BAT")
                .map(|entry| entry.available)
                .unwrap_or(0.0),
        )
    }

    async fn transfer_bat(
        &self,
        wallet: &ExternalWallet,
        destination: &str,
        amount: f64,
        memo: &str,
    ) -> Option<String> {
        let body = serde_json::json!({
            "currency_code": "BAT",
            "amount": amount,
            "deposit_id": destination,
            "transfer_id": uuid::Uuid::new_v4().to_string(),
            "message": memo,
        });

        let request = UrlRequest::post(
            self.api_url("/api/link/v1/coin/withdraw-to-deposit-id/request"),
        )
        .with_header("authorization", &format!("Bearer {}", wallet.access_token))
        .with_json(&body);

        let options = FetchOptions {
            disable_logging: true,
            ..Default::default()
        };
        let response = self.fetcher.fetch(request, options).await;
        if !response.succeeded() {
            tracing::error!(status = response.status_code, "bitflyer transfer failed");
            return None;
        }

        let withdraw: WithdrawResponse = response.read_body_json()?;
        Some(withdraw.transfer_id)
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
            provider: WalletProvider::Bitflyer,
            address: address.clone(),
            access_token: access_token.clone(),
        })
    }

    fn contribution_fee_address(&self) -> String {
        self.config
            .contribution_fee_address(WalletProvider::Bitflyer)
            .to_string()
    }

    fn contribution_token_order_address(&self) -> Option<String> {
        None
    }
}
