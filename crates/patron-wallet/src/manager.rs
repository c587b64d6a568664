//! The external wallet manager.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use patron_payments::{EnvironmentConfig, UrlFetcher};
use patron_types::{ExternalWallet, TransferResult, WalletProvider};

use crate::bitflyer::BitflyerHandler;
use crate::gemini::GeminiHandler;
use crate::handler::WalletHandler;
use crate::uphold::UpholdHandler;

/// Tracks the connected wallet and dispatches operations to the matching
/// provider handler.
pub struct ExternalWalletManager {
    wallet: RwLock<Option<ExternalWallet>>,
    uphold: Box<dyn WalletHandler>,
    gemini: Box<dyn WalletHandler>,
    bitflyer: Box<dyn WalletHandler>,
}

impl ExternalWalletManager {
    pub fn new(fetcher: Arc<dyn UrlFetcher>, config: EnvironmentConfig) -> Self {
        Self {
            wallet: RwLock::new(None),
            uphold: Box::new(UpholdHandler::new(fetcher.clone(), config.clone())),
            gemini: Box::new(GeminiHandler::new(fetcher.clone(), config.clone())),
            bitflyer: Box::new(BitflyerHandler::new(fetcher, config)),
        }
    }

    /// Build a manager with explicit handlers (tests).
    pub fn with_handlers(
        uphold: Box<dyn WalletHandler>,
        gemini: Box<dyn WalletHandler>,
        bitflyer: Box<dyn WalletHandler>,
    ) -> Self {
        Self {
            wallet: RwLock::new(None),
            uphold,
            gemini,
            bitflyer,
        }
    }

    fn handler(&self, provider: WalletProvider) -> &dyn WalletHandler {
        match provider {
            WalletProvider::Uphold => self.uphold.as_ref(),
            WalletProvider::Gemini => self.gemini.as_ref(),
            WalletProvider::Bitflyer => self.bitflyer.as_ref(),
        }
    }

    /// Attach a wallet supplied by the embedder.
    pub async fn connect_wallet(&self, wallet: ExternalWallet) {
        tracing::info!(provider = wallet.provider.as_str(), "external wallet connected");
        *self.wallet.write().await = Some(wallet);
    }

    /// Drop the connected wallet.
    pub async fn disconnect_wallet(&self) {
        *self.wallet.write().await = None;
    }

    /// Complete a provider authorization and connect the resulting wallet.
    pub async fn handle_authorization_response(
        &self,
        provider: WalletProvider,
        auth_params: &HashMap<String, String>,
    ) -> Option<ExternalWallet> {
        let wallet = self
            .handler(provider)
            .handle_authorization_response(auth_params)
            .await?;
        self.connect_wallet(wallet.clone()).await;
        Some(wallet)
    }

    pub async fn get_external_wallet(&self) -> Option<ExternalWallet> {
        self.wallet.read().await.clone()
    }

    pub async fn has_external_wallet(&self) -> bool {
        self.wallet.read().await.is_some()
    }

    /// Available BAT balance of the connected wallet.
    pub async fn get_balance(&self) -> Option<f64> {
        let wallet = self.get_external_wallet().await?;
        self.handler(wallet.provider).get_balance(&wallet).await
    }

    /// Transfer BAT from the connected wallet.
    pub async fn transfer_bat(
        &self,
        destination: &str,
        amount: f64,
        memo: &str,
    ) -> Option<TransferResult> {
        let wallet = self.get_external_wallet().await?;
        let transaction_id = self
            .handler(wallet.provider)
            .transfer_bat(&wallet, destination, amount, memo)
            .await?;

        Some(TransferResult {
            provider: wallet.provider,
            transaction_id,
        })
    }

    /// Fee sink address for the connected wallet's provider.
    pub async fn get_contribution_fee_address(&self) -> Option<String> {
        let wallet = self.get_external_wallet().await?;
        Some(self.handler(wallet.provider).contribution_fee_address())
    }

    /// Token-order address for the connected wallet's provider, if any.
    pub async fn get_contribution_token_order_address(&self) -> Option<String> {
        let wallet = self.get_external_wallet().await?;
        self.handler(wallet.provider)
            .contribution_token_order_address()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct FixedHandler {
        balance: Option<f64>,
        transaction_id: Option<&'static str>,
    }

    #[async_trait]
    impl WalletHandler for FixedHandler {
        async fn get_balance(&self, _wallet: &ExternalWallet) -> Option<f64> {
            self.balance
        }

        async fn transfer_bat(
            &self,
            _wallet: &ExternalWallet,
            _destination: &str,
            _amount: f64,
            _memo: &str,
        ) -> Option<String> {
            self.transaction_id.map(str::to_string)
        }

        async fn handle_authorization_response(
            &self,
            _auth_params: &HashMap<String, String>,
        ) -> Option<ExternalWallet> {
            None
        }

        fn contribution_fee_address(&self) -> String {
            "fee-address".to_string()
        }

        fn contribution_token_order_address(&self) -> Option<String> {
            Some("order-address".to_string())
        }
    }

    fn manager(balance: Option<f64>, transaction_id: Option<&'static str>) -> ExternalWalletManager {
        ExternalWalletManager::with_handlers(
            Box::new(FixedHandler {
                balance,
                transaction_id,
            }),
            Box::new(FixedHandler {
                balance: None,
                transaction_id: None,
            }),
            Box::new(FixedHandler {
                balance: None,
                transaction_id: None,
            }),
        )
    }

    fn uphold_wallet() -> ExternalWallet {
        ExternalWallet {
            provider: WalletProvider::Uphold,
            address: "card-1".to_string(),
            access_token: "token-1".to_string(),
        }
    }

    #[tokio::test]
    async fn test_no_wallet_no_operations() {
        let manager = manager(Some(5.0), Some("tx"));
        assert!(!manager.has_external_wallet().await);
        assert!(manager.get_balance().await.is_none());
        assert!(manager.transfer_bat("dest", 1.0, "").await.is_none());
        assert!(manager.get_contribution_fee_address().await.is_none());
    }

    #[tokio::test]
    async fn test_connected_wallet_dispatches_to_provider() {
        let manager = manager(Some(5.0), Some("tx-1"));
        manager.connect_wallet(uphold_wallet()).await;

        assert!(manager.has_external_wallet().await);
        assert_eq!(manager.get_balance().await, Some(5.0));

        let transfer = manager.transfer_bat("dest", 1.0, "").await.expect("transfer");
        assert_eq!(transfer.provider, WalletProvider::Uphold);
        assert_eq!(transfer.transaction_id, "tx-1");

        assert_eq!(
            manager.get_contribution_fee_address().await.as_deref(),
            Some("fee-address")
        );
    }

    #[tokio::test]
    async fn test_disconnect() {
        let manager = manager(Some(5.0), None);
        manager.connect_wallet(uphold_wallet()).await;
        manager.disconnect_wallet().await;
        assert!(!manager.has_external_wallet().await);
    }
}
