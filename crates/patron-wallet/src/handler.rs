//! Provider handler interface.

use std::collections::HashMap;

use async_trait::async_trait;

use patron_types::ExternalWallet;

/// Provider-specific wallet operations.
///
/// Handlers are stateless; the wallet (address + access token) is passed
/// into every call. Failures are reported as `None` after logging.
#[async_trait]
pub trait WalletHandler: Send + Sync {
    /// Available BAT balance.
    async fn get_balance(&self, wallet: &ExternalWallet) -> Option<f64>;

    /// Transfer BAT to `destination`; returns the provider transaction id.
    async fn transfer_bat(
        &self,
        wallet: &ExternalWallet,
        destination: &str,
        amount: f64,
        memo: &str,
    ) -> Option<String>;

    /// Complete an OAuth-style authorization and produce a connected
    /// wallet.
    async fn handle_authorization_response(
        &self,
        auth_params: &HashMap<String, String>,
    ) -> Option<ExternalWallet>;

    /// Sink address for the per-transaction contribution fee.
    fn contribution_fee_address(&self) -> String;

    /// Order-receiving address for contribution token purchases, if the
    /// provider supports them.
    fn contribution_token_order_address(&self) -> Option<String>;
}
