//! Contribution fee processor.
//!
//! Sends the per-transaction fee to the provider's fee address. Fire and
//! forget: a failed fee transfer is logged but never fails the
//! contribution that produced it.

use crate::context::Context;

/// Transfer a contribution fee in the background.
pub fn send_contribution_fee(ctx: &Context, contribution_id: String, fee: f64) {
    if fee <= 0.0 {
        return;
    }

    let ctx = ctx.clone();
    tokio::spawn(async move {
        let Some(address) = ctx.wallet().get_contribution_fee_address().await else {
            tracing::warn!(contribution_id, "no fee address for connected wallet");
            return;
        };

        let memo = format!("contribution fee for {contribution_id}");
        match ctx.wallet().transfer_bat(&address, fee, &memo).await {
            Some(transfer) => {
                tracing::debug!(
                    contribution_id,
                    transaction_id = %transfer.transaction_id,
                    fee,
                    "contribution fee sent"
                );
            }
            None => {
                tracing::error!(contribution_id, fee, "contribution fee transfer failed");
            }
        }
    });
}
