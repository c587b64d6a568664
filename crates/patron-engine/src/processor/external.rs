//! External wallet contribution processor.
//!
//! Splits the amount into a 5% contribution fee and a net transfer,
//! resolves the publisher's custodial address for the connected provider
//! and records the contribution with the provider transaction id.

use patron_types::{Contribution, ContributionSource, ContributionType, Publisher};

use crate::context::Context;
use crate::processor::fee;

/// Per-transaction contribution fee rate.
const TRANSFER_FEE_RATE: f64 = 0.05;

/// Send a contribution from the connected external wallet.
pub async fn process_contribution(ctx: &Context, contribution: Contribution) -> bool {
    if contribution.id.is_empty()
        || contribution.publisher_id.is_empty()
        || contribution.amount <= 0.0
        || contribution.source != ContributionSource::External
        || contribution.contribution_type == ContributionType::AutoContribute
    {
        tracing::error!("malformed external contribution request");
        return false;
    }

    let fee = contribution.amount * TRANSFER_FEE_RATE;
    let net_amount = contribution.amount - fee;

    let Some(balance) = ctx.wallet().get_balance().await else {
        tracing::error!("unable to read external wallet balance");
        return false;
    };

    if balance < contribution.amount {
        tracing::error!(
            balance,
            amount = contribution.amount,
            "insufficient funds for contribution"
        );
        return false;
    }

    let Some(publisher) = ctx.publishers().get_publisher(&contribution.publisher_id).await
    else {
        tracing::error!(
            publisher_id = %contribution.publisher_id,
            "unable to fetch publisher info"
        );
        return false;
    };

    let Some(address) = publisher_address(ctx, &publisher).await else {
        tracing::error!(
            publisher_id = %contribution.publisher_id,
            "publisher does not have a matching wallet provider address"
        );
        return false;
    };

    let Some(transfer) = ctx.wallet().transfer_bat(&address, net_amount, "").await else {
        tracing::error!(
            publisher_id = %contribution.publisher_id,
            "unable to send contribution to publisher"
        );
        return false;
    };

    fee::send_contribution_fee(ctx, contribution.id.clone(), fee);

    ctx.store().save_external_contribution(&contribution, &transfer);
    true
}

/// The publisher's custodial address, if its verification tier matches the
/// connected wallet's provider.
async fn publisher_address(ctx: &Context, publisher: &Publisher) -> Option<String> {
    let wallet = ctx.wallet().get_external_wallet().await?;
    if !publisher.status.accepts_provider(wallet.provider) || publisher.address.is_empty() {
        return None;
    }
    Some(publisher.address.clone())
}
