//! The contribution router.
//!
//! Builds the [`Contribution`] record for a request, selects the funding
//! source and dispatches to the matching processor.

use patron_types::{Contribution, ContributionSource, ContributionType};

use crate::context::Context;
use crate::processor;

/// Select the current funding source: the external wallet when one is
/// connected, virtual grant tokens otherwise.
pub async fn get_current_source(ctx: &Context) -> ContributionSource {
    if ctx.wallet().has_external_wallet().await {
        ContributionSource::External
    } else {
        ContributionSource::VgTokens
    }
}

/// Route a contribution to a processor and await its completion.
pub async fn send_contribution(
    ctx: &Context,
    contribution_type: ContributionType,
    publisher_id: &str,
    amount: f64,
) -> bool {
    if publisher_id.is_empty() {
        tracing::error!("contribution requested with empty publisher id");
        return false;
    }

    if amount <= 0.0 {
        tracing::info!(publisher_id, "attempting to send a contribution with zero amount");
        return true;
    }

    let source = get_current_source(ctx).await;
    let contribution = Contribution::new(contribution_type, publisher_id, source, amount);

    match contribution.source {
        ContributionSource::VgTokens | ContributionSource::SkuTokens => {
            processor::token::process_contribution(ctx, contribution).await
        }
        ContributionSource::External => {
            processor::external::process_contribution(ctx, contribution).await
        }
    }
}
