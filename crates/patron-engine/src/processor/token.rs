//! Token contribution processor.
//!
//! Reserves tokens covering the contribution amount and redeems them:
//! SKU tokens become publisher votes at the payment service, VG tokens go
//! through the promotion service's suggestions endpoint. On success the
//! hold is stamped with the contribution id and the contribution row is
//! persisted.

use patron_payments::{PaymentVote, PaymentVoteType};
use patron_types::{Contribution, ContributionSource, ContributionType, TokenType};

use crate::context::Context;
use crate::tokens::TokenHold;

fn vote_type(contribution_type: ContributionType) -> PaymentVoteType {
    match contribution_type {
        ContributionType::OneTime => PaymentVoteType::OneOffTip,
        ContributionType::Recurring => PaymentVoteType::RecurringTip,
        ContributionType::AutoContribute => PaymentVoteType::AutoContribute,
    }
}

fn token_type(source: ContributionSource) -> Option<TokenType> {
    match source {
        ContributionSource::VgTokens => Some(TokenType::Vg),
        ContributionSource::SkuTokens => Some(TokenType::Sku),
        ContributionSource::External => None,
    }
}

/// Reserve tokens for the contribution amount and redeem them.
pub async fn process_contribution(ctx: &Context, contribution: Contribution) -> bool {
    let Some(token_type) = token_type(contribution.source) else {
        tracing::error!("token processor invoked for an external-wallet contribution");
        return false;
    };

    let hold = ctx.tokens().reserve_tokens(token_type, contribution.amount);
    process_contribution_with_hold(ctx, contribution, hold).await
}

/// Redeem an already-reserved hold for the contribution.
pub async fn process_contribution_with_hold(
    ctx: &Context,
    mut contribution: Contribution,
    mut hold: TokenHold,
) -> bool {
    if contribution.id.is_empty() || contribution.publisher_id.is_empty() {
        tracing::error!("malformed contribution request");
        return false;
    }

    let Some(token_type) = token_type(contribution.source) else {
        tracing::error!("token processor invoked for an external-wallet contribution");
        return false;
    };

    let total_value = hold.total_value();
    if total_value < contribution.amount {
        tracing::error!(
            requested = contribution.amount,
            reserved = total_value,
            "insufficient tokens reserved for contribution"
        );
        return false;
    }

    // The contribution amount can differ slightly from the requested amount
    // based on the per-token value; record the value actually being sent.
    contribution.amount = total_value;

    let redeemed = match token_type {
        TokenType::Sku => {
            let votes: Vec<PaymentVote> = hold
                .tokens()
                .iter()
                .map(|token| PaymentVote {
                    unblinded_token: token.unblinded_token.clone(),
                    public_key: token.public_key.clone(),
                })
                .collect();

            ctx.payment()
                .post_publisher_votes(
                    &contribution.publisher_id,
                    vote_type(contribution.contribution_type),
                    &votes,
                )
                .await
        }
        TokenType::Vg => {
            ctx.promotion()
                .post_suggestions(&patron_payments::promotion::SuggestionRedeem {
                    publisher_id: &contribution.publisher_id,
                    rewards_type: contribution.contribution_type.as_str(),
                    tokens: hold.tokens(),
                })
                .await
        }
    };

    if !redeemed {
        tracing::error!(
            publisher_id = %contribution.publisher_id,
            "unable to redeem contribution tokens"
        );
        return false;
    }

    hold.on_tokens_redeemed(&contribution.id);
    ctx.store().save_contribution(&contribution);
    true
}
