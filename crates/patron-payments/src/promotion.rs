//! Promotion service client: redeeming virtual grant tokens.

use std::sync::Arc;

use patron_types::ContributionToken;

use crate::environment::EnvironmentConfig;
use crate::fetcher::{FetchOptions, UrlFetcher, UrlRequest};

/// A grant-token redemption against one publisher.
#[derive(Clone, Debug)]
pub struct SuggestionRedeem<'a> {
    pub publisher_id: &'a str,
    /// The contribution policy string ("one-time", "recurring",
    /// "auto-contribute").
    pub rewards_type: &'a str,
    pub tokens: &'a [ContributionToken],
}

/// Typed access to the promotion service.
#[derive(Clone)]
pub struct PromotionService {
    fetcher: Arc<dyn UrlFetcher>,
    config: EnvironmentConfig,
}

impl PromotionService {
    pub fn new(fetcher: Arc<dyn UrlFetcher>, config: EnvironmentConfig) -> Self {
        Self { fetcher, config }
    }

    /// Redeem unblinded grant tokens as a suggestion for a publisher.
    pub async fn post_suggestions(&self, redeem: &SuggestionRedeem<'_>) -> bool {
        let body = serde_json::json!({
            "type": redeem.rewards_type,
            "channel": redeem.publisher_id,
            "credentials": redeem
                .tokens
                .iter()
                .map(|token| serde_json::json!({
                    "t": token.unblinded_token,
                    "publicKey": token.public_key,
                }))
                .collect::<Vec<_>>(),
        });

        let request =
            UrlRequest::post(self.config.promotion_url("/v1/suggestions")).with_json(&body);
        let options = FetchOptions {
            disable_logging: true,
            ..Default::default()
        };
        let response = self.fetcher.fetch(request, options).await;
        if !response.succeeded() {
            tracing::error!(status = response.status_code, "suggestion redemption failed");
        }
        response.succeeded()
    }
}
