//! Contribution records and the per-publisher inputs they are built from.

use serde::{Deserialize, Serialize};

use crate::ParseEnumError;

/// The policy under which a contribution is sent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContributionType {
    /// A user-initiated tip.
    #[serde(rename = "one-time")]
    OneTime,
    /// A per-cycle tip configured by the user.
    #[serde(rename = "recurring")]
    Recurring,
    /// Background weight-proportional contribution.
    #[serde(rename = "auto-contribute")]
    AutoContribute,
}

impl ContributionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContributionType::OneTime => "one-time",
            ContributionType::Recurring => "recurring",
            ContributionType::AutoContribute => "auto-contribute",
        }
    }
}

impl std::str::FromStr for ContributionType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "one-time" => Ok(ContributionType::OneTime),
            "recurring" => Ok(ContributionType::Recurring),
            "auto-contribute" => Ok(ContributionType::AutoContribute),
            other => Err(ParseEnumError::new("contribution type", other)),
        }
    }
}

/// The funding source a contribution is drawn from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContributionSource {
    /// Virtual grant tokens minted by the promotion service.
    #[serde(rename = "vg-tokens")]
    VgTokens,
    /// Tokens purchased against an external-wallet transfer.
    #[serde(rename = "sku-tokens")]
    SkuTokens,
    /// A connected external wallet, transferred directly.
    #[serde(rename = "external-wallet")]
    External,
}

impl ContributionSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContributionSource::VgTokens => "vg-tokens",
            ContributionSource::SkuTokens => "sku-tokens",
            ContributionSource::External => "external-wallet",
        }
    }
}

impl std::str::FromStr for ContributionSource {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "vg-tokens" => Ok(ContributionSource::VgTokens),
            "sku-tokens" => Ok(ContributionSource::SkuTokens),
            "external-wallet" => Ok(ContributionSource::External),
            other => Err(ParseEnumError::new("contribution source", other)),
        }
    }
}

/// A single unit of value movement from the user to a publisher.
///
/// Created at routing time and immutable afterwards, except that token
/// processors replace `amount` with the exact value of the tokens being
/// redeemed. Persisted to the `contribution` table only on success.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Contribution {
    /// Lowercase UUID, generated at routing time.
    pub id: String,
    pub contribution_type: ContributionType,
    pub publisher_id: String,
    /// Amount in BAT.
    pub amount: f64,
    pub source: ContributionSource,
}

impl Contribution {
    /// Create a new contribution with a fresh id.
    pub fn new(
        contribution_type: ContributionType,
        publisher_id: &str,
        source: ContributionSource,
        amount: f64,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            contribution_type,
            publisher_id: publisher_id.to_string(),
            amount,
            source,
        }
    }
}

/// Accumulated browsing activity for one publisher.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PublisherActivity {
    pub publisher_id: String,
    pub visits: i64,
    /// Cumulative dwell time in seconds.
    pub duration_secs: f64,
}

/// A user-configured per-cycle contribution.
#[derive(Clone, Debug, PartialEq)]
pub struct RecurringContribution {
    pub publisher_id: String,
    /// Amount in BAT.
    pub amount: f64,
}
