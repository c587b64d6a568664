//! Publisher registration info served by the publisher service.

use serde::{Deserialize, Serialize};

use crate::{ParseEnumError, WalletProvider};

/// Verification tier of a publisher.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PublisherStatus {
    #[serde(rename = "not-verified")]
    NotVerified,
    /// Registered and able to receive token contributions, but with no
    /// custodial wallet attached.
    #[serde(rename = "verified")]
    Verified,
    #[serde(rename = "uphold-verified")]
    UpholdVerified,
    #[serde(rename = "gemini-verified")]
    GeminiVerified,
    #[serde(rename = "bitflyer-verified")]
    BitflyerVerified,
}

impl PublisherStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PublisherStatus::NotVerified => "not-verified",
            PublisherStatus::Verified => "verified",
            PublisherStatus::UpholdVerified => "uphold-verified",
            PublisherStatus::GeminiVerified => "gemini-verified",
            PublisherStatus::BitflyerVerified => "bitflyer-verified",
        }
    }

    /// Whether a publisher with this status can accept a direct transfer
    /// from a wallet of the given provider.
    pub fn accepts_provider(&self, provider: WalletProvider) -> bool {
        matches!(
            (self, provider),
            (PublisherStatus::UpholdVerified, WalletProvider::Uphold)
                | (PublisherStatus::GeminiVerified, WalletProvider::Gemini)
                | (PublisherStatus::BitflyerVerified, WalletProvider::Bitflyer)
        )
    }
}

impl std::str::FromStr for PublisherStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "not-verified" => Ok(PublisherStatus::NotVerified),
            "verified" => Ok(PublisherStatus::Verified),
            "uphold-verified" => Ok(PublisherStatus::UpholdVerified),
            "gemini-verified" => Ok(PublisherStatus::GeminiVerified),
            "bitflyer-verified" => Ok(PublisherStatus::BitflyerVerified),
            other => Err(ParseEnumError::new("publisher status", other)),
        }
    }
}

/// A publisher record as served by the publisher service.
#[derive(Clone, Debug, PartialEq)]
pub struct Publisher {
    pub registered: bool,
    pub status: PublisherStatus,
    /// Custodial address for the provider named by `status`, if any.
    pub address: String,
}
