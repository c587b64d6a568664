//! External wallet descriptors.

use serde::{Deserialize, Serialize};

use crate::ParseEnumError;

/// A supported custodial wallet provider.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum WalletProvider {
    #[serde(rename = "uphold")]
    Uphold,
    #[serde(rename = "gemini")]
    Gemini,
    #[serde(rename = "bitflyer")]
    Bitflyer,
}

impl WalletProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            WalletProvider::Uphold => "uphold",
            WalletProvider::Gemini => "gemini",
            WalletProvider::Bitflyer => "bitflyer",
        }
    }
}

impl std::str::FromStr for WalletProvider {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "uphold" => Ok(WalletProvider::Uphold),
            "gemini" => Ok(WalletProvider::Gemini),
            "bitflyer" => Ok(WalletProvider::Bitflyer),
            other => Err(ParseEnumError::new("wallet provider", other)),
        }
    }
}

/// A connected external wallet, supplied by the wallet collaborator.
///
/// Never persisted by the engine.
#[derive(Clone, Debug)]
pub struct ExternalWallet {
    pub provider: WalletProvider,
    /// Provider-side account or card address.
    pub address: String,
    pub access_token: String,
}

/// The outcome of a successful external transfer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransferResult {
    pub provider: WalletProvider,
    pub transaction_id: String,
}
