//! Contribution tokens: unblinded vouchers redeemable for a fixed value.

use serde::{Deserialize, Serialize};

use crate::ParseEnumError;

/// The redemption value of a single contribution token, in BAT.
pub const TOKEN_VALUE: f64 = 0.25;

/// Where a token came from, which also determines how it is redeemed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenType {
    /// Virtual grant token; redeemed through the promotion service.
    #[serde(rename = "vg")]
    Vg,
    /// Purchased token; redeemed as a vote through the payment service.
    #[serde(rename = "sku")]
    Sku,
}

impl TokenType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenType::Vg => "vg",
            TokenType::Sku => "sku",
        }
    }
}

impl std::str::FromStr for TokenType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "vg" => Ok(TokenType::Vg),
            "sku" => Ok(TokenType::Sku),
            other => Err(ParseEnumError::new("token type", other)),
        }
    }
}

/// A single unblinded voucher held in the token table.
///
/// A token is always in exactly one of three states: free, reserved by one
/// hold, or redeemed against a contribution.
#[derive(Clone, Debug, PartialEq)]
pub struct ContributionToken {
    /// Row id in the token table; zero before insertion.
    pub id: i64,
    /// Redemption value in BAT.
    pub value: f64,
    /// Opaque unblinded token string.
    pub unblinded_token: String,
    /// Public key of the signing batch.
    pub public_key: String,
}
