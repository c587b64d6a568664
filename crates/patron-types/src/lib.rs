//! # patron-types
//!
//! Core data types shared across the contribution engine: contribution
//! records, contribution tokens, external wallet descriptors, payment
//! orders and publisher info, plus the string codecs used when these
//! enums are written into job-state JSON and table columns.

pub mod contribution;
pub mod payment;
pub mod publisher;
pub mod token;
pub mod wallet;

pub use contribution::{
    Contribution, ContributionSource, ContributionType, PublisherActivity, RecurringContribution,
};
pub use payment::{PaymentOrder, PaymentOrderItem, PaymentOrderStatus};
pub use publisher::{Publisher, PublisherStatus};
pub use token::{ContributionToken, TokenType};
pub use wallet::{ExternalWallet, TransferResult, WalletProvider};

/// Error produced when a persisted enum string does not match any variant.
#[derive(Debug, thiserror::Error)]
#[error("unknown {kind} value: {value:?}")]
pub struct ParseEnumError {
    /// The enum family being parsed (e.g. "contribution type").
    pub kind: &'static str,
    /// The rejected input.
    pub value: String,
}

impl ParseEnumError {
    pub(crate) fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}
