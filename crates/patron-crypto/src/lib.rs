//! # patron-crypto
//!
//! The blind-token boundary consumed by the contribution token vendor.
//!
//! The vendor treats blinding and unblinding as opaque operations: it asks
//! for a batch of `(token, blinded_token)` pairs, ships the blinded forms to
//! the payment service for signing, and later turns the signed forms plus a
//! batch proof into unblinded vouchers. Any implementation of those two
//! operations is acceptable to the rest of the engine.

pub mod privacy_pass;

pub use privacy_pass::{PrivacyPass, TokenBatch};

/// Error types for blind-token operations.
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    /// The signed batch does not line up with the tokens being unblinded.
    #[error("batch mismatch: {0}")]
    BatchMismatch(String),

    /// The batch proof or public key failed verification.
    #[error("invalid batch proof")]
    InvalidProof,

    /// A token string could not be decoded.
    #[error("malformed token: {0}")]
    MalformedToken(String),
}

pub type Result<T> = std::result::Result<T, CryptoError>;
