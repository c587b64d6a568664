//! # patron-wallet
//!
//! External custodial wallets. The [`ExternalWalletManager`] tracks the
//! currently connected wallet and dispatches balance reads, BAT transfers
//! and address lookups to the matching provider handler. Wallets are never
//! persisted; the connected wallet is supplied at runtime via
//! authorization or restored by the embedder.

pub mod bitflyer;
pub mod gemini;
pub mod handler;
pub mod manager;
pub mod uphold;

pub use handler::WalletHandler;
pub use manager::ExternalWalletManager;
