//! # patron-payments
//!
//! The engine's HTTP boundary and the typed service clients built on it:
//! the payment service (SKU orders, provider transactions, credentials,
//! publisher votes), the promotion service (grant-token suggestions) and
//! the publisher service (registration lookups).
//!
//! Wire details beyond the bodies these clients read and write are not
//! modeled; endpoints are typed request/response mappings and every client
//! reports failure by returning `None`/`false` after logging, never by
//! panicking or propagating.

pub mod environment;
pub mod fetcher;
pub mod payment;
pub mod promotion;
pub mod publishers;

pub use environment::{Environment, EnvironmentConfig};
pub use fetcher::{FetchOptions, HttpFetcher, UrlFetcher, UrlRequest, UrlResponse};
pub use payment::{CredsBatch, NewOrderItem, PaymentService, PaymentVote, PaymentVoteType};
pub use promotion::PromotionService;
pub use publishers::PublisherService;
