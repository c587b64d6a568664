//! Token reservations.
//!
//! The token manager is the only path to the token table. A reservation
//! produces a [`TokenHold`]: an exclusive, splittable claim on a set of
//! tokens. Dropping a hold releases its un-redeemed tokens; redeeming it
//! stamps them with the contribution id permanently.

use std::sync::Arc;

use patron_db::queries::tokens as token_queries;
use patron_db::Db;
use patron_jobs::Clock;
use patron_types::{ContributionToken, TokenType};

pub use patron_db::queries::tokens::NewToken;

/// Serialized access to the token inventory.
#[derive(Clone)]
pub struct TokenManager {
    db: Db,
    clock: Arc<dyn Clock>,
}

impl TokenManager {
    pub fn new(db: Db, clock: Arc<dyn Clock>) -> Self {
        Self { db, clock }
    }

    /// Reserve tokens of `token_type` covering `amount`. The hold may come
    /// back short (or empty) if the inventory cannot cover the amount.
    pub fn reserve_tokens(&self, token_type: TokenType, amount: f64) -> TokenHold {
        let hold_id = uuid::Uuid::new_v4().to_string();
        let tokens = self
            .db
            .with_tx(|conn| token_queries::reserve_amount(conn, token_type, amount, &hold_id))
            .unwrap_or_else(|e| {
                tracing::error!(error = %e, "token reservation failed");
                Vec::new()
            });

        self.hold(hold_id, tokens)
    }

    /// Re-reserve the exact tokens named by `ids` (job resumption). Tokens
    /// that were redeemed in the meantime are skipped.
    pub fn reserve_token_ids(&self, ids: &[i64]) -> TokenHold {
        let hold_id = uuid::Uuid::new_v4().to_string();
        let tokens = self
            .db
            .with_tx(|conn| token_queries::reserve_ids(conn, ids, &hold_id))
            .unwrap_or_else(|e| {
                tracing::error!(error = %e, "token re-reservation failed");
                Vec::new()
            });

        self.hold(hold_id, tokens)
    }

    /// Add freshly minted tokens to the inventory.
    pub fn insert_tokens(&self, tokens: &[NewToken], token_type: TokenType) -> bool {
        match self
            .db
            .with_tx(|conn| token_queries::insert(conn, tokens, token_type))
        {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(error = %e, "token insertion failed");
                false
            }
        }
    }

    /// Combined value of free tokens of the given type.
    pub fn get_available_token_balance(&self, token_type: TokenType) -> f64 {
        self.db
            .with(|conn| token_queries::available_balance(conn, token_type))
            .unwrap_or_else(|e| {
                tracing::error!(error = %e, "token balance read failed");
                0.0
            })
    }

    fn hold(&self, id: String, tokens: Vec<ContributionToken>) -> TokenHold {
        TokenHold {
            db: self.db.clone(),
            clock: self.clock.clone(),
            id,
            tokens,
            redeemed: false,
        }
    }
}

/// An exclusive reservation of a set of tokens.
pub struct TokenHold {
    db: Db,
    clock: Arc<dyn Clock>,
    id: String,
    tokens: Vec<ContributionToken>,
    redeemed: bool,
}

impl TokenHold {
    pub fn tokens(&self) -> &[ContributionToken] {
        &self.tokens
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn token_ids(&self) -> Vec<i64> {
        self.tokens.iter().map(|t| t.id).collect()
    }

    /// Sum of the held tokens' values.
    pub fn total_value(&self) -> f64 {
        self.tokens.iter().map(|t| t.value).sum()
    }

    /// Remove `count` tokens from this hold and return a new hold owning
    /// them.
    pub fn split(&mut self, count: usize) -> TokenHold {
        let count = count.min(self.tokens.len());
        let split_tokens: Vec<ContributionToken> = self.tokens.drain(..count).collect();
        let split_id = uuid::Uuid::new_v4().to_string();

        let ids: Vec<i64> = split_tokens.iter().map(|t| t.id).collect();
        if let Err(e) = self
            .db
            .with(|conn| token_queries::move_to_hold(conn, &ids, &split_id))
        {
            tracing::error!(error = %e, "hold split failed");
        }

        TokenHold {
            db: self.db.clone(),
            clock: self.clock.clone(),
            id: split_id,
            tokens: split_tokens,
            redeemed: false,
        }
    }

    /// Permanently tie the held tokens to a completed contribution.
    pub fn on_tokens_redeemed(&mut self, contribution_id: &str) -> bool {
        let now = self.clock.now_secs();
        match self
            .db
            .with(|conn| token_queries::redeem_hold(conn, &self.id, contribution_id, now))
        {
            Ok(()) => {
                self.redeemed = true;
                true
            }
            Err(e) => {
                tracing::error!(error = %e, "token redemption failed");
                false
            }
        }
    }
}

impl Drop for TokenHold {
    fn drop(&mut self) {
        if self.redeemed || self.tokens.is_empty() {
            return;
        }
        if let Err(e) = self
            .db
            .with(|conn| token_queries::release_hold(conn, &self.id))
        {
            tracing::error!(error = %e, "hold release failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use patron_jobs::ManualClock;

    fn manager() -> TokenManager {
        TokenManager::new(
            Db::open_memory().expect("open db"),
            Arc::new(ManualClock::new(1_000)),
        )
    }

    fn seed(manager: &TokenManager, count: usize, token_type: TokenType) {
        let tokens: Vec<NewToken> = (0..count)
            .map(|i| NewToken {
                value: 0.25,
                unblinded_token: format!("ut-{i}"),
                public_key: "pk".to_string(),
            })
            .collect();
        assert!(manager.insert_tokens(&tokens, token_type));
    }

    #[test]
    fn test_reserve_and_drop_releases() {
        let manager = manager();
        seed(&manager, 8, TokenType::Vg);

        {
            let hold = manager.reserve_tokens(TokenType::Vg, 1.0);
            assert_eq!(hold.tokens().len(), 4);
            assert!((hold.total_value() - 1.0).abs() < 1e-9);
            assert!(
                (manager.get_available_token_balance(TokenType::Vg) - 1.0).abs() < 1e-9
            );
        }

        // Hold dropped without redemption: tokens are free again.
        assert!((manager.get_available_token_balance(TokenType::Vg) - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_redeemed_hold_does_not_release() {
        let manager = manager();
        seed(&manager, 4, TokenType::Vg);

        {
            let mut hold = manager.reserve_tokens(TokenType::Vg, 1.0);
            assert!(hold.on_tokens_redeemed("contribution-1"));
        }

        assert_eq!(manager.get_available_token_balance(TokenType::Vg), 0.0);
    }

    #[test]
    fn test_split_partitions_tokens() {
        let manager = manager();
        seed(&manager, 8, TokenType::Sku);

        let mut hold = manager.reserve_tokens(TokenType::Sku, 2.0);
        assert_eq!(hold.tokens().len(), 8);

        let split = hold.split(3);
        assert_eq!(split.tokens().len(), 3);
        assert_eq!(hold.tokens().len(), 5);
        assert!((split.total_value() - 0.75).abs() < 1e-9);

        let all_ids: Vec<i64> = split
            .token_ids()
            .iter()
            .chain(hold.token_ids().iter())
            .copied()
            .collect();
        assert_eq!(all_ids.len(), 8);
    }

    #[test]
    fn test_split_redeem_keeps_remainder_reserved() {
        let manager = manager();
        seed(&manager, 4, TokenType::Sku);

        let mut hold = manager.reserve_tokens(TokenType::Sku, 1.0);
        let mut split = hold.split(2);
        assert!(split.on_tokens_redeemed("contribution-1"));

        // The rest of the original hold is still reserved.
        assert_eq!(manager.get_available_token_balance(TokenType::Sku), 0.0);
        drop(hold);
        assert!((manager.get_available_token_balance(TokenType::Sku) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_reserve_token_ids_for_resumption() {
        let manager = manager();
        seed(&manager, 4, TokenType::Sku);

        let ids = {
            let hold = manager.reserve_tokens(TokenType::Sku, 1.0);
            let ids = hold.token_ids();
            // Simulate a crash: forget the hold without dropping it.
            std::mem::forget(hold);
            ids
        };

        let recovered = manager.reserve_token_ids(&ids);
        assert_eq!(recovered.token_ids(), ids);
    }

    #[test]
    fn test_empty_reservation() {
        let manager = manager();
        let hold = manager.reserve_tokens(TokenType::Vg, 1.0);
        assert!(hold.is_empty());
        assert_eq!(hold.total_value(), 0.0);
    }
}
