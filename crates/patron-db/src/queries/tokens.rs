//! Contribution token inventory queries.
//!
//! A token row is free (`reserved_for` NULL, `redeemed_at` NULL), reserved
//! by exactly one hold, or redeemed. Reservation and release are single
//! UPDATE statements keyed on the hold id, so two holds can never claim the
//! same token.

use rusqlite::Connection;

use patron_types::{ContributionToken, TokenType};

use crate::Result;

/// A token pending insertion.
#[derive(Clone, Debug)]
pub struct NewToken {
    pub value: f64,
    pub unblinded_token: String,
    pub public_key: String,
}

/// Insert a batch of unblinded tokens as free inventory.
pub fn insert(conn: &Connection, tokens: &[NewToken], token_type: TokenType) -> Result<()> {
    let mut stmt = conn.prepare(
        "INSERT INTO contribution_token (token_type, value, unblinded_token, public_key)
         VALUES (?1, ?2, ?3, ?4)",
    )?;

    for token in tokens {
        stmt.execute(rusqlite::params![
            token_type.as_str(),
            token.value,
            token.unblinded_token,
            token.public_key,
        ])?;
    }

    Ok(())
}

/// Reserve free tokens of `token_type` until their combined value covers
/// `amount`, marking them with `hold_id`. Returns the reserved tokens; if
/// the inventory cannot cover the amount, everything available is taken.
pub fn reserve_amount(
    conn: &Connection,
    token_type: TokenType,
    amount: f64,
    hold_id: &str,
) -> Result<Vec<ContributionToken>> {
    let mut stmt = conn.prepare(
        "SELECT token_id, value FROM contribution_token
         WHERE token_type = ?1 AND reserved_for IS NULL AND redeemed_at IS NULL
         ORDER BY token_id",
    )?;

    let candidates = stmt
        .query_map([token_type.as_str()], |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, f64>(1)?))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut ids = Vec::new();
    let mut total = 0.0;
    for (id, value) in candidates {
        if total >= amount {
            break;
        }
        ids.push(id);
        total += value;
    }

    reserve_ids(conn, &ids, hold_id)
}

/// Reserve the exact tokens named by `ids` under `hold_id`.
///
/// Used when a resumed job re-claims tokens it recorded before a restart;
/// stale reservations from the dead run are overwritten. Redeemed tokens
/// are never re-reserved.
pub fn reserve_ids(
    conn: &Connection,
    ids: &[i64],
    hold_id: &str,
) -> Result<Vec<ContributionToken>> {
    let mut update = conn.prepare(
        "UPDATE contribution_token SET reserved_for = ?1
         WHERE token_id = ?2 AND redeemed_at IS NULL",
    )?;
    for id in ids {
        update.execute(rusqlite::params![hold_id, id])?;
    }

    held_by(conn, hold_id)
}

/// Move tokens from one hold to another (hold split).
pub fn move_to_hold(conn: &Connection, ids: &[i64], hold_id: &str) -> Result<()> {
    let mut stmt = conn.prepare(
        "UPDATE contribution_token SET reserved_for = ?1
         WHERE token_id = ?2 AND redeemed_at IS NULL",
    )?;
    for id in ids {
        stmt.execute(rusqlite::params![hold_id, id])?;
    }
    Ok(())
}

/// Release every un-redeemed token held by `hold_id` back to free inventory.
pub fn release_hold(conn: &Connection, hold_id: &str) -> Result<()> {
    conn.execute(
        "UPDATE contribution_token SET reserved_for = NULL
         WHERE reserved_for = ?1 AND redeemed_at IS NULL",
        [hold_id],
    )?;
    Ok(())
}

/// Mark every token held by `hold_id` as redeemed against a contribution.
pub fn redeem_hold(
    conn: &Connection,
    hold_id: &str,
    contribution_id: &str,
    now: u64,
) -> Result<()> {
    conn.execute(
        "UPDATE contribution_token
         SET redeemed_at = ?1, contribution_id = ?2, reserved_for = NULL
         WHERE reserved_for = ?3",
        rusqlite::params![now as i64, contribution_id, hold_id],
    )?;
    Ok(())
}

/// Tokens currently reserved under `hold_id`.
pub fn held_by(conn: &Connection, hold_id: &str) -> Result<Vec<ContributionToken>> {
    let mut stmt = conn.prepare(
        "SELECT token_id, value, unblinded_token, public_key
         FROM contribution_token WHERE reserved_for = ?1
         ORDER BY token_id",
    )?;

    let rows = stmt
        .query_map([hold_id], |row| {
            Ok(ContributionToken {
                id: row.get(0)?,
                value: row.get(1)?,
                unblinded_token: row.get(2)?,
                public_key: row.get(3)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

/// Combined value of free tokens of the given type.
pub fn available_balance(conn: &Connection, token_type: TokenType) -> Result<f64> {
    let balance: f64 = conn.query_row(
        "SELECT COALESCE(SUM(value), 0) FROM contribution_token
         WHERE token_type = ?1 AND reserved_for IS NULL AND redeemed_at IS NULL",
        [token_type.as_str()],
        |row| row.get(0),
    )?;
    Ok(balance)
}

/// Token ids redeemed against a contribution.
pub fn redeemed_for(conn: &Connection, contribution_id: &str) -> Result<Vec<i64>> {
    let mut stmt = conn.prepare(
        "SELECT token_id FROM contribution_token
         WHERE contribution_id = ?1 AND redeemed_at IS NOT NULL
         ORDER BY token_id",
    )?;

    let rows = stmt
        .query_map([contribution_id], |row| row.get(0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Db;

    fn test_db() -> Db {
        Db::open_memory().expect("open test db")
    }

    fn seed(db: &Db, count: usize, token_type: TokenType) {
        let tokens: Vec<NewToken> = (0..count)
            .map(|i| NewToken {
                value: 0.25,
                unblinded_token: format!("ut-{i}"),
                public_key: "pk".to_string(),
            })
            .collect();
        db.with(|conn| insert(conn, &tokens, token_type)).expect("insert");
    }

    #[test]
    fn test_reserve_amount_takes_just_enough() {
        let db = test_db();
        seed(&db, 8, TokenType::Vg);

        let tokens = db
            .with(|conn| reserve_amount(conn, TokenType::Vg, 1.0, "hold-1"))
            .expect("reserve");
        assert_eq!(tokens.len(), 4);

        let balance = db
            .with(|conn| available_balance(conn, TokenType::Vg))
            .expect("balance");
        assert!((balance - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_reserve_amount_partial_when_insufficient() {
        let db = test_db();
        seed(&db, 2, TokenType::Vg);

        let tokens = db
            .with(|conn| reserve_amount(conn, TokenType::Vg, 5.0, "hold-1"))
            .expect("reserve");
        assert_eq!(tokens.len(), 2);
    }

    #[test]
    fn test_no_double_reservation() {
        let db = test_db();
        seed(&db, 4, TokenType::Sku);

        let first = db
            .with(|conn| reserve_amount(conn, TokenType::Sku, 1.0, "hold-1"))
            .expect("reserve");
        assert_eq!(first.len(), 4);

        let second = db
            .with(|conn| reserve_amount(conn, TokenType::Sku, 1.0, "hold-2"))
            .expect("reserve");
        assert!(second.is_empty());
    }

    #[test]
    fn test_reserve_respects_token_type() {
        let db = test_db();
        seed(&db, 4, TokenType::Vg);

        let tokens = db
            .with(|conn| reserve_amount(conn, TokenType::Sku, 1.0, "hold-1"))
            .expect("reserve");
        assert!(tokens.is_empty());
    }

    #[test]
    fn test_release_returns_tokens_to_inventory() {
        let db = test_db();
        seed(&db, 4, TokenType::Vg);

        db.with(|conn| reserve_amount(conn, TokenType::Vg, 1.0, "hold-1"))
            .expect("reserve");
        db.with(|conn| release_hold(conn, "hold-1")).expect("release");

        let balance = db
            .with(|conn| available_balance(conn, TokenType::Vg))
            .expect("balance");
        assert!((balance - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_redeem_is_permanent() {
        let db = test_db();
        seed(&db, 4, TokenType::Vg);

        let tokens = db
            .with(|conn| reserve_amount(conn, TokenType::Vg, 1.0, "hold-1"))
            .expect("reserve");
        db.with(|conn| redeem_hold(conn, "hold-1", "contribution-1", 500))
            .expect("redeem");

        let redeemed = db
            .with(|conn| redeemed_for(conn, "contribution-1"))
            .expect("redeemed");
        assert_eq!(redeemed.len(), tokens.len());

        // Redeemed tokens cannot be reserved again, even by id.
        let again = db
            .with(|conn| reserve_ids(conn, &redeemed, "hold-2"))
            .expect("reserve ids");
        assert!(again.is_empty());

        let balance = db
            .with(|conn| available_balance(conn, TokenType::Vg))
            .expect("balance");
        assert!(balance.abs() < 1e-9);
    }

    #[test]
    fn test_reserve_ids_overrides_stale_hold() {
        let db = test_db();
        seed(&db, 2, TokenType::Sku);

        let tokens = db
            .with(|conn| reserve_amount(conn, TokenType::Sku, 0.5, "dead-hold"))
            .expect("reserve");
        let ids: Vec<i64> = tokens.iter().map(|t| t.id).collect();

        // A restarted job re-reserves the exact ids it recorded.
        let recovered = db
            .with(|conn| reserve_ids(conn, &ids, "new-hold"))
            .expect("re-reserve");
        assert_eq!(recovered.len(), 2);

        let stale = db
            .with(|conn| held_by(conn, "dead-hold"))
            .expect("stale hold lookup");
        assert!(stale.is_empty());
    }

    #[test]
    fn test_move_to_hold_splits_reservation() {
        let db = test_db();
        seed(&db, 4, TokenType::Sku);

        let tokens = db
            .with(|conn| reserve_amount(conn, TokenType::Sku, 1.0, "hold-1"))
            .expect("reserve");
        let split_ids: Vec<i64> = tokens.iter().take(2).map(|t| t.id).collect();

        db.with(|conn| move_to_hold(conn, &split_ids, "hold-2")).expect("move");

        let remaining = db
            .with(|conn| held_by(conn, "hold-1"))
            .expect("hold-1 tokens");
        assert_eq!(remaining.len(), 2);
        let moved = db
            .with(|conn| held_by(conn, "hold-2"))
            .expect("hold-2 tokens");
        assert_eq!(moved.len(), 2);
    }
}
