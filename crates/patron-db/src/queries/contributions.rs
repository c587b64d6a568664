//! Completed and pending contribution queries.

use rusqlite::Connection;

use patron_types::{Contribution, TransferResult};

use crate::{DbError, Result};

/// Pending contributions expire after 90 days.
const PENDING_EXPIRY_SECS: u64 = 90 * 24 * 60 * 60;

/// A completed contribution as stored.
#[derive(Clone, Debug)]
pub struct ContributionRow {
    pub contribution_id: String,
    pub contribution_type: String,
    pub publisher_id: String,
    pub amount: f64,
    pub source: String,
    pub external_provider: Option<String>,
    pub external_transaction_id: Option<String>,
    pub completed_at: u64,
}

/// A queued tip for a publisher that could not yet receive it.
#[derive(Clone, Debug, PartialEq)]
pub struct PendingContributionRow {
    pub id: i64,
    pub publisher_id: String,
    pub amount: f64,
    pub created_at: u64,
}

/// Record a completed token-funded contribution.
pub fn save(conn: &Connection, contribution: &Contribution, now: u64) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO contribution (contribution_id, contribution_type,
           publisher_id, amount, source, completed_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        rusqlite::params![
            contribution.id,
            contribution.contribution_type.as_str(),
            contribution.publisher_id,
            contribution.amount,
            contribution.source.as_str(),
            now as i64,
        ],
    )?;
    Ok(())
}

/// Record a completed contribution sent through an external wallet.
pub fn save_with_transfer(
    conn: &Connection,
    contribution: &Contribution,
    transfer: &TransferResult,
    now: u64,
) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO contribution (contribution_id, contribution_type,
           publisher_id, amount, source, external_provider, external_transaction_id,
           completed_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        rusqlite::params![
            contribution.id,
            contribution.contribution_type.as_str(),
            contribution.publisher_id,
            contribution.amount,
            contribution.source.as_str(),
            transfer.provider.as_str(),
            transfer.transaction_id,
            now as i64,
        ],
    )?;
    Ok(())
}

/// Load a contribution by id.
pub fn get(conn: &Connection, contribution_id: &str) -> Result<Option<ContributionRow>> {
    conn.query_row(
        "SELECT contribution_id, contribution_type, publisher_id, amount, source,
                external_provider, external_transaction_id, completed_at
         FROM contribution WHERE contribution_id = ?1",
        [contribution_id],
        |row| {
            Ok(ContributionRow {
                contribution_id: row.get(0)?,
                contribution_type: row.get(1)?,
                publisher_id: row.get(2)?,
                amount: row.get(3)?,
                source: row.get(4)?,
                external_provider: row.get(5)?,
                external_transaction_id: row.get(6)?,
                completed_at: row.get::<_, i64>(7)? as u64,
            })
        },
    )
    .map(Some)
    .or_else(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => Ok(None),
        other => Err(DbError::Sqlite(other)),
    })
}

/// All recorded contributions, most recent first.
pub fn list(conn: &Connection) -> Result<Vec<ContributionRow>> {
    let mut stmt = conn.prepare(
        "SELECT contribution_id, contribution_type, publisher_id, amount, source,
                external_provider, external_transaction_id, completed_at
         FROM contribution ORDER BY completed_at DESC, contribution_id",
    )?;

    let rows = stmt
        .query_map([], |row| {
            Ok(ContributionRow {
                contribution_id: row.get(0)?,
                contribution_type: row.get(1)?,
                publisher_id: row.get(2)?,
                amount: row.get(3)?,
                source: row.get(4)?,
                external_provider: row.get(5)?,
                external_transaction_id: row.get(6)?,
                completed_at: row.get::<_, i64>(7)? as u64,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

/// Queue a tip that will be retried once the publisher can accept it.
pub fn save_pending(conn: &Connection, publisher_id: &str, amount: f64, now: u64) -> Result<()> {
    conn.execute(
        "INSERT INTO pending_contribution (publisher_id, amount, created_at)
         VALUES (?1, ?2, ?3)",
        rusqlite::params![publisher_id, amount, now as i64],
    )?;
    Ok(())
}

/// Pending contributions still inside the expiry window.
///
/// Expired entries are deleted as part of the read.
pub fn get_pending(conn: &Connection, now: u64) -> Result<Vec<PendingContributionRow>> {
    let cutoff = now.saturating_sub(PENDING_EXPIRY_SECS) as i64;

    conn.execute(
        "DELETE FROM pending_contribution WHERE created_at < ?1",
        [cutoff],
    )?;

    let mut stmt = conn.prepare(
        "SELECT id, publisher_id, amount, created_at
         FROM pending_contribution ORDER BY created_at, id",
    )?;

    let rows = stmt
        .query_map([], |row| {
            Ok(PendingContributionRow {
                id: row.get(0)?,
                publisher_id: row.get(1)?,
                amount: row.get(2)?,
                created_at: row.get::<_, i64>(3)? as u64,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

/// Remove a pending contribution by id.
pub fn delete_pending(conn: &Connection, id: i64) -> Result<()> {
    conn.execute("DELETE FROM pending_contribution WHERE id = ?1", [id])?;
    Ok(())
}
