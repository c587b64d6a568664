//! Publisher activity and recurring-contribution queries.

use rusqlite::Connection;

use patron_types::{PublisherActivity, RecurringContribution};

use crate::{DbError, Result};

/// Record a visit: increments the visit count and adds dwell time.
///
/// Inserts the publisher row on first visit.
pub fn add_visit(conn: &Connection, publisher_id: &str, duration_secs: f64) -> Result<()> {
    let existing: Option<(i64, f64)> = conn
        .query_row(
            "SELECT visits, duration FROM contribution_publisher WHERE publisher_id = ?1",
            [publisher_id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .map(Some)
        .or_else(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => Ok(None),
            other => Err(DbError::Sqlite(other)),
        })?;

    match existing {
        Some((visits, duration)) => {
            conn.execute(
                "UPDATE contribution_publisher SET visits = ?1, duration = ?2
                 WHERE publisher_id = ?3",
                rusqlite::params![visits + 1, duration + duration_secs, publisher_id],
            )?;
        }
        None => {
            conn.execute(
                "INSERT INTO contribution_publisher (publisher_id, visits, duration)
                 VALUES (?1, 1, ?2)",
                rusqlite::params![publisher_id, duration_secs],
            )?;
        }
    }

    Ok(())
}

/// Publishers with recorded dwell time and auto-contribute enabled.
pub fn get_activity(conn: &Connection) -> Result<Vec<PublisherActivity>> {
    let mut stmt = conn.prepare(
        "SELECT publisher_id, visits, duration
         FROM contribution_publisher
         WHERE duration > 0 AND auto_contribute_enabled = 1",
    )?;

    let rows = stmt
        .query_map([], |row| {
            Ok(PublisherActivity {
                publisher_id: row.get(0)?,
                visits: row.get(1)?,
                duration_secs: row.get(2)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

/// Zero out visit counts and dwell time for all publishers.
pub fn reset_activity(conn: &Connection) -> Result<()> {
    conn.execute(
        "UPDATE contribution_publisher SET visits = 0, duration = 0",
        [],
    )?;
    Ok(())
}

/// Exclude or re-include a publisher from auto-contribute.
pub fn set_auto_contribute_enabled(
    conn: &Connection,
    publisher_id: &str,
    enabled: bool,
) -> Result<()> {
    conn.execute(
        "INSERT INTO contribution_publisher (publisher_id, auto_contribute_enabled)
         VALUES (?1, ?2)
         ON CONFLICT (publisher_id)
         DO UPDATE SET auto_contribute_enabled = excluded.auto_contribute_enabled",
        rusqlite::params![publisher_id, enabled],
    )?;
    Ok(())
}

/// All publishers with a positive recurring amount.
pub fn get_recurring(conn: &Connection) -> Result<Vec<RecurringContribution>> {
    let mut stmt = conn.prepare(
        "SELECT publisher_id, recurring_amount
         FROM contribution_publisher
         WHERE recurring_amount > 0",
    )?;

    let rows = stmt
        .query_map([], |row| {
            Ok(RecurringContribution {
                publisher_id: row.get(0)?,
                amount: row.get(1)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

/// Upsert the per-cycle amount for a publisher. Negative amounts clamp to 0;
/// a zero amount removes the recurrence.
pub fn set_recurring(conn: &Connection, publisher_id: &str, amount: f64) -> Result<()> {
    let amount = amount.max(0.0);
    conn.execute(
        "INSERT INTO contribution_publisher (publisher_id, recurring_amount)
         VALUES (?1, ?2)
         ON CONFLICT (publisher_id)
         DO UPDATE SET recurring_amount = excluded.recurring_amount",
        rusqlite::params![publisher_id, amount],
    )?;
    Ok(())
}
