//! Dictionary queries: miscellaneous engine singletons.

use rusqlite::Connection;

use crate::{DbError, Result};

/// Get a dictionary value by key.
pub fn get(conn: &Connection, key: &str) -> Result<Option<String>> {
    conn.query_row(
        "SELECT value FROM dictionary WHERE key = ?1",
        [key],
        |row| row.get(0),
    )
    .map(Some)
    .or_else(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => Ok(None),
        other => Err(DbError::Sqlite(other)),
    })
}

/// Set a dictionary value.
pub fn set(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO dictionary (key, value) VALUES (?1, ?2)",
        rusqlite::params![key, value],
    )?;
    Ok(())
}
