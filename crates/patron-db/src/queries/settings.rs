//! User preference queries.

use rusqlite::Connection;

use crate::{DbError, Result};

/// Get a setting value by key.
pub fn get(conn: &Connection, key: &str) -> Result<String> {
    conn.query_row(
        "SELECT value FROM settings WHERE key = ?1",
        [key],
        |row| row.get(0),
    )
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => DbError::NotFound(format!("setting '{key}'")),
        other => DbError::Sqlite(other),
    })
}

/// Set a setting value.
pub fn set(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO settings (key, value) VALUES (?1, ?2)",
        rusqlite::params![key, value],
    )?;
    Ok(())
}

/// Get a setting as a boolean, defaulting to `default` if not found.
pub fn get_bool(conn: &Connection, key: &str, default: bool) -> Result<bool> {
    match get(conn, key) {
        Ok(v) => Ok(v == "true" || v == "1"),
        Err(DbError::NotFound(_)) => Ok(default),
        Err(e) => Err(e),
    }
}

/// Get a setting as i64, defaulting to `default` if not found.
pub fn get_i64(conn: &Connection, key: &str, default: i64) -> Result<i64> {
    match get(conn, key) {
        Ok(v) => v
            .parse()
            .map_err(|e: std::num::ParseIntError| DbError::Serialization(e.to_string())),
        Err(DbError::NotFound(_)) => Ok(default),
        Err(e) => Err(e),
    }
}

/// Get a setting as f64, defaulting to `default` if not found.
pub fn get_f64(conn: &Connection, key: &str, default: f64) -> Result<f64> {
    match get(conn, key) {
        Ok(v) => v
            .parse()
            .map_err(|e: std::num::ParseFloatError| DbError::Serialization(e.to_string())),
        Err(DbError::NotFound(_)) => Ok(default),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Db;

    fn test_db() -> Db {
        Db::open_memory().expect("open test db")
    }

    #[test]
    fn test_defaults_present() {
        let db = test_db();
        let enabled = db
            .with(|conn| get_bool(conn, "ac_enabled", true))
            .expect("get");
        assert!(!enabled);
        let visits = db
            .with(|conn| get_i64(conn, "ac_minimum_visits", 0))
            .expect("get");
        assert_eq!(visits, 1);
    }

    #[test]
    fn test_set_and_get() {
        let db = test_db();
        db.with(|conn| set(conn, "ac_amount", "5.5")).expect("set");
        let amount = db
            .with(|conn| get_f64(conn, "ac_amount", 0.0))
            .expect("get");
        assert_eq!(amount, 5.5);
    }

    #[test]
    fn test_missing_key_uses_default() {
        let db = test_db();
        let value = db
            .with(|conn| get_i64(conn, "nonexistent", 42))
            .expect("get");
        assert_eq!(value, 42);
    }
}
