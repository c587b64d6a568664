//! Resumable job state queries.
//!
//! A job row with `completed_at` NULL is resumable; once `completed_at` is
//! set the row is terminal and kept for inspection.

use rusqlite::Connection;

use crate::{DbError, Result};

/// A persisted job record.
#[derive(Clone, Debug)]
pub struct JobRow {
    pub job_id: String,
    pub job_type: String,
    /// JSON snapshot of the job's resumable state.
    pub state: String,
    pub error: Option<String>,
    pub created_at: u64,
    pub completed_at: Option<u64>,
}

/// Insert a new pending job.
pub fn insert(
    conn: &Connection,
    job_id: &str,
    job_type: &str,
    state: &str,
    now: u64,
) -> Result<()> {
    conn.execute(
        "INSERT INTO job_state (job_id, job_type, state, created_at)
         VALUES (?1, ?2, ?3, ?4)",
        rusqlite::params![job_id, job_type, state, now as i64],
    )?;
    Ok(())
}

/// Replace the state snapshot of an existing job.
pub fn update_state(conn: &Connection, job_id: &str, state: &str) -> Result<()> {
    let updated = conn.execute(
        "UPDATE job_state SET state = ?1 WHERE job_id = ?2",
        rusqlite::params![state, job_id],
    )?;
    if updated == 0 {
        return Err(DbError::NotFound(format!("job '{job_id}'")));
    }
    Ok(())
}

/// Load a job by id.
pub fn get(conn: &Connection, job_id: &str) -> Result<Option<JobRow>> {
    conn.query_row(
        "SELECT job_id, job_type, state, error, created_at, completed_at
         FROM job_state WHERE job_id = ?1",
        [job_id],
        |row| {
            Ok(JobRow {
                job_id: row.get(0)?,
                job_type: row.get(1)?,
                state: row.get(2)?,
                error: row.get(3)?,
                created_at: row.get::<_, i64>(4)? as u64,
                completed_at: row.get::<_, Option<i64>>(5)?.map(|t| t as u64),
            })
        },
    )
    .map(Some)
    .or_else(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => Ok(None),
        other => Err(DbError::Sqlite(other)),
    })
}

/// Mark a job terminal, optionally with an error.
pub fn complete(conn: &Connection, job_id: &str, error: Option<&str>, now: u64) -> Result<()> {
    conn.execute(
        "UPDATE job_state SET completed_at = ?1, error = ?2 WHERE job_id = ?3",
        rusqlite::params![now as i64, error, job_id],
    )?;
    Ok(())
}

/// Ids of all resumable jobs of the given type, oldest first.
pub fn active_ids(conn: &Connection, job_type: &str) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT job_id FROM job_state
         WHERE job_type = ?1 AND completed_at IS NULL
         ORDER BY created_at, job_id",
    )?;

    let rows = stmt
        .query_map([job_type], |row| row.get(0))?
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

    #[test]
    fn test_insert_and_get() {
        let db = test_db();
        db.with(|conn| insert(conn, "job-1", "purchase", "{}", 100))
            .expect("insert");

        let row = db
            .with(|conn| get(conn, "job-1"))
            .expect("get")
            .expect("row exists");
        assert_eq!(row.job_type, "purchase");
        assert_eq!(row.state, "{}");
        assert_eq!(row.created_at, 100);
        assert!(row.completed_at.is_none());
        assert!(row.error.is_none());
    }

    #[test]
    fn test_update_state_requires_row() {
        let db = test_db();
        let result = db.with(|conn| update_state(conn, "missing", "{}"));
        assert!(matches!(result, Err(DbError::NotFound(_))));
    }

    #[test]
    fn test_active_ids_excludes_completed() {
        let db = test_db();
        db.with(|conn| insert(conn, "job-1", "purchase", "{}", 100))
            .expect("insert");
        db.with(|conn| insert(conn, "job-2", "purchase", "{}", 200))
            .expect("insert");
        db.with(|conn| insert(conn, "job-3", "auto-contribute", "{}", 300))
            .expect("insert");
        db.with(|conn| complete(conn, "job-1", None, 400)).expect("complete");

        let active = db
            .with(|conn| active_ids(conn, "purchase"))
            .expect("active");
        assert_eq!(active, vec!["job-2".to_string()]);
    }

    #[test]
    fn test_complete_with_error() {
        let db = test_db();
        db.with(|conn| insert(conn, "job-1", "purchase", "{}", 100))
            .expect("insert");
        db.with(|conn| complete(conn, "job-1", Some("invalid job state"), 200))
            .expect("complete");

        let row = db
            .with(|conn| get(conn, "job-1"))
            .expect("get")
            .expect("row exists");
        assert_eq!(row.completed_at, Some(200));
        assert_eq!(row.error.as_deref(), Some("invalid job state"));
    }
}
