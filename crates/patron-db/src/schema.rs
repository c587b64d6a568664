//! Initial database schema.

/// Schema v1: the tables read and written by the contribution engine.
pub const SCHEMA_V1: &str = r#"
CREATE TABLE contribution (
    contribution_id TEXT PRIMARY KEY,
    contribution_type TEXT NOT NULL,
    publisher_id TEXT NOT NULL,
    amount REAL NOT NULL,
    source TEXT NOT NULL,
    external_provider TEXT,
    external_transaction_id TEXT,
    completed_at INTEGER NOT NULL
);

CREATE TABLE contribution_publisher (
    publisher_id TEXT PRIMARY KEY,
    auto_contribute_enabled INTEGER NOT NULL DEFAULT 1,
    recurring_amount REAL NOT NULL DEFAULT 0,
    visits INTEGER NOT NULL DEFAULT 0,
    duration REAL NOT NULL DEFAULT 0
);

CREATE TABLE pending_contribution (
    id INTEGER PRIMARY KEY,
    publisher_id TEXT NOT NULL,
    amount REAL NOT NULL,
    created_at INTEGER NOT NULL
);

CREATE TABLE contribution_token (
    token_id INTEGER PRIMARY KEY,
    token_type TEXT NOT NULL,
    value REAL NOT NULL,
    unblinded_token TEXT NOT NULL,
    public_key TEXT NOT NULL,
    reserved_for TEXT,
    redeemed_at INTEGER,
    contribution_id TEXT
);

CREATE INDEX idx_contribution_token_type
    ON contribution_token (token_type, reserved_for, redeemed_at);

CREATE TABLE job_state (
    job_id TEXT PRIMARY KEY,
    job_type TEXT NOT NULL,
    state TEXT NOT NULL,
    error TEXT,
    created_at INTEGER NOT NULL,
    completed_at INTEGER
);

CREATE INDEX idx_job_state_type ON job_state (job_type, completed_at);

CREATE TABLE dictionary (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

CREATE TABLE settings (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
"#;
