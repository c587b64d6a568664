//! The contribution store: tabular state consumed by the engine.
//!
//! Mutations return success iff the SQL ran; reads come back empty on
//! failure after logging. Errors are never propagated up the job chain.

use std::sync::Arc;

use patron_db::queries;
use patron_db::Db;
use patron_jobs::Clock;
use patron_types::{Contribution, PublisherActivity, RecurringContribution, TransferResult};

pub use patron_db::queries::contributions::{ContributionRow, PendingContributionRow};

const LAST_SCHEDULED_CONTRIBUTION_KEY: &str = "last-scheduled-contribution";

/// Durable engine state shared by the scheduler and the processors.
#[derive(Clone)]
pub struct ContributionStore {
    db: Db,
    clock: Arc<dyn Clock>,
}

impl ContributionStore {
    pub fn new(db: Db, clock: Arc<dyn Clock>) -> Self {
        Self { db, clock }
    }

    fn log_err(op: &str, e: patron_db::DbError) -> bool {
        tracing::error!(error = %e, "{op} failed");
        false
    }

    /// Record a completed token-funded contribution.
    pub fn save_contribution(&self, contribution: &Contribution) -> bool {
        let now = self.clock.now_secs();
        self.db
            .with(|conn| queries::contributions::save(conn, contribution, now))
            .map(|_| true)
            .unwrap_or_else(|e| Self::log_err("contribution save", e))
    }

    /// Record a completed contribution sent through an external wallet.
    pub fn save_external_contribution(
        &self,
        contribution: &Contribution,
        transfer: &TransferResult,
    ) -> bool {
        let now = self.clock.now_secs();
        self.db
            .with(|conn| {
                queries::contributions::save_with_transfer(conn, contribution, transfer, now)
            })
            .map(|_| true)
            .unwrap_or_else(|e| Self::log_err("contribution save", e))
    }

    /// Load a recorded contribution.
    pub fn get_contribution(&self, contribution_id: &str) -> Option<ContributionRow> {
        self.db
            .with(|conn| queries::contributions::get(conn, contribution_id))
            .unwrap_or_else(|e| {
                Self::log_err("contribution read", e);
                None
            })
    }

    /// All recorded contributions.
    pub fn get_contributions(&self) -> Vec<ContributionRow> {
        self.db
            .with(queries::contributions::list)
            .unwrap_or_else(|e| {
                Self::log_err("contribution list", e);
                Vec::new()
            })
    }

    /// Record one visit with its dwell time.
    pub fn add_publisher_visit(&self, publisher_id: &str, duration_secs: f64) -> bool {
        self.db
            .with(|conn| queries::publishers::add_visit(conn, publisher_id, duration_secs))
            .map(|_| true)
            .unwrap_or_else(|e| Self::log_err("publisher visit", e))
    }

    /// Activity rows eligible for auto-contribute.
    pub fn get_publisher_activity(&self) -> Vec<PublisherActivity> {
        self.db
            .with(queries::publishers::get_activity)
            .unwrap_or_else(|e| {
                Self::log_err("activity read", e);
                Vec::new()
            })
    }

    /// Reset all activity counters for the next cycle.
    pub fn reset_publisher_activity(&self) -> bool {
        self.db
            .with(queries::publishers::reset_activity)
            .map(|_| true)
            .unwrap_or_else(|e| Self::log_err("activity reset", e))
    }

    pub fn get_recurring_contributions(&self) -> Vec<RecurringContribution> {
        self.db
            .with(queries::publishers::get_recurring)
            .unwrap_or_else(|e| {
                Self::log_err("recurring read", e);
                Vec::new()
            })
    }

    pub fn set_recurring_contribution(&self, publisher_id: &str, amount: f64) -> bool {
        self.db
            .with(|conn| queries::publishers::set_recurring(conn, publisher_id, amount))
            .map(|_| true)
            .unwrap_or_else(|e| Self::log_err("recurring update", e))
    }

    pub fn save_pending_contribution(&self, publisher_id: &str, amount: f64) -> bool {
        let now = self.clock.now_secs();
        self.db
            .with(|conn| queries::contributions::save_pending(conn, publisher_id, amount, now))
            .map(|_| true)
            .unwrap_or_else(|e| Self::log_err("pending save", e))
    }

    /// Pending contributions inside the 90-day window; expired entries are
    /// dropped by the read.
    pub fn get_pending_contributions(&self) -> Vec<PendingContributionRow> {
        let now = self.clock.now_secs();
        self.db
            .with(|conn| queries::contributions::get_pending(conn, now))
            .unwrap_or_else(|e| {
                Self::log_err("pending read", e);
                Vec::new()
            })
    }

    pub fn delete_pending_contribution(&self, id: i64) -> bool {
        self.db
            .with(|conn| queries::contributions::delete_pending(conn, id))
            .map(|_| true)
            .unwrap_or_else(|e| Self::log_err("pending delete", e))
    }

    /// When the scheduler last fired. Seeds the value with "now" on first
    /// read so a fresh profile waits one full interval.
    pub fn get_last_scheduled_contribution_time(&self) -> u64 {
        let stored = self
            .db
            .with(|conn| queries::dictionary::get(conn, LAST_SCHEDULED_CONTRIBUTION_KEY))
            .unwrap_or_else(|e| {
                Self::log_err("dictionary read", e);
                None
            })
            .and_then(|value| value.parse::<u64>().ok());

        match stored {
            Some(time) => time,
            None => {
                let now = self.clock.now_secs();
                self.update_last_scheduled_contribution_time();
                now
            }
        }
    }

    pub fn update_last_scheduled_contribution_time(&self) -> bool {
        let now = self.clock.now_secs();
        self.db
            .with(|conn| {
                queries::dictionary::set(conn, LAST_SCHEDULED_CONTRIBUTION_KEY, &now.to_string())
            })
            .map(|_| true)
            .unwrap_or_else(|e| Self::log_err("dictionary update", e))
    }
}
