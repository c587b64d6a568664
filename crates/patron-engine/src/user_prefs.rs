//! User preferences backed by the settings table.

use patron_db::{queries, Db};

/// Auto-contribute preferences.
#[derive(Clone)]
pub struct UserPrefs {
    db: Db,
}

impl UserPrefs {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    pub fn ac_enabled(&self) -> bool {
        self.db
            .with(|conn| queries::settings::get_bool(conn, "ac_enabled", false))
            .unwrap_or(false)
    }

    pub fn ac_minimum_visits(&self) -> i64 {
        self.db
            .with(|conn| queries::settings::get_i64(conn, "ac_minimum_visits", 1))
            .unwrap_or(1)
    }

    pub fn ac_minimum_duration_secs(&self) -> f64 {
        self.db
            .with(|conn| queries::settings::get_f64(conn, "ac_minimum_duration_secs", 8.0))
            .unwrap_or(8.0)
    }

    pub fn ac_amount(&self) -> f64 {
        self.db
            .with(|conn| queries::settings::get_f64(conn, "ac_amount", 0.0))
            .unwrap_or(0.0)
    }

    pub fn set_ac_enabled(&self, enabled: bool) -> bool {
        self.set("ac_enabled", if enabled { "true" } else { "false" })
    }

    pub fn set_ac_minimum_visits(&self, visits: i64) -> bool {
        self.set("ac_minimum_visits", &visits.to_string())
    }

    pub fn set_ac_minimum_duration_secs(&self, secs: f64) -> bool {
        self.set("ac_minimum_duration_secs", &secs.to_string())
    }

    pub fn set_ac_amount(&self, amount: f64) -> bool {
        self.set("ac_amount", &amount.to_string())
    }

    fn set(&self, key: &str, value: &str) -> bool {
        match self.db.with(|conn| queries::settings::set(conn, key, value)) {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(error = %e, key, "preference update failed");
                false
            }
        }
    }
}
