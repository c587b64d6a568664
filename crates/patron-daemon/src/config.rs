//! Configuration file management.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use patron_engine::EngineOptions;
use patron_payments::Environment;

/// Complete daemon configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Storage settings.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Contribution engine settings.
    #[serde(default)]
    pub contributions: ContributionConfig,
    /// Advanced settings.
    #[serde(default)]
    pub advanced: AdvancedConfig,
}

/// Storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Data directory. Empty = platform default.
    #[serde(default)]
    pub data_dir: String,
}

/// Contribution engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContributionConfig {
    /// Deployment environment: "development" | "staging" | "production".
    #[serde(default = "default_environment")]
    pub environment: String,
    /// Seconds between scheduled contribution rounds.
    #[serde(default = "default_interval_secs")]
    pub contribution_interval_secs: u64,
    /// Whether this client may run auto-contribute.
    #[serde(default = "default_true")]
    pub auto_contribute_allowed: bool,
    /// Fallback auto-contribute amount in BAT when the user pref is unset.
    #[serde(default = "default_contribution_amount")]
    pub default_contribution_amount: f64,
}

/// Advanced configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvancedConfig {
    /// Log level: "debug" | "info" | "warn" | "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_environment() -> String {
    "production".to_string()
}

fn default_interval_secs() -> u64 {
    30 * 24 * 60 * 60
}

fn default_true() -> bool {
    true
}

fn default_contribution_amount() -> f64 {
    10.0
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: String::new(),
        }
    }
}

impl Default for ContributionConfig {
    fn default() -> Self {
        Self {
            environment: default_environment(),
            contribution_interval_secs: default_interval_secs(),
            auto_contribute_allowed: true,
            default_contribution_amount: default_contribution_amount(),
        }
    }
}

impl Default for AdvancedConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl DaemonConfig {
    /// Load configuration from the default config file location.
    ///
    /// Falls back to defaults if the file does not exist.
    pub fn load() -> anyhow::Result<Self> {
        let config_path = Self::config_path();
        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: DaemonConfig = toml::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Engine options derived from this configuration.
    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            environment: self.environment(),
            contribution_interval: Duration::from_secs(
                self.contributions.contribution_interval_secs,
            ),
            auto_contribute_allowed: self.contributions.auto_contribute_allowed,
            default_contribution_amount: self.contributions.default_contribution_amount,
        }
    }

    fn environment(&self) -> Environment {
        match self.contributions.environment.as_str() {
            "development" => Environment::Development,
            "staging" => Environment::Staging,
            _ => Environment::Production,
        }
    }

    /// Get the data directory path.
    pub fn data_dir(&self) -> PathBuf {
        if self.storage.data_dir.is_empty() {
            Self::default_data_dir()
        } else {
            PathBuf::from(&self.storage.data_dir)
        }
    }

    /// Get the config file path.
    fn config_path() -> PathBuf {
        if let Ok(dir) = std::env::var("PATRON_DATA_DIR") {
            return PathBuf::from(dir).join("config.toml");
        }
        Self::default_data_dir().join("config.toml")
    }

    /// Platform-specific default data directory.
    fn default_data_dir() -> PathBuf {
        if let Ok(dir) = std::env::var("PATRON_DATA_DIR") {
            return PathBuf::from(dir);
        }
        #[cfg(target_os = "macos")]
        {
            home_fallback("Library/Application Support/Patron")
        }
        #[cfg(not(target_os = "macos"))]
        {
            home_fallback(".patron")
        }
    }
}

/// Fallback home directory resolution.
fn home_fallback(subpath: &str) -> PathBuf {
    std::env::var("HOME")
        .map(|h| PathBuf::from(h).join(subpath))
        .unwrap_or_else(|_| PathBuf::from("/tmp/patron"))
}
