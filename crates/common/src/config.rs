//! Application configuration.

use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use serde::Deserialize;
use std::path::Path;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Batch import configuration.
    #[serde(default)]
    pub import: ImportConfig,
    /// Background scheduler configuration.
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    /// Administrator account created on first start.
    #[serde(default)]
    pub bootstrap: Option<BootstrapConfig>,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind to.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Public URL of this instance.
    pub url: String,
}

/// Database connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// Batch import configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ImportConfig {
    /// Number of records inserted per statement.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Maximum number of rows accepted in a single import.
    #[serde(default = "default_max_rows")]
    pub max_rows: usize,
}

/// Background scheduler configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerConfig {
    /// Seconds between academic period archival sweeps.
    #[serde(default = "default_archive_interval")]
    pub archive_interval_secs: u64,
    /// IANA timezone used to decide which calendar day it is.
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

/// Bootstrap administrator account.
#[derive(Debug, Clone, Deserialize)]
pub struct BootstrapConfig {
    /// Username of the administrator.
    pub username: String,
    /// Email of the administrator.
    pub email: String,
    /// Initial password of the administrator.
    pub password: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    3000
}

const fn default_max_connections() -> u32 {
    20
}

const fn default_min_connections() -> u32 {
    2
}

const fn default_batch_size() -> usize {
    50
}

const fn default_max_rows() -> usize {
    5000
}

const fn default_archive_interval() -> u64 {
    3600
}

fn default_timezone() -> String {
    "Asia/Manila".to_string()
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            max_rows: default_max_rows(),
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            archive_interval_secs: default_archive_interval(),
            timezone: default_timezone(),
        }
    }
}

impl SchedulerConfig {
    /// Parse the configured timezone, falling back to UTC when it is unknown.
    #[must_use]
    pub fn tz(&self) -> Tz {
        self.timezone.parse().unwrap_or_else(|_| {
            tracing::warn!(timezone = %self.timezone, "Unknown timezone, using UTC");
            Tz::UTC
        })
    }

    /// The current calendar date in the configured timezone.
    #[must_use]
    pub fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.tz()).date_naive()
    }
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Configuration is loaded in the following order:
    /// 1. `.env` (if present)
    /// 2. `config/default.toml`
    /// 3. `config/{environment}.toml` (based on `GAD_ENV`)
    /// 4. Environment variables with `GAD__` prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();
        let env = std::env::var("GAD_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("GAD")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load configuration from a specific file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix("GAD")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scheduler_defaults() {
        let scheduler = SchedulerConfig::default();
        assert_eq!(scheduler.archive_interval_secs, 3600);
        assert_eq!(scheduler.tz(), chrono_tz::Asia::Manila);
    }

    #[test]
    fn test_unknown_timezone_falls_back_to_utc() {
        let scheduler = SchedulerConfig {
            archive_interval_secs: 60,
            timezone: "Mars/Olympus_Mons".to_string(),
        };
        assert_eq!(scheduler.tz(), Tz::UTC);
    }

    #[test]
    fn test_import_defaults() {
        let import = ImportConfig::default();
        assert_eq!(import.batch_size, 50);
        assert_eq!(import.max_rows, 5000);
    }
}
