//! Configuration management for the realty server.
//!
//! Settings are read from the base configuration file and then from environment variables,
//! which win over the file. Environment variables use the prefix `REALTY_`.

use core::{num::NonZeroUsize, time::Duration};

use config::{ConfigError, Environment, File, FileFormat};
use serde::Deserialize;

/// Loads the application configuration from base config and environment variables.
///
/// Environment variables use double underscores `__` to denote nested keys.
/// For example, `REALTY_LEDGER__DB_URL` corresponds to `ledger.db_url`.
///
/// # Errors
///
/// If the configuration could not be loaded or parsed
pub fn get_configuration() -> Result<Config, ConfigError> {
    config::Config::builder()
        .add_source(File::from_str(include_str!("base_config.ron"), FileFormat::Ron))
        .add_source(
            Environment::with_prefix(Config::CONFIG_ENV_PREFIX)
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?
        .try_deserialize()
}

/// Root configuration structure containing all application settings.
#[derive(Deserialize)]
pub struct Config {
    /// HTTP listener settings
    pub app: AppConfig,

    /// Database holding deals, users and properties
    pub documents: DbConfig,

    /// Database holding trust accounts, transactions and the audit log
    pub ledger: DbConfig,

    /// Property sync worker settings
    pub property_sync: PropertySyncConfig,
}

/// HTTP listener settings.
#[derive(Deserialize)]
pub struct AppConfig {
    /// The address to listen on (e.g., "0.0.0.0:8000")
    pub listen: String,

    /// CORS allowed origins (e.g., ["http://localhost:3000", "https://example.com"])
    /// Use ["*"] to allow all origins
    pub cors_allowed_origins: Vec<String>,

    /// Take the audit origin from `X-Forwarded-For` instead of the peer address.
    /// Enable only behind a proxy that overwrites the header
    #[serde(default)]
    pub trust_forwarded_for: bool,
}

/// Database configuration settings.
#[derive(Deserialize)]
pub struct DbConfig {
    /// The database connection URL
    pub db_url: String,

    /// Maximum number of database connections in the pool
    pub max_conn: NonZeroUsize,
}

/// Property sync worker settings.
#[derive(Deserialize)]
pub struct PropertySyncConfig {
    /// Number of property commands that may wait in the queue
    pub capacity: NonZeroUsize,

    /// How long shutdown waits for queued commands to drain
    #[serde(with = "humantime_serde")]
    pub shutdown_timeout: Duration,
}

impl Config {
    const CONFIG_ENV_PREFIX: &str = "REALTY";
}
