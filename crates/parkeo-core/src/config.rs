//! Application configuration
//!
//! Centralized configuration management using the `config` crate. Values
//! are layered: defaults, then `config/default` and `config/{RUN_MODE}`
//! files if present, then `PARKEO__`-prefixed environment variables.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub parking: ParkingConfig,
}

/// Database configuration
#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in the pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Connection acquire timeout in seconds
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_secs: u64,

    /// Idle connection timeout in seconds
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
}

fn default_max_connections() -> u32 {
    10
}

fn default_acquire_timeout() -> u64 {
    30
}

fn default_idle_timeout() -> u64 {
    600
}

/// Redis configuration
#[derive(Debug, Deserialize, Clone)]
pub struct RedisConfig {
    /// Redis connection URL
    pub url: String,

    /// Default TTL for cached items in seconds
    #[serde(default = "default_cache_ttl")]
    pub default_ttl_secs: u64,
}

fn default_cache_ttl() -> u64 {
    300
}

/// Parking-specific tunables
#[derive(Debug, Deserialize, Clone)]
pub struct ParkingConfig {
    /// TTL for cached active tariffs in seconds
    #[serde(default = "default_tariff_cache_ttl")]
    pub tariff_cache_ttl_secs: u64,

    /// Longest plate accepted after normalization
    #[serde(default = "default_max_plate_length")]
    pub max_plate_length: usize,
}

fn default_tariff_cache_ttl() -> u64 {
    300
}

fn default_max_plate_length() -> usize {
    10
}

impl AppConfig {
    /// Load configuration from environment and optional config files
    pub fn load() -> Result<Self, ConfigError> {
        // Pick up a .env file when present; harmless otherwise
        let _ = dotenvy::dotenv();

        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = Config::builder()
            .set_default("database.max_connections", 10)?
            .set_default("database.acquire_timeout_secs", 30)?
            .set_default("database.idle_timeout_secs", 600)?
            .set_default("redis.default_ttl_secs", 300)?
            .set_default("parking.tariff_cache_ttl_secs", 300)?
            .set_default("parking.max_plate_length", 10)?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            .add_source(
                Environment::with_prefix("PARKEO")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load configuration from a specific file
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name(path))
            .add_source(Environment::with_prefix("PARKEO").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}

impl Default for ParkingConfig {
    fn default() -> Self {
        Self {
            tariff_cache_ttl_secs: 300,
            max_plate_length: 10,
        }
    }
}
