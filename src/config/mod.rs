//! Configuration management for the cross-venue hedger.
//!
//! Loads settings from environment variables and config files. Trade
//! specifications live separately in a CSV file (see [`trades`]).

pub mod trades;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

pub use trades::{ConfigSource, CsvTradeSource, TradeSpec};

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Order execution and fill monitoring parameters
    #[serde(default)]
    pub execution: ExecutionConfig,
    /// Price oracle connection settings
    #[serde(default)]
    pub oracle: OracleConfig,
    /// Venues available to trade specs, keyed by id
    #[serde(default = "default_venues")]
    pub venues: Vec<VenueConfig>,
    /// CSV file with trade specifications
    #[serde(default = "default_trades_path")]
    pub trades_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionConfig {
    /// Interval between position polls while an order rests
    #[serde(default = "default_check_interval_ms")]
    pub check_interval_ms: u64,
    /// Absolute ceiling on how long one order may rest
    #[serde(default = "default_max_wait_ms")]
    pub max_wait_ms: u64,
    /// Resting time after which the order is cancelled and re-quoted.
    /// Only effective when shorter than `max_wait_ms`.
    #[serde(default = "default_retry_timeout_ms")]
    pub retry_timeout_ms: u64,
    /// Fixed pause between cancelling a stale order and resubmitting
    #[serde(default = "default_retry_pause_ms")]
    pub retry_pause_ms: u64,
    /// Attempt budget when buying on the primary venue
    #[serde(default = "default_long_primary_max_retries")]
    pub long_primary_max_retries: u32,
    /// Attempt budget when selling on the primary venue
    #[serde(default = "default_short_primary_max_retries")]
    pub short_primary_max_retries: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OracleConfig {
    /// Gateway base URL (the `/query` endpoint is appended)
    #[serde(default = "default_oracle_base_url")]
    pub base_url: String,
    /// Attempts per price request before giving up
    #[serde(default = "default_oracle_max_attempts")]
    pub max_attempts: u32,
    /// First backoff delay; doubles on every retry
    #[serde(default = "default_oracle_backoff_base_ms")]
    pub backoff_base_ms: u64,
    /// HTTP request timeout
    #[serde(default = "default_oracle_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Product id cache file. `None` keeps the cache in memory only.
    #[serde(default = "default_product_cache_path")]
    pub product_cache_path: Option<String>,
}

/// How a venue's trading surface is provided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VenueKind {
    /// In-memory simulation filled against oracle quotes
    Paper,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VenueConfig {
    /// Identifier referenced by trade specs
    pub id: String,
    pub kind: VenueKind,
}

// Default value functions
fn default_check_interval_ms() -> u64 {
    500
}

fn default_max_wait_ms() -> u64 {
    300_000 // 5 minutes
}

fn default_retry_timeout_ms() -> u64 {
    30_000
}

fn default_retry_pause_ms() -> u64 {
    1_000 // Keeps re-quotes clear of the oracle's rate limit
}

fn default_long_primary_max_retries() -> u32 {
    3
}

fn default_short_primary_max_retries() -> u32 {
    999
}

fn default_oracle_base_url() -> String {
    "https://gateway.prod.nado.xyz/v1".to_string()
}

fn default_oracle_max_attempts() -> u32 {
    10
}

fn default_oracle_backoff_base_ms() -> u64 {
    1_000
}

fn default_oracle_timeout_secs() -> u64 {
    10
}

fn default_product_cache_path() -> Option<String> {
    Some("data/product_id_cache.json".to_string())
}

fn default_trades_path() -> String {
    "config.csv".to_string()
}

fn default_venues() -> Vec<VenueConfig> {
    vec![
        VenueConfig {
            id: "nado".to_string(),
            kind: VenueKind::Paper,
        },
        VenueConfig {
            id: "variational".to_string(),
            kind: VenueKind::Paper,
        },
    ]
}

impl ExecutionConfig {
    pub fn check_interval(&self) -> Duration {
        Duration::from_millis(self.check_interval_ms)
    }

    pub fn max_wait(&self) -> Duration {
        Duration::from_millis(self.max_wait_ms)
    }

    pub fn retry_timeout(&self) -> Duration {
        Duration::from_millis(self.retry_timeout_ms)
    }

    pub fn retry_pause(&self) -> Duration {
        Duration::from_millis(self.retry_pause_ms)
    }

    /// Whether a stale order is ever cancelled and re-quoted.
    pub fn resubmit_enabled(&self) -> bool {
        self.retry_timeout_ms < self.max_wait_ms
    }
}

impl Config {
    /// Load configuration from environment variables and config files.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(config::File::with_name("config").required(false))
            .add_source(config::Environment::default().separator("__").prefix("CVH"))
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        let exec = &self.execution;

        anyhow::ensure!(exec.check_interval_ms > 0, "check_interval_ms must be positive");
        anyhow::ensure!(exec.max_wait_ms > 0, "max_wait_ms must be positive");
        anyhow::ensure!(
            exec.long_primary_max_retries >= 1 && exec.short_primary_max_retries >= 1,
            "max retries must allow at least one attempt"
        );
        anyhow::ensure!(
            self.oracle.max_attempts >= 1,
            "oracle max_attempts must be at least 1"
        );
        anyhow::ensure!(!self.venues.is_empty(), "at least one venue must be configured");

        if !exec.resubmit_enabled() {
            warn!(
                retry_timeout_ms = exec.retry_timeout_ms,
                max_wait_ms = exec.max_wait_ms,
                "retry_timeout_ms >= max_wait_ms: stale orders will never be re-quoted"
            );
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            execution: ExecutionConfig::default(),
            oracle: OracleConfig::default(),
            venues: default_venues(),
            trades_path: default_trades_path(),
        }
    }
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            check_interval_ms: default_check_interval_ms(),
            max_wait_ms: default_max_wait_ms(),
            retry_timeout_ms: default_retry_timeout_ms(),
            retry_pause_ms: default_retry_pause_ms(),
            long_primary_max_retries: default_long_primary_max_retries(),
            short_primary_max_retries: default_short_primary_max_retries(),
        }
    }
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            base_url: default_oracle_base_url(),
            max_attempts: default_oracle_max_attempts(),
            backoff_base_ms: default_oracle_backoff_base_ms(),
            request_timeout_secs: default_oracle_timeout_secs(),
            product_cache_path: default_product_cache_path(),
        }
    }
}
