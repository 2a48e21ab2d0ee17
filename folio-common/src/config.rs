//! Configuration management for the Folio engine.
//!
//! Configuration lives in a single file at `~/.folio/config.json`.
//!
//! # Configuration Priority
//!
//! 1. Environment variables (FOLIO_* prefix)
//! 2. Explicit config file values
//! 3. Default values
//!
//! # Environment Variable Mapping
//!
//! - `FOLIO_TOTAL_CAPITAL` → portfolio.total_capital
//! - `FOLIO_MIN_TRADE_VALUE` → rebalance.min_trade_value
//! - `FOLIO_LOG_LEVEL` → observability.log_level
//! - `FOLIO_LOG_FORMAT` → observability.log_format
//!
//! Engine sections hold optional overrides only; the engine crate owns the
//! defaults and fills in whatever is absent.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Get the configuration directory path.
pub fn config_dir() -> PathBuf {
    directories::UserDirs::new().map_or_else(
        || PathBuf::from(".folio"),
        |dirs| dirs.home_dir().join(".folio"),
    )
}

/// Get the configuration file path.
pub fn config_path() -> PathBuf {
    config_dir().join("config.json")
}

// ============================================================================
// Root Configuration
// ============================================================================

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,

    /// Portfolio construction overrides
    #[serde(default)]
    pub portfolio: Option<PortfolioConfig>,

    /// Rebalancing overrides
    #[serde(default)]
    pub rebalance: Option<RebalanceConfig>,

    /// Quote fetching overrides
    #[serde(default)]
    pub quotes: Option<QuotesConfig>,
}

impl Config {
    /// Load configuration from the default path.
    pub fn load() -> Result<Self> {
        let path = config_path();
        if !path.exists() {
            tracing::info!("Config file not found, using defaults");
            return Ok(Self::default());
        }

        Self::load_from(&path)
    }

    /// Load configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))
    }

    /// Load configuration with environment variable overrides.
    pub fn load_with_env() -> Result<Self> {
        let mut config = Self::load()?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Save configuration to a specific path, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write config to {}", path.display()))
    }

    /// Apply environment variable overrides to the configuration.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(value) = std::env::var("FOLIO_TOTAL_CAPITAL") {
            if let Ok(capital) = value.parse() {
                self.portfolio.get_or_insert_with(Default::default).total_capital = Some(capital);
            }
        }

        if let Ok(value) = std::env::var("FOLIO_MIN_TRADE_VALUE") {
            if let Ok(min) = value.parse() {
                self.rebalance.get_or_insert_with(Default::default).min_trade_value = Some(min);
            }
        }

        if let Ok(level) = std::env::var("FOLIO_LOG_LEVEL") {
            self.observability.log_level = level;
        }

        if let Ok(format) = std::env::var("FOLIO_LOG_FORMAT") {
            self.observability.log_format = format;
        }
    }
}

// ============================================================================
// Observability
// ============================================================================

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level", alias = "level")]
    pub log_level: String,

    /// Log format (json, pretty)
    #[serde(default = "default_log_format", alias = "format")]
    pub log_format: String,

    /// Additional module targets pinned to `warn`.
    #[serde(default)]
    pub excluded_targets: Vec<String>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: default_log_format(),
            excluded_targets: Vec::new(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

// ============================================================================
// Engine Sections
// ============================================================================

/// Portfolio construction overrides.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PortfolioConfig {
    /// Capital to deploy (currency units)
    #[serde(default)]
    pub total_capital: Option<f64>,

    /// Maximum number of holdings
    #[serde(default)]
    pub max_holdings: Option<usize>,

    /// Cash held back from allocation (%)
    #[serde(default)]
    pub cash_reserve_pct: Option<f64>,

    /// Maximum aggregate weight per sector (%)
    #[serde(default)]
    pub max_sector_pct: Option<f64>,

    /// Maximum weight per position (%)
    #[serde(default)]
    pub max_position_pct: Option<f64>,

    /// Minimum weight per position (%)
    #[serde(default)]
    pub min_position_pct: Option<f64>,

    /// Minimum conviction score for eligibility (0-100)
    #[serde(default)]
    pub min_conviction: Option<f64>,

    /// Weight normalization mode ("two_pass" or "converge")
    #[serde(default)]
    pub normalization: Option<String>,

    /// Iteration cap for the "converge" mode
    #[serde(default)]
    pub max_iterations: Option<usize>,

    /// Per-position tolerance for the "converge" mode (percentage points)
    #[serde(default)]
    pub convergence_tolerance: Option<f64>,
}

/// Rebalancing overrides.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RebalanceConfig {
    /// Smallest trade worth executing (currency units)
    #[serde(default)]
    pub min_trade_value: Option<f64>,
}

/// Longest quote cache TTL accepted, one week.
pub const MAX_CACHE_TTL_SECS: i64 = 7 * 86_400;

/// Quote fetching overrides.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QuotesConfig {
    /// Maximum lookups in flight at once
    #[serde(default)]
    pub max_concurrency: Option<usize>,

    /// Per-lookup timeout in seconds
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,

    /// Quote cache TTL in seconds, at most [`MAX_CACHE_TTL_SECS`] (0 disables caching)
    #[serde(default)]
    pub cache_ttl_secs: Option<i64>,

    /// Provider rate limit
    #[serde(default)]
    pub requests_per_minute: Option<u32>,
}
