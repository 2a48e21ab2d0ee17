//! Configuration validation for the Folio engine.
//!
//! Provides validation logic for configuration fields to ensure
//! all values are present and within valid ranges.

use thiserror::Error;

use crate::config::{
    Config, ObservabilityConfig, PortfolioConfig, QuotesConfig, RebalanceConfig,
    MAX_CACHE_TTL_SECS,
};

/// Configuration validation error.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Configuration conflict: {reason}")]
    Conflict { reason: String },

    #[error("Multiple validation errors: {0:?}")]
    Multiple(Vec<ValidationError>),
}

impl ValidationError {
    /// Shorthand for an [`ValidationError::InvalidValue`].
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Trait for validatable configuration sections.
pub trait Validate {
    /// Validate this configuration section.
    fn validate(&self) -> ValidationResult<()>;
}

/// Collapse a list of section errors into a single result.
pub fn collect_errors(mut errors: Vec<ValidationError>) -> ValidationResult<()> {
    if errors.is_empty() {
        Ok(())
    } else if errors.len() == 1 {
        Err(errors.remove(0))
    } else {
        Err(ValidationError::Multiple(errors))
    }
}

/// Check that an optional percentage lies within 0–100.
pub fn check_pct(field: &str, value: Option<f64>) -> ValidationResult<()> {
    match value {
        Some(v) if !v.is_finite() || !(0.0..=100.0).contains(&v) => Err(ValidationError::invalid(
            field,
            format!("must be between 0 and 100, got {}", v),
        )),
        _ => Ok(()),
    }
}

impl Config {
    /// Validate the entire configuration.
    pub fn validate(&self) -> ValidationResult<()> {
        let mut errors = Vec::new();

        if let Err(e) = self.observability.validate() {
            errors.push(e);
        }
        if let Some(ref portfolio) = self.portfolio {
            if let Err(e) = portfolio.validate() {
                errors.push(e);
            }
        }
        if let Some(ref rebalance) = self.rebalance {
            if let Err(e) = rebalance.validate() {
                errors.push(e);
            }
        }
        if let Some(ref quotes) = self.quotes {
            if let Err(e) = quotes.validate() {
                errors.push(e);
            }
        }

        collect_errors(errors)
    }

    /// Load and validate configuration.
    pub fn load_and_validate() -> anyhow::Result<Self> {
        let config = Self::load()?;
        config.validate().map_err(|e| anyhow::anyhow!("{}", e))?;
        Ok(config)
    }
}

impl Validate for ObservabilityConfig {
    fn validate(&self) -> ValidationResult<()> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.to_lowercase().as_str()) {
            return Err(ValidationError::invalid(
                "observability.log_level",
                format!("must be one of: {}", valid_levels.join(", ")),
            ));
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.log_format.to_lowercase().as_str()) {
            return Err(ValidationError::invalid(
                "observability.log_format",
                format!("must be one of: {}", valid_formats.join(", ")),
            ));
        }

        Ok(())
    }
}

impl Validate for PortfolioConfig {
    fn validate(&self) -> ValidationResult<()> {
        let mut errors = Vec::new();

        if let Some(capital) = self.total_capital {
            if !capital.is_finite() || capital <= 0.0 {
                errors.push(ValidationError::invalid(
                    "portfolio.total_capital",
                    "must be greater than 0",
                ));
            }
        }
        if self.max_holdings == Some(0) {
            errors.push(ValidationError::invalid(
                "portfolio.max_holdings",
                "must be at least 1",
            ));
        }

        for (field, value) in [
            ("portfolio.cash_reserve_pct", self.cash_reserve_pct),
            ("portfolio.max_sector_pct", self.max_sector_pct),
            ("portfolio.max_position_pct", self.max_position_pct),
            ("portfolio.min_position_pct", self.min_position_pct),
            ("portfolio.min_conviction", self.min_conviction),
        ] {
            if let Err(e) = check_pct(field, value) {
                errors.push(e);
            }
        }

        if let (Some(min), Some(max)) = (self.min_position_pct, self.max_position_pct) {
            if min > max {
                errors.push(ValidationError::Conflict {
                    reason: format!(
                        "portfolio.min_position_pct ({}) exceeds portfolio.max_position_pct ({})",
                        min, max
                    ),
                });
            }
        }

        collect_errors(errors)
    }
}

impl Validate for RebalanceConfig {
    fn validate(&self) -> ValidationResult<()> {
        match self.min_trade_value {
            Some(v) if !v.is_finite() || v < 0.0 => Err(ValidationError::invalid(
                "rebalance.min_trade_value",
                "must be a non-negative amount",
            )),
            _ => Ok(()),
        }
    }
}

impl Validate for QuotesConfig {
    fn validate(&self) -> ValidationResult<()> {
        if self.max_concurrency == Some(0) {
            return Err(ValidationError::invalid(
                "quotes.max_concurrency",
                "must be at least 1",
            ));
        }
        if self.request_timeout_secs == Some(0) {
            return Err(ValidationError::invalid(
                "quotes.request_timeout_secs",
                "must be greater than 0 when set",
            ));
        }
        if let Some(ttl) = self.cache_ttl_secs {
            if !(0..=MAX_CACHE_TTL_SECS).contains(&ttl) {
                return Err(ValidationError::invalid(
                    "quotes.cache_ttl_secs",
                    format!("must be between 0 and {}", MAX_CACHE_TTL_SECS),
                ));
            }
        }
        if self.requests_per_minute == Some(0) {
            return Err(ValidationError::invalid(
                "quotes.requests_per_minute",
                "must be greater than 0 when set",
            ));
        }
        Ok(())
    }
}
