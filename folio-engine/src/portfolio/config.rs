//! Construction configuration.
//!
//! Defines the limits the construction pipeline enforces, with defaults
//! that can be overridden from the shared [`folio_common::Config`].

use serde::{Deserialize, Serialize};

use folio_common::validation::{check_pct, collect_errors};
use folio_common::{Config, Validate, ValidationError, ValidationResult};

// ============================================================================
// Normalization Mode
// ============================================================================

/// How the clamp/normalize sequence terminates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum NormalizationMode {
    /// Sector caps, normalize, clamp, normalize. Residual drift from the
    /// second normalization is left in the result, so positions and sectors
    /// can end above their limits when few candidates are eligible.
    TwoPass,
    /// Repeat sector caps, normalize, clamp and sector caps until no weight
    /// moves by more than `tolerance`, or `max_iterations` is reached.
    /// Always finishes on the constraint side; weight that cannot be placed
    /// stays in cash.
    Converge { max_iterations: usize, tolerance: f64 },
}

impl Default for NormalizationMode {
    fn default() -> Self {
        Self::converge()
    }
}

impl NormalizationMode {
    /// Converge mode with the default iteration cap and tolerance.
    pub fn converge() -> Self {
        Self::Converge {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            tolerance: DEFAULT_CONVERGENCE_TOLERANCE,
        }
    }

    /// Parse a mode name from configuration.
    fn from_name(
        name: &str,
        max_iterations: Option<usize>,
        tolerance: Option<f64>,
    ) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "two_pass" | "two-pass" | "twopass" => Some(Self::TwoPass),
            "converge" | "iterative" => Some(Self::Converge {
                max_iterations: max_iterations.unwrap_or(DEFAULT_MAX_ITERATIONS),
                tolerance: tolerance.unwrap_or(DEFAULT_CONVERGENCE_TOLERANCE),
            }),
            _ => None,
        }
    }
}

const DEFAULT_MAX_ITERATIONS: usize = 25;
const DEFAULT_CONVERGENCE_TOLERANCE: f64 = 0.05;

// ============================================================================
// Construction Configuration
// ============================================================================

/// Limits applied by the construction pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConstructionConfig {
    /// Capital to deploy (currency units, > 0)
    pub total_capital: f64,
    /// Maximum number of holdings (≥ 1)
    pub max_holdings: usize,
    /// Cash held back from allocation (%)
    pub cash_reserve_pct: f64,
    /// Maximum aggregate weight per sector (%)
    pub max_sector_pct: f64,
    /// Maximum weight per position (%)
    pub max_position_pct: f64,
    /// Minimum weight per position (%)
    pub min_position_pct: f64,
    /// Candidates scoring below this are ineligible
    pub min_conviction: f64,
    #[serde(default)]
    pub normalization: NormalizationMode,
}

impl Default for ConstructionConfig {
    fn default() -> Self {
        Self {
            total_capital: 100_000.0,
            max_holdings: 12,
            cash_reserve_pct: 5.0,
            max_sector_pct: 25.0,
            max_position_pct: 10.0,
            min_position_pct: 2.0,
            min_conviction: 50.0,
            normalization: NormalizationMode::default(),
        }
    }
}

impl ConstructionConfig {
    /// Build from the shared configuration, filling defaults for absent values.
    ///
    /// An unrecognized normalization name falls back to the default mode.
    pub fn from_config(config: &Config) -> Self {
        let defaults = Self::default();
        let Some(p) = config.portfolio.as_ref() else {
            return defaults;
        };

        let normalization = match p.normalization.as_deref() {
            Some(name) => NormalizationMode::from_name(name, p.max_iterations, p.convergence_tolerance)
                .unwrap_or_else(|| {
                    tracing::warn!(mode = %name, "Unknown normalization mode, using converge");
                    defaults.normalization
                }),
            None => defaults.normalization,
        };

        Self {
            total_capital: p.total_capital.unwrap_or(defaults.total_capital),
            max_holdings: p.max_holdings.unwrap_or(defaults.max_holdings),
            cash_reserve_pct: p.cash_reserve_pct.unwrap_or(defaults.cash_reserve_pct),
            max_sector_pct: p.max_sector_pct.unwrap_or(defaults.max_sector_pct),
            max_position_pct: p.max_position_pct.unwrap_or(defaults.max_position_pct),
            min_position_pct: p.min_position_pct.unwrap_or(defaults.min_position_pct),
            min_conviction: p.min_conviction.unwrap_or(defaults.min_conviction),
            normalization,
        }
    }

    /// Weight the invested positions should sum to.
    pub fn target_total_weight(&self) -> f64 {
        100.0 - self.cash_reserve_pct
    }
}

impl Validate for ConstructionConfig {
    fn validate(&self) -> ValidationResult<()> {
        let mut errors = Vec::new();

        if !self.total_capital.is_finite() || self.total_capital <= 0.0 {
            errors.push(ValidationError::invalid(
                "total_capital",
                format!("must be greater than 0, got {}", self.total_capital),
            ));
        }
        if self.max_holdings == 0 {
            errors.push(ValidationError::invalid("max_holdings", "must be at least 1"));
        }

        for (field, value) in [
            ("cash_reserve_pct", self.cash_reserve_pct),
            ("max_sector_pct", self.max_sector_pct),
            ("max_position_pct", self.max_position_pct),
            ("min_position_pct", self.min_position_pct),
            ("min_conviction", self.min_conviction),
        ] {
            if let Err(e) = check_pct(field, Some(value)) {
                errors.push(e);
            }
        }

        if self.min_position_pct > self.max_position_pct {
            errors.push(ValidationError::Conflict {
                reason: format!(
                    "min_position_pct ({}) exceeds max_position_pct ({})",
                    self.min_position_pct, self.max_position_pct
                ),
            });
        } else if self.min_position_pct * self.max_holdings as f64 > self.target_total_weight() {
            errors.push(ValidationError::Conflict {
                reason: format!(
                    "{} holdings at min_position_pct ({}) exceed the investable {}%",
                    self.max_holdings,
                    self.min_position_pct,
                    self.target_total_weight()
                ),
            });
        }

        if let NormalizationMode::Converge {
            max_iterations,
            tolerance,
        } = self.normalization
        {
            if max_iterations == 0 {
                errors.push(ValidationError::invalid(
                    "normalization.max_iterations",
                    "must be at least 1",
                ));
            }
            if !tolerance.is_finite() || tolerance < 0.0 {
                errors.push(ValidationError::invalid(
                    "normalization.tolerance",
                    "must be a non-negative number",
                ));
            }
        }

        collect_errors(errors)
    }
}
