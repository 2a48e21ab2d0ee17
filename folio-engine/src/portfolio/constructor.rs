//! Portfolio constructor.
//!
//! Runs the construction pipeline end to end:
//!
//! ```text
//! candidates ─▶ screen ─▶ seed weights ─▶ sector caps ─▶ normalize
//!                                                          │
//!        stats ◀─ shares ◀─ normalize ◀─ position bounds ◀─┘
//! ```

use tracing::{info, info_span};

use folio_common::logging::generate_run_id;
use folio_common::{Error, Result, Validate};

use super::config::ConstructionConfig;
use super::screener::screen_candidates;
use super::shares::allocate_shares;
use super::stats::{build_sector_breakdown, compute_stats, weight_totals};
use super::types::{Candidate, PortfolioConstructionResult, Strategy};
use super::weights::{balance_weights, initial_weights};

/// Builds target portfolios from ranked candidates.
pub struct PortfolioConstructor {
    config: ConstructionConfig,
}

impl PortfolioConstructor {
    /// Create a constructor with default limits.
    pub fn new() -> Self {
        Self {
            config: ConstructionConfig::default(),
        }
    }

    /// Create with custom limits.
    pub fn with_config(config: ConstructionConfig) -> Self {
        Self { config }
    }

    /// The limits this constructor enforces.
    pub fn config(&self) -> &ConstructionConfig {
        &self.config
    }

    /// Construct a portfolio from candidates.
    ///
    /// Returns an error only for an invalid configuration. Malformed
    /// candidates are listed in `rejected`; no eligible candidate yields the
    /// empty result with 100% cash.
    pub fn construct(
        &self,
        candidates: &[Candidate],
        strategy: Strategy,
    ) -> Result<PortfolioConstructionResult> {
        self.config
            .validate()
            .map_err(|e| Error::from(e).with_context("invalid construction config"))?;

        let run_id = generate_run_id();
        let _span = info_span!("construct_portfolio", run_id = %run_id, %strategy).entered();

        info!(
            candidates = candidates.len(),
            total_capital = self.config.total_capital,
            max_holdings = self.config.max_holdings,
            "Starting portfolio construction"
        );

        // Step 1: Screen
        let screened = screen_candidates(candidates, &self.config);
        if screened.eligible.is_empty() {
            info!(
                rejected = screened.rejected.len(),
                below_conviction = screened.below_conviction,
                "No eligible candidates, holding all cash"
            );
            return Ok(PortfolioConstructionResult::empty(strategy, screened.rejected));
        }

        // Step 2: Seed weights within position bounds
        let seed = initial_weights(&screened.eligible, &self.config);

        // Step 3: Sector caps, normalization and position bounds
        let balanced = balance_weights(&seed, &self.config);

        // Step 4: Whole shares
        let allocations = allocate_shares(&balanced, self.config.total_capital)?;

        // Step 5: Statistics
        let (total_weight, cash_reserve) = weight_totals(&allocations);
        let portfolio_stats = compute_stats(&allocations);
        let sector_breakdown = build_sector_breakdown(&allocations);

        let result = PortfolioConstructionResult {
            allocations,
            total_weight,
            cash_reserve,
            sector_breakdown,
            portfolio_stats,
            strategy,
            rejected: screened.rejected,
            generated_at: chrono::Utc::now(),
        };

        info!(summary = %result.summary(), "Portfolio construction complete");
        Ok(result)
    }
}

impl Default for PortfolioConstructor {
    fn default() -> Self {
        Self::new()
    }
}

/// Construct a portfolio with the given limits.
pub fn construct_portfolio(
    candidates: &[Candidate],
    config: &ConstructionConfig,
    strategy: Strategy,
) -> Result<PortfolioConstructionResult> {
    PortfolioConstructor::with_config(config.clone()).construct(candidates, strategy)
}
