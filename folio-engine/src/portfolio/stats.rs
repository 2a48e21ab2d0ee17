//! Portfolio statistics and sector breakdown.

use super::types::{Allocation, PortfolioStats, SectorBreakdown, SectorExposure};
use super::weights::round1;

/// Beta reported until per-candidate betas are sourced.
pub const PLACEHOLDER_BETA: f64 = 1.0;

/// Rounded sum of weights and its complement.
pub fn weight_totals(allocations: &[Allocation]) -> (f64, f64) {
    let total = round1(allocations.iter().map(|a| a.weight).sum());
    (total, round1(100.0 - total))
}

/// Summary statistics over the final allocations.
///
/// Upside is averaged only over allocations that report one. Beta stays at
/// the placeholder; absent betas are never counted as zero.
pub fn compute_stats(allocations: &[Allocation]) -> PortfolioStats {
    if allocations.is_empty() {
        return PortfolioStats::default();
    }

    let average_conviction = round1(
        allocations.iter().map(|a| a.conviction_score).sum::<f64>() / allocations.len() as f64,
    );

    let upsides: Vec<f64> = allocations.iter().filter_map(|a| a.composite_upside).collect();
    let average_upside = if upsides.is_empty() {
        None
    } else {
        Some(round1(upsides.iter().sum::<f64>() / upsides.len() as f64))
    };

    PortfolioStats {
        average_conviction,
        average_upside,
        holdings_count: allocations.len(),
        estimated_beta: PLACEHOLDER_BETA,
    }
}

/// Group allocations by sector.
pub fn build_sector_breakdown(allocations: &[Allocation]) -> SectorBreakdown {
    let mut breakdown = SectorBreakdown::new();

    for allocation in allocations {
        let entry = breakdown
            .entry(allocation.sector.clone())
            .or_insert_with(SectorExposure::default);
        entry.count += 1;
        entry.weight += allocation.weight;
        entry.tickers.push(allocation.ticker.clone());
    }

    for exposure in breakdown.values_mut() {
        exposure.weight = round1(exposure.weight);
    }

    breakdown
}
