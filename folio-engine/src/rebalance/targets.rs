//! Target derivation from a construction result.

use std::collections::HashMap;
use tracing::debug;

use crate::portfolio::shares::affordable_shares;
use crate::portfolio::PortfolioConstructionResult;

use super::types::TargetAllocation;

/// Re-express a construction result at current prices.
///
/// Target shares are re-sized from each allocation's weight at the fresh
/// quote. A missing or non-positive quote falls back to the price the
/// allocation was constructed with.
pub fn targets_from_construction(
    result: &PortfolioConstructionResult,
    prices: &HashMap<String, f64>,
    total_capital: f64,
) -> Vec<TargetAllocation> {
    result
        .allocations
        .iter()
        .map(|allocation| {
            let price = match prices.get(&allocation.ticker) {
                Some(&p) if p.is_finite() && p > 0.0 => p,
                _ => {
                    debug!(ticker = %allocation.ticker, "No fresh quote, using construction price");
                    allocation.current_price
                }
            };

            TargetAllocation {
                ticker: allocation.ticker.clone(),
                target_weight: allocation.weight,
                target_shares: affordable_shares(allocation.weight / 100.0 * total_capital, price),
                current_price: price,
            }
        })
        .collect()
}
