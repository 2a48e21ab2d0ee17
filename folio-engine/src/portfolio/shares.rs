//! Share allocation.
//!
//! Converts weights into whole share counts. Shares are always rounded down
//! so the realized value never exceeds the weight's nominal budget.

use folio_common::{Error, Result};

use super::types::Allocation;

/// Whole shares affordable with `budget` at `price`.
///
/// Callers must have validated `price > 0`.
pub fn affordable_shares(budget: f64, price: f64) -> u64 {
    if budget <= 0.0 {
        return 0;
    }
    (budget / price).floor() as u64
}

/// Assign share counts and realized values to every allocation.
///
/// Fails on a non-positive or non-finite price; that is an input error,
/// not something to clamp away.
pub fn allocate_shares(allocations: &[Allocation], total_capital: f64) -> Result<Vec<Allocation>> {
    allocations
        .iter()
        .map(|a| {
            if !a.current_price.is_finite() || a.current_price <= 0.0 {
                return Err(Error::invalid_input(format!(
                    "{}: price must be positive, got {}",
                    a.ticker, a.current_price
                )));
            }

            let nominal = a.weight / 100.0 * total_capital;
            let shares = affordable_shares(nominal, a.current_price);

            Ok(Allocation {
                shares,
                target_value: shares as f64 * a.current_price,
                ..a.clone()
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::portfolio::screener::tests::make_candidate;

    fn allocation(ticker: &str, price: f64, weight: f64) -> Allocation {
        let mut candidate = make_candidate(ticker, None, 80.0);
        candidate.current_price = price;
        Allocation::from_candidate(&candidate, weight)
    }

    #[test]
    fn test_floor_never_overspends() {
        // 7.9% of 100k = 7,900 → 52 shares at 150 (7,800)
        let result = allocate_shares(&[allocation("AAPL", 150.0, 7.9)], 100_000.0).unwrap();
        assert_eq!(result[0].shares, 52);
        assert_eq!(result[0].target_value, 7_800.0);
        assert!(result[0].target_value <= 7_900.0);
    }

    #[test]
    fn test_price_above_budget_gives_zero_shares() {
        let result = allocate_shares(&[allocation("BRK", 600_000.0, 5.0)], 100_000.0).unwrap();
        assert_eq!(result[0].shares, 0);
        assert_eq!(result[0].target_value, 0.0);
    }

    #[test]
    fn test_non_positive_price_is_error() {
        let err = allocate_shares(&[allocation("ZERO", 0.0, 5.0)], 100_000.0).unwrap_err();
        assert!(err.is_input_error());
        assert!(err.to_string().contains("ZERO"));
    }

    #[test]
    fn test_affordable_shares_zero_budget() {
        assert_eq!(affordable_shares(0.0, 10.0), 0);
        assert_eq!(affordable_shares(-50.0, 10.0), 0);
        assert_eq!(affordable_shares(99.0, 10.0), 9);
    }
}
