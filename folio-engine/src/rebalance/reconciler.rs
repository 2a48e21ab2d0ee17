//! Holding/target reconciliation.
//!
//! Two ordered phases:
//!
//! 1. **Sells**: exit holdings missing from the targets, trim holdings above
//!    their target share count. Proceeds accumulate into the cash pool.
//! 2. **Buys**: open or top up positions below target, paid from available
//!    cash plus sell proceeds. Sells are assumed to settle before buys.
//!
//! Trades worth less than the minimum trade value are dropped outright,
//! so a small drift can leave a position untouched indefinitely.

use std::collections::{HashMap, HashSet};
use tracing::{debug, info, info_span};

use folio_common::logging::generate_run_id;
use folio_common::{Config, Error, Result};

use super::types::{
    BuyOrder, Holding, OrderReason, RebalanceResult, SellOrder, TargetAllocation,
    DEFAULT_MIN_TRADE_VALUE,
};

/// Slack for comparing a buy's cost against the remaining cash pool.
const CASH_EPSILON: f64 = 1e-6;

/// Generates orders that move holdings to targets.
pub struct Rebalancer {
    min_trade_value: f64,
}

impl Rebalancer {
    /// Create a rebalancer with the default minimum trade value.
    pub fn new() -> Self {
        Self {
            min_trade_value: DEFAULT_MIN_TRADE_VALUE,
        }
    }

    /// Create with a custom minimum trade value.
    pub fn with_min_trade_value(min_trade_value: f64) -> Self {
        Self { min_trade_value }
    }

    /// Build from the shared configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::with_min_trade_value(
            config
                .rebalance
                .as_ref()
                .and_then(|r| r.min_trade_value)
                .unwrap_or(DEFAULT_MIN_TRADE_VALUE),
        )
    }

    pub fn min_trade_value(&self) -> f64 {
        self.min_trade_value
    }

    /// Reconcile holdings against targets.
    pub fn rebalance(
        &self,
        holdings: &[Holding],
        targets: &[TargetAllocation],
        available_cash: f64,
    ) -> Result<RebalanceResult> {
        self.validate_inputs(holdings, targets, available_cash)?;

        let run_id = generate_run_id();
        let _span = info_span!("rebalance_portfolio", run_id = %run_id).entered();

        info!(
            holdings = holdings.len(),
            targets = targets.len(),
            available_cash,
            min_trade_value = self.min_trade_value,
            "Starting rebalance"
        );

        let target_by_ticker: HashMap<&str, &TargetAllocation> =
            targets.iter().map(|t| (t.ticker.as_str(), t)).collect();
        let held_by_ticker: HashMap<&str, &Holding> =
            holdings.iter().map(|h| (h.ticker.as_str(), h)).collect();

        // Phase 1: sells
        let sell_orders = self.generate_sells(holdings, &target_by_ticker);
        let cash_from_sells: f64 = sell_orders.iter().map(|o| o.estimated_proceeds).sum();

        // Phase 2: buys against the combined pool
        let investable = available_cash + cash_from_sells;
        let (buy_orders, remaining_cash) = self.generate_buys(targets, &held_by_ticker, investable);
        let total_buy_cost: f64 = buy_orders.iter().map(|o| o.estimated_cost).sum();

        let result = RebalanceResult {
            trades_count: sell_orders.len() + buy_orders.len(),
            net_cash_change: cash_from_sells - total_buy_cost,
            sell_orders,
            buy_orders,
            cash_from_sells,
            total_buy_cost,
            remaining_cash,
        };

        info!(summary = %result.summary(), "Rebalance complete");
        Ok(result)
    }

    /// Sell orders for removed and overweight holdings, in holding order.
    fn generate_sells(
        &self,
        holdings: &[Holding],
        targets: &HashMap<&str, &TargetAllocation>,
    ) -> Vec<SellOrder> {
        let mut orders = Vec::new();

        for holding in holdings {
            let (shares, reason) = match targets.get(holding.ticker.as_str()) {
                None => (holding.shares, OrderReason::RemovedFromPortfolio),
                Some(target) if target.target_shares < holding.shares => (
                    holding.shares - target.target_shares,
                    OrderReason::ReduceOverweight,
                ),
                Some(_) => continue,
            };

            if shares == 0 {
                continue;
            }

            let proceeds = shares as f64 * holding.current_price;
            if proceeds < self.min_trade_value {
                debug!(
                    ticker = %holding.ticker,
                    shares,
                    proceeds,
                    "Dropping sell below minimum trade value"
                );
                continue;
            }

            orders.push(SellOrder {
                ticker: holding.ticker.clone(),
                shares,
                estimated_proceeds: proceeds,
                reason,
            });
        }

        orders
    }

    /// Buy orders for underweight targets, in target order.
    ///
    /// The pool is drawn down after every accepted order so the buys can
    /// never oversubscribe it. Returns the orders and the unspent cash.
    fn generate_buys(
        &self,
        targets: &[TargetAllocation],
        held: &HashMap<&str, &Holding>,
        investable: f64,
    ) -> (Vec<BuyOrder>, f64) {
        let mut orders = Vec::new();
        let mut remaining = investable;

        for target in targets {
            let current = held.get(target.ticker.as_str()).map(|h| h.shares);
            let current_shares = current.unwrap_or(0);
            if target.target_shares <= current_shares {
                continue;
            }

            let shares = target.target_shares - current_shares;
            let cost = shares as f64 * target.current_price;

            if cost < self.min_trade_value {
                debug!(ticker = %target.ticker, shares, cost, "Dropping buy below minimum trade value");
                continue;
            }
            if cost > remaining + CASH_EPSILON {
                debug!(
                    ticker = %target.ticker,
                    shares,
                    cost,
                    remaining,
                    "Dropping buy exceeding remaining cash"
                );
                continue;
            }

            remaining -= cost;
            orders.push(BuyOrder {
                ticker: target.ticker.clone(),
                shares,
                estimated_cost: cost,
                reason: if current.is_some() {
                    OrderReason::IncreaseUnderweight
                } else {
                    OrderReason::NewPosition
                },
            });
        }

        (orders, remaining.max(0.0))
    }

    fn validate_inputs(
        &self,
        holdings: &[Holding],
        targets: &[TargetAllocation],
        available_cash: f64,
    ) -> Result<()> {
        if !available_cash.is_finite() || available_cash < 0.0 {
            return Err(Error::invalid_input(format!(
                "available cash must be non-negative, got {}",
                available_cash
            )));
        }
        if !self.min_trade_value.is_finite() || self.min_trade_value < 0.0 {
            return Err(Error::invalid_input(format!(
                "minimum trade value must be non-negative, got {}",
                self.min_trade_value
            )));
        }

        let mut seen = HashSet::new();
        for holding in holdings {
            if !seen.insert(holding.ticker.as_str()) {
                return Err(Error::invalid_input(format!(
                    "duplicate holding {}",
                    holding.ticker
                )));
            }
            if !holding.current_price.is_finite() || holding.current_price <= 0.0 {
                return Err(Error::invalid_input(format!(
                    "{}: holding price must be positive, got {}",
                    holding.ticker, holding.current_price
                )));
            }
        }

        seen.clear();
        for target in targets {
            if !seen.insert(target.ticker.as_str()) {
                return Err(Error::invalid_input(format!(
                    "duplicate target {}",
                    target.ticker
                )));
            }
            if !target.current_price.is_finite() || target.current_price <= 0.0 {
                return Err(Error::invalid_input(format!(
                    "{}: target price must be positive, got {}",
                    target.ticker, target.current_price
                )));
            }
        }

        Ok(())
    }
}

impl Default for Rebalancer {
    fn default() -> Self {
        Self::new()
    }
}

/// Reconcile holdings against targets with the given minimum trade value.
pub fn rebalance_portfolio(
    holdings: &[Holding],
    targets: &[TargetAllocation],
    available_cash: f64,
    min_trade_value: f64,
) -> Result<RebalanceResult> {
    Rebalancer::with_min_trade_value(min_trade_value).rebalance(holdings, targets, available_cash)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn holding(ticker: &str, shares: u64, price: f64) -> Holding {
        Holding {
            ticker: ticker.to_string(),
            shares,
            current_price: price,
            sector: None,
        }
    }

    fn target(ticker: &str, shares: u64, price: f64) -> TargetAllocation {
        TargetAllocation {
            ticker: ticker.to_string(),
            target_weight: 5.0,
            target_shares: shares,
            current_price: price,
        }
    }

    #[test]
    fn test_full_exit_of_removed_holding() {
        let result = Rebalancer::new()
            .rebalance(&[holding("TICK", 100, 10.0)], &[], 0.0)
            .unwrap();

        assert_eq!(
            result.sell_orders,
            vec![SellOrder {
                ticker: "TICK".into(),
                shares: 100,
                estimated_proceeds: 1_000.0,
                reason: OrderReason::RemovedFromPortfolio,
            }]
        );
        assert!(result.buy_orders.is_empty());
        assert_eq!(result.net_cash_change, 1_000.0);
        assert_eq!(result.trades_count, 1);
    }

    #[test]
    fn test_small_exit_is_dropped() {
        let result = Rebalancer::new()
            .rebalance(&[holding("TICK", 5, 10.0)], &[], 0.0)
            .unwrap();
        assert!(result.is_noop());
        assert_eq!(result.net_cash_change, 0.0);
    }

    #[test]
    fn test_partial_sell_of_overweight() {
        let result = Rebalancer::new()
            .rebalance(&[holding("AAA", 100, 20.0)], &[target("AAA", 60, 20.0)], 0.0)
            .unwrap();
        assert_eq!(result.sell_orders.len(), 1);
        assert_eq!(result.sell_orders[0].shares, 40);
        assert_eq!(result.sell_orders[0].estimated_proceeds, 800.0);
        assert_eq!(result.sell_orders[0].reason, OrderReason::ReduceOverweight);
    }

    #[test]
    fn test_buy_reasons() {
        let result = Rebalancer::new()
            .rebalance(
                &[holding("OLD", 10, 100.0)],
                &[target("OLD", 20, 100.0), target("NEW", 10, 100.0)],
                10_000.0,
            )
            .unwrap();

        assert_eq!(result.buy_orders.len(), 2);
        assert_eq!(result.buy_orders[0].reason, OrderReason::IncreaseUnderweight);
        assert_eq!(result.buy_orders[0].shares, 10);
        assert_eq!(result.buy_orders[1].reason, OrderReason::NewPosition);
        assert_eq!(result.total_buy_cost, 2_000.0);
        assert_eq!(result.remaining_cash, 8_000.0);
    }

    #[test]
    fn test_sell_proceeds_fund_buys() {
        let result = Rebalancer::new()
            .rebalance(
                &[holding("EXIT", 50, 40.0)],
                &[target("ENTER", 20, 95.0)],
                100.0,
            )
            .unwrap();

        assert_eq!(result.cash_from_sells, 2_000.0);
        assert_eq!(result.buy_orders.len(), 1);
        assert_eq!(result.buy_orders[0].estimated_cost, 1_900.0);
        assert_eq!(result.net_cash_change, 100.0);
    }

    #[test]
    fn test_cash_is_drawn_down_per_order() {
        // Each buy fits the pool alone, but not both together.
        let result = Rebalancer::new()
            .rebalance(
                &[],
                &[target("FIRST", 60, 100.0), target("SECOND", 60, 100.0)],
                10_000.0,
            )
            .unwrap();

        assert_eq!(result.buy_orders.len(), 1);
        assert_eq!(result.buy_orders[0].ticker, "FIRST");
        assert!(result.total_buy_cost <= 10_000.0);
    }

    #[test]
    fn test_later_smaller_buy_still_fits() {
        let result = Rebalancer::new()
            .rebalance(
                &[],
                &[
                    target("BIG", 80, 100.0),
                    target("HUGE", 50, 100.0),
                    target("SMALL", 10, 100.0),
                ],
                10_000.0,
            )
            .unwrap();

        let tickers: Vec<_> = result.buy_orders.iter().map(|o| o.ticker.as_str()).collect();
        assert_eq!(tickers, vec!["BIG", "SMALL"]);
        assert_eq!(result.remaining_cash, 1_000.0);
    }

    #[test]
    fn test_at_target_no_trade() {
        let result = Rebalancer::new()
            .rebalance(&[holding("AAA", 10, 100.0)], &[target("AAA", 10, 100.0)], 5_000.0)
            .unwrap();
        assert!(result.is_noop());
    }

    #[test]
    fn test_invalid_inputs() {
        let rebalancer = Rebalancer::new();
        assert!(rebalancer.rebalance(&[], &[], -1.0).is_err());
        assert!(rebalancer
            .rebalance(&[holding("BAD", 1, 0.0)], &[], 0.0)
            .is_err());
        assert!(rebalancer
            .rebalance(&[], &[target("DUP", 1, 1.0), target("DUP", 2, 1.0)], 0.0)
            .is_err());
        assert!(rebalance_portfolio(&[], &[], 0.0, -10.0).is_err());
    }

    #[test]
    fn test_from_config_default() {
        let rebalancer = Rebalancer::from_config(&Config::default());
        assert_eq!(rebalancer.min_trade_value(), DEFAULT_MIN_TRADE_VALUE);
    }
}
