//! Rebalancing types.

use serde::{Deserialize, Serialize};

/// Trades below this value are not worth executing.
pub const DEFAULT_MIN_TRADE_VALUE: f64 = 500.0;

/// A position currently held.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Holding {
    pub ticker: String,
    /// Shares held
    pub shares: u64,
    /// Last price per share
    pub current_price: f64,
    #[serde(default)]
    pub sector: Option<String>,
}

impl Holding {
    /// Current market value.
    pub fn market_value(&self) -> f64 {
        self.shares as f64 * self.current_price
    }
}

/// Desired end state for one ticker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetAllocation {
    pub ticker: String,
    /// Target weight (%)
    pub target_weight: f64,
    /// Target share count
    pub target_shares: u64,
    /// Price the target was sized at
    pub current_price: f64,
}

/// Why an order was generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderReason {
    #[serde(rename = "Removed from portfolio")]
    RemovedFromPortfolio,
    #[serde(rename = "Reduce overweight position")]
    ReduceOverweight,
    #[serde(rename = "New position")]
    NewPosition,
    #[serde(rename = "Increase underweight position")]
    IncreaseUnderweight,
}

impl std::fmt::Display for OrderReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RemovedFromPortfolio => write!(f, "Removed from portfolio"),
            Self::ReduceOverweight => write!(f, "Reduce overweight position"),
            Self::NewPosition => write!(f, "New position"),
            Self::IncreaseUnderweight => write!(f, "Increase underweight position"),
        }
    }
}

/// A sell order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SellOrder {
    pub ticker: String,
    pub shares: u64,
    pub estimated_proceeds: f64,
    pub reason: OrderReason,
}

/// A buy order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuyOrder {
    pub ticker: String,
    pub shares: u64,
    pub estimated_cost: f64,
    pub reason: OrderReason,
}

/// Orders that move the current holdings to the targets.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RebalanceResult {
    pub sell_orders: Vec<SellOrder>,
    pub buy_orders: Vec<BuyOrder>,
    /// Proceeds from all sells minus cost of all buys
    pub net_cash_change: f64,
    pub trades_count: usize,
    /// Proceeds from all sells
    pub cash_from_sells: f64,
    /// Cost of all buys
    pub total_buy_cost: f64,
    /// Investable cash left after the buys
    pub remaining_cash: f64,
}

impl RebalanceResult {
    /// Whether no trade is needed.
    pub fn is_noop(&self) -> bool {
        self.trades_count == 0
    }

    /// Summary string for logging.
    pub fn summary(&self) -> String {
        format!(
            "{} sells ({:.2}), {} buys ({:.2}), net cash {:+.2}",
            self.sell_orders.len(),
            self.cash_from_sells,
            self.buy_orders.len(),
            self.total_buy_cost,
            self.net_cash_change
        )
    }
}
