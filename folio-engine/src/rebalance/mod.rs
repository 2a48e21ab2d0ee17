//! Rebalancing Module.
//!
//! Turns a change in target allocation into sell and buy orders.
//!
//! # Usage
//!
//! ```ignore
//! use folio_engine::rebalance::{Rebalancer, targets_from_construction};
//!
//! let targets = targets_from_construction(&construction, &prices, capital);
//! let plan = Rebalancer::new().rebalance(&holdings, &targets, cash)?;
//! ```

pub mod reconciler;
pub mod targets;
pub mod types;

pub use reconciler::{rebalance_portfolio, Rebalancer};
pub use targets::targets_from_construction;
pub use types::{
    BuyOrder, Holding, OrderReason, RebalanceResult, SellOrder, TargetAllocation,
    DEFAULT_MIN_TRADE_VALUE,
};
