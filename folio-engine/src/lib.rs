//! Folio Engine
//!
//! Turns a conviction-ranked list of investment candidates into a constrained,
//! normalized target allocation, and turns a change in target allocation into
//! buy and sell orders.
//!
//! # Architecture
//!
//! ```text
//!  candidates ──► screen ──► seed weights ──► sector caps ──► normalize ──► clamp
//!                                                                             │
//!  PortfolioConstructionResult ◄── stats + sector breakdown ◄── shares ◄──────┘
//!
//!  quotes (PriceFetcher) ──► targets_from_construction ──► Rebalancer ──► orders
//! ```
//!
//! Construction and rebalancing are synchronous pure functions. The only
//! async boundary is [`data::PriceFetcher`], which batches quote lookups
//! against a caller-supplied [`data::QuoteProvider`].
//!
//! # Key Concepts
//!
//! ## Weights
//! - Percentage points of total capital, rounded to one decimal
//! - The cash reserve is whatever the allocations leave of 100
//!
//! ## Orders
//! - Sells come first and fund buys
//! - Trades below the minimum trade value are dropped, not deferred

#![warn(clippy::all)]
#![allow(clippy::pedantic)]

pub mod data;
pub mod portfolio;
pub mod rebalance;
pub mod report;

pub use data::{fetch_prices, PriceFetchResult, PriceFetcher, QuoteProvider, QuoteSettings};
pub use portfolio::{
    construct_portfolio, Candidate, ConstructionConfig, NormalizationMode,
    PortfolioConstructionResult, PortfolioConstructor, Strategy,
};
pub use rebalance::{
    rebalance_portfolio, targets_from_construction, Holding, RebalanceResult, Rebalancer,
    TargetAllocation, DEFAULT_MIN_TRADE_VALUE,
};
pub use report::{ConstructionReport, RebalanceReport, ReportFormat};
