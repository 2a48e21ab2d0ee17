//! Portfolio Construction Module.
//!
//! Turns a ranked candidate list into a constrained, normalized allocation.
//!
//! # Components
//!
//! - **Screener**: validation, conviction floor, ranking, holdings limit
//! - **Weights**: seed weights, sector caps, normalization, position bounds
//! - **Shares**: whole-share sizing against total capital
//! - **Stats**: totals, averages, sector breakdown
//!
//! # Usage
//!
//! ```ignore
//! use folio_engine::portfolio::{PortfolioConstructor, ConstructionConfig, Strategy};
//!
//! let constructor = PortfolioConstructor::with_config(ConstructionConfig::default());
//! let result = constructor.construct(&candidates, Strategy::Balanced)?;
//! ```

pub mod config;
pub mod constructor;
pub mod screener;
pub mod shares;
pub mod stats;
pub mod types;
pub mod weights;

pub use config::{ConstructionConfig, NormalizationMode};
pub use constructor::{construct_portfolio, PortfolioConstructor};
pub use screener::{screen_candidates, ScreenOutcome};
pub use types::{
    Allocation, Candidate, CandidateRejection, PortfolioConstructionResult, PortfolioStats,
    SectorBreakdown, SectorExposure, SectorKey, Strategy, UNKNOWN_SECTOR,
};
