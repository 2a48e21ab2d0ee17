//! Portfolio construction types.
//!
//! Candidates arrive from the external screening stage; allocations are
//! produced fresh by every pipeline stage and never mutated in place.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;

// ============================================================================
// Sector Key
// ============================================================================

/// Label used when a candidate carries no sector.
pub const UNKNOWN_SECTOR: &str = "Unknown";

/// Closed-world sector label.
///
/// A missing, blank or literal "Unknown" sector all collapse into
/// [`SectorKey::Unknown`], so the breakdown never holds two unknown buckets.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SectorKey {
    /// A sector reported by the screening stage
    Named(String),
    /// Synthetic bucket for candidates without a sector
    Unknown,
}

impl SectorKey {
    /// Build a key from an optional sector label.
    pub fn from_label(label: Option<&str>) -> Self {
        match label.map(str::trim) {
            None | Some("") | Some(UNKNOWN_SECTOR) => Self::Unknown,
            Some(name) => Self::Named(name.to_string()),
        }
    }

    /// The display label for this sector.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Named(name) => name,
            Self::Unknown => UNKNOWN_SECTOR,
        }
    }
}

impl std::fmt::Display for SectorKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for SectorKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for SectorKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        Ok(Self::from_label(Some(&label)))
    }
}

// ============================================================================
// Strategy
// ============================================================================

/// Investment style requested by the caller.
///
/// Recorded on the result; weighting does not yet depend on it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    Value,
    Growth,
    #[default]
    Balanced,
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Value => write!(f, "value"),
            Self::Growth => write!(f, "growth"),
            Self::Balanced => write!(f, "balanced"),
        }
    }
}

impl std::str::FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "value" => Ok(Self::Value),
            "growth" => Ok(Self::Growth),
            "balanced" => Ok(Self::Balanced),
            _ => Err(format!("Unknown strategy: {}", s)),
        }
    }
}

// ============================================================================
// Candidate
// ============================================================================

/// An investment candidate produced by the screening stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    /// Ticker symbol (unique key)
    pub ticker: String,
    /// Company name
    #[serde(default)]
    pub company_name: String,
    /// Sector label, if known
    #[serde(default)]
    pub sector: Option<String>,
    /// Last price per share (must be > 0)
    pub current_price: f64,
    /// Conviction score (0-100)
    pub conviction_score: f64,
    /// Conviction label (e.g. "High")
    #[serde(default)]
    pub conviction_level: String,
    /// Suggested weight (%)
    pub suggested_weight: f64,
    /// Suggested weight ceiling (%)
    #[serde(default)]
    pub max_weight: f64,
    /// Expected upside (%)
    #[serde(default)]
    pub composite_upside: Option<f64>,
    /// Preliminary screening score
    #[serde(default)]
    pub tier1_score: f64,
    #[serde(default)]
    pub bull_case: Vec<String>,
    #[serde(default)]
    pub bear_case: Vec<String>,
    #[serde(default)]
    pub risks: Vec<String>,
    /// Market beta, when the data source provides one
    #[serde(default)]
    pub beta: Option<f64>,
}

impl Candidate {
    /// Sector key with the unknown sentinel applied.
    pub fn sector_key(&self) -> SectorKey {
        SectorKey::from_label(self.sector.as_deref())
    }
}

// ============================================================================
// Allocation
// ============================================================================

/// A candidate with an assigned weight and share count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Allocation {
    pub ticker: String,
    pub company_name: String,
    pub sector: SectorKey,
    pub current_price: f64,
    pub conviction_score: f64,
    pub conviction_level: String,
    /// Portfolio weight (percentage points, 0-100)
    pub weight: f64,
    /// Whole shares to hold
    pub shares: u64,
    /// Realized value: shares × current price
    pub target_value: f64,
    pub composite_upside: Option<f64>,
    pub tier1_score: f64,
    pub bull_case: Vec<String>,
    pub bear_case: Vec<String>,
    pub risks: Vec<String>,
    pub beta: Option<f64>,
}

impl Allocation {
    /// Seed an allocation from a candidate with the given weight.
    pub fn from_candidate(candidate: &Candidate, weight: f64) -> Self {
        Self {
            ticker: candidate.ticker.clone(),
            company_name: candidate.company_name.clone(),
            sector: candidate.sector_key(),
            current_price: candidate.current_price,
            conviction_score: candidate.conviction_score,
            conviction_level: candidate.conviction_level.clone(),
            weight,
            shares: 0,
            target_value: 0.0,
            composite_upside: candidate.composite_upside,
            tier1_score: candidate.tier1_score,
            bull_case: candidate.bull_case.clone(),
            bear_case: candidate.bear_case.clone(),
            risks: candidate.risks.clone(),
            beta: candidate.beta,
        }
    }

    /// Copy of this allocation with a different weight.
    pub fn with_weight(&self, weight: f64) -> Self {
        Self {
            weight,
            ..self.clone()
        }
    }
}

// ============================================================================
// Results
// ============================================================================

/// Aggregate exposure of one sector.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SectorExposure {
    /// Number of holdings in the sector
    pub count: usize,
    /// Summed weight (%)
    pub weight: f64,
    /// Member tickers in allocation order
    pub tickers: Vec<String>,
}

/// Sector → exposure mapping.
pub type SectorBreakdown = BTreeMap<SectorKey, SectorExposure>;

/// Summary statistics of a constructed portfolio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioStats {
    pub average_conviction: f64,
    /// Mean upside over allocations that report one
    pub average_upside: Option<f64>,
    pub holdings_count: usize,
    /// Placeholder until per-candidate betas are sourced
    pub estimated_beta: f64,
}

impl Default for PortfolioStats {
    fn default() -> Self {
        Self {
            average_conviction: 0.0,
            average_upside: None,
            holdings_count: 0,
            estimated_beta: 1.0,
        }
    }
}

/// Why a candidate was excluded before screening.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateRejection {
    pub ticker: String,
    pub reason: String,
}

/// Result of a construction run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioConstructionResult {
    /// Final allocations, highest conviction first
    pub allocations: Vec<Allocation>,
    /// Sum of allocation weights (%)
    pub total_weight: f64,
    /// 100 − total weight (%)
    pub cash_reserve: f64,
    pub sector_breakdown: SectorBreakdown,
    pub portfolio_stats: PortfolioStats,
    pub strategy: Strategy,
    /// Candidates dropped by input validation
    pub rejected: Vec<CandidateRejection>,
    pub generated_at: DateTime<Utc>,
}

impl PortfolioConstructionResult {
    /// Terminal result for a run with no eligible candidates.
    pub fn empty(strategy: Strategy, rejected: Vec<CandidateRejection>) -> Self {
        Self {
            allocations: Vec::new(),
            total_weight: 0.0,
            cash_reserve: 100.0,
            sector_breakdown: SectorBreakdown::new(),
            portfolio_stats: PortfolioStats::default(),
            strategy,
            rejected,
            generated_at: Utc::now(),
        }
    }

    /// Whether the run produced any allocation.
    pub fn is_empty(&self) -> bool {
        self.allocations.is_empty()
    }

    /// Look up an allocation by ticker.
    pub fn allocation(&self, ticker: &str) -> Option<&Allocation> {
        self.allocations.iter().find(|a| a.ticker == ticker)
    }

    /// Total realized value of all allocations.
    pub fn invested_value(&self) -> f64 {
        self.allocations.iter().map(|a| a.target_value).sum()
    }

    /// Summary string for logging.
    pub fn summary(&self) -> String {
        format!(
            "{} holdings, {:.1}% invested, {:.1}% cash across {} sectors",
            self.allocations.len(),
            self.total_weight,
            self.cash_reserve,
            self.sector_breakdown.len()
        )
    }
}
