//! Report rendering for construction and rebalance results.
//!
//! Generates reports in two formats:
//! - Markdown (for people)
//! - JSON (for downstream tooling)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::portfolio::PortfolioConstructionResult;
use crate::rebalance::RebalanceResult;

// ============================================================================
// Report Format
// ============================================================================

/// Supported report formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// Markdown format (human-readable)
    Markdown,
    /// JSON format (machine-readable)
    Json,
}

impl ReportFormat {
    fn extension(self) -> &'static str {
        match self {
            Self::Markdown => "md",
            Self::Json => "json",
        }
    }
}

impl std::fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Markdown => write!(f, "markdown"),
            Self::Json => write!(f, "json"),
        }
    }
}

impl std::str::FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "markdown" | "md" => Ok(Self::Markdown),
            "json" => Ok(Self::Json),
            _ => Err(format!("Unknown report format: {}", s)),
        }
    }
}

fn write_report(path: &Path, format: ReportFormat, content: String) -> Result<PathBuf> {
    let file_path = if path.extension().is_none() {
        path.with_extension(format.extension())
    } else {
        path.to_path_buf()
    };

    if let Some(parent) = file_path.parent() {
        std::fs::create_dir_all(parent).context("Failed to create report directory")?;
    }

    std::fs::write(&file_path, content)
        .with_context(|| format!("Failed to write report file {}", file_path.display()))?;

    Ok(file_path)
}

fn fmt_opt_pct(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{:.1}%", v))
}

// ============================================================================
// Construction Report
// ============================================================================

/// Report generator for a constructed portfolio.
pub struct ConstructionReport<'a> {
    result: &'a PortfolioConstructionResult,
    total_capital: f64,
}

impl<'a> ConstructionReport<'a> {
    pub fn new(result: &'a PortfolioConstructionResult, total_capital: f64) -> Self {
        Self {
            result,
            total_capital,
        }
    }

    /// Generate report in the specified format.
    pub fn generate(&self, format: ReportFormat) -> Result<String> {
        match format {
            ReportFormat::Markdown => Ok(self.to_markdown()),
            ReportFormat::Json => self.to_json(),
        }
    }

    /// Save report to file, adding the format's extension when missing.
    pub fn save_to_file(&self, path: &Path, format: ReportFormat) -> Result<PathBuf> {
        write_report(path, format, self.generate(format)?)
    }

    pub fn to_markdown(&self) -> String {
        let r = self.result;
        let mut md = String::new();

        md.push_str(&format!(
            "# Portfolio Construction\n\n**Strategy**: {}\n**Generated**: {}\n\n",
            r.strategy,
            r.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
        ));

        md.push_str("## Summary\n\n");
        md.push_str(&format!("- **Capital**: {:.2}\n", self.total_capital));
        md.push_str(&format!("- **Holdings**: {}\n", r.portfolio_stats.holdings_count));
        md.push_str(&format!("- **Invested**: {:.1}%\n", r.total_weight));
        md.push_str(&format!("- **Cash reserve**: {:.1}%\n", r.cash_reserve));
        md.push_str(&format!(
            "- **Average conviction**: {:.1}\n",
            r.portfolio_stats.average_conviction
        ));
        md.push_str(&format!(
            "- **Average upside**: {}\n",
            fmt_opt_pct(r.portfolio_stats.average_upside)
        ));
        md.push_str(&format!(
            "- **Estimated beta**: {:.2}\n\n",
            r.portfolio_stats.estimated_beta
        ));

        if r.is_empty() {
            md.push_str("_No candidates passed screening._\n\n");
        } else {
            md.push_str("## Allocations\n\n");
            md.push_str("| Ticker | Company | Sector | Conviction | Weight | Shares | Price | Value | Upside |\n");
            md.push_str("|--------|---------|--------|------------|--------|--------|-------|-------|--------|\n");
            for a in &r.allocations {
                md.push_str(&format!(
                    "| {} | {} | {} | {:.0} ({}) | {:.1}% | {} | {:.2} | {:.2} | {} |\n",
                    a.ticker,
                    a.company_name,
                    a.sector,
                    a.conviction_score,
                    a.conviction_level,
                    a.weight,
                    a.shares,
                    a.current_price,
                    a.target_value,
                    fmt_opt_pct(a.composite_upside),
                ));
            }
            md.push('\n');

            md.push_str("## Sectors\n\n");
            md.push_str("| Sector | Holdings | Weight | Tickers |\n");
            md.push_str("|--------|----------|--------|---------|\n");
            for (sector, exposure) in &r.sector_breakdown {
                md.push_str(&format!(
                    "| {} | {} | {:.1}% | {} |\n",
                    sector,
                    exposure.count,
                    exposure.weight,
                    exposure.tickers.join(", ")
                ));
            }
            md.push('\n');
        }

        if !r.rejected.is_empty() {
            md.push_str("## Rejected\n\n");
            for rejection in &r.rejected {
                md.push_str(&format!("- `{}`: {}\n", rejection.ticker, rejection.reason));
            }
            md.push('\n');
        }

        md
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self.result).context("Failed to serialize construction result")
    }
}

// ============================================================================
// Rebalance Report
// ============================================================================

/// Report generator for a set of rebalance orders.
pub struct RebalanceReport<'a> {
    result: &'a RebalanceResult,
}

impl<'a> RebalanceReport<'a> {
    pub fn new(result: &'a RebalanceResult) -> Self {
        Self { result }
    }

    pub fn generate(&self, format: ReportFormat) -> Result<String> {
        match format {
            ReportFormat::Markdown => Ok(self.to_markdown()),
            ReportFormat::Json => self.to_json(),
        }
    }

    pub fn save_to_file(&self, path: &Path, format: ReportFormat) -> Result<PathBuf> {
        write_report(path, format, self.generate(format)?)
    }

    pub fn to_markdown(&self) -> String {
        let r = self.result;
        let mut md = String::from("# Rebalance Orders\n\n");

        if r.is_noop() {
            md.push_str("_Portfolio is on target, no trades needed._\n");
            return md;
        }

        if !r.sell_orders.is_empty() {
            md.push_str("## Sells\n\n");
            md.push_str("| Ticker | Shares | Proceeds | Reason |\n");
            md.push_str("|--------|--------|----------|--------|\n");
            for order in &r.sell_orders {
                md.push_str(&format!(
                    "| {} | {} | {:.2} | {} |\n",
                    order.ticker, order.shares, order.estimated_proceeds, order.reason
                ));
            }
            md.push('\n');
        }

        if !r.buy_orders.is_empty() {
            md.push_str("## Buys\n\n");
            md.push_str("| Ticker | Shares | Cost | Reason |\n");
            md.push_str("|--------|--------|------|--------|\n");
            for order in &r.buy_orders {
                md.push_str(&format!(
                    "| {} | {} | {:.2} | {} |\n",
                    order.ticker, order.shares, order.estimated_cost, order.reason
                ));
            }
            md.push('\n');
        }

        md.push_str("## Cash\n\n");
        md.push_str(&format!("- **From sells**: {:.2}\n", r.cash_from_sells));
        md.push_str(&format!("- **Spent on buys**: {:.2}\n", r.total_buy_cost));
        md.push_str(&format!("- **Net change**: {:+.2}\n", r.net_cash_change));
        md.push_str(&format!("- **Remaining**: {:.2}\n", r.remaining_cash));
        md.push_str(&format!("- **Trades**: {}\n", r.trades_count));

        md
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self.result).context("Failed to serialize rebalance result")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::portfolio::{Candidate, PortfolioConstructor, Strategy};
    use crate::rebalance::{rebalance_portfolio, Holding};

    fn sample_construction() -> PortfolioConstructionResult {
        let candidates = vec![
            Candidate {
                ticker: "AAPL".into(),
                company_name: "Apple".into(),
                sector: Some("Technology".into()),
                current_price: 150.0,
                conviction_score: 90.0,
                conviction_level: "High".into(),
                suggested_weight: 8.0,
                max_weight: 10.0,
                composite_upside: Some(20.0),
                tier1_score: 0.0,
                bull_case: vec![],
                bear_case: vec![],
                risks: vec![],
                beta: None,
            },
            Candidate {
                ticker: "BAD".into(),
                company_name: "Bad Data".into(),
                sector: None,
                current_price: 0.0,
                conviction_score: 90.0,
                conviction_level: "High".into(),
                suggested_weight: 8.0,
                max_weight: 10.0,
                composite_upside: None,
                tier1_score: 0.0,
                bull_case: vec![],
                bear_case: vec![],
                risks: vec![],
                beta: None,
            },
        ];
        PortfolioConstructor::new()
            .construct(&candidates, Strategy::Growth)
            .unwrap()
    }

    #[test]
    fn test_report_format_parsing() {
        assert_eq!("markdown".parse::<ReportFormat>().unwrap(), ReportFormat::Markdown);
        assert_eq!("MD".parse::<ReportFormat>().unwrap(), ReportFormat::Markdown);
        assert_eq!("json".parse::<ReportFormat>().unwrap(), ReportFormat::Json);
        assert!("telegram".parse::<ReportFormat>().is_err());
    }

    #[test]
    fn test_construction_markdown() {
        let result = sample_construction();
        let md = ConstructionReport::new(&result, 100_000.0).to_markdown();

        assert!(md.contains("# Portfolio Construction"));
        assert!(md.contains("**Strategy**: growth"));
        assert!(md.contains("| AAPL | Apple | Technology |"));
        assert!(md.contains("## Rejected"));
        assert!(md.contains("`BAD`"));
    }

    #[test]
    fn test_construction_json() {
        let result = sample_construction();
        let json = ConstructionReport::new(&result, 100_000.0).to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["allocations"][0]["ticker"], "AAPL");
        assert!(value["sectorBreakdown"]["Technology"].is_object());
    }

    #[test]
    fn test_rebalance_markdown() {
        let holdings = vec![Holding {
            ticker: "TICK".into(),
            shares: 100,
            current_price: 10.0,
            sector: None,
        }];
        let result = rebalance_portfolio(&holdings, &[], 0.0, 500.0).unwrap();
        let md = RebalanceReport::new(&result).to_markdown();

        assert!(md.contains("| TICK | 100 | 1000.00 | Removed from portfolio |"));
        assert!(md.contains("**Net change**: +1000.00"));
        assert!(!md.contains("## Buys"));
    }

    #[test]
    fn test_noop_rebalance_markdown() {
        let result = RebalanceResult::default();
        let md = RebalanceReport::new(&result).to_markdown();
        assert!(md.contains("no trades needed"));
    }

    #[test]
    fn test_save_adds_extension() {
        let dir = tempfile::tempdir().unwrap();
        let result = RebalanceResult::default();
        let path = RebalanceReport::new(&result)
            .save_to_file(&dir.path().join("reports/orders"), ReportFormat::Json)
            .unwrap();

        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("json"));
        assert!(std::fs::read_to_string(path).unwrap().contains("\"sellOrders\""));
    }
}
