//! Candidate screening.
//!
//! Rejects malformed candidates, drops those below the conviction floor,
//! ranks the rest by conviction and keeps the top `max_holdings`.

use std::collections::HashSet;
use tracing::{debug, warn};

use super::config::ConstructionConfig;
use super::types::{Candidate, CandidateRejection};

/// Outcome of screening a candidate list.
#[derive(Debug, Clone, Default)]
pub struct ScreenOutcome {
    /// Eligible candidates, highest conviction first
    pub eligible: Vec<Candidate>,
    /// Candidates that failed input validation
    pub rejected: Vec<CandidateRejection>,
    /// Valid candidates below the conviction floor
    pub below_conviction: usize,
    /// Eligible candidates cut by the holdings limit
    pub truncated: usize,
}

/// Check a single candidate for malformed input.
pub fn validate_candidate(candidate: &Candidate) -> Result<(), String> {
    if candidate.ticker.trim().is_empty() {
        return Err("empty ticker".to_string());
    }
    if !candidate.current_price.is_finite() || candidate.current_price <= 0.0 {
        return Err(format!(
            "non-positive price {}",
            candidate.current_price
        ));
    }
    if !candidate.conviction_score.is_finite()
        || !(0.0..=100.0).contains(&candidate.conviction_score)
    {
        return Err(format!(
            "conviction score {} outside 0-100",
            candidate.conviction_score
        ));
    }
    if !candidate.suggested_weight.is_finite() {
        return Err("suggested weight is not a number".to_string());
    }
    Ok(())
}

/// Screen candidates against the configuration.
///
/// The sort is stable, so equal conviction scores keep their input order.
pub fn screen_candidates(candidates: &[Candidate], config: &ConstructionConfig) -> ScreenOutcome {
    let mut outcome = ScreenOutcome::default();
    let mut seen: HashSet<&str> = HashSet::with_capacity(candidates.len());
    let mut survivors: Vec<&Candidate> = Vec::with_capacity(candidates.len());

    for candidate in candidates {
        if let Err(reason) = validate_candidate(candidate) {
            warn!(ticker = %candidate.ticker, reason = %reason, "Rejecting candidate");
            outcome.rejected.push(CandidateRejection {
                ticker: candidate.ticker.clone(),
                reason,
            });
            continue;
        }

        if !seen.insert(candidate.ticker.as_str()) {
            warn!(ticker = %candidate.ticker, "Rejecting duplicate candidate");
            outcome.rejected.push(CandidateRejection {
                ticker: candidate.ticker.clone(),
                reason: "duplicate ticker".to_string(),
            });
            continue;
        }

        if candidate.conviction_score < config.min_conviction {
            outcome.below_conviction += 1;
            continue;
        }

        survivors.push(candidate);
    }

    survivors.sort_by(|a, b| {
        b.conviction_score
            .partial_cmp(&a.conviction_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    outcome.truncated = survivors.len().saturating_sub(config.max_holdings);
    outcome.eligible = survivors
        .into_iter()
        .take(config.max_holdings)
        .cloned()
        .collect();

    debug!(
        eligible = outcome.eligible.len(),
        rejected = outcome.rejected.len(),
        below_conviction = outcome.below_conviction,
        truncated = outcome.truncated,
        "Screening complete"
    );

    outcome
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn make_candidate(ticker: &str, sector: Option<&str>, conviction: f64) -> Candidate {
        Candidate {
            ticker: ticker.to_string(),
            company_name: format!("{} Corp", ticker),
            sector: sector.map(str::to_string),
            current_price: 100.0,
            conviction_score: conviction,
            conviction_level: "Medium".to_string(),
            suggested_weight: 8.0,
            max_weight: 10.0,
            composite_upside: None,
            tier1_score: 50.0,
            bull_case: vec![],
            bear_case: vec![],
            risks: vec![],
            beta: None,
        }
    }

    #[test]
    fn test_filters_below_min_conviction() {
        let candidates = vec![
            make_candidate("AAA", Some("Tech"), 80.0),
            make_candidate("BBB", Some("Tech"), 49.9),
            make_candidate("CCC", Some("Energy"), 50.0),
        ];
        let outcome = screen_candidates(&candidates, &ConstructionConfig::default());
        let tickers: Vec<_> = outcome.eligible.iter().map(|c| c.ticker.as_str()).collect();
        assert_eq!(tickers, vec!["AAA", "CCC"]);
        assert_eq!(outcome.below_conviction, 1);
    }

    #[test]
    fn test_stable_sort_on_ties() {
        let candidates = vec![
            make_candidate("FIRST", None, 70.0),
            make_candidate("TOP", None, 95.0),
            make_candidate("SECOND", None, 70.0),
            make_candidate("THIRD", None, 70.0),
        ];
        let outcome = screen_candidates(&candidates, &ConstructionConfig::default());
        let tickers: Vec<_> = outcome.eligible.iter().map(|c| c.ticker.as_str()).collect();
        assert_eq!(tickers, vec!["TOP", "FIRST", "SECOND", "THIRD"]);
    }

    #[test]
    fn test_truncates_to_max_holdings() {
        let candidates: Vec<_> = (0..20)
            .map(|i| make_candidate(&format!("T{:02}", i), None, 60.0 + i as f64))
            .collect();
        let config = ConstructionConfig {
            max_holdings: 5,
            ..Default::default()
        };
        let outcome = screen_candidates(&candidates, &config);
        assert_eq!(outcome.eligible.len(), 5);
        assert_eq!(outcome.truncated, 15);
        assert_eq!(outcome.eligible[0].ticker, "T19");
        assert_eq!(outcome.eligible[4].ticker, "T15");
    }

    #[test]
    fn test_rejects_invalid_price_only_for_that_candidate() {
        let mut bad = make_candidate("BAD", None, 90.0);
        bad.current_price = 0.0;
        let candidates = vec![bad, make_candidate("GOOD", None, 60.0)];

        let outcome = screen_candidates(&candidates, &ConstructionConfig::default());
        assert_eq!(outcome.eligible.len(), 1);
        assert_eq!(outcome.eligible[0].ticker, "GOOD");
        assert_eq!(outcome.rejected.len(), 1);
        assert!(outcome.rejected[0].reason.contains("non-positive price"));
    }

    #[test]
    fn test_rejects_duplicate_ticker() {
        let mut dup = make_candidate("AAA", None, 99.0);
        dup.company_name = "Shadow".to_string();
        let candidates = vec![make_candidate("AAA", None, 60.0), dup];

        let outcome = screen_candidates(&candidates, &ConstructionConfig::default());
        assert_eq!(outcome.eligible.len(), 1);
        assert_eq!(outcome.eligible[0].conviction_score, 60.0);
        assert_eq!(outcome.rejected[0].reason, "duplicate ticker");
    }

    #[test]
    fn test_rejects_out_of_range_conviction() {
        let candidate = make_candidate("HOT", None, 120.0);
        assert!(validate_candidate(&candidate).is_err());
    }

    #[test]
    fn test_empty_input() {
        let outcome = screen_candidates(&[], &ConstructionConfig::default());
        assert!(outcome.eligible.is_empty());
        assert!(outcome.rejected.is_empty());
    }
}
