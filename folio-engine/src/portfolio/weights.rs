//! Weight assignment, sector caps, normalization and position bounds.
//!
//! Every function here is a pure transform: it reads an allocation slice and
//! returns a new vector, leaving its input untouched.

use std::collections::HashMap;
use tracing::debug;

use super::config::{ConstructionConfig, NormalizationMode};
use super::types::{Allocation, Candidate, SectorKey};

/// Round to one decimal place.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Round down to one decimal place.
fn floor1(value: f64) -> f64 {
    ((value * 10.0) + 1e-9).floor() / 10.0
}

/// Clamp without panicking on inverted bounds.
fn bound(value: f64, min: f64, max: f64) -> f64 {
    value.max(min).min(max)
}

/// Sum of allocation weights.
pub fn total_weight(allocations: &[Allocation]) -> f64 {
    allocations.iter().map(|a| a.weight).sum()
}

/// Seed weights: each candidate's suggested weight clamped to the position bounds.
pub fn initial_weights(candidates: &[Candidate], config: &ConstructionConfig) -> Vec<Allocation> {
    candidates
        .iter()
        .map(|c| {
            let weight = bound(
                c.suggested_weight,
                config.min_position_pct,
                config.max_position_pct,
            );
            Allocation::from_candidate(c, weight)
        })
        .collect()
}

/// Aggregate weight per sector.
pub fn sector_weights(allocations: &[Allocation]) -> HashMap<SectorKey, f64> {
    let mut weights: HashMap<SectorKey, f64> = HashMap::new();
    for allocation in allocations {
        *weights.entry(allocation.sector.clone()).or_insert(0.0) += allocation.weight;
    }
    weights
}

/// Shrink every sector above `max_sector_pct` proportionally onto the cap.
///
/// Single pass. Sectors at or under the cap are left alone and nothing is
/// re-inflated to make up the shortfall.
pub fn apply_sector_caps(allocations: &[Allocation], max_sector_pct: f64) -> Vec<Allocation> {
    let totals = sector_weights(allocations);

    allocations
        .iter()
        .map(|a| {
            let sector_total = totals.get(&a.sector).copied().unwrap_or(0.0);
            if sector_total > max_sector_pct && sector_total > 0.0 {
                a.with_weight(a.weight * (max_sector_pct / sector_total))
            } else {
                a.clone()
            }
        })
        .collect()
}

/// Rescale all weights by one factor so they sum to `target_total`.
///
/// Weights are rounded to one decimal. A zero total is returned unchanged.
pub fn normalize_weights(allocations: &[Allocation], target_total: f64) -> Vec<Allocation> {
    let current = total_weight(allocations);
    if current <= 0.0 {
        return allocations.to_vec();
    }

    let factor = target_total / current;
    allocations
        .iter()
        .map(|a| a.with_weight(round1(a.weight * factor)))
        .collect()
}

/// Clamp every weight into `[min_position_pct, max_position_pct]`.
pub fn clamp_weights(allocations: &[Allocation], config: &ConstructionConfig) -> Vec<Allocation> {
    allocations
        .iter()
        .map(|a| {
            a.with_weight(bound(
                a.weight,
                config.min_position_pct,
                config.max_position_pct,
            ))
        })
        .collect()
}

/// Take any overshoot of `target_total` out of the room each position has
/// above `min_position_pct`, rounding down to one decimal.
///
/// Totals at or under the target are returned unchanged. Only shrinks, so
/// position maxima and sector caps that held before still hold.
pub fn trim_to_target(
    allocations: &[Allocation],
    target_total: f64,
    min_position_pct: f64,
) -> Vec<Allocation> {
    let excess = total_weight(allocations) - target_total;
    if excess <= 1e-9 {
        return allocations.to_vec();
    }

    let room: f64 = allocations
        .iter()
        .map(|a| (a.weight - min_position_pct).max(0.0))
        .sum();
    if room <= 0.0 {
        return allocations.to_vec();
    }

    let share = (excess / room).min(1.0);
    debug!(excess, room, "Trimming weight overshoot");

    allocations
        .iter()
        .map(|a| {
            let above = (a.weight - min_position_pct).max(0.0);
            a.with_weight(floor1(a.weight - above * share))
        })
        .collect()
}

/// Largest per-position weight change between two equally ordered sets.
fn max_weight_delta(before: &[Allocation], after: &[Allocation]) -> f64 {
    before
        .iter()
        .zip(after)
        .map(|(a, b)| (a.weight - b.weight).abs())
        .fold(0.0, f64::max)
}

/// Run the sector/normalize/clamp sequence selected by the configuration.
pub fn balance_weights(seed: &[Allocation], config: &ConstructionConfig) -> Vec<Allocation> {
    let target = config.target_total_weight();

    match config.normalization {
        NormalizationMode::TwoPass => {
            let capped = apply_sector_caps(seed, config.max_sector_pct);
            let first = normalize_weights(&capped, target);
            let bounded = clamp_weights(&first, config);
            let second = normalize_weights(&bounded, target);
            let fitted = trim_to_target(&second, target, config.min_position_pct);

            debug!(
                after_caps = total_weight(&capped),
                after_first = total_weight(&first),
                after_clamp = total_weight(&bounded),
                after_second = total_weight(&second),
                after_trim = total_weight(&fitted),
                "Two-pass normalization complete"
            );
            fitted
        }
        NormalizationMode::Converge {
            max_iterations,
            tolerance,
        } => {
            let mut current = seed.to_vec();
            let mut converged = false;
            let mut iterations = 0;

            while iterations < max_iterations {
                iterations += 1;
                let capped = apply_sector_caps(&current, config.max_sector_pct);
                let normalized = normalize_weights(&capped, target);
                let bounded = clamp_weights(&normalized, config);
                let next = apply_sector_caps(&bounded, config.max_sector_pct);

                let delta = max_weight_delta(&current, &next);
                current = next;
                if delta <= tolerance {
                    converged = true;
                    break;
                }
            }

            debug!(
                iterations,
                converged,
                total = total_weight(&current),
                "Iterative normalization complete"
            );

            trim_to_target(&current, target, config.min_position_pct)
                .iter()
                .map(|a| a.with_weight(floor1(a.weight)))
                .collect()
        }
    }
}
