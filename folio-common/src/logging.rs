//! Logging utilities for the Folio engine.
//!
//! Provides structured JSON or pretty logging through `tracing-subscriber`.
//!
//! # Noise Filtering
//!
//! Noisy library modules are pinned to `warn` unless `RUST_LOG` overrides
//! the filter.

use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use crate::config::ObservabilityConfig;

/// Default noisy modules that should be filtered to warn level.
pub const NOISY_MODULES: &[&str] = &["tokio"];

/// Build the filter directive string for a base level plus exclusions.
fn build_directives(log_level: &str, excluded_targets: &[String]) -> String {
    let mut directives = String::from(log_level);

    for module in NOISY_MODULES {
        directives.push_str(&format!(",{}=warn", module));
    }

    for target in excluded_targets {
        directives.push_str(&format!(",{}=warn", target));
    }

    directives
}

/// Initialize logging with the given level and format.
///
/// # Arguments
///
/// * `log_level` - Base log level (trace, debug, info, warn, error)
/// * `log_format` - "json" for structured JSON, anything else for human-readable
///
/// Safe to call more than once; later calls are ignored.
pub fn init_logging(log_level: &str, log_format: &str) {
    init_logging_with_exclusions(log_level, log_format, &[]);
}

/// Initialize logging from an [`ObservabilityConfig`].
pub fn init_from_config(config: &ObservabilityConfig) {
    init_logging_with_exclusions(&config.log_level, &config.log_format, &config.excluded_targets);
}

/// Initialize logging with custom excluded targets.
pub fn init_logging_with_exclusions(log_level: &str, log_format: &str, excluded_targets: &[String]) {
    let directives = build_directives(log_level, excluded_targets);
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&directives));

    let subscriber = tracing_subscriber::registry().with(filter);

    if log_format == "json" {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_span_events(FmtSpan::CLOSE)
            .with_current_span(true)
            .with_target(true)
            .with_file(true)
            .with_line_number(true);
        let _ = subscriber.with(fmt_layer).try_init();
    } else {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_ansi(true)
            .with_target(true)
            .with_file(false)
            .with_line_number(false);
        let _ = subscriber.with(fmt_layer).try_init();
    }

    tracing::info!(
        log_level = %log_level,
        log_format = %log_format,
        noise_filtered = NOISY_MODULES.len() + excluded_targets.len(),
        "Logging initialized"
    );
}

/// Generate a new run ID for tagging a construction or rebalance run.
pub fn generate_run_id() -> String {
    uuid::Uuid::new_v4().to_string()[..8].to_string()
}
