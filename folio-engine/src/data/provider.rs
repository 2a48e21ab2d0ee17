//! Quote provider abstraction.
//!
//! Defines the `QuoteProvider` trait implemented by market-data wrappers
//! living outside the engine, plus an in-memory provider.

use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::sync::RwLock;

// ============================================================================
// Provider Error
// ============================================================================

/// Errors returned by quote providers.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderError {
    /// Network error (connection failed, reset)
    Network(String),
    /// Rate limit exceeded
    RateLimited { retry_after_secs: Option<u64> },
    /// No quote exists for the ticker
    NotFound(String),
    /// The provider returned an unusable price
    InvalidPrice { ticker: String, price: f64 },
    /// The lookup did not finish in time
    Timeout { ticker: String, secs: u64 },
    /// Provider is temporarily unavailable
    Unavailable(String),
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network(msg) => write!(f, "Network error: {}", msg),
            Self::RateLimited { retry_after_secs } => {
                write!(f, "Rate limited")?;
                if let Some(secs) = retry_after_secs {
                    write!(f, ", retry after {} seconds", secs)?;
                }
                Ok(())
            }
            Self::NotFound(ticker) => write!(f, "No quote for {}", ticker),
            Self::InvalidPrice { ticker, price } => {
                write!(f, "Invalid price {} for {}", price, ticker)
            }
            Self::Timeout { ticker, secs } => {
                write!(f, "Quote for {} timed out after {}s", ticker, secs)
            }
            Self::Unavailable(msg) => write!(f, "Provider unavailable: {}", msg),
        }
    }
}

impl std::error::Error for ProviderError {}

impl ProviderError {
    /// Check if the error is transient (a caller-side retry may succeed).
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Network(_) | Self::RateLimited { .. } | Self::Timeout { .. } | Self::Unavailable(_)
        )
    }
}

impl From<ProviderError> for folio_common::Error {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::Timeout { .. } => Self::Timeout,
            other => Self::External(other.to_string()),
        }
    }
}

// ============================================================================
// Quote Provider Trait
// ============================================================================

/// Source of current prices.
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    /// Provider name for logging (e.g. "static", "yahoo")
    fn name(&self) -> &'static str;

    /// Fetch the latest price for one ticker.
    async fn get_price(&self, ticker: &str) -> Result<f64, ProviderError>;
}

// ============================================================================
// Static Provider
// ============================================================================

/// In-memory quote provider.
///
/// Serves prices from a fixed table; tickers not in the table fail with
/// [`ProviderError::NotFound`].
#[derive(Debug, Default)]
pub struct StaticQuoteProvider {
    prices: RwLock<HashMap<String, f64>>,
}

impl StaticQuoteProvider {
    /// Create an empty provider.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create from a price table.
    pub fn from_prices<I, S>(prices: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        Self {
            prices: RwLock::new(prices.into_iter().map(|(t, p)| (t.into(), p)).collect()),
        }
    }

    /// Set or replace a price.
    pub fn set_price(&self, ticker: impl Into<String>, price: f64) {
        if let Ok(mut prices) = self.prices.write() {
            prices.insert(ticker.into(), price);
        }
    }
}

#[async_trait]
impl QuoteProvider for StaticQuoteProvider {
    fn name(&self) -> &'static str {
        "static"
    }

    async fn get_price(&self, ticker: &str) -> Result<f64, ProviderError> {
        let prices = self
            .prices
            .read()
            .map_err(|_| ProviderError::Unavailable("price table poisoned".into()))?;
        prices
            .get(ticker)
            .copied()
            .ok_or_else(|| ProviderError::NotFound(ticker.to_string()))
    }
}
