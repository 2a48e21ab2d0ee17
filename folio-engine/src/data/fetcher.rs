//! Batch price retrieval.
//!
//! Issues one lookup per unique ticker against a [`QuoteProvider`], at most
//! `max_concurrency` in flight. A failed lookup becomes an entry in the
//! error list and never aborts the batch.

use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use folio_common::{Config, MAX_CACHE_TTL_SECS};

use super::cache::QuoteCache;
use super::provider::{ProviderError, QuoteProvider};
use super::rate_limiter::RateLimiter;

/// Lookups in flight when nothing is configured.
pub const DEFAULT_MAX_CONCURRENCY: usize = 8;

/// Tuning for a [`PriceFetcher`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteSettings {
    pub max_concurrency: usize,
    /// Per-lookup timeout; `None` waits as long as the provider takes
    pub request_timeout_secs: Option<u64>,
    /// Quote cache TTL, at most [`MAX_CACHE_TTL_SECS`]; `None` disables caching
    pub cache_ttl_secs: Option<i64>,
    /// Request budget; `None` disables throttling
    pub requests_per_minute: Option<u32>,
}

impl Default for QuoteSettings {
    fn default() -> Self {
        Self {
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            request_timeout_secs: None,
            cache_ttl_secs: None,
            requests_per_minute: None,
        }
    }
}

impl QuoteSettings {
    /// Build from the `quotes` config section, defaulting absent values.
    pub fn from_config(config: &Config) -> Self {
        let defaults = Self::default();
        let Some(quotes) = config.quotes.as_ref() else {
            return defaults;
        };

        Self {
            max_concurrency: quotes
                .max_concurrency
                .filter(|n| *n > 0)
                .unwrap_or(defaults.max_concurrency),
            request_timeout_secs: quotes.request_timeout_secs.filter(|s| *s > 0),
            cache_ttl_secs: quotes
                .cache_ttl_secs
                .filter(|s| *s > 0)
                .map(|s| s.min(MAX_CACHE_TTL_SECS)),
            requests_per_minute: quotes.requests_per_minute.filter(|n| *n > 0),
        }
    }
}

/// Prices that resolved plus one error line per ticker that did not.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceFetchResult {
    pub prices: HashMap<String, f64>,
    /// Entries formatted as `"TICKER: error"`
    pub errors: Vec<String>,
}

impl PriceFetchResult {
    /// Whether every requested ticker resolved.
    pub fn is_complete(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn price(&self, ticker: &str) -> Option<f64> {
        self.prices.get(ticker).copied()
    }
}

/// Concurrent quote fetcher over a single provider.
pub struct PriceFetcher {
    provider: Arc<dyn QuoteProvider>,
    settings: QuoteSettings,
    cache: Option<QuoteCache>,
    rate_limiter: Option<RateLimiter>,
}

impl PriceFetcher {
    /// Create a fetcher with default settings.
    pub fn new(provider: Arc<dyn QuoteProvider>) -> Self {
        Self::with_settings(provider, QuoteSettings::default())
    }

    /// Create a fetcher with explicit settings.
    pub fn with_settings(provider: Arc<dyn QuoteProvider>, settings: QuoteSettings) -> Self {
        let cache = settings
            .cache_ttl_secs
            .filter(|s| *s > 0)
            .map(|s| QuoteCache::with_ttl(s.min(MAX_CACHE_TTL_SECS)));
        let rate_limiter = settings
            .requests_per_minute
            .map(|rpm| RateLimiter::new(provider.name(), rpm));

        Self {
            provider,
            settings,
            cache,
            rate_limiter,
        }
    }

    /// Create a fetcher from the loaded config.
    pub fn from_config(provider: Arc<dyn QuoteProvider>, config: &Config) -> Self {
        Self::with_settings(provider, QuoteSettings::from_config(config))
    }

    pub fn settings(&self) -> &QuoteSettings {
        &self.settings
    }

    pub fn cache(&self) -> Option<&QuoteCache> {
        self.cache.as_ref()
    }

    /// Fetch prices for a batch of tickers.
    ///
    /// Duplicate tickers are looked up once. Results keep the order of first
    /// appearance in `tickers` for the error list. Expired cache entries are
    /// evicted before the batch starts.
    pub async fn fetch_prices<S: AsRef<str>>(&self, tickers: &[S]) -> PriceFetchResult {
        if let Some(cache) = &self.cache {
            cache.clear_expired();
        }

        let mut seen = HashSet::new();
        let unique: Vec<&str> = tickers
            .iter()
            .map(AsRef::as_ref)
            .filter(|t| seen.insert(*t))
            .collect();

        let concurrency = self.settings.max_concurrency.max(1);
        let outcomes: Vec<(&str, Result<f64, ProviderError>)> = stream::iter(unique)
            .map(|ticker| async move { (ticker, self.fetch_one(ticker).await) })
            .buffered(concurrency)
            .collect()
            .await;

        let mut result = PriceFetchResult::default();
        for (ticker, outcome) in outcomes {
            match outcome {
                Ok(price) => {
                    result.prices.insert(ticker.to_string(), price);
                }
                Err(e) => {
                    warn!(ticker, provider = self.provider.name(), error = %e, "Quote lookup failed");
                    result.errors.push(format!("{}: {}", ticker, e));
                }
            }
        }

        info!(
            provider = self.provider.name(),
            resolved = result.prices.len(),
            failed = result.errors.len(),
            "Fetched prices"
        );

        result
    }

    async fn fetch_one(&self, ticker: &str) -> Result<f64, ProviderError> {
        if let Some(price) = self.cache.as_ref().and_then(|c| c.get(ticker)) {
            debug!(ticker, price, "Quote cache hit");
            return Ok(price);
        }

        if let Some(limiter) = &self.rate_limiter {
            limiter.acquire().await;
        }

        let price = match self.settings.request_timeout_secs {
            Some(secs) => {
                tokio::time::timeout(Duration::from_secs(secs), self.provider.get_price(ticker))
                    .await
                    .map_err(|_| ProviderError::Timeout {
                        ticker: ticker.to_string(),
                        secs,
                    })??
            }
            None => self.provider.get_price(ticker).await?,
        };

        if !price.is_finite() || price <= 0.0 {
            return Err(ProviderError::InvalidPrice {
                ticker: ticker.to_string(),
                price,
            });
        }

        if let Some(cache) = &self.cache {
            cache.set(ticker, price);
        }

        Ok(price)
    }
}

/// Fetch prices with default settings.
pub async fn fetch_prices<S: AsRef<str>>(
    provider: Arc<dyn QuoteProvider>,
    tickers: &[S],
) -> PriceFetchResult {
    PriceFetcher::new(provider).fetch_prices(tickers).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::provider::StaticQuoteProvider;
    use async_trait::async_trait;
    use folio_common::QuotesConfig;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingProvider {
        inner: StaticQuoteProvider,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl QuoteProvider for CountingProvider {
        fn name(&self) -> &'static str {
            "counting"
        }

        async fn get_price(&self, ticker: &str) -> Result<f64, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.get_price(ticker).await
        }
    }

    struct SlowProvider;

    #[async_trait]
    impl QuoteProvider for SlowProvider {
        fn name(&self) -> &'static str {
            "slow"
        }

        async fn get_price(&self, _ticker: &str) -> Result<f64, ProviderError> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(1.0)
        }
    }

    fn counting(prices: &[(&str, f64)]) -> Arc<CountingProvider> {
        Arc::new(CountingProvider {
            inner: StaticQuoteProvider::from_prices(prices.iter().copied()),
            calls: AtomicUsize::new(0),
        })
    }

    #[tokio::test]
    async fn test_partial_failure_isolated() {
        let provider = Arc::new(StaticQuoteProvider::from_prices([
            ("AAPL", 150.0),
            ("MSFT", 300.0),
        ]));
        let result = PriceFetcher::new(provider)
            .fetch_prices(&["AAPL", "ZZZZ", "MSFT"])
            .await;

        assert_eq!(result.prices.len(), 2);
        assert_eq!(result.price("AAPL"), Some(150.0));
        assert_eq!(result.errors, vec!["ZZZZ: No quote for ZZZZ".to_string()]);
        assert!(!result.is_complete());
    }

    #[tokio::test]
    async fn test_duplicates_fetched_once() {
        let provider = counting(&[("AAPL", 150.0)]);
        let fetcher = PriceFetcher::new(provider.clone());
        let result = fetcher.fetch_prices(&["AAPL", "AAPL", "AAPL"]).await;

        assert_eq!(result.prices.len(), 1);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_non_positive_price_is_error() {
        let provider = Arc::new(StaticQuoteProvider::from_prices([("BAD", 0.0)]));
        let result = fetch_prices(provider, &["BAD"]).await;

        assert!(result.prices.is_empty());
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].starts_with("BAD: "));
    }

    #[tokio::test]
    async fn test_cache_skips_provider() {
        let provider = counting(&[("AAPL", 150.0)]);
        let settings = QuoteSettings {
            cache_ttl_secs: Some(60),
            ..QuoteSettings::default()
        };
        let fetcher = PriceFetcher::with_settings(provider.clone(), settings);

        fetcher.fetch_prices(&["AAPL"]).await;
        let second = fetcher.fetch_prices(&["AAPL"]).await;

        assert_eq!(second.price("AAPL"), Some(150.0));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_expired_entries_evicted_per_batch() {
        let provider = counting(&[("AAPL", 150.0)]);
        let settings = QuoteSettings {
            cache_ttl_secs: Some(60),
            ..QuoteSettings::default()
        };
        let fetcher = PriceFetcher::with_settings(provider, settings);
        let cache = fetcher.cache().unwrap();
        cache.set_with_ttl("OLD", 1.0, -1);
        cache.set_with_ttl("STALE", 2.0, -1);
        assert_eq!(cache.stats().total_entries, 2);

        fetcher.fetch_prices(&["AAPL"]).await;

        let stats = cache.stats();
        assert_eq!(stats.total_entries, 1);
        assert_eq!(stats.expired_entries, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_becomes_error() {
        let settings = QuoteSettings {
            request_timeout_secs: Some(1),
            ..QuoteSettings::default()
        };
        let fetcher = PriceFetcher::with_settings(Arc::new(SlowProvider), settings);
        let result = fetcher.fetch_prices(&["AAPL"]).await;

        assert!(result.prices.is_empty());
        assert_eq!(result.errors, vec!["AAPL: Quote for AAPL timed out after 1s".to_string()]);
    }

    #[test]
    fn test_settings_from_config() {
        let config = Config {
            quotes: Some(QuotesConfig {
                max_concurrency: Some(4),
                request_timeout_secs: Some(10),
                cache_ttl_secs: None,
                requests_per_minute: Some(0),
            }),
            ..Config::default()
        };

        let settings = QuoteSettings::from_config(&config);
        assert_eq!(settings.max_concurrency, 4);
        assert_eq!(settings.request_timeout_secs, Some(10));
        assert_eq!(settings.cache_ttl_secs, None);
        assert_eq!(settings.requests_per_minute, None);

        assert_eq!(QuoteSettings::from_config(&Config::default()), QuoteSettings::default());
    }

    #[tokio::test]
    async fn test_oversized_cache_ttl_clamped() {
        let config = Config {
            quotes: Some(QuotesConfig {
                cache_ttl_secs: Some(i64::MAX),
                ..QuotesConfig::default()
            }),
            ..Config::default()
        };
        assert_eq!(
            QuoteSettings::from_config(&config).cache_ttl_secs,
            Some(MAX_CACHE_TTL_SECS)
        );

        let settings = QuoteSettings {
            cache_ttl_secs: Some(i64::MAX),
            ..QuoteSettings::default()
        };
        let fetcher = PriceFetcher::with_settings(counting(&[("AAPL", 150.0)]), settings);
        let result = fetcher.fetch_prices(&["AAPL"]).await;
        assert_eq!(result.price("AAPL"), Some(150.0));
        assert_eq!(fetcher.cache().unwrap().get("AAPL"), Some(150.0));
    }
}
