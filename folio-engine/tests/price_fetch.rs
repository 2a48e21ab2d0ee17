//! Price fetching against mock providers.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use folio_engine::data::{ProviderError, PriceFetcher, QuoteProvider, QuoteSettings};

/// Fails for tickers starting with "ERR", prices the rest at their length.
struct FlakyProvider;

#[async_trait]
impl QuoteProvider for FlakyProvider {
    fn name(&self) -> &'static str {
        "flaky"
    }

    async fn get_price(&self, ticker: &str) -> Result<f64, ProviderError> {
        if ticker.starts_with("ERR") {
            return Err(ProviderError::Network("connection reset".into()));
        }
        Ok(ticker.len() as f64)
    }
}

/// Records the peak number of lookups in flight.
struct TrackingProvider {
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl TrackingProvider {
    fn new() -> Self {
        Self {
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl QuoteProvider for TrackingProvider {
    fn name(&self) -> &'static str {
        "tracking"
    }

    async fn get_price(&self, _ticker: &str) -> Result<f64, ProviderError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(20)).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(10.0)
    }
}

#[tokio::test]
async fn test_failures_do_not_abort_batch() {
    let fetcher = PriceFetcher::new(Arc::new(FlakyProvider));
    let result = fetcher
        .fetch_prices(&["AAPL", "ERR1", "MSFT", "ERR2", "GOOGL"])
        .await;

    assert_eq!(result.prices.len(), 3);
    assert_eq!(result.price("GOOGL"), Some(5.0));
    assert_eq!(
        result.errors,
        vec![
            "ERR1: Network error: connection reset".to_string(),
            "ERR2: Network error: connection reset".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_empty_batch() {
    let result = PriceFetcher::new(Arc::new(FlakyProvider))
        .fetch_prices::<&str>(&[])
        .await;
    assert!(result.prices.is_empty());
    assert!(result.is_complete());
}

#[tokio::test(start_paused = true)]
async fn test_concurrency_is_capped() {
    let provider = Arc::new(TrackingProvider::new());
    let settings = QuoteSettings {
        max_concurrency: 3,
        ..QuoteSettings::default()
    };
    let fetcher = PriceFetcher::with_settings(provider.clone(), settings);

    let tickers: Vec<String> = (0..10).map(|i| format!("T{}", i)).collect();
    let result = fetcher.fetch_prices(&tickers).await;

    assert_eq!(result.prices.len(), 10);
    let peak = provider.peak.load(Ordering::SeqCst);
    assert!(peak <= 3, "peak in flight was {}", peak);
    assert!(peak > 1, "lookups never overlapped");
}

#[tokio::test]
async fn test_rate_limited_batch_completes() {
    let settings = QuoteSettings {
        requests_per_minute: Some(6_000),
        ..QuoteSettings::default()
    };
    let fetcher = PriceFetcher::with_settings(Arc::new(FlakyProvider), settings);

    let tickers: Vec<String> = (0..5).map(|i| format!("T{}", i)).collect();
    let result = fetcher.fetch_prices(&tickers).await;
    assert_eq!(result.prices.len(), 5);
}
