//! Price data boundary.
//!
//! The engine never talks to a market-data service directly. Callers plug a
//! [`QuoteProvider`] into a [`PriceFetcher`], which batches lookups with
//! bounded concurrency and optional caching, throttling and timeouts.

pub mod cache;
pub mod fetcher;
pub mod provider;
pub mod rate_limiter;

pub use cache::{CacheStats, QuoteCache};
pub use fetcher::{fetch_prices, PriceFetchResult, PriceFetcher, QuoteSettings, DEFAULT_MAX_CONCURRENCY};
pub use provider::{ProviderError, QuoteProvider, StaticQuoteProvider};
pub use rate_limiter::RateLimiter;
