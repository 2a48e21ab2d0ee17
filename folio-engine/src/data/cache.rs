//! Quote cache.
//!
//! In-memory price cache with TTL so repeated batches do not hit the
//! provider for every ticker.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::RwLock;

/// Cache entry with TTL
#[derive(Debug, Clone)]
struct CacheEntry {
    price: f64,
    /// `None` when the expiry is past the representable range
    expires_at: Option<DateTime<Utc>>,
}

impl CacheEntry {
    fn new(price: f64, ttl_secs: i64) -> Self {
        let now = Utc::now();
        let expires_at = Duration::try_seconds(ttl_secs)
            .and_then(|ttl| now.checked_add_signed(ttl))
            .or_else(|| (ttl_secs < 0).then_some(DateTime::<Utc>::MIN_UTC));
        Self { price, expires_at }
    }

    fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| Utc::now() > at)
    }
}

/// Price cache keyed by ticker.
pub struct QuoteCache {
    prices: RwLock<HashMap<String, CacheEntry>>,
    ttl_secs: i64,
}

impl QuoteCache {
    /// Create a cache with a one-minute TTL.
    pub fn new() -> Self {
        Self::with_ttl(60)
    }

    /// Create with custom TTL
    pub fn with_ttl(ttl_secs: i64) -> Self {
        Self {
            prices: RwLock::new(HashMap::new()),
            ttl_secs,
        }
    }

    /// Get a cached price if not expired.
    pub fn get(&self, ticker: &str) -> Option<f64> {
        let cache = self.prices.read().ok()?;
        cache
            .get(ticker)
            .filter(|entry| !entry.is_expired())
            .map(|entry| entry.price)
    }

    /// Cache a price.
    pub fn set(&self, ticker: &str, price: f64) {
        self.set_with_ttl(ticker, price, self.ttl_secs);
    }

    /// Cache a price with a custom TTL.
    pub fn set_with_ttl(&self, ticker: &str, price: f64, ttl_secs: i64) {
        if let Ok(mut cache) = self.prices.write() {
            cache.insert(ticker.to_string(), CacheEntry::new(price, ttl_secs));
        }
    }

    /// Clear all expired entries
    pub fn clear_expired(&self) {
        if let Ok(mut cache) = self.prices.write() {
            cache.retain(|_, entry| !entry.is_expired());
        }
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        let (total, expired) = self
            .prices
            .read()
            .map(|c| (c.len(), c.values().filter(|e| e.is_expired()).count()))
            .unwrap_or((0, 0));

        CacheStats {
            total_entries: total,
            expired_entries: expired,
            active_entries: total - expired,
        }
    }
}

impl Default for QuoteCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Cache statistics
#[derive(Debug, Clone)]
pub struct CacheStats {
    pub total_entries: usize,
    pub expired_entries: usize,
    pub active_entries: usize,
}
