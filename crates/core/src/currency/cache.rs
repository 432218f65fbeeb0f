//! Exchange rate caching using Moka.
//!
//! Rates change slowly, so a looked-up rate is reused for a while instead of
//! asking the underlying source again for every expense.

use std::time::Duration;

use moka::sync::Cache;
use outlay_shared::types::Currency;
use rust_decimal::Decimal;

use super::conversion::CurrencyConverter;

/// Default cache capacity (number of currency pairs).
const DEFAULT_CACHE_CAPACITY: u64 = 256;

/// Default time-to-live for cached rates (1 hour).
const DEFAULT_TTL_SECS: u64 = 3600;

/// Wraps a converter and remembers the rates it returns.
///
/// Only successful lookups are cached; an unknown pair is asked again next
/// time. Thread-safe and suitable for concurrent access.
#[derive(Clone)]
pub struct CachedConverter<C> {
    inner: C,
    cache: Cache<(Currency, Currency), Decimal>,
}

impl<C: CurrencyConverter> CachedConverter<C> {
    /// Creates a cache with default settings (256 pairs, 1 hour TTL).
    #[must_use]
    pub fn new(inner: C) -> Self {
        Self::with_config(inner, DEFAULT_CACHE_CAPACITY, DEFAULT_TTL_SECS)
    }

    /// Creates a cache with custom capacity and time-to-live.
    #[must_use]
    pub fn with_config(inner: C, max_capacity: u64, ttl_secs: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_capacity)
            .time_to_live(Duration::from_secs(ttl_secs))
            .build();

        Self { inner, cache }
    }

    /// Drops every cached rate.
    pub fn invalidate_all(&self) {
        self.cache.invalidate_all();
    }

    /// Returns the wrapped converter.
    pub fn inner(&self) -> &C {
        &self.inner
    }
}

impl<C: CurrencyConverter> CurrencyConverter for CachedConverter<C> {
    fn rate(&self, from: Currency, to: Currency) -> Option<Decimal> {
        if let Some(rate) = self.cache.get(&(from, to)) {
            return Some(rate);
        }
        let rate = self.inner.rate(from, to)?;
        self.cache.insert((from, to), rate);
        Some(rate)
    }
}
