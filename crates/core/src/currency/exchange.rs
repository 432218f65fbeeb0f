//! Exchange rate types and an in-memory rate table.

use std::collections::HashMap;

use chrono::NaiveDate;
use outlay_shared::types::Currency;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::conversion::CurrencyConverter;

/// Exchange rate between two currencies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeRate {
    /// Source currency.
    pub from_currency: Currency,
    /// Target currency.
    pub to_currency: Currency,
    /// Exchange rate (1 from_currency = rate to_currency).
    pub rate: Decimal,
    /// Date this rate is effective.
    pub effective_date: NaiveDate,
}

impl ExchangeRate {
    /// Creates a new exchange rate.
    #[must_use]
    pub const fn new(
        from_currency: Currency,
        to_currency: Currency,
        rate: Decimal,
        effective_date: NaiveDate,
    ) -> Self {
        Self {
            from_currency,
            to_currency,
            rate,
            effective_date,
        }
    }

    /// Returns the inverse rate, or `None` for a zero rate.
    #[must_use]
    pub fn inverse(&self) -> Option<Self> {
        if self.rate.is_zero() {
            return None;
        }
        Some(Self {
            from_currency: self.to_currency,
            to_currency: self.from_currency,
            rate: Decimal::ONE / self.rate,
            effective_date: self.effective_date,
        })
    }
}

/// Rates already fetched by the surrounding system, keyed by currency pair.
///
/// When only the opposite direction is known the inverse is used. A newer
/// rate for a pair replaces an older one.
#[derive(Debug, Clone, Default)]
pub struct RateTable {
    rates: HashMap<(Currency, Currency), ExchangeRate>,
}

impl RateTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a rate, keeping whichever of old and new is more recent.
    pub fn insert(&mut self, rate: ExchangeRate) {
        let key = (rate.from_currency, rate.to_currency);
        match self.rates.get(&key) {
            Some(existing) if existing.effective_date > rate.effective_date => {}
            _ => {
                self.rates.insert(key, rate);
            }
        }
    }

    /// Number of pairs with a direct rate.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rates.len()
    }

    /// Returns true when no rates are loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}

impl FromIterator<ExchangeRate> for RateTable {
    fn from_iter<I: IntoIterator<Item = ExchangeRate>>(iter: I) -> Self {
        let mut table = Self::new();
        for rate in iter {
            table.insert(rate);
        }
        table
    }
}

impl CurrencyConverter for RateTable {
    fn rate(&self, from: Currency, to: Currency) -> Option<Decimal> {
        if let Some(direct) = self.rates.get(&(from, to)) {
            return Some(direct.rate);
        }
        self.rates
            .get(&(to, from))
            .and_then(ExchangeRate::inverse)
            .map(|r| r.rate)
    }
}
