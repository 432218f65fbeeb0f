//! Currency conversion for expense amounts.
//!
//! Expenses are filed in any supported currency and matched against approval
//! rules in the company's base currency. Rates are supplied by the caller;
//! nothing in here talks to the network.

pub mod cache;
pub mod conversion;
pub mod exchange;

#[cfg(test)]
mod props;

pub use cache::CachedConverter;
pub use conversion::{CurrencyConverter, convert_amount};
pub use exchange::{ExchangeRate, RateTable};
