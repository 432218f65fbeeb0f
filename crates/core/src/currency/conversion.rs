//! Currency conversion logic.
//!
//! CRITICAL: Rounding strategy for multi-currency:
//! - Always round to the target currency's decimal places
//! - Use banker's rounding (round half to even)
//! - Store both original and converted amounts

use outlay_shared::types::Currency;
use rust_decimal::Decimal;
use rust_decimal::RoundingStrategy;

/// Converts an amount using the given exchange rate.
///
/// Uses banker's rounding (round half to even) to minimize cumulative errors.
/// Returns `None` when the product does not fit in a `Decimal`.
#[must_use]
pub fn convert_amount(amount: Decimal, rate: Decimal, decimal_places: u32) -> Option<Decimal> {
    amount
        .checked_mul(rate)
        .map(|converted| {
            converted.round_dp_with_strategy(decimal_places, RoundingStrategy::MidpointNearestEven)
        })
}

/// Source of exchange rates used to express expenses in a company's currency.
///
/// Implementors only provide [`CurrencyConverter::rate`]; conversion and
/// rounding are shared.
pub trait CurrencyConverter {
    /// Rate such that `1 from = rate to`, or `None` when the pair is unknown.
    fn rate(&self, from: Currency, to: Currency) -> Option<Decimal>;

    /// Converts `amount` from one currency to another.
    ///
    /// Same-currency conversion returns the amount untouched. `None` means no
    /// rate is available or the result overflows; callers then fall back to
    /// the unconverted amount.
    fn convert(&self, amount: Decimal, from: Currency, to: Currency) -> Option<Decimal> {
        if from == to {
            return Some(amount);
        }
        let rate = self.rate(from, to)?;
        convert_amount(amount, rate, to.decimal_places())
    }
}
