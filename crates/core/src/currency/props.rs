//! Property-based tests for currency conversion.
//!
//! - Banker's rounding never leaves more digits than the target allows
//! - Same-currency conversion is the identity

use outlay_shared::types::Currency;
use proptest::prelude::*;
use rust_decimal::Decimal;

use super::conversion::{CurrencyConverter, convert_amount};
use super::exchange::{ExchangeRate, RateTable};

/// Strategy to generate positive decimal amounts (0.01 to 1,000,000.00).
fn positive_amount() -> impl Strategy<Value = Decimal> {
    (1i64..100_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy to generate positive exchange rates (0.0001 to 10000.0000).
fn positive_rate() -> impl Strategy<Value = Decimal> {
    (1i64..100_000_000i64).prop_map(|v| Decimal::new(v, 4))
}

fn any_currency() -> impl Strategy<Value = Currency> {
    prop::sample::select(Currency::ALL.to_vec())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Rounded result never carries more digits than requested.
    #[test]
    fn prop_rounding_respects_decimal_places(
        amount in positive_amount(),
        rate in positive_rate(),
        places in 0u32..=4,
    ) {
        let result = convert_amount(amount, rate, places);
        prop_assert!(result.is_some_and(|r| r.scale() <= places));
    }

    /// Rounding moves the exact product by at most half a minor unit.
    #[test]
    fn prop_rounding_error_is_bounded(
        amount in positive_amount(),
        rate in positive_rate(),
    ) {
        let exact = amount * rate;
        let rounded = convert_amount(amount, rate, 2);
        prop_assert!(rounded.is_some_and(|r| (exact - r).abs() <= Decimal::new(5, 3)));
    }

    /// Converting within one currency never consults the rate table.
    #[test]
    fn prop_same_currency_identity(
        amount in positive_amount(),
        currency in any_currency(),
    ) {
        let table = RateTable::new();
        prop_assert_eq!(table.convert(amount, currency, currency), Some(amount));
    }

    /// A direct rate produces the same result as `convert_amount`.
    #[test]
    fn prop_table_matches_convert_amount(
        amount in positive_amount(),
        rate in positive_rate(),
    ) {
        let date = chrono::NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let table: RateTable = [ExchangeRate::new(Currency::Usd, Currency::Inr, rate, date)]
            .into_iter()
            .collect();
        prop_assert_eq!(
            table.convert(amount, Currency::Usd, Currency::Inr),
            convert_amount(amount, rate, 2)
        );
    }
}
