//! Turning submitted expense data into a pending expense.

use chrono::{DateTime, NaiveDate, Utc};
use outlay_shared::types::{Currency, ExpenseId, UserId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::currency::CurrencyConverter;
use crate::workflow::error::WorkflowError;
use crate::workflow::types::{Company, Expense, ExpenseStatus, MANAGER_STEP, UserProfile};

/// Decimal places an amount column can hold.
pub const MAX_AMOUNT_SCALE: u32 = 4;

/// Integer digits an amount column can hold.
pub const MAX_AMOUNT_INTEGER_DIGITS: u32 = 15;

/// Checks that `amount` is non-negative and fits a `NUMERIC(19, 4)` column.
fn check_amount(amount: Decimal) -> Result<(), WorkflowError> {
    let invalid = |reason| Err(WorkflowError::InvalidAmount { amount, reason });
    if amount.is_sign_negative() && !amount.is_zero() {
        return invalid("amounts must not be negative");
    }
    if amount.normalize().scale() > MAX_AMOUNT_SCALE {
        return invalid("at most 4 decimal places are allowed");
    }
    let limit = Decimal::from(10_u64.pow(MAX_AMOUNT_INTEGER_DIGITS));
    if amount >= limit {
        return invalid("at most 15 integer digits are allowed");
    }
    Ok(())
}

/// Expense data as submitted by an employee or read off a receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewExpense {
    /// The filing employee.
    pub employee_id: UserId,
    /// Amount in `currency`.
    pub amount: Decimal,
    /// ISO currency code as entered.
    pub currency: String,
    /// Receipt date.
    pub expense_date: NaiveDate,
    /// Merchant name, if known.
    pub merchant: Option<String>,
    /// Free-text description.
    pub description: String,
}

/// Validates submissions and builds pending expenses.
pub struct ExpenseIntake;

impl ExpenseIntake {
    /// Builds a `pending` expense for `employee` in `company`.
    ///
    /// `converted_amount` is left unset when `converter` has no rate from the
    /// expense currency to the company currency; rule matching then falls
    /// back to the raw amount.
    ///
    /// # Errors
    ///
    /// - `InvalidAmount` for a negative amount, or one with more than 15
    ///   integer digits or 4 decimal places, before or after conversion
    /// - `UnknownCurrency` for an unsupported currency code
    /// - `EmployeeWithoutCompany` when the employee has no company yet
    /// - `CompanyNotFound` when `company` is not the employee's company
    pub fn prepare<C: CurrencyConverter + ?Sized>(
        input: &NewExpense,
        employee: &UserProfile,
        company: &Company,
        converter: &C,
        now: DateTime<Utc>,
    ) -> Result<Expense, WorkflowError> {
        check_amount(input.amount)?;
        let currency: Currency = input
            .currency
            .parse()
            .map_err(|_| WorkflowError::UnknownCurrency(input.currency.clone()))?;

        let company_id = employee
            .company_id
            .ok_or(WorkflowError::EmployeeWithoutCompany(employee.id))?;
        if company_id != company.id {
            return Err(WorkflowError::CompanyNotFound(company_id));
        }

        let converted_amount = converter.convert(input.amount, currency, company.currency);
        if let Some(converted) = converted_amount {
            check_amount(converted).map_err(|_| WorkflowError::InvalidAmount {
                amount: input.amount,
                reason: "the converted amount is too large",
            })?;
        } else {
            warn!(
                from = %currency,
                to = %company.currency,
                "No exchange rate available, matching rules on raw amount"
            );
        }

        Ok(Expense {
            id: ExpenseId::new(),
            company_id,
            employee_id: employee.id,
            amount: input.amount,
            currency,
            converted_amount,
            expense_date: input.expense_date,
            merchant: input
                .merchant
                .as_deref()
                .map(str::trim)
                .filter(|m| !m.is_empty())
                .map(str::to_string),
            description: input.description.trim().to_string(),
            status: ExpenseStatus::Pending,
            approval_rule_id: None,
            current_approver: None,
            current_step: MANAGER_STEP,
            current_rule_step: None,
            created_at: now,
            updated_at: now,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::currency::{ExchangeRate, RateTable};
    use crate::workflow::approval::UserRole;
    use outlay_shared::types::CompanyId;
    use rust_decimal_macros::dec;

    fn company(currency: Currency) -> Company {
        Company {
            id: CompanyId::new(),
            name: "Acme".to_string(),
            currency,
            admin_id: None,
        }
    }

    fn employee(company_id: Option<CompanyId>) -> UserProfile {
        UserProfile {
            id: UserId::new(),
            company_id,
            role: UserRole::Employee,
            manager_id: None,
        }
    }

    fn input(employee_id: UserId, amount: Decimal, currency: &str) -> NewExpense {
        NewExpense {
            employee_id,
            amount,
            currency: currency.to_string(),
            expense_date: NaiveDate::from_ymd_opt(2026, 10, 1).unwrap(),
            merchant: Some("  Cafe Nero ".to_string()),
            description: "Team lunch".to_string(),
        }
    }

    fn eur_to_usd() -> RateTable {
        [ExchangeRate::new(
            Currency::Eur,
            Currency::Usd,
            dec!(1.10),
            NaiveDate::from_ymd_opt(2026, 10, 1).unwrap(),
        )]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_prepare_converts_to_company_currency() {
        let company = company(Currency::Usd);
        let employee = employee(Some(company.id));
        let expense = ExpenseIntake::prepare(
            &input(employee.id, dec!(100), "eur"),
            &employee,
            &company,
            &eur_to_usd(),
            Utc::now(),
        )
        .unwrap();

        assert_eq!(expense.status, ExpenseStatus::Pending);
        assert_eq!(expense.currency, Currency::Eur);
        assert_eq!(expense.converted_amount, Some(dec!(110.00)));
        assert_eq!(expense.comparison_amount(), dec!(110.00));
        assert_eq!(expense.merchant.as_deref(), Some("Cafe Nero"));
        assert_eq!(expense.current_approver, None);
        assert_eq!(expense.current_step, MANAGER_STEP);
    }

    #[test]
    fn test_prepare_without_rate_keeps_raw_amount() {
        let company = company(Currency::Usd);
        let employee = employee(Some(company.id));
        let expense = ExpenseIntake::prepare(
            &input(employee.id, dec!(5000), "INR"),
            &employee,
            &company,
            &RateTable::new(),
            Utc::now(),
        )
        .unwrap();

        assert_eq!(expense.converted_amount, None);
        assert_eq!(expense.comparison_amount(), dec!(5000));
    }

    #[test]
    fn test_prepare_allows_zero_amount() {
        let company = company(Currency::Usd);
        let employee = employee(Some(company.id));
        let expense = ExpenseIntake::prepare(
            &input(employee.id, Decimal::ZERO, "USD"),
            &employee,
            &company,
            &RateTable::new(),
            Utc::now(),
        )
        .unwrap();
        assert_eq!(expense.converted_amount, Some(Decimal::ZERO));
    }

    #[test]
    fn test_prepare_rejects_negative_amount() {
        let company = company(Currency::Usd);
        let employee = employee(Some(company.id));
        let result = ExpenseIntake::prepare(
            &input(employee.id, dec!(-1), "USD"),
            &employee,
            &company,
            &RateTable::new(),
            Utc::now(),
        );
        assert_eq!(
            result,
            Err(WorkflowError::InvalidAmount {
                amount: dec!(-1),
                reason: "amounts must not be negative",
            })
        );
    }

    #[test]
    fn test_prepare_rejects_amount_beyond_column_range() {
        let company = company(Currency::Usd);
        let employee = employee(Some(company.id));
        for amount in [Decimal::MAX, dec!(1000000000000000)] {
            let result = ExpenseIntake::prepare(
                &input(employee.id, amount, "USD"),
                &employee,
                &company,
                &RateTable::new(),
                Utc::now(),
            );
            assert!(matches!(result, Err(WorkflowError::InvalidAmount { .. })));
        }

        let largest = ExpenseIntake::prepare(
            &input(employee.id, dec!(999999999999999.9999), "USD"),
            &employee,
            &company,
            &RateTable::new(),
            Utc::now(),
        );
        assert!(largest.is_ok());
    }

    #[test]
    fn test_prepare_rejects_excess_decimal_places() {
        let company = company(Currency::Usd);
        let employee = employee(Some(company.id));
        let result = ExpenseIntake::prepare(
            &input(employee.id, dec!(12.34567), "USD"),
            &employee,
            &company,
            &RateTable::new(),
            Utc::now(),
        );
        assert!(matches!(result, Err(WorkflowError::InvalidAmount { .. })));

        // Trailing zeros do not count.
        let result = ExpenseIntake::prepare(
            &input(employee.id, dec!(12.340000), "USD"),
            &employee,
            &company,
            &RateTable::new(),
            Utc::now(),
        );
        assert!(result.is_ok());
    }

    #[test]
    fn test_prepare_rejects_huge_amount_without_panicking_on_conversion() {
        let company = company(Currency::Inr);
        let employee = employee(Some(company.id));
        let usd_to_inr: RateTable = [ExchangeRate::new(
            Currency::Usd,
            Currency::Inr,
            dec!(83),
            NaiveDate::from_ymd_opt(2026, 10, 1).unwrap(),
        )]
        .into_iter()
        .collect();

        let result = ExpenseIntake::prepare(
            &input(employee.id, Decimal::MAX, "USD"),
            &employee,
            &company,
            &usd_to_inr,
            Utc::now(),
        );
        assert!(matches!(result, Err(WorkflowError::InvalidAmount { .. })));

        // Fits before conversion, overflows the column after it.
        let result = ExpenseIntake::prepare(
            &input(employee.id, dec!(100000000000000), "USD"),
            &employee,
            &company,
            &usd_to_inr,
            Utc::now(),
        );
        assert_eq!(
            result,
            Err(WorkflowError::InvalidAmount {
                amount: dec!(100000000000000),
                reason: "the converted amount is too large",
            })
        );
    }

    #[test]
    fn test_prepare_rejects_unknown_currency() {
        let company = company(Currency::Usd);
        let employee = employee(Some(company.id));
        let result = ExpenseIntake::prepare(
            &input(employee.id, dec!(10), "XYZ"),
            &employee,
            &company,
            &RateTable::new(),
            Utc::now(),
        );
        assert_eq!(result, Err(WorkflowError::UnknownCurrency("XYZ".into())));
    }

    #[test]
    fn test_prepare_requires_company() {
        let company = company(Currency::Usd);
        let employee = employee(None);
        let result = ExpenseIntake::prepare(
            &input(employee.id, dec!(10), "USD"),
            &employee,
            &company,
            &RateTable::new(),
            Utc::now(),
        );
        assert_eq!(result, Err(WorkflowError::EmployeeWithoutCompany(employee.id)));
    }
}
