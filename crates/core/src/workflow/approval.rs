//! Approval rules engine for expense authorization.
//!
//! This module holds the company-configured approval rules and selects
//! the single rule that governs an expense of a given amount.

use std::cmp::Reverse;
use std::collections::HashSet;
use std::fmt;

use outlay_shared::types::{ApprovalRuleId, ApprovalStepId, CompanyId, UserId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::workflow::error::WorkflowError;

/// User role inside a company.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Runs the company account.
    Admin,
    /// Leads a team and usually approves its spend.
    Manager,
    /// Files expenses.
    Employee,
}

impl UserRole {
    /// All roles.
    pub const ALL: [Self; 3] = [Self::Admin, Self::Manager, Self::Employee];

    /// Parse a role from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "admin" => Some(Self::Admin),
            "manager" => Some(Self::Manager),
            "employee" => Some(Self::Employee),
            _ => None,
        }
    }

    /// Returns the string representation of the role.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Manager => "manager",
            Self::Employee => "employee",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who signs off on a rule step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "value")]
pub enum ApproverRef {
    /// A fixed user.
    User(UserId),
    /// Whoever holds this role, looked up when the step is reached.
    Role(UserRole),
}

/// One ordered link in a rule's approver chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalStep {
    /// Step ID.
    pub id: ApprovalStepId,
    /// Declared position in the chain (ascending).
    pub step_number: i32,
    /// The approver for this step.
    pub approver: ApproverRef,
}

/// A company-scoped policy selecting who must sign off on an expense.
///
/// Rules are gated by an inclusive amount range; an unset bound is open.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalRule {
    /// Unique identifier for the rule.
    pub id: ApprovalRuleId,
    /// Owning company.
    pub company_id: CompanyId,
    /// Human-readable name for the rule.
    pub name: String,
    /// Minimum amount for this rule to apply (inclusive, None = no minimum).
    pub min_amount: Option<Decimal>,
    /// Maximum amount for this rule to apply (inclusive, None = no maximum).
    pub max_amount: Option<Decimal>,
    /// Inactive rules are never matched.
    pub is_active: bool,
    /// Insert the employee's direct manager before the configured steps.
    pub is_manager_approver: bool,
    /// Configured steps, in any order.
    pub steps: Vec<ApprovalStep>,
}

impl ApprovalRule {
    /// Returns true if `amount` falls inside the rule's range.
    #[must_use]
    pub fn contains(&self, amount: Decimal) -> bool {
        let above_min = self.min_amount.is_none_or(|min| amount >= min);
        let below_max = self.max_amount.is_none_or(|max| amount <= max);
        above_min && below_max
    }

    /// The step with the lowest declared number.
    #[must_use]
    pub fn first_step(&self) -> Option<&ApprovalStep> {
        self.steps.iter().min_by_key(|s| s.step_number)
    }

    /// The step with the smallest declared number greater than `step_number`.
    #[must_use]
    pub fn step_after(&self, step_number: i32) -> Option<&ApprovalStep> {
        self.steps
            .iter()
            .filter(|s| s.step_number > step_number)
            .min_by_key(|s| s.step_number)
    }

    /// Checks the rule for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns `WorkflowError::InvalidRule` when a bound is negative, the
    /// minimum exceeds the maximum, or step numbers are not positive and
    /// unique.
    pub fn validate(&self) -> Result<(), WorkflowError> {
        if self.name.trim().is_empty() {
            return Err(WorkflowError::InvalidRule("name is required".to_string()));
        }
        if let Some(min) = self.min_amount
            && min.is_sign_negative()
            && !min.is_zero()
        {
            return Err(WorkflowError::InvalidRule(format!(
                "min_amount {min} is negative"
            )));
        }
        if let Some(max) = self.max_amount
            && max.is_sign_negative()
            && !max.is_zero()
        {
            return Err(WorkflowError::InvalidRule(format!(
                "max_amount {max} is negative"
            )));
        }
        if let (Some(min), Some(max)) = (self.min_amount, self.max_amount)
            && min > max
        {
            return Err(WorkflowError::InvalidRule(format!(
                "min_amount {min} exceeds max_amount {max}"
            )));
        }

        let mut seen = HashSet::with_capacity(self.steps.len());
        for step in &self.steps {
            if step.step_number < 1 {
                return Err(WorkflowError::InvalidRule(format!(
                    "step_number {} must be at least 1",
                    step.step_number
                )));
            }
            if !seen.insert(step.step_number) {
                return Err(WorkflowError::InvalidRule(format!(
                    "step_number {} is used twice",
                    step.step_number
                )));
            }
        }
        Ok(())
    }
}

/// Stateless engine for evaluating approval rules.
pub struct ApprovalEngine;

impl ApprovalEngine {
    /// Select the rule that governs an expense of `amount` in `company_id`.
    ///
    /// Active rules of the company are scanned by `min_amount` descending,
    /// rules without a minimum last; the first whose range contains the
    /// amount wins. Rules with equal minimums keep their input order.
    ///
    /// # Returns
    /// The matching rule, or None when no approval is required.
    #[must_use]
    pub fn find_rule(
        rules: &[ApprovalRule],
        company_id: CompanyId,
        amount: Decimal,
    ) -> Option<&ApprovalRule> {
        let mut candidates: Vec<_> = rules
            .iter()
            .filter(|r| r.company_id == company_id && r.is_active)
            .collect();

        // None sorts below every Some, so reversing puts open minimums last.
        candidates.sort_by_key(|r| Reverse(r.min_amount));
        candidates.into_iter().find(|r| r.contains(amount))
    }
}
