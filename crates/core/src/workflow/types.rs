//! Workflow domain types for the expense approval lifecycle.
//!
//! This module defines the expense and its approval trail, the statuses
//! they move through, and the `Transition` value produced by every
//! workflow operation.

use chrono::{DateTime, NaiveDate, Utc};
use outlay_shared::types::{
    ApprovalRuleId, CompanyId, Currency, ExpenseApprovalId, ExpenseId, UserId,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::workflow::approval::UserRole;
use crate::workflow::error::WorkflowError;

/// Expense progression index used for the implicit manager approval.
///
/// Rule steps start at progression index 1, whatever `step_number` the rule
/// itself declares for its first step.
pub const MANAGER_STEP: i32 = 0;

/// Expense status in the approval workflow.
///
/// The valid transitions are:
/// - Pending → InProgress (initiate, a rule matched)
/// - Pending → Approved (initiate, no rule matched)
/// - InProgress → Approved (last step approved)
/// - InProgress → Rejected (any step rejected)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpenseStatus {
    /// Created, workflow not started yet.
    Pending,
    /// Waiting on one or more approvers.
    InProgress,
    /// Fully approved (terminal).
    Approved,
    /// Rejected at some step (terminal).
    Rejected,
}

impl ExpenseStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    /// Parses a status from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "in_progress" => Some(Self::InProgress),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }

    /// Returns true if no further transition is possible.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Approved | Self::Rejected)
    }

    /// Checks if a status transition is valid.
    #[must_use]
    pub fn can_transition_to(self, to: Self) -> bool {
        matches!(
            (self, to),
            (Self::Pending, Self::InProgress | Self::Approved)
                | (Self::InProgress, Self::Approved | Self::Rejected)
        )
    }
}

impl fmt::Display for ExpenseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status of a single approval record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalStatus {
    /// Awaiting the approver's decision.
    Pending,
    /// Approver signed off.
    Approved,
    /// Approver turned the expense down.
    Rejected,
}

impl ApprovalStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    /// Parses a status from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }
}

impl fmt::Display for ApprovalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An approver's verdict on the step they are blocking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    /// Sign off and move on.
    Approve,
    /// Stop the whole expense.
    Reject,
}

impl Decision {
    /// Approval record status this decision produces.
    #[must_use]
    pub fn approval_status(self) -> ApprovalStatus {
        match self {
            Self::Approve => ApprovalStatus::Approved,
            Self::Reject => ApprovalStatus::Rejected,
        }
    }
}

/// A decision submitted by a user on an expense.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecisionRequest {
    /// The user submitting the decision.
    pub approver_id: UserId,
    /// Approve or reject.
    pub decision: Decision,
    /// Optional free-text note stored on the approval record.
    pub comment: Option<String>,
}

/// A company as seen by the workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    /// Company ID.
    pub id: CompanyId,
    /// Display name.
    pub name: String,
    /// Base currency that approval thresholds are expressed in.
    pub currency: Currency,
    /// The designated administrator.
    pub admin_id: Option<UserId>,
}

/// The parts of a user the workflow needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// User ID.
    pub id: UserId,
    /// Company the user belongs to; unset while onboarding.
    pub company_id: Option<CompanyId>,
    /// Role inside the company.
    pub role: UserRole,
    /// Direct manager, if any.
    pub manager_id: Option<UserId>,
}

/// An expense and its position in the approval workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expense {
    /// Expense ID.
    pub id: ExpenseId,
    /// Company the expense is filed under.
    pub company_id: CompanyId,
    /// Employee who filed it.
    pub employee_id: UserId,
    /// Amount as entered.
    pub amount: Decimal,
    /// Currency of `amount`.
    pub currency: Currency,
    /// Amount in the company's base currency, when a rate was available.
    pub converted_amount: Option<Decimal>,
    /// Date printed on the receipt.
    pub expense_date: NaiveDate,
    /// Merchant printed on the receipt.
    pub merchant: Option<String>,
    /// Free-text description.
    pub description: String,
    /// Lifecycle status.
    pub status: ExpenseStatus,
    /// Rule matched at initiation; later steps are read from it.
    pub approval_rule_id: Option<ApprovalRuleId>,
    /// The user whose decision currently blocks the expense.
    pub current_approver: Option<UserId>,
    /// Progression index: `0` = manager step, `1..` = consulted rule steps.
    pub current_step: i32,
    /// Declared `step_number` of the rule step behind `current_step`.
    ///
    /// Kept separately because the progression index and the rule's own
    /// numbering diverge whenever a rule does not number its steps `1, 2, ..`.
    pub current_rule_step: Option<i32>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

impl Expense {
    /// Amount compared against rule bounds: converted if known, raw otherwise.
    #[must_use]
    pub fn comparison_amount(&self) -> Decimal {
        self.converted_amount.unwrap_or(self.amount)
    }

    /// Returns true while the expense is on the implicit manager step.
    #[must_use]
    pub fn is_on_manager_step(&self) -> bool {
        self.current_step == MANAGER_STEP && self.current_rule_step.is_none()
    }
}

/// One entry in an expense's append-only approval trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseApproval {
    /// Record ID.
    pub id: ExpenseApprovalId,
    /// Owning expense.
    pub expense_id: ExpenseId,
    /// The user asked to decide.
    pub approver_id: UserId,
    /// Expense progression index (not the rule's declared step number).
    pub step_number: i32,
    /// Pending until decided, then approved or rejected for good.
    pub status: ApprovalStatus,
    /// Note left by the approver.
    pub comment: Option<String>,
    /// When the decision was made.
    pub decided_at: Option<DateTime<Utc>>,
    /// When the request was created.
    pub created_at: DateTime<Utc>,
}

impl ExpenseApproval {
    /// Creates a pending approval request.
    #[must_use]
    pub fn pending(
        expense_id: ExpenseId,
        approver_id: UserId,
        step_number: i32,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: ExpenseApprovalId::new(),
            expense_id,
            approver_id,
            step_number,
            status: ApprovalStatus::Pending,
            comment: None,
            decided_at: None,
            created_at: now,
        }
    }
}

/// An approval request waiting on a given approver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingApproval {
    /// The expense being approved.
    pub expense: Expense,
    /// The pending record for the current step.
    pub approval: ExpenseApproval,
}

/// What a workflow operation did to an expense.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionOutcome {
    /// No rule matched; approved without any approver.
    AutoApproved,
    /// A new approval request was issued.
    AwaitingApproval {
        /// The approver now blocking the expense.
        approver_id: UserId,
        /// Progression index of the new request.
        step: i32,
    },
    /// The final step was approved.
    Approved,
    /// A step was rejected.
    Rejected,
    /// The chain could not produce the next approver.
    ///
    /// The expense stays `in_progress` with nobody assigned and needs manual
    /// intervention.
    Stalled(WorkflowError),
}

/// The complete, all-or-nothing effect of one workflow operation.
///
/// Nothing is written while computing it; the caller persists every part
/// together or none of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    /// The expense after the operation.
    pub expense: Expense,
    /// The pending record that was decided, with its final status.
    pub decided: Option<ExpenseApproval>,
    /// The approval request that was issued.
    pub created: Option<ExpenseApproval>,
    /// Summary of what happened.
    pub outcome: TransitionOutcome,
}

impl Transition {
    /// The configuration error that stalled the workflow, if any.
    #[must_use]
    pub fn stall_reason(&self) -> Option<&WorkflowError> {
        match &self.outcome {
            TransitionOutcome::Stalled(reason) => Some(reason),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_as_str() {
        assert_eq!(ExpenseStatus::Pending.as_str(), "pending");
        assert_eq!(ExpenseStatus::InProgress.as_str(), "in_progress");
        assert_eq!(ExpenseStatus::Approved.as_str(), "approved");
        assert_eq!(ExpenseStatus::Rejected.as_str(), "rejected");
    }

    #[test]
    fn test_status_parse() {
        assert_eq!(
            ExpenseStatus::parse("IN_PROGRESS"),
            Some(ExpenseStatus::InProgress)
        );
        assert_eq!(ExpenseStatus::parse("approved"), Some(ExpenseStatus::Approved));
        assert_eq!(ExpenseStatus::parse("draft"), None);
        assert_eq!(ApprovalStatus::parse("Rejected"), Some(ApprovalStatus::Rejected));
        assert_eq!(ApprovalStatus::parse("in_progress"), None);
    }

    #[test]
    fn test_status_terminal() {
        assert!(!ExpenseStatus::Pending.is_terminal());
        assert!(!ExpenseStatus::InProgress.is_terminal());
        assert!(ExpenseStatus::Approved.is_terminal());
        assert!(ExpenseStatus::Rejected.is_terminal());
    }

    #[test]
    fn test_valid_transitions() {
        use ExpenseStatus::{Approved, InProgress, Pending, Rejected};

        assert!(Pending.can_transition_to(InProgress));
        assert!(Pending.can_transition_to(Approved));
        assert!(InProgress.can_transition_to(Approved));
        assert!(InProgress.can_transition_to(Rejected));

        assert!(!Pending.can_transition_to(Rejected));
        assert!(!Approved.can_transition_to(Rejected));
        assert!(!Rejected.can_transition_to(InProgress));
        assert!(!InProgress.can_transition_to(Pending));
    }

    #[test]
    fn test_decision_maps_to_status() {
        assert_eq!(Decision::Approve.approval_status(), ApprovalStatus::Approved);
        assert_eq!(Decision::Reject.approval_status(), ApprovalStatus::Rejected);
    }

    #[test]
    fn test_display() {
        assert_eq!(ExpenseStatus::InProgress.to_string(), "in_progress");
        assert_eq!(ApprovalStatus::Pending.to_string(), "pending");
    }
}
