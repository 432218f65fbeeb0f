//! Workflow error types for the expense approval lifecycle.
//!
//! Every variant belongs to one [`ErrorKind`], which is what the request
//! layer uses to pick a response.

use outlay_shared::AppError;
use outlay_shared::types::{ApprovalRuleId, CompanyId, ExpenseId, UserId};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::workflow::approval::UserRole;
use crate::workflow::types::ExpenseStatus;

/// Broad category of a workflow error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed input.
    Validation,
    /// Decision submitted by someone other than the current approver.
    Authorization,
    /// Operation not allowed in the expense's current state.
    InvalidState,
    /// Company configuration cannot produce an approver.
    Configuration,
    /// Referenced entity does not exist.
    NotFound,
    /// Storage or other internal failure.
    Internal,
}

/// Errors that can occur during workflow operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowError {
    /// Amount is negative, too large, or too precise to store.
    #[error("Invalid expense amount {amount}: {reason}")]
    InvalidAmount {
        /// The rejected amount.
        amount: Decimal,
        /// What is wrong with it.
        reason: &'static str,
    },

    /// Currency code is not supported.
    #[error("Unknown currency: {0}")]
    UnknownCurrency(String),

    /// Employee is not attached to a company yet.
    #[error("User {0} does not belong to a company")]
    EmployeeWithoutCompany(UserId),

    /// Approval rule definition is inconsistent.
    #[error("Invalid approval rule: {0}")]
    InvalidRule(String),

    /// Manager assignment would create a loop in the hierarchy.
    #[error("Assigning manager {manager_id} to user {user_id} would create a reporting cycle")]
    ManagerCycle {
        /// The user being updated.
        user_id: UserId,
        /// The proposed manager.
        manager_id: UserId,
    },

    /// Decision submitted by someone who is not the current approver.
    #[error("User {user_id} is not the current approver of expense {expense_id}")]
    NotCurrentApprover {
        /// The expense.
        expense_id: ExpenseId,
        /// The user who attempted the decision.
        user_id: UserId,
    },

    /// Decision on an expense that is not awaiting approval.
    #[error("Expense {expense_id} is {status}, not in_progress")]
    NotInProgress {
        /// The expense.
        expense_id: ExpenseId,
        /// Its current status.
        status: ExpenseStatus,
    },

    /// Workflow already started for this expense.
    #[error("Approval workflow for expense {expense_id} was already initiated (status {status})")]
    AlreadyInitiated {
        /// The expense.
        expense_id: ExpenseId,
        /// Its current status.
        status: ExpenseStatus,
    },

    /// No single pending approval exists for the current step.
    #[error("Expense {expense_id} has no pending approval at step {step}")]
    NoPendingApproval {
        /// The expense.
        expense_id: ExpenseId,
        /// The expense's current progression index.
        step: i32,
    },

    /// A rule step names a role nobody in the company holds.
    #[error(
        "Expense {expense_id} is stalled: step {step_number} of approval rule {rule_id} \
         needs a {role} but the company has none"
    )]
    ApproverUnresolved {
        /// The stalled expense.
        expense_id: ExpenseId,
        /// The rule.
        rule_id: ApprovalRuleId,
        /// Declared step number.
        step_number: i32,
        /// The role that could not be resolved.
        role: UserRole,
    },

    /// Rule matched but neither manager approval nor any step applies.
    #[error("Expense {expense_id} is stalled: approval rule {rule_id} yields no approver")]
    NoApproverAvailable {
        /// The stalled expense.
        expense_id: ExpenseId,
        /// The rule.
        rule_id: ApprovalRuleId,
    },

    /// Rule recorded on an in-progress expense no longer exists.
    #[error("Approval rule {0} not found")]
    RuleNotFound(ApprovalRuleId),

    /// Expense not found.
    #[error("Expense {0} not found")]
    ExpenseNotFound(ExpenseId),

    /// User not found.
    #[error("User {0} not found")]
    UserNotFound(UserId),

    /// Company not found.
    #[error("Company {0} not found")]
    CompanyNotFound(CompanyId),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

impl WorkflowError {
    /// Returns the category of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidAmount { .. }
            | Self::UnknownCurrency(_)
            | Self::EmployeeWithoutCompany(_)
            | Self::InvalidRule(_)
            | Self::ManagerCycle { .. } => ErrorKind::Validation,

            Self::NotCurrentApprover { .. } => ErrorKind::Authorization,

            Self::NotInProgress { .. }
            | Self::AlreadyInitiated { .. }
            | Self::NoPendingApproval { .. } => ErrorKind::InvalidState,

            Self::ApproverUnresolved { .. }
            | Self::NoApproverAvailable { .. }
            | Self::RuleNotFound(_) => ErrorKind::Configuration,

            Self::ExpenseNotFound(_) | Self::UserNotFound(_) | Self::CompanyNotFound(_) => {
                ErrorKind::NotFound
            }

            Self::Database(_) => ErrorKind::Internal,
        }
    }

    /// The expense left `in_progress` without an approver, for the two
    /// errors reporting a stalled workflow.
    #[must_use]
    pub fn stalled_expense(&self) -> Option<ExpenseId> {
        match self {
            Self::ApproverUnresolved { expense_id, .. }
            | Self::NoApproverAvailable { expense_id, .. } => Some(*expense_id),
            _ => None,
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self.kind() {
            ErrorKind::Validation => 400,
            ErrorKind::Authorization => 403,
            ErrorKind::NotFound => 404,
            ErrorKind::InvalidState => 409,
            ErrorKind::Configuration => 422,
            ErrorKind::Internal => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidAmount { .. } => "INVALID_AMOUNT",
            Self::UnknownCurrency(_) => "UNKNOWN_CURRENCY",
            Self::EmployeeWithoutCompany(_) => "EMPLOYEE_WITHOUT_COMPANY",
            Self::InvalidRule(_) => "INVALID_APPROVAL_RULE",
            Self::ManagerCycle { .. } => "MANAGER_CYCLE",
            Self::NotCurrentApprover { .. } => "NOT_CURRENT_APPROVER",
            Self::NotInProgress { .. } => "EXPENSE_NOT_IN_PROGRESS",
            Self::AlreadyInitiated { .. } => "WORKFLOW_ALREADY_INITIATED",
            Self::NoPendingApproval { .. } => "NO_PENDING_APPROVAL",
            Self::ApproverUnresolved { .. } => "APPROVER_UNRESOLVED",
            Self::NoApproverAvailable { .. } => "NO_APPROVER_AVAILABLE",
            Self::RuleNotFound(_) => "APPROVAL_RULE_NOT_FOUND",
            Self::ExpenseNotFound(_) => "EXPENSE_NOT_FOUND",
            Self::UserNotFound(_) => "USER_NOT_FOUND",
            Self::CompanyNotFound(_) => "COMPANY_NOT_FOUND",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }
}

impl From<WorkflowError> for AppError {
    fn from(err: WorkflowError) -> Self {
        let message = err.to_string();
        match err.kind() {
            ErrorKind::Validation => Self::Validation(message),
            ErrorKind::Authorization => Self::Forbidden(message),
            ErrorKind::InvalidState => Self::InvalidState(message),
            ErrorKind::Configuration => Self::Configuration(message),
            ErrorKind::NotFound => Self::NotFound(message),
            ErrorKind::Internal => Self::Database(message),
        }
    }
}
