//! Expense approval workflow for Outlay.
//!
//! This module implements the expense lifecycle state machine, the
//! approval rules engine and approver resolution.
//!
//! # Modules
//!
//! - `types` - Workflow domain types (Expense, ExpenseApproval, Transition)
//! - `error` - Workflow-specific error types
//! - `approval` - Approval rules engine
//! - `resolver` - Role-based approver resolution
//! - `hierarchy` - Manager assignment checks
//! - `intake` - Validation of submitted expenses
//! - `service` - Initiation and decision transitions

pub mod approval;
pub mod error;
pub mod hierarchy;
pub mod intake;
pub mod resolver;
pub mod service;
pub mod types;

#[cfg(test)]
mod approval_props;
#[cfg(test)]
mod service_props;

pub use approval::{ApprovalEngine, ApprovalRule, ApprovalStep, ApproverRef, UserRole};
pub use error::{ErrorKind, WorkflowError};
pub use hierarchy::ManagerHierarchy;
pub use intake::{ExpenseIntake, NewExpense};
pub use resolver::{ApproverResolver, Approvers, CompanyDirectory, DirectoryEntry};
pub use service::WorkflowService;
pub use types::{
    ApprovalStatus, Company, Decision, DecisionRequest, Expense, ExpenseApproval, ExpenseStatus,
    MANAGER_STEP, PendingApproval, Transition, TransitionOutcome, UserProfile,
};
