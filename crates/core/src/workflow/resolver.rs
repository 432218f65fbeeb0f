//! Approver resolution for rule steps.
//!
//! A step either names a fixed user or a role. Roles are resolved through a
//! table of resolver functions keyed by [`UserRole`], consulted once when the
//! step becomes current.

use std::collections::HashMap;

use outlay_shared::types::{ApprovalRuleId, ExpenseId, UserId};
use serde::{Deserialize, Serialize};

use crate::workflow::approval::{ApprovalStep, ApproverRef, UserRole};
use crate::workflow::error::WorkflowError;

/// A company member eligible for role-based resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryEntry {
    /// User ID.
    pub user_id: UserId,
    /// The member's role.
    pub role: UserRole,
}

/// The members of one company, in lookup precedence order.
///
/// "First user with a role" means first in this order; the database layer
/// lists members newest first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyDirectory {
    members: Vec<DirectoryEntry>,
}

impl CompanyDirectory {
    /// Builds a directory from members in precedence order.
    #[must_use]
    pub fn new(members: Vec<DirectoryEntry>) -> Self {
        Self { members }
    }

    /// First member holding `role`.
    #[must_use]
    pub fn first_with_role(&self, role: UserRole) -> Option<UserId> {
        self.members
            .iter()
            .find(|m| m.role == role)
            .map(|m| m.user_id)
    }

    /// All members holding `role`, in precedence order.
    pub fn with_role(&self, role: UserRole) -> impl Iterator<Item = UserId> + '_ {
        self.members
            .iter()
            .filter(move |m| m.role == role)
            .map(|m| m.user_id)
    }

    /// Number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Returns true when the company has no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Resolver function for one role.
pub type ResolveFn = fn(&CompanyDirectory) -> Option<UserId>;

/// Dispatch table from role to resolver function.
#[derive(Debug, Clone)]
pub struct ApproverResolver {
    table: HashMap<UserRole, ResolveFn>,
}

impl Default for ApproverResolver {
    fn default() -> Self {
        let mut table: HashMap<UserRole, ResolveFn> = HashMap::with_capacity(UserRole::ALL.len());
        table.insert(UserRole::Admin, |d| d.first_with_role(UserRole::Admin));
        table.insert(UserRole::Manager, |d| d.first_with_role(UserRole::Manager));
        table.insert(UserRole::Employee, |d| d.first_with_role(UserRole::Employee));
        Self { table }
    }
}

impl ApproverResolver {
    /// Replaces the resolver for `role`.
    #[must_use]
    pub fn with_resolver(mut self, role: UserRole, resolve: ResolveFn) -> Self {
        self.table.insert(role, resolve);
        self
    }

    /// Resolves a role to a user, or None when nobody qualifies.
    #[must_use]
    pub fn resolve_role(&self, role: UserRole, directory: &CompanyDirectory) -> Option<UserId> {
        self.table.get(&role).and_then(|resolve| resolve(directory))
    }
}

/// Everything needed to turn a rule step into a concrete approver.
#[derive(Debug, Clone, Copy)]
pub struct Approvers<'a> {
    /// Role dispatch table.
    pub resolver: &'a ApproverResolver,
    /// Members of the expense's company.
    pub directory: &'a CompanyDirectory,
}

impl<'a> Approvers<'a> {
    /// Pairs a resolver with a company directory.
    #[must_use]
    pub const fn new(resolver: &'a ApproverResolver, directory: &'a CompanyDirectory) -> Self {
        Self {
            resolver,
            directory,
        }
    }

    /// Resolves the approver of `step` of rule `rule_id` for `expense_id`.
    ///
    /// # Errors
    ///
    /// Returns `WorkflowError::ApproverUnresolved` when the step names a role
    /// nobody in the company holds.
    pub fn resolve_step(
        &self,
        expense_id: ExpenseId,
        rule_id: ApprovalRuleId,
        step: &ApprovalStep,
    ) -> Result<UserId, WorkflowError> {
        match step.approver {
            ApproverRef::User(user_id) => Ok(user_id),
            ApproverRef::Role(role) => self
                .resolver
                .resolve_role(role, self.directory)
                .ok_or(WorkflowError::ApproverUnresolved {
                    expense_id,
                    rule_id,
                    step_number: step.step_number,
                    role,
                }),
        }
    }
}
