//! Conversions between database models and workflow types.

use chrono::Utc;
use outlay_core::workflow::{
    ApprovalRule, ApprovalStep, ApproverRef, Company, Expense, ExpenseApproval, UserProfile,
    WorkflowError, approval as core_approval, types as core_types,
};
use outlay_shared::types::{
    ApprovalRuleId, ApprovalStepId, CompanyId, Currency, ExpenseApprovalId, ExpenseId, UserId,
};
use sea_orm::{DbErr, Set};

use crate::entities::{
    approval_rules, approval_steps, companies, expense_approvals, expenses,
    sea_orm_active_enums::{ApprovalStatus, ExpenseStatus, UserRole},
    users,
};

/// Wraps a `SeaORM` error.
pub(crate) fn db_err(err: DbErr) -> WorkflowError {
    WorkflowError::Database(err.to_string())
}

impl From<UserRole> for core_approval::UserRole {
    fn from(role: UserRole) -> Self {
        match role {
            UserRole::Admin => Self::Admin,
            UserRole::Manager => Self::Manager,
            UserRole::Employee => Self::Employee,
        }
    }
}

impl From<core_approval::UserRole> for UserRole {
    fn from(role: core_approval::UserRole) -> Self {
        match role {
            core_approval::UserRole::Admin => Self::Admin,
            core_approval::UserRole::Manager => Self::Manager,
            core_approval::UserRole::Employee => Self::Employee,
        }
    }
}

impl From<ExpenseStatus> for core_types::ExpenseStatus {
    fn from(status: ExpenseStatus) -> Self {
        match status {
            ExpenseStatus::Pending => Self::Pending,
            ExpenseStatus::InProgress => Self::InProgress,
            ExpenseStatus::Approved => Self::Approved,
            ExpenseStatus::Rejected => Self::Rejected,
        }
    }
}

impl From<core_types::ExpenseStatus> for ExpenseStatus {
    fn from(status: core_types::ExpenseStatus) -> Self {
        match status {
            core_types::ExpenseStatus::Pending => Self::Pending,
            core_types::ExpenseStatus::InProgress => Self::InProgress,
            core_types::ExpenseStatus::Approved => Self::Approved,
            core_types::ExpenseStatus::Rejected => Self::Rejected,
        }
    }
}

impl From<ApprovalStatus> for core_types::ApprovalStatus {
    fn from(status: ApprovalStatus) -> Self {
        match status {
            ApprovalStatus::Pending => Self::Pending,
            ApprovalStatus::Approved => Self::Approved,
            ApprovalStatus::Rejected => Self::Rejected,
        }
    }
}

impl From<core_types::ApprovalStatus> for ApprovalStatus {
    fn from(status: core_types::ApprovalStatus) -> Self {
        match status {
            core_types::ApprovalStatus::Pending => Self::Pending,
            core_types::ApprovalStatus::Approved => Self::Approved,
            core_types::ApprovalStatus::Rejected => Self::Rejected,
        }
    }
}

fn parse_currency(code: &str) -> Result<Currency, WorkflowError> {
    code.parse()
        .map_err(|_| WorkflowError::UnknownCurrency(code.to_string()))
}

pub(crate) fn company_from_model(model: companies::Model) -> Result<Company, WorkflowError> {
    Ok(Company {
        id: CompanyId::from_uuid(model.id),
        currency: parse_currency(&model.currency)?,
        name: model.name,
        admin_id: model.admin_id.map(UserId::from_uuid),
    })
}

pub(crate) fn profile_from_model(model: &users::Model) -> UserProfile {
    UserProfile {
        id: UserId::from_uuid(model.id),
        company_id: model.company_id.map(CompanyId::from_uuid),
        role: model.role.into(),
        manager_id: model.manager_id.map(UserId::from_uuid),
    }
}

pub(crate) fn rule_from_models(
    rule: approval_rules::Model,
    steps: Vec<approval_steps::Model>,
) -> Result<ApprovalRule, WorkflowError> {
    let rule_id = ApprovalRuleId::from_uuid(rule.id);
    let steps = steps
        .into_iter()
        .map(|step| {
            let approver = match (step.approver_id, step.approver_role) {
                (Some(user_id), _) => ApproverRef::User(UserId::from_uuid(user_id)),
                (None, Some(role)) => ApproverRef::Role(role.into()),
                (None, None) => {
                    return Err(WorkflowError::InvalidRule(format!(
                        "step {} of rule {rule_id} has no approver",
                        step.step_number
                    )));
                }
            };
            Ok(ApprovalStep {
                id: ApprovalStepId::from_uuid(step.id),
                step_number: step.step_number,
                approver,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ApprovalRule {
        id: rule_id,
        company_id: CompanyId::from_uuid(rule.company_id),
        name: rule.name,
        min_amount: rule.min_amount,
        max_amount: rule.max_amount,
        is_active: rule.is_active,
        is_manager_approver: rule.is_manager_approver,
        steps,
    })
}

pub(crate) fn expense_from_model(model: expenses::Model) -> Result<Expense, WorkflowError> {
    Ok(Expense {
        id: ExpenseId::from_uuid(model.id),
        company_id: CompanyId::from_uuid(model.company_id),
        employee_id: UserId::from_uuid(model.employee_id),
        amount: model.amount,
        currency: parse_currency(&model.currency)?,
        converted_amount: model.converted_amount,
        expense_date: model.expense_date,
        merchant: model.merchant,
        description: model.description,
        status: model.status.into(),
        approval_rule_id: model.approval_rule_id.map(ApprovalRuleId::from_uuid),
        current_approver: model.current_approver_id.map(UserId::from_uuid),
        current_step: model.current_step,
        current_rule_step: model.current_rule_step,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    })
}

/// Full active model for inserting an expense.
pub(crate) fn expense_to_active(expense: &Expense) -> expenses::ActiveModel {
    expenses::ActiveModel {
        id: Set(expense.id.into_inner()),
        company_id: Set(expense.company_id.into_inner()),
        employee_id: Set(expense.employee_id.into_inner()),
        amount: Set(expense.amount),
        currency: Set(expense.currency.as_str().to_string()),
        converted_amount: Set(expense.converted_amount),
        expense_date: Set(expense.expense_date),
        merchant: Set(expense.merchant.clone()),
        description: Set(expense.description.clone()),
        status: Set(expense.status.into()),
        approval_rule_id: Set(expense.approval_rule_id.map(ApprovalRuleId::into_inner)),
        current_approver_id: Set(expense.current_approver.map(UserId::into_inner)),
        current_step: Set(expense.current_step),
        current_rule_step: Set(expense.current_rule_step),
        created_at: Set(expense.created_at.into()),
        updated_at: Set(expense.updated_at.into()),
    }
}

pub(crate) fn approval_from_model(model: expense_approvals::Model) -> ExpenseApproval {
    ExpenseApproval {
        id: ExpenseApprovalId::from_uuid(model.id),
        expense_id: ExpenseId::from_uuid(model.expense_id),
        approver_id: UserId::from_uuid(model.approver_id),
        step_number: model.step_number,
        status: model.status.into(),
        comment: model.comment,
        decided_at: model.decided_at.map(|at| at.with_timezone(&Utc)),
        created_at: model.created_at.with_timezone(&Utc),
    }
}

pub(crate) fn approval_to_active(approval: &ExpenseApproval) -> expense_approvals::ActiveModel {
    expense_approvals::ActiveModel {
        id: Set(approval.id.into_inner()),
        expense_id: Set(approval.expense_id.into_inner()),
        approver_id: Set(approval.approver_id.into_inner()),
        step_number: Set(approval.step_number),
        status: Set(approval.status.into()),
        comment: Set(approval.comment.clone()),
        decided_at: Set(approval.decided_at.map(Into::into)),
        created_at: Set(approval.created_at.into()),
    }
}
