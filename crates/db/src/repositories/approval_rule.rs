//! Approval Rule Repository
//!
//! Provides CRUD operations for approval rules and their steps.

use outlay_core::workflow::{
    ApprovalRule, ApprovalStep, ApproverRef, UserRole, WorkflowError,
};
use outlay_shared::types::{ApprovalRuleId, ApprovalStepId, CompanyId, UserId};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use tracing::info;

use super::mapping::{db_err, rule_from_models};
use crate::entities::{approval_rules, approval_steps, users};

/// Input for one step of a new approval rule.
#[derive(Debug, Clone)]
pub struct CreateApprovalStepInput {
    /// Declared position in the chain.
    pub step_number: i32,
    /// Fixed approver; wins over `approver_role` when both are given.
    pub approver_id: Option<UserId>,
    /// Role resolved when the step is reached.
    pub approver_role: Option<UserRole>,
}

/// Input for creating an approval rule.
#[derive(Debug, Clone)]
pub struct CreateApprovalRuleInput {
    /// Name of the approval rule.
    pub name: String,
    /// Minimum amount threshold (inclusive).
    pub min_amount: Option<Decimal>,
    /// Maximum amount threshold (inclusive).
    pub max_amount: Option<Decimal>,
    /// Put the employee's manager in front of the steps.
    pub is_manager_approver: bool,
    /// Configured steps.
    pub steps: Vec<CreateApprovalStepInput>,
}

/// Repository for approval rule operations.
#[derive(Debug, Clone)]
pub struct ApprovalRuleRepository {
    db: DatabaseConnection,
}

impl ApprovalRuleRepository {
    /// Creates a new ApprovalRuleRepository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a new approval rule with its steps.
    ///
    /// # Errors
    ///
    /// - `InvalidRule` for inconsistent bounds or step numbers, or a step
    ///   without any approver
    /// - `UserNotFound` when a fixed approver is not in the company
    pub async fn create_rule(
        &self,
        company_id: CompanyId,
        input: CreateApprovalRuleInput,
    ) -> Result<ApprovalRule, WorkflowError> {
        let steps = input
            .steps
            .iter()
            .map(|step| {
                let approver = match (step.approver_id, step.approver_role) {
                    (Some(user_id), _) => ApproverRef::User(user_id),
                    (None, Some(role)) => ApproverRef::Role(role),
                    (None, None) => {
                        return Err(WorkflowError::InvalidRule(format!(
                            "step {} needs an approver or an approver role",
                            step.step_number
                        )));
                    }
                };
                Ok(ApprovalStep {
                    id: ApprovalStepId::new(),
                    step_number: step.step_number,
                    approver,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let rule = ApprovalRule {
            id: ApprovalRuleId::new(),
            company_id,
            name: input.name.trim().to_string(),
            min_amount: input.min_amount,
            max_amount: input.max_amount,
            is_active: true,
            is_manager_approver: input.is_manager_approver,
            steps,
        };
        rule.validate()?;

        let txn = self.db.begin().await.map_err(db_err)?;

        for step in &rule.steps {
            if let ApproverRef::User(user_id) = step.approver {
                let in_company = users::Entity::find_by_id(user_id.into_inner())
                    .filter(users::Column::CompanyId.eq(company_id.into_inner()))
                    .one(&txn)
                    .await
                    .map_err(db_err)?
                    .is_some();
                if !in_company {
                    return Err(WorkflowError::UserNotFound(user_id));
                }
            }
        }

        let now = chrono::Utc::now().into();
        approval_rules::ActiveModel {
            id: Set(rule.id.into_inner()),
            company_id: Set(company_id.into_inner()),
            name: Set(rule.name.clone()),
            min_amount: Set(rule.min_amount),
            max_amount: Set(rule.max_amount),
            is_active: Set(true),
            is_manager_approver: Set(rule.is_manager_approver),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await
        .map_err(db_err)?;

        for step in &rule.steps {
            let (approver_id, approver_role) = match step.approver {
                ApproverRef::User(user_id) => (Some(user_id.into_inner()), None),
                ApproverRef::Role(role) => (None, Some(role.into())),
            };
            approval_steps::ActiveModel {
                id: Set(step.id.into_inner()),
                rule_id: Set(rule.id.into_inner()),
                step_number: Set(step.step_number),
                approver_id: Set(approver_id),
                approver_role: Set(approver_role),
                created_at: Set(now),
            }
            .insert(&txn)
            .await
            .map_err(db_err)?;
        }

        txn.commit().await.map_err(db_err)?;

        info!(
            rule_id = %rule.id,
            company_id = %company_id,
            steps = rule.steps.len(),
            "Approval rule created"
        );
        Ok(rule)
    }

    /// Lists all approval rules of a company, active or not.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_rules(
        &self,
        company_id: CompanyId,
    ) -> Result<Vec<ApprovalRule>, WorkflowError> {
        load_rules(&self.db, company_id, false).await
    }

    /// Gets a specific approval rule by ID.
    ///
    /// # Errors
    ///
    /// Returns `RuleNotFound` if the rule does not exist in the company.
    pub async fn get_rule(
        &self,
        company_id: CompanyId,
        rule_id: ApprovalRuleId,
    ) -> Result<ApprovalRule, WorkflowError> {
        load_rule(&self.db, rule_id)
            .await?
            .filter(|r| r.company_id == company_id)
            .ok_or(WorkflowError::RuleNotFound(rule_id))
    }

    /// Activates or deactivates a rule.
    ///
    /// Deactivated rules are no longer matched, but expenses already
    /// following them continue through their steps.
    ///
    /// # Errors
    ///
    /// Returns `RuleNotFound` if the rule does not exist in the company.
    pub async fn set_active(
        &self,
        company_id: CompanyId,
        rule_id: ApprovalRuleId,
        is_active: bool,
    ) -> Result<ApprovalRule, WorkflowError> {
        let existing = approval_rules::Entity::find_by_id(rule_id.into_inner())
            .filter(approval_rules::Column::CompanyId.eq(company_id.into_inner()))
            .one(&self.db)
            .await
            .map_err(db_err)?
            .ok_or(WorkflowError::RuleNotFound(rule_id))?;

        let mut rule: approval_rules::ActiveModel = existing.into();
        rule.is_active = Set(is_active);
        rule.updated_at = Set(chrono::Utc::now().into());
        rule.update(&self.db).await.map_err(db_err)?;

        info!(rule_id = %rule_id, is_active, "Approval rule toggled");
        self.get_rule(company_id, rule_id).await
    }
}

/// Loads a company's rules with their steps.
pub(crate) async fn load_rules<C: ConnectionTrait>(
    conn: &C,
    company_id: CompanyId,
    active_only: bool,
) -> Result<Vec<ApprovalRule>, WorkflowError> {
    let mut query = approval_rules::Entity::find()
        .filter(approval_rules::Column::CompanyId.eq(company_id.into_inner()));
    if active_only {
        query = query.filter(approval_rules::Column::IsActive.eq(true));
    }

    query
        .order_by_asc(approval_rules::Column::CreatedAt)
        .find_with_related(approval_steps::Entity)
        .all(conn)
        .await
        .map_err(db_err)?
        .into_iter()
        .map(|(rule, steps)| rule_from_models(rule, steps))
        .collect()
}

/// Loads one rule with its steps, whatever its active flag.
pub(crate) async fn load_rule<C: ConnectionTrait>(
    conn: &C,
    rule_id: ApprovalRuleId,
) -> Result<Option<ApprovalRule>, WorkflowError> {
    let found = approval_rules::Entity::find_by_id(rule_id.into_inner())
        .find_with_related(approval_steps::Entity)
        .all(conn)
        .await
        .map_err(db_err)?;

    found
        .into_iter()
        .next()
        .map(|(rule, steps)| rule_from_models(rule, steps))
        .transpose()
}
