//! Expense repository running the approval workflow.
//!
//! Every mutation loads the state it needs, lets `WorkflowService` compute
//! the transition and writes the result inside one database transaction.
//! Decisions lock the expense row first, so decisions on the same expense
//! are applied one at a time.

use std::sync::Arc;

use outlay_core::currency::CurrencyConverter;
use outlay_core::workflow::{
    ApproverResolver, Approvers, DecisionRequest, Expense, ExpenseApproval, ExpenseIntake,
    ExpenseStatus, NewExpense, PendingApproval, Transition, TransitionOutcome, WorkflowError,
    WorkflowService,
};
use outlay_shared::types::{ExpenseId, UserId};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, TransactionTrait,
};
use tracing::{error, info, warn};

use super::approval_rule::{load_rule, load_rules};
use super::mapping::{
    approval_from_model, approval_to_active, company_from_model, db_err, expense_from_model,
    expense_to_active, profile_from_model,
};
use super::user::{find_user, load_directory};
use crate::entities::{companies, expense_approvals, expenses, sea_orm_active_enums::ApprovalStatus};

/// Expense repository for the approval workflow.
#[derive(Clone)]
pub struct ExpenseRepository {
    db: DatabaseConnection,
    converter: Arc<dyn CurrencyConverter + Send + Sync>,
    resolver: ApproverResolver,
}

impl std::fmt::Debug for ExpenseRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExpenseRepository")
            .field("resolver", &self.resolver)
            .finish_non_exhaustive()
    }
}

impl ExpenseRepository {
    /// Creates a new expense repository using the default role resolution.
    #[must_use]
    pub fn new(
        db: DatabaseConnection,
        converter: Arc<dyn CurrencyConverter + Send + Sync>,
    ) -> Self {
        Self {
            db,
            converter,
            resolver: ApproverResolver::default(),
        }
    }

    /// Replaces the role resolution table.
    #[must_use]
    pub fn with_resolver(mut self, resolver: ApproverResolver) -> Self {
        self.resolver = resolver;
        self
    }

    /// Creates an expense and starts its approval workflow.
    ///
    /// # Errors
    ///
    /// - `UserNotFound` / `CompanyNotFound` for unknown references
    /// - `InvalidAmount`, `UnknownCurrency`, `EmployeeWithoutCompany` for bad
    ///   input; nothing is written
    /// - `ApproverUnresolved` / `NoApproverAvailable` when the matched rule
    ///   yields no approver; the expense is stored `in_progress` without an
    ///   approver and the error carries its id
    ///   ([`WorkflowError::stalled_expense`])
    pub async fn create_expense(&self, input: NewExpense) -> Result<Expense, WorkflowError> {
        let now = chrono::Utc::now();
        let txn = self.db.begin().await.map_err(db_err)?;

        let employee = profile_from_model(&find_user(&txn, input.employee_id).await?);
        let company_id = employee
            .company_id
            .ok_or(WorkflowError::EmployeeWithoutCompany(employee.id))?;
        let company = companies::Entity::find_by_id(company_id.into_inner())
            .one(&txn)
            .await
            .map_err(db_err)?
            .ok_or(WorkflowError::CompanyNotFound(company_id))
            .and_then(company_from_model)?;

        let expense =
            ExpenseIntake::prepare(&input, &employee, &company, self.converter.as_ref(), now)?;

        let rules = load_rules(&txn, company_id, true).await?;
        let directory = load_directory(&txn, company_id).await?;
        let transition = WorkflowService::initiate(
            &expense,
            &[],
            &employee,
            &rules,
            Approvers::new(&self.resolver, &directory),
            now,
        )?;

        expense_to_active(&transition.expense)
            .insert(&txn)
            .await
            .map_err(db_err)?;
        if let Some(created) = &transition.created {
            approval_to_active(created)
                .insert(&txn)
                .await
                .map_err(db_err)?;
        }

        txn.commit().await.map_err(db_err)?;

        report(&transition)?;
        Ok(transition.expense)
    }

    /// Applies an approver's decision to an expense.
    ///
    /// # Errors
    ///
    /// - `ExpenseNotFound` for an unknown expense
    /// - `NotCurrentApprover` when `request.approver_id` is not the current
    ///   approver
    /// - `NotInProgress` / `NoPendingApproval` when no decision is expected
    /// - `ApproverUnresolved` when the next step names a role nobody holds;
    ///   the decision is stored and the expense, named in the error, is left
    ///   without an approver
    ///
    /// Apart from the last case, errors leave the database untouched.
    pub async fn submit_decision(
        &self,
        expense_id: ExpenseId,
        request: DecisionRequest,
    ) -> Result<ExpenseStatus, WorkflowError> {
        let now = chrono::Utc::now();
        let txn = self.db.begin().await.map_err(db_err)?;

        let expense = expenses::Entity::find_by_id(expense_id.into_inner())
            .lock_exclusive()
            .one(&txn)
            .await
            .map_err(db_err)?
            .ok_or(WorkflowError::ExpenseNotFound(expense_id))
            .and_then(expense_from_model)?;

        let trail = load_trail(&txn, expense_id).await?;
        let rule = match expense.approval_rule_id {
            Some(rule_id) => load_rule(&txn, rule_id).await?,
            None => None,
        };
        let directory = load_directory(&txn, expense.company_id).await?;

        let approver_id = request.approver_id;
        let transition = WorkflowService::decide(
            &expense,
            &trail,
            rule.as_ref(),
            Approvers::new(&self.resolver, &directory),
            request,
            now,
        )
        .inspect_err(|err| {
            warn!(
                expense_id = %expense_id,
                approver_id = %approver_id,
                error = %err,
                "Decision refused"
            );
        })?;

        if let Some(decided) = &transition.decided {
            approval_to_active(decided)
                .update(&txn)
                .await
                .map_err(db_err)?;
        }
        expense_to_active(&transition.expense)
            .update(&txn)
            .await
            .map_err(db_err)?;
        if let Some(created) = &transition.created {
            approval_to_active(created)
                .insert(&txn)
                .await
                .map_err(db_err)?;
        }

        txn.commit().await.map_err(db_err)?;

        report(&transition)?;
        Ok(transition.expense.status)
    }

    /// Pending approval requests addressed to `approver_id`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn get_pending_approvals(
        &self,
        approver_id: UserId,
    ) -> Result<Vec<PendingApproval>, WorkflowError> {
        let rows = expense_approvals::Entity::find()
            .filter(expense_approvals::Column::ApproverId.eq(approver_id.into_inner()))
            .filter(expense_approvals::Column::Status.eq(ApprovalStatus::Pending))
            .order_by_asc(expense_approvals::Column::CreatedAt)
            .find_also_related(expenses::Entity)
            .all(&self.db)
            .await
            .map_err(db_err)?;

        rows.into_iter()
            .filter_map(|(approval, expense)| expense.map(|e| (approval, e)))
            .map(|(approval, expense)| {
                Ok(PendingApproval {
                    expense: expense_from_model(expense)?,
                    approval: approval_from_model(approval),
                })
            })
            .collect()
    }

    /// The approval records of an expense in step order.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn approval_trail(
        &self,
        expense_id: ExpenseId,
    ) -> Result<Vec<ExpenseApproval>, WorkflowError> {
        load_trail(&self.db, expense_id).await
    }

    /// Finds an expense by ID.
    ///
    /// # Errors
    ///
    /// Returns `ExpenseNotFound` if it does not exist.
    pub async fn find(&self, expense_id: ExpenseId) -> Result<Expense, WorkflowError> {
        expenses::Entity::find_by_id(expense_id.into_inner())
            .one(&self.db)
            .await
            .map_err(db_err)?
            .ok_or(WorkflowError::ExpenseNotFound(expense_id))
            .and_then(expense_from_model)
    }
}

async fn load_trail<C: ConnectionTrait>(
    conn: &C,
    expense_id: ExpenseId,
) -> Result<Vec<ExpenseApproval>, WorkflowError> {
    let records = expense_approvals::Entity::find()
        .filter(expense_approvals::Column::ExpenseId.eq(expense_id.into_inner()))
        .order_by_asc(expense_approvals::Column::StepNumber)
        .all(conn)
        .await
        .map_err(db_err)?;
    Ok(records.into_iter().map(approval_from_model).collect())
}

/// Logs a committed transition and surfaces a stall as an error.
fn report(transition: &Transition) -> Result<(), WorkflowError> {
    let expense = &transition.expense;
    match &transition.outcome {
        TransitionOutcome::Stalled(reason) => {
            error!(
                expense_id = %expense.id,
                step = expense.current_step,
                error = %reason,
                "Approval workflow stalled, manual intervention required"
            );
            return Err(reason.clone());
        }
        TransitionOutcome::AwaitingApproval { approver_id, step } => {
            info!(
                expense_id = %expense.id,
                approver_id = %approver_id,
                step,
                "Approval requested"
            );
        }
        TransitionOutcome::AutoApproved
        | TransitionOutcome::Approved
        | TransitionOutcome::Rejected => {
            info!(expense_id = %expense.id, status = %expense.status, "Expense decided");
        }
    }
    Ok(())
}
