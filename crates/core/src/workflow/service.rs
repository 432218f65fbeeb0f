//! Workflow service for expense state transitions.
//!
//! Both operations are pure: they take the current expense, its approval
//! trail and the configuration they need, and return a [`Transition`]
//! describing everything that changes. Persisting it atomically is up to the
//! caller.

use chrono::{DateTime, Utc};

use crate::workflow::approval::{ApprovalEngine, ApprovalRule, ApprovalStep};
use crate::workflow::error::WorkflowError;
use crate::workflow::resolver::Approvers;
use crate::workflow::types::{
    ApprovalStatus, DecisionRequest, Decision, Expense, ExpenseApproval, ExpenseStatus,
    MANAGER_STEP, Transition, TransitionOutcome, UserProfile,
};

/// Progression index of the first consulted rule step.
const FIRST_RULE_STEP: i32 = 1;

/// Stateless service for managing expense workflow transitions.
pub struct WorkflowService;

impl WorkflowService {
    /// Start the approval workflow of a freshly created expense.
    ///
    /// # Arguments
    /// * `expense` - The expense, still `pending`
    /// * `trail` - Its approval records (must be empty)
    /// * `employee` - The filing employee
    /// * `rules` - The company's approval rules
    /// * `approvers` - Role resolution for rule steps
    /// * `now` - Timestamp for new records
    ///
    /// # Returns
    /// * `AutoApproved` when no rule matches
    /// * `AwaitingApproval` at step 0 for the manager, or at step 1 for the
    ///   first rule step
    /// * `Stalled` when the matched rule yields no approver; the expense is
    ///   still moved to `in_progress`
    ///
    /// # Errors
    ///
    /// Returns `WorkflowError::AlreadyInitiated` unless the expense is
    /// `pending` with no approval records.
    pub fn initiate(
        expense: &Expense,
        trail: &[ExpenseApproval],
        employee: &UserProfile,
        rules: &[ApprovalRule],
        approvers: Approvers<'_>,
        now: DateTime<Utc>,
    ) -> Result<Transition, WorkflowError> {
        if expense.status != ExpenseStatus::Pending || !trail.is_empty() {
            return Err(WorkflowError::AlreadyInitiated {
                expense_id: expense.id,
                status: expense.status,
            });
        }

        let mut next = expense.clone();
        next.updated_at = now;
        next.current_approver = None;
        next.current_step = MANAGER_STEP;
        next.current_rule_step = None;

        let Some(rule) =
            ApprovalEngine::find_rule(rules, expense.company_id, expense.comparison_amount())
        else {
            next.status = ExpenseStatus::Approved;
            next.approval_rule_id = None;
            return Ok(Transition {
                expense: next,
                decided: None,
                created: None,
                outcome: TransitionOutcome::AutoApproved,
            });
        };

        next.status = ExpenseStatus::InProgress;
        next.approval_rule_id = Some(rule.id);

        if rule.is_manager_approver
            && let Some(manager_id) = employee.manager_id
        {
            next.current_approver = Some(manager_id);
            let created = ExpenseApproval::pending(next.id, manager_id, MANAGER_STEP, now);
            return Ok(Transition {
                expense: next,
                decided: None,
                created: Some(created),
                outcome: TransitionOutcome::AwaitingApproval {
                    approver_id: manager_id,
                    step: MANAGER_STEP,
                },
            });
        }

        let (created, outcome) = match rule.first_step() {
            Some(step) => Self::enter_step(&mut next, rule, step, FIRST_RULE_STEP, approvers, now),
            None => (
                None,
                TransitionOutcome::Stalled(WorkflowError::NoApproverAvailable {
                    expense_id: next.id,
                    rule_id: rule.id,
                }),
            ),
        };

        Ok(Transition {
            expense: next,
            decided: None,
            created,
            outcome,
        })
    }

    /// Apply the current approver's decision.
    ///
    /// # Arguments
    /// * `expense` - The expense, `in_progress`
    /// * `trail` - Its approval records
    /// * `rule` - The rule recorded on the expense at initiation, if it
    ///   still exists
    /// * `approvers` - Role resolution for the next rule step
    /// * `request` - Who decides what
    /// * `now` - Timestamp for the decision and new records
    ///
    /// # Returns
    /// * `Rejected` on reject, whatever steps remain
    /// * `AwaitingApproval` when the next rule step got an approver
    /// * `Approved` when the approved step was the last one
    /// * `Stalled` when the next rule step names a role nobody holds
    ///
    /// # Errors
    ///
    /// - `NotInProgress` unless the expense is `in_progress`
    /// - `NoPendingApproval` when nobody is assigned or the trail does not
    ///   hold exactly one pending record for the current step
    /// - `NotCurrentApprover` when someone else submits the decision
    /// - `RuleNotFound` when approving and the recorded rule is gone
    ///
    /// Errors are returned before anything is changed.
    pub fn decide(
        expense: &Expense,
        trail: &[ExpenseApproval],
        rule: Option<&ApprovalRule>,
        approvers: Approvers<'_>,
        request: DecisionRequest,
        now: DateTime<Utc>,
    ) -> Result<Transition, WorkflowError> {
        if expense.status != ExpenseStatus::InProgress {
            return Err(WorkflowError::NotInProgress {
                expense_id: expense.id,
                status: expense.status,
            });
        }
        let no_pending = || WorkflowError::NoPendingApproval {
            expense_id: expense.id,
            step: expense.current_step,
        };
        let current_approver = expense.current_approver.ok_or_else(no_pending)?;
        if current_approver != request.approver_id {
            return Err(WorkflowError::NotCurrentApprover {
                expense_id: expense.id,
                user_id: request.approver_id,
            });
        }

        let mut pending = trail.iter().filter(|a| {
            a.step_number == expense.current_step && a.status == ApprovalStatus::Pending
        });
        let record = match (pending.next(), pending.next()) {
            (Some(record), None) if record.approver_id == current_approver => record,
            _ => return Err(no_pending()),
        };

        let mut decided = record.clone();
        decided.status = request.decision.approval_status();
        decided.comment = request.comment;
        decided.decided_at = Some(now);

        let mut next = expense.clone();
        next.updated_at = now;

        if request.decision == Decision::Reject {
            next.status = ExpenseStatus::Rejected;
            next.current_approver = None;
            return Ok(Transition {
                expense: next,
                decided: Some(decided),
                created: None,
                outcome: TransitionOutcome::Rejected,
            });
        }

        let rule = match (expense.approval_rule_id, rule) {
            (Some(id), Some(rule)) if rule.id == id => rule,
            (Some(id), _) => return Err(WorkflowError::RuleNotFound(id)),
            (None, _) => {
                return Err(WorkflowError::Database(format!(
                    "expense {} is in progress without an approval rule",
                    expense.id
                )));
            }
        };

        // Leaving the manager step enters the rule's first step; otherwise
        // continue after the last consulted declared step number.
        let upcoming = match expense.current_rule_step {
            None => rule.first_step(),
            Some(step_number) => rule.step_after(step_number),
        };

        let (created, outcome) = match upcoming {
            Some(step) => {
                let index = expense.current_step + 1;
                Self::enter_step(&mut next, rule, step, index, approvers, now)
            }
            None => {
                next.status = ExpenseStatus::Approved;
                next.current_approver = None;
                (None, TransitionOutcome::Approved)
            }
        };

        Ok(Transition {
            expense: next,
            decided: Some(decided),
            created,
            outcome,
        })
    }

    /// Point `expense` at `step` as progression index `index`.
    ///
    /// On an unresolvable role the expense keeps the position but has no
    /// approver.
    fn enter_step(
        expense: &mut Expense,
        rule: &ApprovalRule,
        step: &ApprovalStep,
        index: i32,
        approvers: Approvers<'_>,
        now: DateTime<Utc>,
    ) -> (Option<ExpenseApproval>, TransitionOutcome) {
        expense.current_step = index;
        expense.current_rule_step = Some(step.step_number);

        match approvers.resolve_step(expense.id, rule.id, step) {
            Ok(approver_id) => {
                expense.current_approver = Some(approver_id);
                let created = ExpenseApproval::pending(expense.id, approver_id, index, now);
                (
                    Some(created),
                    TransitionOutcome::AwaitingApproval {
                        approver_id,
                        step: index,
                    },
                )
            }
            Err(err) => {
                expense.current_approver = None;
                (None, TransitionOutcome::Stalled(err))
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::workflow::approval::tests::{role_step, rule};
    use crate::workflow::approval::{ApproverRef, UserRole};
    use crate::workflow::resolver::{ApproverResolver, CompanyDirectory, DirectoryEntry};
    use chrono::NaiveDate;
    use outlay_shared::types::{ApprovalStepId, CompanyId, Currency, ExpenseId, UserId};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    /// A small company: one admin, one manager, one employee reporting to
    /// the manager.
    pub(crate) struct Fixture {
        pub company_id: CompanyId,
        pub admin: UserId,
        pub manager: UserId,
        pub employee: UserProfile,
        pub directory: CompanyDirectory,
        pub resolver: ApproverResolver,
    }

    impl Fixture {
        pub(crate) fn new() -> Self {
            let company_id = CompanyId::new();
            let admin = UserId::new();
            let manager = UserId::new();
            let employee = UserProfile {
                id: UserId::new(),
                company_id: Some(company_id),
                role: UserRole::Employee,
                manager_id: Some(manager),
            };
            let directory = CompanyDirectory::new(vec![
                DirectoryEntry {
                    user_id: employee.id,
                    role: UserRole::Employee,
                },
                DirectoryEntry {
                    user_id: manager,
                    role: UserRole::Manager,
                },
                DirectoryEntry {
                    user_id: admin,
                    role: UserRole::Admin,
                },
            ]);
            Self {
                company_id,
                admin,
                manager,
                employee,
                directory,
                resolver: ApproverResolver::default(),
            }
        }

        pub(crate) fn approvers(&self) -> Approvers<'_> {
            Approvers::new(&self.resolver, &self.directory)
        }

        pub(crate) fn expense(&self, amount: Decimal) -> Expense {
            let now = Utc::now();
            Expense {
                id: ExpenseId::new(),
                company_id: self.company_id,
                employee_id: self.employee.id,
                amount,
                currency: Currency::Usd,
                converted_amount: Some(amount),
                expense_date: NaiveDate::from_ymd_opt(2026, 10, 1).unwrap(),
                merchant: None,
                description: "Client dinner".to_string(),
                status: ExpenseStatus::Pending,
                approval_rule_id: None,
                current_approver: None,
                current_step: MANAGER_STEP,
                current_rule_step: None,
                created_at: now,
                updated_at: now,
            }
        }

        /// Rule `{min=0, max=500, is_manager_approver=true}` without steps.
        pub(crate) fn manager_rule(&self) -> ApprovalRule {
            let mut r = rule(self.company_id, "Manager sign-off", Some(dec!(0)), Some(dec!(500)));
            r.is_manager_approver = true;
            r
        }

        /// Rule `{min=500, steps: [1 manager, 2 admin]}`.
        pub(crate) fn two_step_rule(&self) -> ApprovalRule {
            let mut r = rule(self.company_id, "Large spend", Some(dec!(500)), None);
            r.steps = vec![role_step(1, UserRole::Manager), role_step(2, UserRole::Admin)];
            r
        }

        pub(crate) fn initiate(
            &self,
            expense: &Expense,
            trail: &[ExpenseApproval],
            rules: &[ApprovalRule],
        ) -> Result<Transition, WorkflowError> {
            WorkflowService::initiate(
                expense,
                trail,
                &self.employee,
                rules,
                self.approvers(),
                Utc::now(),
            )
        }

        pub(crate) fn decide(
            &self,
            expense: &Expense,
            trail: &[ExpenseApproval],
            rule: Option<&ApprovalRule>,
            request: DecisionRequest,
        ) -> Result<Transition, WorkflowError> {
            WorkflowService::decide(expense, trail, rule, self.approvers(), request, Utc::now())
        }
    }

    /// Applies a transition to in-memory state the way the repository does.
    pub(crate) fn apply(
        transition: Transition,
        trail: &mut Vec<ExpenseApproval>,
    ) -> (Expense, TransitionOutcome) {
        if let Some(decided) = transition.decided {
            let slot = trail.iter_mut().find(|a| a.id == decided.id).unwrap();
            *slot = decided;
        }
        if let Some(created) = transition.created {
            trail.push(created);
        }
        (transition.expense, transition.outcome)
    }

    pub(crate) fn approve(approver_id: UserId) -> DecisionRequest {
        DecisionRequest {
            approver_id,
            decision: Decision::Approve,
            comment: None,
        }
    }

    pub(crate) fn reject(approver_id: UserId) -> DecisionRequest {
        DecisionRequest {
            approver_id,
            decision: Decision::Reject,
            comment: Some("Not a business expense".to_string()),
        }
    }

    #[test]
    fn test_no_matching_rule_auto_approves() {
        let fx = Fixture::new();
        let rules = vec![fx.two_step_rule()];
        let expense = fx.expense(dec!(100));

        let t = fx.initiate(&expense, &[], &rules).unwrap();

        assert_eq!(t.outcome, TransitionOutcome::AutoApproved);
        assert_eq!(t.expense.status, ExpenseStatus::Approved);
        assert_eq!(t.expense.current_approver, None);
        assert!(t.created.is_none());
        assert!(t.decided.is_none());
    }

    #[test]
    fn test_manager_rule_scenario() {
        let fx = Fixture::new();
        let rules = vec![fx.manager_rule()];
        let expense = fx.expense(dec!(300));
        let mut trail = Vec::new();

        let t = fx.initiate(&expense, &trail, &rules).unwrap();
        let created = t.created.clone().unwrap();
        assert_eq!(created.step_number, MANAGER_STEP);
        assert_eq!(created.approver_id, fx.manager);
        assert_eq!(created.status, ApprovalStatus::Pending);
        let (expense, _) = apply(t, &mut trail);
        assert_eq!(expense.status, ExpenseStatus::InProgress);
        assert_eq!(expense.current_approver, Some(fx.manager));
        assert_eq!(expense.current_step, MANAGER_STEP);

        let t = WorkflowService::decide(
            &expense,
            &trail,
            rules.first(),
            fx.approvers(),
            approve(fx.manager),
            Utc::now(),
        )
        .unwrap();
        let (expense, outcome) = apply(t, &mut trail);

        assert_eq!(outcome, TransitionOutcome::Approved);
        assert_eq!(expense.status, ExpenseStatus::Approved);
        assert_eq!(expense.current_approver, None);
        assert_eq!(trail.len(), 1);
        assert_eq!(trail[0].status, ApprovalStatus::Approved);
        assert!(trail[0].decided_at.is_some());
    }

    #[test]
    fn test_two_step_rule_scenario() {
        let fx = Fixture::new();
        let rules = vec![fx.manager_rule(), fx.two_step_rule()];
        let expense = fx.expense(dec!(1000));
        let mut trail = Vec::new();

        let t = fx.initiate(&expense, &trail, &rules).unwrap();
        assert_eq!(
            t.outcome,
            TransitionOutcome::AwaitingApproval {
                approver_id: fx.manager,
                step: 1
            }
        );
        let (expense, _) = apply(t, &mut trail);
        assert_eq!(expense.approval_rule_id, Some(rules[1].id));
        assert_eq!(expense.current_rule_step, Some(1));

        let t = fx.decide(&expense, &trail, Some(&rules[1]), approve(fx.manager)).unwrap();
        assert_eq!(
            t.outcome,
            TransitionOutcome::AwaitingApproval {
                approver_id: fx.admin,
                step: 2
            }
        );
        let (expense, _) = apply(t, &mut trail);
        assert_eq!(expense.current_approver, Some(fx.admin));

        let t = fx.decide(&expense, &trail, Some(&rules[1]), approve(fx.admin)).unwrap();
        let (expense, outcome) = apply(t, &mut trail);

        assert_eq!(outcome, TransitionOutcome::Approved);
        assert_eq!(expense.status, ExpenseStatus::Approved);
        assert_eq!(expense.current_approver, None);
        let steps: Vec<_> = trail.iter().map(|a| (a.step_number, a.status)).collect();
        assert_eq!(
            steps,
            vec![(1, ApprovalStatus::Approved), (2, ApprovalStatus::Approved)]
        );
    }

    #[test]
    fn test_manager_step_then_rule_steps() {
        let fx = Fixture::new();
        let mut r = fx.two_step_rule();
        r.is_manager_approver = true;
        let rules = vec![r];
        let mut trail = Vec::new();

        let t = fx.initiate(&fx.expense(dec!(800)), &trail, &rules).unwrap();
        let (expense, _) = apply(t, &mut trail);
        assert_eq!(expense.current_step, MANAGER_STEP);
        assert!(expense.is_on_manager_step());

        let t = fx.decide(&expense, &trail, rules.first(), approve(fx.manager)).unwrap();
        let (expense, _) = apply(t, &mut trail);
        assert_eq!(expense.current_step, 1);
        assert_eq!(expense.current_rule_step, Some(1));
        assert_eq!(expense.current_approver, Some(fx.manager));
        assert_eq!(trail.len(), 2);
    }

    #[test]
    fn test_progression_index_ignores_declared_numbers() {
        let fx = Fixture::new();
        let mut r = rule(fx.company_id, "Sparse", None, None);
        r.steps = vec![role_step(30, UserRole::Admin), role_step(10, UserRole::Manager)];
        let rules = vec![r];
        let mut trail = Vec::new();

        let t = fx.initiate(&fx.expense(dec!(50)), &trail, &rules).unwrap();
        let (expense, _) = apply(t, &mut trail);
        assert_eq!(expense.current_step, 1);
        assert_eq!(expense.current_rule_step, Some(10));
        assert_eq!(trail[0].step_number, 1);
        assert_eq!(trail[0].approver_id, fx.manager);

        let t = fx.decide(&expense, &trail, rules.first(), approve(fx.manager)).unwrap();
        let (expense, _) = apply(t, &mut trail);
        assert_eq!(expense.current_step, 2);
        assert_eq!(expense.current_rule_step, Some(30));
        assert_eq!(expense.current_approver, Some(fx.admin));
    }

    #[test]
    fn test_manager_rule_without_manager_uses_steps() {
        let mut fx = Fixture::new();
        fx.employee.manager_id = None;
        let mut r = fx.two_step_rule();
        r.is_manager_approver = true;

        let t = fx.initiate(&fx.expense(dec!(900)), &[], &[r]).unwrap();
        assert_eq!(t.expense.current_step, 1);
        assert_eq!(t.created.unwrap().approver_id, fx.manager);
    }

    #[test]
    fn test_fixed_approver_wins_over_role() {
        let fx = Fixture::new();
        let auditor = UserId::new();
        let mut r = rule(fx.company_id, "Audit", None, None);
        r.steps = vec![ApprovalStep {
            id: ApprovalStepId::new(),
            step_number: 1,
            approver: ApproverRef::User(auditor),
        }];

        let t = fx.initiate(&fx.expense(dec!(10)), &[], &[r]).unwrap();
        assert_eq!(t.expense.current_approver, Some(auditor));
    }

    #[test]
    fn test_initiate_stalls_without_any_approver() {
        let mut fx = Fixture::new();
        fx.employee.manager_id = None;
        let rules = vec![fx.manager_rule()];

        let t = fx.initiate(&fx.expense(dec!(100)), &[], &rules).unwrap();

        assert_eq!(t.expense.status, ExpenseStatus::InProgress);
        assert_eq!(t.expense.current_approver, None);
        assert!(t.created.is_none());
        assert_eq!(
            t.stall_reason(),
            Some(&WorkflowError::NoApproverAvailable {
                expense_id: t.expense.id,
                rule_id: rules[0].id
            })
        );
    }

    #[test]
    fn test_initiate_stalls_on_unresolvable_role() {
        let fx = Fixture::new();
        let directory = CompanyDirectory::new(vec![DirectoryEntry {
            user_id: fx.employee.id,
            role: UserRole::Employee,
        }]);
        let rules = vec![fx.two_step_rule()];

        let t = WorkflowService::initiate(
            &fx.expense(dec!(600)),
            &[],
            &fx.employee,
            &rules,
            Approvers::new(&fx.resolver, &directory),
            Utc::now(),
        )
        .unwrap();

        assert_eq!(t.expense.status, ExpenseStatus::InProgress);
        assert_eq!(t.expense.current_step, 1);
        assert_eq!(t.expense.current_rule_step, Some(1));
        assert!(matches!(
            t.stall_reason(),
            Some(WorkflowError::ApproverUnresolved {
                role: UserRole::Manager,
                step_number: 1,
                ..
            })
        ));
    }

    #[test]
    fn test_mid_chain_stall_keeps_prior_decision() {
        let fx = Fixture::new();
        let rules = vec![fx.two_step_rule()];
        let mut trail = Vec::new();
        let t = fx.initiate(&fx.expense(dec!(700)), &trail, &rules).unwrap();
        let (expense, _) = apply(t, &mut trail);

        // The admin left the company before the second step was reached.
        let directory = CompanyDirectory::new(vec![DirectoryEntry {
            user_id: fx.manager,
            role: UserRole::Manager,
        }]);
        let t = WorkflowService::decide(
            &expense,
            &trail,
            rules.first(),
            Approvers::new(&fx.resolver, &directory),
            approve(fx.manager),
            Utc::now(),
        )
        .unwrap();
        assert!(t.stall_reason().is_some());
        let (expense, _) = apply(t, &mut trail);

        assert_eq!(expense.status, ExpenseStatus::InProgress);
        assert_eq!(expense.current_approver, None);
        assert_eq!(expense.current_step, 2);
        assert_eq!(trail.len(), 1);
        assert_eq!(trail[0].status, ApprovalStatus::Approved);

        let err = fx.decide(&expense, &trail, rules.first(), approve(fx.admin))
            .unwrap_err();
        assert!(matches!(err, WorkflowError::NoPendingApproval { step: 2, .. }));
    }

    #[test]
    fn test_initiate_twice_rejected() {
        let fx = Fixture::new();
        let rules = vec![fx.manager_rule()];
        let mut trail = Vec::new();
        let t = fx.initiate(&fx.expense(dec!(100)), &trail, &rules).unwrap();
        let (expense, _) = apply(t, &mut trail);

        let err = fx.initiate(&expense, &trail, &rules)
            .unwrap_err();
        assert!(matches!(err, WorkflowError::AlreadyInitiated { .. }));
    }

    #[test]
    fn test_reject_is_terminal() {
        let fx = Fixture::new();
        let rules = vec![fx.two_step_rule()];
        let mut trail = Vec::new();
        let t = fx.initiate(&fx.expense(dec!(2000)), &trail, &rules).unwrap();
        let (expense, _) = apply(t, &mut trail);

        let t = fx.decide(&expense, &trail, rules.first(), reject(fx.manager)).unwrap();
        assert!(t.created.is_none());
        let (expense, outcome) = apply(t, &mut trail);

        assert_eq!(outcome, TransitionOutcome::Rejected);
        assert_eq!(expense.status, ExpenseStatus::Rejected);
        assert_eq!(expense.current_approver, None);
        assert_eq!(trail[0].status, ApprovalStatus::Rejected);
        assert_eq!(trail[0].comment.as_deref(), Some("Not a business expense"));

        let err = fx.decide(&expense, &trail, rules.first(), approve(fx.manager))
            .unwrap_err();
        assert!(matches!(
            err,
            WorkflowError::NotInProgress {
                status: ExpenseStatus::Rejected,
                ..
            }
        ));
    }

    #[test]
    fn test_wrong_approver_rejected() {
        let fx = Fixture::new();
        let rules = vec![fx.manager_rule()];
        let mut trail = Vec::new();
        let t = fx.initiate(&fx.expense(dec!(100)), &trail, &rules).unwrap();
        let (expense, _) = apply(t, &mut trail);

        let err = fx.decide(&expense, &trail, rules.first(), approve(fx.admin))
            .unwrap_err();
        assert_eq!(
            err,
            WorkflowError::NotCurrentApprover {
                expense_id: expense.id,
                user_id: fx.admin
            }
        );
        assert_eq!(err.status_code(), 403);
    }

    #[test]
    fn test_decide_requires_single_pending_record() {
        let fx = Fixture::new();
        let rules = vec![fx.manager_rule()];
        let mut trail = Vec::new();
        let t = fx.initiate(&fx.expense(dec!(100)), &trail, &rules).unwrap();
        let (expense, _) = apply(t, &mut trail);

        let err = fx.decide(&expense, &[], rules.first(), approve(fx.manager))
            .unwrap_err();
        assert!(matches!(err, WorkflowError::NoPendingApproval { .. }));

        let mut doubled = trail.clone();
        doubled.push(ExpenseApproval::pending(expense.id, fx.manager, MANAGER_STEP, Utc::now()));
        let err = fx.decide(&expense, &doubled, rules.first(), approve(fx.manager))
            .unwrap_err();
        assert!(matches!(err, WorkflowError::NoPendingApproval { .. }));
    }

    #[test]
    fn test_approve_with_missing_rule_fails() {
        let fx = Fixture::new();
        let rules = vec![fx.two_step_rule()];
        let mut trail = Vec::new();
        let t = fx.initiate(&fx.expense(dec!(1000)), &trail, &rules).unwrap();
        let (expense, _) = apply(t, &mut trail);

        let err = fx.decide(&expense, &trail, None, approve(fx.manager))
            .unwrap_err();
        assert_eq!(err, WorkflowError::RuleNotFound(rules[0].id));

        // Rejection does not need the rule.
        let t = fx.decide(&expense, &trail, None, reject(fx.manager)).unwrap();
        assert_eq!(t.outcome, TransitionOutcome::Rejected);
    }
}
