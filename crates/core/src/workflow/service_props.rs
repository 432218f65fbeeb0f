//! Property-based tests for WorkflowService.

use chrono::Utc;
use proptest::prelude::*;
use rust_decimal_macros::dec;

use crate::workflow::approval::UserRole;
use crate::workflow::approval::tests::{role_step, rule};
use crate::workflow::service::WorkflowService;
use crate::workflow::service::tests::{Fixture, apply, approve, reject};
use crate::workflow::types::{ApprovalStatus, ExpenseStatus, TransitionOutcome};

fn arb_role() -> impl Strategy<Value = UserRole> {
    prop_oneof![Just(UserRole::Manager), Just(UserRole::Admin)]
}

/// Distinct, unsorted step numbers with a role each.
fn arb_chain() -> impl Strategy<Value = Vec<(i32, UserRole)>> {
    prop::collection::btree_set(1i32..100, 1..6)
        .prop_flat_map(|numbers| {
            let len = numbers.len();
            (
                Just(numbers.into_iter().collect::<Vec<_>>()),
                prop::collection::vec(arb_role(), len),
            )
        })
        .prop_map(|(numbers, roles)| numbers.into_iter().rev().zip(roles).collect())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Approving every step completes the chain with one record per step.
    #[test]
    fn prop_full_chain_approves(chain in arb_chain(), manager_first in any::<bool>()) {
        let fx = Fixture::new();
        let mut r = rule(fx.company_id, "Chain", None, None);
        r.is_manager_approver = manager_first;
        r.steps = chain.iter().map(|&(n, role)| role_step(n, role)).collect();
        let rules = vec![r];
        let mut trail = Vec::new();

        let t = WorkflowService::initiate(
            &fx.expense(dec!(250)), &trail, &fx.employee, &rules, fx.approvers(), Utc::now(),
        ).unwrap();
        let (mut expense, _) = apply(t, &mut trail);

        let expected_records = chain.len() + usize::from(manager_first);
        for _ in 0..expected_records {
            prop_assert_eq!(expense.status, ExpenseStatus::InProgress);
            let approver = expense.current_approver.unwrap();
            let t = WorkflowService::decide(
                &expense, &trail, rules.first(), fx.approvers(), approve(approver), Utc::now(),
            ).unwrap();
            expense = apply(t, &mut trail).0;
        }

        prop_assert_eq!(expense.status, ExpenseStatus::Approved);
        prop_assert_eq!(expense.current_approver, None);
        prop_assert_eq!(trail.len(), expected_records);
        prop_assert!(trail.iter().all(|a| a.status == ApprovalStatus::Approved));

        let first_index = if manager_first { 0 } else { 1 };
        let indices: Vec<i32> = trail.iter().map(|a| a.step_number).collect();
        let expected: Vec<i32> = (first_index..).take(expected_records).collect();
        prop_assert_eq!(indices, expected);
    }

    /// Rejecting at any position ends the workflow without new records.
    #[test]
    fn prop_reject_is_terminal(chain in arb_chain(), reject_at in 0usize..6) {
        let fx = Fixture::new();
        let mut r = rule(fx.company_id, "Chain", None, None);
        r.steps = chain.iter().map(|&(n, role)| role_step(n, role)).collect();
        let rules = vec![r];
        let reject_at = reject_at % chain.len();
        let mut trail = Vec::new();

        let t = WorkflowService::initiate(
            &fx.expense(dec!(75)), &trail, &fx.employee, &rules, fx.approvers(), Utc::now(),
        ).unwrap();
        let (mut expense, _) = apply(t, &mut trail);

        for _ in 0..reject_at {
            let approver = expense.current_approver.unwrap();
            let t = WorkflowService::decide(
                &expense, &trail, rules.first(), fx.approvers(), approve(approver), Utc::now(),
            ).unwrap();
            expense = apply(t, &mut trail).0;
        }

        let before = trail.len();
        let approver = expense.current_approver.unwrap();
        let t = WorkflowService::decide(
            &expense, &trail, rules.first(), fx.approvers(), reject(approver), Utc::now(),
        ).unwrap();
        prop_assert!(t.created.is_none());
        let (expense, outcome) = apply(t, &mut trail);

        prop_assert_eq!(outcome, TransitionOutcome::Rejected);
        prop_assert_eq!(expense.status, ExpenseStatus::Rejected);
        prop_assert_eq!(expense.current_approver, None);
        prop_assert_eq!(trail.len(), before);
    }

    /// A decision from anyone but the current approver is refused.
    #[test]
    fn prop_non_approver_refused(chain in arb_chain(), approve_first in any::<bool>()) {
        let fx = Fixture::new();
        let mut r = rule(fx.company_id, "Chain", None, None);
        r.steps = chain.iter().map(|&(n, role)| role_step(n, role)).collect();
        let rules = vec![r];
        let mut trail = Vec::new();

        let t = WorkflowService::initiate(
            &fx.expense(dec!(10)), &trail, &fx.employee, &rules, fx.approvers(), Utc::now(),
        ).unwrap();
        let (expense, _) = apply(t, &mut trail);

        let intruder = fx.employee.id;
        let request = if approve_first { approve(intruder) } else { reject(intruder) };
        let result = WorkflowService::decide(
            &expense, &trail, rules.first(), fx.approvers(), request, Utc::now(),
        );

        prop_assert!(result.is_err());
        prop_assert_eq!(result.unwrap_err().status_code(), 403);
    }
}
