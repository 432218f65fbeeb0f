//! Property-based tests for rule matching.

use outlay_shared::types::CompanyId;
use proptest::prelude::*;
use rust_decimal::Decimal;

use crate::workflow::approval::tests::rule;
use crate::workflow::approval::{ApprovalEngine, ApprovalRule};

/// Amount in cents up to 100k, as a two-place decimal.
fn arb_amount() -> impl Strategy<Value = Decimal> {
    (0i64..10_000_000).prop_map(|cents| Decimal::new(cents, 2))
}

fn arb_bound() -> impl Strategy<Value = Option<Decimal>> {
    prop_oneof![1 => Just(None), 3 => arb_amount().prop_map(Some)]
}

/// Rules with arbitrary, possibly overlapping or empty ranges.
fn arb_rules(company_id: CompanyId) -> impl Strategy<Value = Vec<ApprovalRule>> {
    prop::collection::vec((arb_bound(), arb_bound(), any::<bool>()), 0..8).prop_map(
        move |specs| {
            specs
                .into_iter()
                .enumerate()
                .map(|(i, (min, max, active))| {
                    let mut r = rule(company_id, &format!("rule-{i}"), min, max);
                    r.is_active = active;
                    r
                })
                .collect()
        },
    )
}

fn company_and_rules() -> impl Strategy<Value = (CompanyId, Vec<ApprovalRule>)> {
    Just(CompanyId::new()).prop_flat_map(|company_id| (Just(company_id), arb_rules(company_id)))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// The match contains the amount and has the highest minimum of all
    /// active matching rules.
    #[test]
    fn prop_find_rule_picks_highest_minimum(
        (company_id, rules) in company_and_rules(),
        amount in arb_amount(),
    ) {
        let matching: Vec<_> = rules
            .iter()
            .filter(|r| r.is_active && r.contains(amount))
            .collect();

        match ApprovalEngine::find_rule(&rules, company_id, amount) {
            None => prop_assert!(matching.is_empty()),
            Some(found) => {
                prop_assert!(found.is_active);
                prop_assert!(found.contains(amount));
                let best = matching.iter().map(|r| r.min_amount).max().flatten();
                prop_assert_eq!(found.min_amount, best);
            }
        }
    }

    /// Rules of other companies never match.
    #[test]
    fn prop_find_rule_is_company_scoped(
        (company_id, rules) in company_and_rules(),
        amount in arb_amount(),
    ) {
        prop_assert!(ApprovalEngine::find_rule(&rules, CompanyId::new(), amount).is_none());
        if let Some(found) = ApprovalEngine::find_rule(&rules, company_id, amount) {
            prop_assert_eq!(found.company_id, company_id);
        }
    }

    /// An active open-ended rule guarantees a match.
    #[test]
    fn prop_catch_all_always_matches(
        (company_id, mut rules) in company_and_rules(),
        amount in arb_amount(),
    ) {
        rules.push(rule(company_id, "catch-all", None, None));
        prop_assert!(ApprovalEngine::find_rule(&rules, company_id, amount).is_some());
    }
}
