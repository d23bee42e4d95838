//! Property-based tests for order-list reconciliation

use std::collections::HashSet;

use dragcula_core::reconcile_order;
use proptest::prelude::*;

/// Small id alphabet so stored and existing lists overlap often
fn id_list() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[a-h]", 0..12)
}

fn unique(ids: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    ids.into_iter().filter(|id| seen.insert(id.clone())).collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// The result is a permutation of the existing ids
    #[test]
    fn prop_result_is_permutation_of_existing(stored in id_list(), existing in id_list()) {
        let existing = unique(existing);
        let order = reconcile_order(&stored, &existing);

        let mut sorted_order = order.clone();
        sorted_order.sort();
        let mut sorted_existing = existing.clone();
        sorted_existing.sort();
        prop_assert_eq!(sorted_order, sorted_existing);
    }

    /// Valid stored ids keep their relative order and come first
    #[test]
    fn prop_stored_prefix_preserved(stored in id_list(), existing in id_list()) {
        let existing = unique(existing);
        let live: HashSet<&String> = existing.iter().collect();
        let expected_prefix = unique(stored.into_iter().filter(|id| live.contains(id)).collect());

        let order = reconcile_order(&expected_prefix, &existing);
        prop_assert_eq!(&order[..expected_prefix.len()], &expected_prefix[..]);
    }

    /// Missing ids are appended in natural order
    #[test]
    fn prop_new_ids_appended_in_natural_order(stored in id_list(), existing in id_list()) {
        let existing = unique(existing);
        let order = reconcile_order(&stored, &existing);
        let stored_set: HashSet<&String> = stored.iter().collect();
        let appended: Vec<&String> = existing.iter().filter(|id| !stored_set.contains(id)).collect();
        let tail: Vec<&String> = order[order.len() - appended.len()..].iter().collect();
        prop_assert_eq!(tail, appended);
    }

    /// Reconciling twice changes nothing
    #[test]
    fn prop_reconcile_is_idempotent(stored in id_list(), existing in id_list()) {
        let existing = unique(existing);
        let once = reconcile_order(&stored, &existing);
        prop_assert_eq!(reconcile_order(&once, &existing), once);
    }
}

#[test]
fn deleted_id_is_dropped_and_new_one_appended() {
    let stored: Vec<String> = ["b", "deleted", "a"].iter().map(ToString::to_string).collect();
    let existing: Vec<String> = ["a", "b", "c"].iter().map(ToString::to_string).collect();
    assert_eq!(reconcile_order(&stored, &existing), vec!["b", "a", "c"]);
}
