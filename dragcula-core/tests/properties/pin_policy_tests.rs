//! Property-based tests for the tab pin policy
//!
//! Whatever the drop, applying the plan must leave a pinned-first list in
//! which the dragged tab sits at the planned index with the planned state.

use dragcula_core::{
    DropPosition, PinChange, TabEntry, canonical_order, plan_tab_move,
};
use dragcula_core::order::TabMovePlan;
use proptest::prelude::*;

fn tabs_strategy() -> impl Strategy<Value = Vec<TabEntry>> {
    prop::collection::vec(any::<bool>(), 1..10).prop_map(|flags| {
        flags
            .into_iter()
            .enumerate()
            .map(|(i, pinned)| TabEntry::new(format!("t{i}"), pinned))
            .collect()
    })
}

fn position_strategy() -> impl Strategy<Value = DropPosition> {
    prop_oneof![
        Just(DropPosition::Before),
        Just(DropPosition::After),
        Just(DropPosition::On),
    ]
}

/// Applies a plan the way the in-memory tab service does
fn apply(tabs: &[TabEntry], id: &str, pin: PinChange, index: usize) -> Vec<TabEntry> {
    let mut list = canonical_order(tabs);
    if let Some(tab) = list.iter_mut().find(|t| t.id == id) {
        match pin {
            PinChange::Pin => tab.pinned = true,
            PinChange::Unpin => tab.pinned = false,
            PinChange::Keep => {}
        }
    }
    let mut list = canonical_order(&list);
    let from = list.iter().position(|t| t.id == id).unwrap();
    let tab = list.remove(from);
    list.insert(index.min(list.len()), tab);
    canonical_order(&list)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Planned moves land exactly where planned, without re-partitioning
    #[test]
    fn prop_plan_lands_at_index(
        tabs in tabs_strategy(),
        pick in any::<usize>(),
        target in 0usize..12,
        position in position_strategy(),
    ) {
        let id = tabs[pick % tabs.len()].id.clone();
        match plan_tab_move(&tabs, &id, target, position) {
            TabMovePlan::Apply { pin, index } => {
                let result = apply(&tabs, &id, pin, index);
                prop_assert_eq!(result.iter().position(|t| t.id == id), Some(index));
            }
            TabMovePlan::Unchanged => {}
            TabMovePlan::Stale => prop_assert!(false, "existing tab reported stale"),
        }
    }

    /// Targets strictly inside a section decide the pin state alone
    #[test]
    fn prop_section_decides_pin_state(
        tabs in tabs_strategy(),
        pick in any::<usize>(),
        target in 0usize..12,
        position in position_strategy(),
    ) {
        let id = tabs[pick % tabs.len()].id.clone();
        let canonical = canonical_order(&tabs);
        let was_pinned = canonical.iter().any(|t| t.id == id && t.pinned);
        let boundary = canonical.iter().filter(|t| t.pinned && t.id != id).count();
        let target = target.min(canonical.len() - 1);

        let pinned_after = match plan_tab_move(&tabs, &id, target, position) {
            TabMovePlan::Apply { pin: PinChange::Pin, .. } => true,
            TabMovePlan::Apply { pin: PinChange::Unpin, .. } => false,
            _ => was_pinned,
        };
        if target < boundary {
            prop_assert!(pinned_after);
        } else if target > boundary {
            prop_assert!(!pinned_after);
        }
    }

    /// Unknown tabs are always stale
    #[test]
    fn prop_unknown_tab_is_stale(tabs in tabs_strategy(), target in 0usize..12) {
        prop_assert_eq!(
            plan_tab_move(&tabs, "missing", target, DropPosition::Before),
            TabMovePlan::Stale
        );
    }
}

#[test]
fn boundary_scenario_from_two_pinned_three_unpinned() {
    let tabs = vec![
        TabEntry::new("A", true),
        TabEntry::new("B", true),
        TabEntry::new("C", false),
        TabEntry::new("D", false),
        TabEntry::new("E", false),
    ];
    assert_eq!(
        plan_tab_move(&tabs, "D", 2, DropPosition::Before),
        TabMovePlan::Apply { pin: PinChange::Keep, index: 2 }
    );
    assert_eq!(
        plan_tab_move(&tabs, "D", 2, DropPosition::After),
        TabMovePlan::Apply { pin: PinChange::Pin, index: 2 }
    );
}
