//! Order-list reconciliation
//!
//! Persisted order lists drift from the backing collection when entries are
//! created or deleted elsewhere. Reconciling keeps the stored order for ids
//! that still exist and appends the rest in their natural order.

use std::collections::HashSet;
use std::hash::Hash;

/// Reconciles a stored order against the ids that currently exist
///
/// Ids no longer present in `existing`, and repeated ids, are dropped. Ids in
/// `existing` that the stored order does not mention are appended in the
/// order `existing` lists them.
#[must_use]
pub fn reconcile_order<T>(stored: &[T], existing: &[T]) -> Vec<T>
where
    T: Eq + Hash + Clone,
{
    let live: HashSet<&T> = existing.iter().collect();
    let mut seen: HashSet<&T> = HashSet::with_capacity(existing.len());
    let mut order = Vec::with_capacity(existing.len());

    for id in stored {
        if live.contains(id) && seen.insert(id) {
            order.push(id.clone());
        }
    }
    for id in existing {
        if seen.insert(id) {
            order.push(id.clone());
        }
    }
    order
}

/// Moves the entry at `from` to `to`, clamping `to` to the list
///
/// Returns false (and leaves the list alone) if `from` is out of range.
pub fn splice_move<T>(order: &mut Vec<T>, from: usize, to: usize) -> bool {
    if from >= order.len() {
        return false;
    }
    let item = order.remove(from);
    let to = to.min(order.len());
    order.insert(to, item);
    true
}
