//! Ordering appliers
//!
//! Appliers are the domain consumers of completed drops: they turn a drop on
//! a tab strip or a notebook tree into mutations of the backing collections.
//! Each applier runs at most one mutation at a time; an overlapping drop is
//! a no-op that still proceeds its gesture event.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::warn;

use crate::dnd::GestureEvent;

mod reconcile;
mod store;
mod tabs;
mod transition;
mod tree;

pub use reconcile::{reconcile_order, splice_move};
pub use store::{CustomData, CustomDataStore, JsonCustomDataStore, MemoryCustomDataStore};
pub use tabs::{
    InMemoryTabs, PinChange, TabEntry, TabMoveOutcome, TabMovePlan, TabOrderApplier, TabService,
    canonical_order, plan_tab_move,
};
pub use transition::{CountingTransition, NoTransition, ViewTransition};
pub use tree::{
    InMemoryNotebooks, NotebookEntry, NotebookService, NotebookTreeApplier, NotebookZone,
    TreeMoveOutcome, TreeNode,
};

/// Busy flag held for the duration of one applier mutation
#[derive(Debug)]
pub(crate) struct BusyGuard(Arc<AtomicBool>);

impl BusyGuard {
    /// Takes the flag, or returns `None` if another mutation holds it
    pub(crate) fn try_acquire(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(Arc::clone(flag)))
    }
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Runs a drop handler on the current tokio runtime
///
/// Outside a runtime the drop cannot be handled and is aborted.
pub(crate) fn spawn_drop<F>(event: &GestureEvent, task: F)
where
    F: Future<Output = ()> + Send + 'static,
{
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => {
            handle.spawn(task);
        }
        Err(_) => {
            warn!("Drop received outside a tokio runtime, rejecting");
            event.abort();
        }
    }
}
