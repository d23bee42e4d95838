//! Notebook and note tree ordering
//!
//! Notebooks are reordered at the root; notes are reordered within a
//! notebook or moved between notebooks. Because the notebook store keeps no
//! order, both levels are persisted as explicit lists in a
//! [`CustomDataStore`] and reconciled against the live contents on every
//! read.

use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{Instrument, debug, error, info, warn};

use super::reconcile::{reconcile_order, splice_move};
use super::store::CustomDataStore;
use super::transition::{NoTransition, ViewTransition, run_in_transition};
use super::{BusyGuard, spawn_drop};
use crate::dnd::{DropPosition, GestureEvent, ZoneListener, keys, landing_index, lock_or_recover};
use crate::error::{OrderError, OrderResult};
use crate::trace_operation;
use crate::tracing::span_names;

/// Payload stored under [`keys::TREE_NODE`]
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum TreeNode {
    /// A notebook at the root
    Notebook(String),
    /// A note inside some notebook
    Note(String),
}

impl TreeNode {
    /// Returns true if this node can be dropped on the list of `notebook`
    ///
    /// Notebooks belong in the root list (`None`), notes in a notebook's
    /// note list.
    #[must_use]
    pub const fn fits(&self, notebook: Option<&str>) -> bool {
        matches!(
            (self, notebook),
            (Self::Notebook(_), None) | (Self::Note(_), Some(_))
        )
    }
}

/// Notebook collection the applier mutates
#[async_trait]
pub trait NotebookService: Send + Sync {
    /// Notebook ids in natural (creation) order
    async fn notebook_ids(&self) -> OrderResult<Vec<String>>;

    /// Resource ids in a notebook, natural order
    async fn contents(&self, notebook: &str) -> OrderResult<Vec<String>>;

    /// Adds a resource to a notebook
    async fn add_resource(&self, notebook: &str, resource: &str) -> OrderResult<()>;

    /// Removes a resource from a notebook
    async fn remove_resource(&self, notebook: &str, resource: &str) -> OrderResult<()>;
}

/// Result of a tree move
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeMoveOutcome {
    /// Another tree move was in progress; nothing was done
    Busy,
    /// The dragged node or the target notebook no longer exists
    Stale,
    /// Nothing to do
    Unchanged,
    /// Reordered within the same list
    Reordered {
        /// Final index
        index: usize,
    },
    /// Note moved to another notebook
    Transferred {
        /// Source notebook
        from: String,
        /// Target notebook
        to: String,
        /// Index in the target notebook
        index: usize,
    },
}

/// Applies notebook-tree drops
///
/// Clones share the busy flag.
#[derive(Clone)]
pub struct NotebookTreeApplier {
    notebooks: Arc<dyn NotebookService>,
    store: Arc<dyn CustomDataStore>,
    transition: Arc<dyn ViewTransition>,
    busy: Arc<AtomicBool>,
}

impl NotebookTreeApplier {
    /// Creates an applier without a visual transition
    #[must_use]
    pub fn new(notebooks: Arc<dyn NotebookService>, store: Arc<dyn CustomDataStore>) -> Self {
        Self::with_transition(notebooks, store, Arc::new(NoTransition))
    }

    /// Creates an applier that brackets mutations with `transition`
    #[must_use]
    pub fn with_transition(
        notebooks: Arc<dyn NotebookService>,
        store: Arc<dyn CustomDataStore>,
        transition: Arc<dyn ViewTransition>,
    ) -> Self {
        Self {
            notebooks,
            store,
            transition,
            busy: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Root notebook order, reconciled against the existing notebooks
    ///
    /// # Errors
    ///
    /// Propagates service and store failures.
    pub async fn notebook_order(&self) -> OrderResult<Vec<String>> {
        let existing = self.notebooks.notebook_ids().await?;
        let data = self.store.get_custom_data().await?;
        Ok(reconcile_order(&data.notebook_order, &existing))
    }

    /// Note order of `notebook`, reconciled against its contents
    ///
    /// # Errors
    ///
    /// Propagates service and store failures.
    pub async fn note_order(&self, notebook: &str) -> OrderResult<Vec<String>> {
        let existing = self.notebooks.contents(notebook).await?;
        let data = self.store.get_custom_data().await?;
        let stored = data.note_orders.get(notebook).map_or(&[][..], Vec::as_slice);
        Ok(reconcile_order(stored, &existing))
    }

    /// Notebook currently containing `note`, found by scanning contents
    ///
    /// # Errors
    ///
    /// Propagates service failures.
    pub async fn find_note_owner(&self, note: &str) -> OrderResult<Option<String>> {
        for notebook in self.notebooks.notebook_ids().await? {
            if self.notebooks.contents(&notebook).await?.iter().any(|id| id == note) {
                return Ok(Some(notebook));
            }
        }
        Ok(None)
    }

    /// Moves a notebook to `target` of the root order
    ///
    /// `None` is a no-op.
    ///
    /// # Errors
    ///
    /// Propagates service and store failures.
    pub async fn move_notebook(
        &self,
        notebook: &str,
        target: Option<usize>,
    ) -> OrderResult<TreeMoveOutcome> {
        let Some(_guard) = BusyGuard::try_acquire(&self.busy) else {
            debug!(notebook, "Tree move already in progress, ignoring");
            return Ok(TreeMoveOutcome::Busy);
        };
        let span = trace_operation!(span_names::NOTEBOOK_REORDER, notebook_id = notebook);
        self.reorder_notebook(notebook, target).instrument(span).await
    }

    /// Moves `note` to `target` of `notebook`
    ///
    /// Within the same notebook this is a reorder and `None` is a no-op.
    /// Across notebooks, `None` appends.
    ///
    /// # Errors
    ///
    /// Propagates service and store failures. A failed removal from the
    /// source notebook is compensated by removing the note from the target
    /// again before the error is returned.
    pub async fn move_note(
        &self,
        note: &str,
        notebook: &str,
        target: Option<usize>,
    ) -> OrderResult<TreeMoveOutcome> {
        let Some(_guard) = BusyGuard::try_acquire(&self.busy) else {
            debug!(note, "Tree move already in progress, ignoring");
            return Ok(TreeMoveOutcome::Busy);
        };
        let span = trace_operation!(span_names::NOTE_MOVE, note_id = note, notebook_id = notebook);
        self.relocate_note(note, notebook, target).instrument(span).await
    }

    async fn reorder_notebook(
        &self,
        notebook: &str,
        target: Option<usize>,
    ) -> OrderResult<TreeMoveOutcome> {
        let mut order = self.notebook_order().await?;
        let Some(current) = order.iter().position(|id| id == notebook) else {
            warn!("Dropped notebook no longer exists");
            return Ok(TreeMoveOutcome::Stale);
        };
        let Some(target) = target else {
            return Ok(TreeMoveOutcome::Unchanged);
        };
        let index = target.min(order.len() - 1);
        if index == current {
            return Ok(TreeMoveOutcome::Unchanged);
        }

        splice_move(&mut order, current, index);
        run_in_transition(self.transition.as_ref(), self.persist_notebook_order(order)).await?;
        info!(index, "Notebook reordered");
        Ok(TreeMoveOutcome::Reordered { index })
    }

    async fn relocate_note(
        &self,
        note: &str,
        notebook: &str,
        target: Option<usize>,
    ) -> OrderResult<TreeMoveOutcome> {
        let Some(source) = self.find_note_owner(note).await? else {
            warn!("Dropped note no longer exists");
            return Ok(TreeMoveOutcome::Stale);
        };
        if !self.notebooks.notebook_ids().await?.iter().any(|id| id == notebook) {
            warn!("Target notebook no longer exists");
            return Ok(TreeMoveOutcome::Stale);
        }

        if source != notebook {
            let index = run_in_transition(
                self.transition.as_ref(),
                self.transfer_note(note, &source, notebook, target),
            )
            .await?;
            info!(from = %source, index, "Note moved to another notebook");
            return Ok(TreeMoveOutcome::Transferred {
                from: source,
                to: notebook.to_string(),
                index,
            });
        }

        let mut order = self.note_order(notebook).await?;
        let Some(current) = order.iter().position(|id| id == note) else {
            return Ok(TreeMoveOutcome::Stale);
        };
        let Some(target) = target else {
            return Ok(TreeMoveOutcome::Unchanged);
        };
        let index = target.min(order.len() - 1);
        if index == current {
            return Ok(TreeMoveOutcome::Unchanged);
        }
        splice_move(&mut order, current, index);
        run_in_transition(
            self.transition.as_ref(),
            self.persist_note_orders(vec![(notebook.to_string(), order)]),
        )
        .await?;
        info!(index, "Note reordered");
        Ok(TreeMoveOutcome::Reordered { index })
    }

    /// Add to target, remove from source, then rebuild both order lists
    async fn transfer_note(
        &self,
        note: &str,
        source: &str,
        target: &str,
        index: Option<usize>,
    ) -> OrderResult<usize> {
        let source_before = self.note_order(source).await?;
        let target_before = self.note_order(target).await?;

        self.notebooks.add_resource(target, note).await?;
        if let Err(e) = self.notebooks.remove_resource(source, note).await {
            warn!(error = %e, "Removing note from source failed, rolling back");
            if let Err(rollback) = self.notebooks.remove_resource(target, note).await {
                error!(error = %rollback, "Rollback failed, note is in both notebooks");
            }
            return Err(e);
        }

        let source_contents = self.notebooks.contents(source).await?;
        let target_contents = self.notebooks.contents(target).await?;

        let remaining: Vec<String> = source_before.into_iter().filter(|id| id != note).collect();
        let source_order = reconcile_order(&remaining, &source_contents);

        let mut target_order: Vec<String> =
            target_before.into_iter().filter(|id| id != note).collect();
        let index = index.map_or(target_order.len(), |i| i.min(target_order.len()));
        target_order.insert(index, note.to_string());
        let target_order = reconcile_order(&target_order, &target_contents);

        self.persist_note_orders(vec![
            (source.to_string(), source_order),
            (target.to_string(), target_order),
        ])
        .await?;
        Ok(index)
    }

    async fn persist_notebook_order(&self, order: Vec<String>) -> OrderResult<()> {
        let mut data = self.store.get_custom_data().await?;
        data.notebook_order = order;
        self.store.update_custom_data(data).await
    }

    async fn persist_note_orders(&self, orders: Vec<(String, Vec<String>)>) -> OrderResult<()> {
        let mut data = self.store.get_custom_data().await?;
        data.note_orders.extend(orders);
        self.store.update_custom_data(data).await
    }

    /// Handles a drop on a tree list and proceeds the event
    ///
    /// `notebook` is the notebook whose note list received the drop, or
    /// `None` for the root notebook list. The event's index hint is the
    /// hovered row. Events without a tree-node payload, or carrying a node
    /// of the wrong kind for the list, are aborted.
    ///
    /// # Errors
    ///
    /// Propagates service and store failures after proceeding the event.
    pub async fn handle_drop(
        &self,
        event: &GestureEvent,
        notebook: Option<&str>,
    ) -> OrderResult<TreeMoveOutcome> {
        let Some(node) = event
            .data()
            .and_then(|d| d.get::<TreeNode>(keys::TREE_NODE))
            .cloned()
        else {
            event.abort();
            return Ok(TreeMoveOutcome::Stale);
        };
        if !node.fits(notebook) {
            debug!(?node, ?notebook, "Tree node dropped on a list of the other kind");
            event.abort();
            return Ok(TreeMoveOutcome::Unchanged);
        }
        let result = self.drop_node(&node, event, notebook).await;
        event.proceed();
        result
    }

    async fn drop_node(
        &self,
        node: &TreeNode,
        event: &GestureEvent,
        notebook: Option<&str>,
    ) -> OrderResult<TreeMoveOutcome> {
        let row = event.index();
        let position = event.drop_position().unwrap_or(DropPosition::Before);
        match (node, notebook) {
            (TreeNode::Notebook(id), None) => {
                let order = self.notebook_order().await?;
                let Some(current) = order.iter().position(|n| n == id) else {
                    warn!(notebook_id = %id, "Dropped notebook no longer exists");
                    return Ok(TreeMoveOutcome::Stale);
                };
                let target = row.map(|r| landing_index(r, position, current));
                self.move_notebook(id, target).await
            }
            (TreeNode::Note(note), Some(target_notebook)) => {
                let owner = self.find_note_owner(note).await?;
                let target = if owner.as_deref() == Some(target_notebook) {
                    let order = self.note_order(target_notebook).await?;
                    let current = order.iter().position(|n| n == note);
                    row.zip(current)
                        .map(|(r, c)| landing_index(r, position, c))
                } else {
                    row.map(|r| if position == DropPosition::After { r + 1 } else { r })
                };
                self.move_note(note, target_notebook, target).await
            }
            // handle_drop only forwards nodes that fit the list
            _ => Ok(TreeMoveOutcome::Unchanged),
        }
    }
}

/// Zone listener for one list of the notebook tree
///
/// `notebook: None` is the root notebook list; `Some(id)` is the note list
/// of that notebook.
#[derive(Clone)]
pub struct NotebookZone {
    applier: NotebookTreeApplier,
    notebook: Option<String>,
}

impl NotebookZone {
    /// Listener for the root notebook list
    #[must_use]
    pub const fn root(applier: NotebookTreeApplier) -> Self {
        Self {
            applier,
            notebook: None,
        }
    }

    /// Listener for the note list of `notebook`
    #[must_use]
    pub fn notes(applier: NotebookTreeApplier, notebook: impl Into<String>) -> Self {
        Self {
            applier,
            notebook: Some(notebook.into()),
        }
    }
}

impl ZoneListener for NotebookZone {
    fn on_drop(&self, event: &GestureEvent) {
        let zone = self.clone();
        let handle = event.clone();
        spawn_drop(event, async move {
            if let Err(e) = zone.applier.handle_drop(&handle, zone.notebook.as_deref()).await {
                warn!(error = %e, "Tree drop failed");
            }
        });
    }
}

/// One notebook and its notes, natural order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotebookEntry {
    /// Notebook id
    pub id: String,
    /// Note ids
    #[serde(default)]
    pub notes: Vec<String>,
}

impl NotebookEntry {
    /// Creates an entry
    #[must_use]
    pub fn new(id: impl Into<String>, notes: &[&str]) -> Self {
        Self {
            id: id.into(),
            notes: notes.iter().map(ToString::to_string).collect(),
        }
    }
}

/// Notebooks kept in memory
#[derive(Debug, Default)]
pub struct InMemoryNotebooks {
    notebooks: Mutex<Vec<NotebookEntry>>,
    failing_removals: Mutex<Option<String>>,
}

impl InMemoryNotebooks {
    /// Creates the collection
    #[must_use]
    pub fn new(notebooks: Vec<NotebookEntry>) -> Self {
        Self {
            notebooks: Mutex::new(notebooks),
            failing_removals: Mutex::new(None),
        }
    }

    /// Current notebooks
    #[must_use]
    pub fn snapshot(&self) -> Vec<NotebookEntry> {
        lock_or_recover(&self.notebooks).clone()
    }

    /// Makes `remove_resource` fail for `notebook` (`None` clears it)
    pub fn fail_removals_from(&self, notebook: Option<&str>) {
        *lock_or_recover(&self.failing_removals) = notebook.map(ToString::to_string);
    }
}

#[async_trait]
impl NotebookService for InMemoryNotebooks {
    async fn notebook_ids(&self) -> OrderResult<Vec<String>> {
        Ok(lock_or_recover(&self.notebooks)
            .iter()
            .map(|nb| nb.id.clone())
            .collect())
    }

    async fn contents(&self, notebook: &str) -> OrderResult<Vec<String>> {
        lock_or_recover(&self.notebooks)
            .iter()
            .find(|nb| nb.id == notebook)
            .map(|nb| nb.notes.clone())
            .ok_or_else(|| OrderError::not_found("notebook", notebook))
    }

    async fn add_resource(&self, notebook: &str, resource: &str) -> OrderResult<()> {
        let mut notebooks = lock_or_recover(&self.notebooks);
        let entry = notebooks
            .iter_mut()
            .find(|nb| nb.id == notebook)
            .ok_or_else(|| OrderError::not_found("notebook", notebook))?;
        if !entry.notes.iter().any(|n| n == resource) {
            entry.notes.push(resource.to_string());
        }
        Ok(())
    }

    async fn remove_resource(&self, notebook: &str, resource: &str) -> OrderResult<()> {
        if lock_or_recover(&self.failing_removals).as_deref() == Some(notebook) {
            return Err(OrderError::service("remove_resource", "removal disabled"));
        }
        let mut notebooks = lock_or_recover(&self.notebooks);
        let entry = notebooks
            .iter_mut()
            .find(|nb| nb.id == notebook)
            .ok_or_else(|| OrderError::not_found("notebook", notebook))?;
        let before = entry.notes.len();
        entry.notes.retain(|n| n != resource);
        if entry.notes.len() == before {
            return Err(OrderError::not_found("note", resource));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dnd::{
        DragData, DragItem, DragOperation, DragPayload, EventContext, GestureKind, RejectReason,
        Verdict,
    };
    use crate::order::{CountingTransition, CustomData, MemoryCustomDataStore};

    struct Fixture {
        notebooks: Arc<InMemoryNotebooks>,
        store: Arc<MemoryCustomDataStore>,
        transition: Arc<CountingTransition>,
        applier: NotebookTreeApplier,
    }

    fn fixture() -> Fixture {
        let notebooks = Arc::new(InMemoryNotebooks::new(vec![
            NotebookEntry::new("X", &["N", "P"]),
            NotebookEntry::new("Y", &["Q", "R"]),
            NotebookEntry::new("Z", &[]),
        ]));
        let store = Arc::new(MemoryCustomDataStore::default());
        let transition = Arc::new(CountingTransition::new());
        let applier =
            NotebookTreeApplier::with_transition(notebooks.clone(), store.clone(), transition.clone());
        Fixture {
            notebooks,
            store,
            transition,
            applier,
        }
    }

    #[tokio::test]
    async fn test_cross_notebook_move() {
        let f = fixture();
        let outcome = f.applier.move_note("N", "Y", Some(1)).await.unwrap();
        assert_eq!(
            outcome,
            TreeMoveOutcome::Transferred {
                from: "X".to_string(),
                to: "Y".to_string(),
                index: 1
            }
        );
        assert_eq!(f.applier.note_order("X").await.unwrap(), vec!["P"]);
        assert_eq!(f.applier.note_order("Y").await.unwrap(), vec!["Q", "N", "R"]);
        assert_eq!(f.transition.begins(), 1);
        assert_eq!(f.transition.completes(), 1);
    }

    #[tokio::test]
    async fn test_cross_notebook_without_index_appends() {
        let f = fixture();
        f.applier.move_note("P", "Y", None).await.unwrap();
        assert_eq!(f.applier.note_order("Y").await.unwrap(), vec!["Q", "R", "P"]);
    }

    #[tokio::test]
    async fn test_same_notebook_reorder_persists() {
        let f = fixture();
        let outcome = f.applier.move_note("N", "X", Some(1)).await.unwrap();
        assert_eq!(outcome, TreeMoveOutcome::Reordered { index: 1 });
        assert_eq!(
            f.store.snapshot().note_orders.get("X"),
            Some(&vec!["P".to_string(), "N".to_string()])
        );
        // natural order in the service is untouched
        assert_eq!(f.notebooks.snapshot()[0].notes, vec!["N", "P"]);
    }

    #[tokio::test]
    async fn test_same_position_and_missing_index_are_noops() {
        let f = fixture();
        assert_eq!(
            f.applier.move_note("P", "X", Some(1)).await.unwrap(),
            TreeMoveOutcome::Unchanged
        );
        assert_eq!(
            f.applier.move_notebook("Y", None).await.unwrap(),
            TreeMoveOutcome::Unchanged
        );
        assert_eq!(f.transition.begins(), 0);
        assert_eq!(f.store.snapshot(), CustomData::default());
    }

    #[tokio::test]
    async fn test_notebook_reorder_uses_reconciled_order() {
        let f = fixture();
        f.store
            .update_custom_data(CustomData {
                notebook_order: vec!["Z".into(), "gone".into(), "X".into()],
                ..CustomData::default()
            })
            .await
            .unwrap();
        assert_eq!(f.applier.notebook_order().await.unwrap(), vec!["Z", "X", "Y"]);

        f.applier.move_notebook("Y", Some(0)).await.unwrap();
        assert_eq!(f.applier.notebook_order().await.unwrap(), vec!["Y", "Z", "X"]);
    }

    #[tokio::test]
    async fn test_failed_source_removal_is_compensated() {
        let f = fixture();
        f.notebooks.fail_removals_from(Some("X"));
        let err = f.applier.move_note("N", "Y", Some(0)).await.unwrap_err();
        assert!(matches!(err, OrderError::Service { .. }));
        let snapshot = f.notebooks.snapshot();
        assert_eq!(snapshot[0].notes, vec!["N", "P"]);
        assert_eq!(snapshot[1].notes, vec!["Q", "R"]);
        assert_eq!(f.transition.completes(), 1);
        assert!(BusyGuard::try_acquire(&f.applier.busy).is_some());
    }

    #[tokio::test]
    async fn test_stale_note_and_notebook() {
        let f = fixture();
        assert_eq!(
            f.applier.move_note("ghost", "X", Some(0)).await.unwrap(),
            TreeMoveOutcome::Stale
        );
        assert_eq!(
            f.applier.move_note("N", "nowhere", Some(0)).await.unwrap(),
            TreeMoveOutcome::Stale
        );
        assert_eq!(
            f.applier.move_notebook("ghost", Some(0)).await.unwrap(),
            TreeMoveOutcome::Stale
        );
    }

    #[tokio::test]
    async fn test_busy_tree_applier() {
        let f = fixture();
        let _held = BusyGuard::try_acquire(&f.applier.busy).unwrap();
        assert_eq!(
            f.applier.move_notebook("Y", Some(0)).await.unwrap(),
            TreeMoveOutcome::Busy
        );
    }

    #[tokio::test]
    async fn test_mismatched_node_kind_is_aborted() {
        let f = fixture();
        let drop_node = |node: TreeNode| {
            let item = DragItem::new(DragData::new().with(keys::TREE_NODE, node));
            let mut op = DragOperation::new(None, DragPayload::Item(item));
            op.index = Some(0);
            GestureEvent::new(GestureKind::Drop, op, EventContext::default())
        };

        let (event, settlement) = drop_node(TreeNode::Notebook("Y".into()));
        let outcome = f.applier.handle_drop(&event, Some("X")).await.unwrap();
        assert_eq!(outcome, TreeMoveOutcome::Unchanged);
        assert_eq!(settlement.await, Verdict::Rejected(RejectReason::Aborted));

        let (event, settlement) = drop_node(TreeNode::Note("N".into()));
        let outcome = f.applier.handle_drop(&event, None).await.unwrap();
        assert_eq!(outcome, TreeMoveOutcome::Unchanged);
        assert_eq!(settlement.await, Verdict::Rejected(RejectReason::Aborted));

        assert_eq!(f.transition.begins(), 0);
        assert_eq!(f.store.snapshot(), CustomData::default());
    }

    #[test]
    fn test_tree_node_fits_its_list() {
        assert!(TreeNode::Notebook("X".into()).fits(None));
        assert!(!TreeNode::Notebook("X".into()).fits(Some("X")));
        assert!(TreeNode::Note("N".into()).fits(Some("X")));
        assert!(!TreeNode::Note("N".into()).fits(None));
    }

    #[test]
    fn test_tree_node_wire_format() {
        let json = serde_json::to_string(&TreeNode::Note("n1".into())).unwrap();
        assert_eq!(json, r#"{"kind":"note","id":"n1"}"#);
    }
}
