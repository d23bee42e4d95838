//! Notebook tree drops and applier concurrency

use std::sync::Arc;

use async_trait::async_trait;
use dragcula_core::{
    CustomDataStore, DndSettings, DragData, DragItem, Dragcula, DropOutcome, ElementTree,
    InMemoryNotebooks, JsonCustomDataStore, MemoryCustomDataStore, Modifiers, NotebookEntry,
    NotebookTreeApplier, NotebookZone, Point, Rect, RowKind, TreeMoveOutcome, TreeNode,
    ViewTransition, ZoneOptions, keys,
};
use tempfile::TempDir;

/// Transition that yields once before the mutation starts
struct YieldingTransition;

#[async_trait]
impl ViewTransition for YieldingTransition {
    async fn begin(&self) {
        tokio::task::yield_now().await;
    }

    async fn complete(&self) {}
}

fn notebooks() -> Arc<InMemoryNotebooks> {
    Arc::new(InMemoryNotebooks::new(vec![
        NotebookEntry::new("X", &["N", "P"]),
        NotebookEntry::new("Y", &["Q", "R"]),
    ]))
}

fn tree_node(node: TreeNode) -> DragItem {
    DragItem::new(DragData::new().with(keys::TREE_NODE, node))
}

#[tokio::test]
async fn test_dragging_note_into_other_notebook_persists_both_orders() {
    let temp = TempDir::new().unwrap();
    let store = Arc::new(JsonCustomDataStore::new(temp.path().join("custom-data.json")));
    let nbs = notebooks();
    let applier = NotebookTreeApplier::new(nbs.clone(), store.clone());

    let mut tree = ElementTree::new();
    let sidebar = tree.insert(None, Rect::new(0.0, 0.0, 240.0, 400.0));
    let x_notes = tree.insert(Some(sidebar), Rect::new(0.0, 0.0, 240.0, 64.0));
    let y_notes = tree.insert(Some(sidebar), Rect::new(0.0, 100.0, 240.0, 64.0));

    let dnd = Dragcula::new(tree, DndSettings::default());
    let accepts_node = || ZoneOptions::new().accepts_key(keys::TREE_NODE).list(2, RowKind::Leaf);
    let x_zone = dnd
        .register_zone(
            x_notes,
            accepts_node(),
            Arc::new(NotebookZone::notes(applier.clone(), "X")),
        )
        .unwrap();
    let y_zone = dnd
        .register_zone(
            y_notes,
            accepts_node(),
            Arc::new(NotebookZone::notes(applier.clone(), "Y")),
        )
        .unwrap();

    dnd.start_drag(
        tree_node(TreeNode::Note("N".into())),
        Some(x_zone),
        Point::new(20.0, 10.0),
        Modifiers::NONE,
    )
    .unwrap();
    // row 0 of Y, lower half: lands between Q and R
    let outcome = dnd.release(Point::new(20.0, 120.0), Modifiers::NONE).await;
    assert_eq!(outcome, DropOutcome::Accepted(y_zone));

    let snapshot = nbs.snapshot();
    assert_eq!(snapshot[0].notes, vec!["P"]);
    assert!(snapshot[1].notes.contains(&"N".to_string()));

    let data = store.get_custom_data().await.unwrap();
    assert_eq!(data.note_orders["X"], vec!["P"]);
    assert_eq!(data.note_orders["Y"], vec!["Q", "N", "R"]);

    // a fresh applier over the same file sees the persisted order
    let reopened = NotebookTreeApplier::new(
        nbs.clone(),
        Arc::new(JsonCustomDataStore::new(store.path().to_path_buf())),
    );
    assert_eq!(reopened.note_order("Y").await.unwrap(), vec!["Q", "N", "R"]);
}

#[tokio::test]
async fn test_notebook_dragged_onto_root_list_reorders() {
    let store = Arc::new(MemoryCustomDataStore::default());
    let applier = NotebookTreeApplier::new(notebooks(), store.clone());

    let mut tree = ElementTree::new();
    let root_list = tree.insert(None, Rect::new(0.0, 0.0, 240.0, 64.0));
    let dnd = Dragcula::new(tree, DndSettings::default());
    let zone = dnd
        .register_zone(
            root_list,
            ZoneOptions::new()
                .accepts_key(keys::TREE_NODE)
                .list(2, RowKind::Container),
            Arc::new(NotebookZone::root(applier.clone())),
        )
        .unwrap();

    dnd.start_drag(
        tree_node(TreeNode::Notebook("Y".into())),
        Some(zone),
        Point::new(10.0, 40.0),
        Modifiers::NONE,
    )
    .unwrap();
    // top band of row 0
    let outcome = dnd.release(Point::new(10.0, 2.0), Modifiers::NONE).await;
    assert!(outcome.is_accepted());
    assert_eq!(applier.notebook_order().await.unwrap(), vec!["Y", "X"]);
    assert_eq!(store.snapshot().notebook_order, vec!["Y", "X"]);
}

#[tokio::test]
async fn test_concurrent_moves_only_apply_the_first() {
    let store = Arc::new(MemoryCustomDataStore::default());
    let applier = NotebookTreeApplier::with_transition(
        notebooks(),
        store.clone(),
        Arc::new(YieldingTransition),
    );

    let (first, second) = futures::future::join(
        applier.move_notebook("Y", Some(0)),
        applier.move_notebook("X", Some(1)),
    )
    .await;

    assert_eq!(first.unwrap(), TreeMoveOutcome::Reordered { index: 0 });
    assert_eq!(second.unwrap(), TreeMoveOutcome::Busy);
    assert_eq!(store.snapshot().notebook_order, vec!["Y", "X"]);

    // the guard is released afterwards
    assert_eq!(
        applier.move_notebook("X", Some(0)).await.unwrap(),
        TreeMoveOutcome::Reordered { index: 0 }
    );
}

#[tokio::test]
async fn test_failed_removal_rolls_back_added_note() {
    let nbs = notebooks();
    nbs.fail_removals_from(Some("X"));
    let applier = NotebookTreeApplier::new(nbs.clone(), Arc::new(MemoryCustomDataStore::default()));

    assert!(applier.move_note("N", "Y", Some(0)).await.is_err());
    let snapshot = nbs.snapshot();
    assert_eq!(snapshot[0].notes, vec!["N", "P"]);
    assert_eq!(snapshot[1].notes, vec!["Q", "R"]);

    nbs.fail_removals_from(None);
    assert!(matches!(
        applier.move_note("N", "Y", None).await.unwrap(),
        TreeMoveOutcome::Transferred { index: 2, .. }
    ));
}
