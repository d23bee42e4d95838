//! End-to-end gestures: pointer samples through drop and cleanup

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use dragcula_core::{
    DndSettings, DragData, DragItem, Dragcula, DropOutcome, ElementId, ElementTree,
    GlobalDragEvent, InMemoryTabs, InertZone, Modifiers, NativeDragEvent, NativeEventKind,
    NativeTransfer, Point, Rect, RejectReason, RowKind, TabEntry, TabOrderApplier, ZoneKey,
    ZoneOptions, keys,
};

/// Tab strip of five 32px rows above an unrelated panel
struct Window {
    dnd: Dragcula,
    tabs: Arc<InMemoryTabs>,
    strip_zone: ZoneKey,
    panel: ElementId,
}

fn window() -> Window {
    let mut tree = ElementTree::new();
    let root = tree.insert(None, Rect::new(0.0, 0.0, 400.0, 400.0));
    let strip = tree.insert(Some(root), Rect::new(0.0, 0.0, 200.0, 160.0));
    let panel = tree.insert(Some(root), Rect::new(0.0, 200.0, 400.0, 200.0));

    let tabs = Arc::new(InMemoryTabs::new(vec![
        TabEntry::new("A", true),
        TabEntry::new("B", true),
        TabEntry::new("C", false),
        TabEntry::new("D", false),
        TabEntry::new("E", false),
    ]));
    let dnd = Dragcula::new(tree, DndSettings::default());
    let strip_zone = dnd
        .register_zone(
            strip,
            ZoneOptions::new().accepts_key(keys::TAB).list(5, RowKind::Leaf),
            Arc::new(TabOrderApplier::new(tabs.clone())),
        )
        .unwrap();
    Window {
        dnd,
        tabs,
        strip_zone,
        panel,
    }
}

fn tab(id: &str) -> DragItem {
    DragItem::new(DragData::new().with(keys::TAB, id.to_string()))
}

fn ids(tabs: &InMemoryTabs) -> Vec<(String, bool)> {
    tabs.snapshot().into_iter().map(|t| (t.id, t.pinned)).collect()
}

#[tokio::test]
async fn test_drag_tab_before_first_unpinned_row() {
    let w = window();
    w.dnd
        .start_drag(tab("D"), Some(w.strip_zone), Point::new(10.0, 100.0), Modifiers::NONE)
        .unwrap();

    // row 2, upper half
    let outcome = w.dnd.release(Point::new(10.0, 70.0), Modifiers::NONE).await;
    assert_eq!(outcome, DropOutcome::Accepted(w.strip_zone));
    assert_eq!(
        ids(&w.tabs),
        vec![
            ("A".into(), true),
            ("B".into(), true),
            ("D".into(), false),
            ("C".into(), false),
            ("E".into(), false),
        ]
    );
    assert_eq!(w.tabs.mutations(), vec!["reorder D 2"]);
    assert!(!w.dnd.is_dragging());
}

#[tokio::test]
async fn test_drag_tab_after_last_pinned_row_pins_it() {
    let w = window();
    w.dnd
        .start_drag(tab("D"), Some(w.strip_zone), Point::new(10.0, 100.0), Modifiers::NONE)
        .unwrap();

    // row 1, lower half
    let outcome = w.dnd.release(Point::new(10.0, 52.0), Modifiers::NONE).await;
    assert!(outcome.is_accepted());
    assert_eq!(w.tabs.mutations(), vec!["pin D", "reorder D 2"]);
    assert_eq!(ids(&w.tabs)[2], ("D".into(), true));
}

#[tokio::test]
async fn test_drag_tab_onto_its_own_row_changes_nothing() {
    let w = window();

    // C is the first unpinned tab; lower half of row 2
    w.dnd
        .start_drag(tab("C"), Some(w.strip_zone), Point::new(10.0, 80.0), Modifiers::NONE)
        .unwrap();
    assert!(w.dnd.release(Point::new(10.0, 90.0), Modifiers::NONE).await.is_accepted());

    // B is the last pinned tab; upper half of row 1
    w.dnd
        .start_drag(tab("B"), Some(w.strip_zone), Point::new(10.0, 48.0), Modifiers::NONE)
        .unwrap();
    assert!(w.dnd.release(Point::new(10.0, 36.0), Modifiers::NONE).await.is_accepted());

    assert!(w.tabs.mutations().is_empty());
    assert_eq!(
        ids(&w.tabs),
        vec![
            ("A".into(), true),
            ("B".into(), true),
            ("C".into(), false),
            ("D".into(), false),
            ("E".into(), false),
        ]
    );
}

#[tokio::test]
async fn test_payload_without_tab_is_never_targeted() {
    let w = window();
    let item = DragItem::new(DragData::new().with("file", "notes.txt".to_string()));
    w.dnd
        .start_drag(item, None, Point::new(10.0, 10.0), Modifiers::NONE)
        .unwrap();
    assert!(!*w.dnd.has_target().borrow());

    let outcome = w.dnd.release(Point::new(10.0, 70.0), Modifiers::NONE).await;
    assert_eq!(outcome, DropOutcome::NoTarget);
    assert!(w.tabs.mutations().is_empty());
}

#[tokio::test]
async fn test_rejecting_zone_leaves_state_untouched() {
    let w = window();
    let panel_zone = w
        .dnd
        .register_zone(w.panel, ZoneOptions::new(), Arc::new(InertZone))
        .unwrap();
    w.dnd
        .start_drag(tab("C"), Some(w.strip_zone), Point::new(10.0, 80.0), Modifiers::NONE)
        .unwrap();

    assert_eq!(w.dnd.pointer_move(Point::new(50.0, 300.0), Modifiers::NONE), Some(panel_zone));
    let outcome = w.dnd.release(Point::new(50.0, 300.0), Modifiers::NONE).await;
    assert!(matches!(outcome, DropOutcome::Rejected(zone, RejectReason::Aborted) if zone == panel_zone));
    assert!(w.tabs.mutations().is_empty());
    assert!(!*w.dnd.dragging().borrow());
}

#[tokio::test]
async fn test_lifecycle_subscribers_fire_once_per_gesture() {
    let w = window();
    let starts = Arc::new(AtomicUsize::new(0));
    let ends = Arc::new(AtomicUsize::new(0));
    let s = starts.clone();
    w.dnd.on(
        GlobalDragEvent::DragStart,
        Arc::new(move |_| {
            s.fetch_add(1, Ordering::SeqCst);
        }),
    );
    let e = ends.clone();
    let end_sub = w.dnd.on(
        GlobalDragEvent::DragEnd,
        Arc::new(move |_| {
            e.fetch_add(1, Ordering::SeqCst);
        }),
    );

    w.dnd
        .start_drag(tab("E"), Some(w.strip_zone), Point::new(10.0, 140.0), Modifiers::NONE)
        .unwrap();
    w.dnd.release(Point::new(10.0, 10.0), Modifiers::NONE).await;
    assert!(!w.dnd.cancel());
    assert_eq!(starts.load(Ordering::SeqCst), 1);
    assert_eq!(ends.load(Ordering::SeqCst), 1);

    assert!(w.dnd.off(end_sub));
    w.dnd
        .start_drag(tab("E"), None, Point::new(10.0, 10.0), Modifiers::NONE)
        .unwrap();
    assert!(w.dnd.cancel());
    assert_eq!(starts.load(Ordering::SeqCst), 2);
    assert_eq!(ends.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_native_drag_enter_leave_and_drop_on_plain_zone() {
    let w = window();
    let drops = Arc::new(AtomicUsize::new(0));

    struct Counting(Arc<AtomicUsize>);
    impl dragcula_core::ZoneListener for Counting {
        fn on_drop(&self, event: &dragcula_core::GestureEvent) {
            self.0.fetch_add(1, Ordering::SeqCst);
            event.proceed();
        }
    }

    let panel_zone = w
        .dnd
        .register_zone(w.panel, ZoneOptions::new(), Arc::new(Counting(drops.clone())))
        .unwrap();

    let transfer = NativeTransfer::new().with_data("text/plain", "hello");
    let response = w.dnd.native_event(
        NativeDragEvent::new(NativeEventKind::DragEnter, Point::new(50.0, 300.0))
            .with_transfer(transfer.clone()),
    );
    assert!(response.allow_drop);
    assert!(w.dnd.operation().is_some_and(|op| op.is_native()));
    assert!(*w.dnd.zone_target(panel_zone).unwrap().borrow());

    let outcome = w
        .dnd
        .native_drop(
            NativeDragEvent::new(NativeEventKind::Drop, Point::new(50.0, 300.0))
                .with_transfer(transfer),
        )
        .await;
    assert_eq!(outcome, DropOutcome::Accepted(panel_zone));
    assert_eq!(drops.load(Ordering::SeqCst), 1);
    assert!(!w.dnd.is_dragging());
    assert!(!*w.dnd.zone_target(panel_zone).unwrap().borrow());
}

#[tokio::test]
async fn test_aborted_native_drop_still_cleans_up() {
    let w = window();
    let panel_zone = w
        .dnd
        .register_zone(w.panel, ZoneOptions::new(), Arc::new(InertZone))
        .unwrap();
    let ends = Arc::new(AtomicUsize::new(0));
    let e = ends.clone();
    w.dnd.on(
        GlobalDragEvent::DragEnd,
        Arc::new(move |_| {
            e.fetch_add(1, Ordering::SeqCst);
        }),
    );

    let transfer = NativeTransfer::new().with_data("text/plain", "hello");
    w.dnd.native_event(
        NativeDragEvent::new(NativeEventKind::DragOver, Point::new(50.0, 300.0))
            .with_transfer(transfer.clone()),
    );
    assert!(*w.dnd.has_target().borrow());

    let outcome = w
        .dnd
        .native_drop(
            NativeDragEvent::new(NativeEventKind::Drop, Point::new(50.0, 300.0))
                .with_transfer(transfer),
        )
        .await;
    assert_eq!(outcome, DropOutcome::Rejected(panel_zone, RejectReason::Aborted));
    assert!(!w.dnd.is_dragging());
    assert!(!*w.dnd.dragging().borrow());
    assert!(!*w.dnd.has_target().borrow());
    assert!(!*w.dnd.zone_target(panel_zone).unwrap().borrow());
    assert_eq!(ends.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_untrusted_native_events_are_ignored() {
    let w = window();
    let response = w.dnd.native_event(
        NativeDragEvent::new(NativeEventKind::DragOver, Point::new(10.0, 10.0)).untrusted(),
    );
    assert!(!response.allow_drop);
    assert!(!w.dnd.is_dragging());
}
