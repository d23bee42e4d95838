//! Drag-and-drop engine
//!
//! One [`Dragcula`] coordinator per surface tracks a single drag operation
//! across registered zones (precise drop targets) and areas (coarse
//! regions). Custom in-app drags and native OS drags share one lifecycle:
//!
//! 1. an operation is created (`start_drag` or a trusted native enter/over)
//! 2. pointer samples resolve the current area and target zone, emitting
//!    enter/over/leave events and updating the reactive markers
//! 3. a drop awaits the target's settlement and, on acceptance, notifies the
//!    source zone
//! 4. cleanup clears every marker, removes previews and notifies `DragEnd`
//!    subscribers exactly once

use std::sync::{Mutex, MutexGuard};

mod area;
mod coordinator;
pub mod data;
mod event;
mod item;
mod operation;
pub mod position;
mod surface;
mod transfer;
mod types;
mod zone;

pub use area::AreaListener;
pub use coordinator::{
    DragCallback, Dragcula, DropOutcome, GlobalDragEvent, NativeDragEvent, NativeResponse,
};
pub use data::{DragData, keys};
pub use event::{
    EventContext, GestureEvent, GestureKind, NativeEventKind, RejectReason, Settlement, Verdict,
};
pub use item::{DragItem, ItemHooks};
pub use operation::{DragOperation, DragPayload};
pub use position::{DropConfig, DropEffect, DropPosition, RowKind, landing_index};
pub use surface::{ElementTree, Surface};
pub use transfer::{NativeTransfer, TransferFile};
pub use types::{
    AreaKey, ElementId, ItemId, Modifiers, OperationId, Point, Rect, SubscriptionId, ZoneKey,
};
pub use zone::{AcceptsFn, InertZone, ListLayout, ZoneListener, ZoneOptions};

/// Locks a mutex, recovering the value if a panicking thread poisoned it
pub(crate) fn lock_or_recover<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            tracing::warn!("Mutex was poisoned, recovering inner value");
            poisoned.into_inner()
        }
    }
}
