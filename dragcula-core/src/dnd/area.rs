//! Drag areas: coarse regions that are entered and left but never dropped on

use std::sync::Arc;

use tokio::sync::watch;

use super::event::GestureEvent;
use super::types::ElementId;

/// Application callbacks for an area
pub trait AreaListener: Send + Sync {
    /// The pointer entered the area during a drag
    fn on_enter(&self, _event: &GestureEvent) {}

    /// The pointer left the area, or the drag ended inside it
    fn on_leave(&self, _event: &GestureEvent) {}
}

/// A registered area (arena entry)
pub(crate) struct Area {
    pub(crate) element: ElementId,
    pub(crate) listener: Arc<dyn AreaListener>,
    pub(crate) is_active: watch::Sender<bool>,
}

impl Area {
    pub(crate) fn new(element: ElementId, listener: Arc<dyn AreaListener>) -> Self {
        let (is_active, _) = watch::channel(false);
        Self {
            element,
            listener,
            is_active,
        }
    }

    pub(crate) fn set_active(&self, value: bool) {
        self.is_active.send_if_modified(|current| {
            let changed = *current != value;
            *current = value;
            changed
        });
    }
}
