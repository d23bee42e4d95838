//! Draggable items

use std::fmt;
use std::sync::Arc;

use super::data::DragData;
use super::types::{ItemId, ZoneKey};

/// Reactions of a draggable element to target changes
///
/// Used for visual feedback on the dragged element itself (e.g. changing the
/// preview when hovering a zone that would copy instead of move).
pub trait ItemHooks: Send + Sync {
    /// The item started hovering `zone` as the current target
    fn on_target_enter(&self, _zone: ZoneKey) {}

    /// The item stopped hovering `zone`
    fn on_target_leave(&self, _zone: ZoneKey) {}
}

/// An in-app draggable item
#[derive(Clone)]
pub struct DragItem {
    /// Unique id
    pub id: ItemId,
    /// Domain payload
    pub data: DragData,
    hooks: Option<Arc<dyn ItemHooks>>,
}

impl DragItem {
    /// Creates an item carrying `data`
    #[must_use]
    pub fn new(data: DragData) -> Self {
        Self {
            id: ItemId::new(),
            data,
            hooks: None,
        }
    }

    /// Attaches target hooks
    #[must_use]
    pub fn with_hooks(mut self, hooks: Arc<dyn ItemHooks>) -> Self {
        self.hooks = Some(hooks);
        self
    }

    pub(crate) fn hooks(&self) -> Option<Arc<dyn ItemHooks>> {
        self.hooks.clone()
    }
}

impl fmt::Debug for DragItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DragItem")
            .field("id", &self.id)
            .field("data", &self.data)
            .field("hooks", &self.hooks.as_ref().map(|_| ".."))
            .finish()
    }
}
