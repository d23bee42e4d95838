//! The drag operation record
//!
//! Exactly one [`DragOperation`] is alive per gesture and it is owned by the
//! coordinator. Listeners only ever see clones taken at dispatch time.

use super::data::DragData;
use super::item::DragItem;
use super::position::DropPosition;
use super::transfer::NativeTransfer;
use super::types::{AreaKey, OperationId, ZoneKey};

/// What the gesture carries
#[derive(Debug, Clone)]
pub enum DragPayload {
    /// In-app drag of a [`DragItem`]
    Item(DragItem),
    /// OS/browser drag wrapping a transfer handle
    Native(NativeTransfer),
}

/// One in-flight drag gesture
#[derive(Debug, Clone)]
pub struct DragOperation {
    pub(crate) id: OperationId,
    pub(crate) source: Option<ZoneKey>,
    pub(crate) target: Option<ZoneKey>,
    pub(crate) area: Option<AreaKey>,
    pub(crate) payload: DragPayload,
    pub(crate) index: Option<usize>,
    pub(crate) drop_position: Option<DropPosition>,
    pub(crate) dropping: bool,
    pub(crate) ending: bool,
}

impl DragOperation {
    pub(crate) fn new(source: Option<ZoneKey>, payload: DragPayload) -> Self {
        Self {
            id: OperationId::new(),
            source,
            target: None,
            area: None,
            payload,
            index: None,
            drop_position: None,
            dropping: false,
            ending: false,
        }
    }

    /// Operation id
    #[must_use]
    pub const fn id(&self) -> OperationId {
        self.id
    }

    /// Zone the gesture started in
    #[must_use]
    pub const fn source(&self) -> Option<ZoneKey> {
        self.source
    }

    /// Zone currently under the pointer
    #[must_use]
    pub const fn target(&self) -> Option<ZoneKey> {
        self.target
    }

    /// Area currently under the pointer
    #[must_use]
    pub const fn area(&self) -> Option<AreaKey> {
        self.area
    }

    /// Payload
    #[must_use]
    pub const fn payload(&self) -> &DragPayload {
        &self.payload
    }

    /// Ordinal hint from index-aware zones
    #[must_use]
    pub const fn index(&self) -> Option<usize> {
        self.index
    }

    /// Fine-grained drop qualifier
    #[must_use]
    pub const fn drop_position(&self) -> Option<DropPosition> {
        self.drop_position
    }

    /// True when the gesture wraps a native transfer
    #[must_use]
    pub const fn is_native(&self) -> bool {
        matches!(self.payload, DragPayload::Native(_))
    }

    /// The dragged item of a custom drag
    #[must_use]
    pub const fn item(&self) -> Option<&DragItem> {
        match &self.payload {
            DragPayload::Item(item) => Some(item),
            DragPayload::Native(_) => None,
        }
    }

    /// The transfer handle of a native drag
    #[must_use]
    pub const fn transfer(&self) -> Option<&NativeTransfer> {
        match &self.payload {
            DragPayload::Native(transfer) => Some(transfer),
            DragPayload::Item(_) => None,
        }
    }

    /// The item's data container, if this is a custom drag
    #[must_use]
    pub fn data(&self) -> Option<&DragData> {
        self.item().map(|item| &item.data)
    }
}
