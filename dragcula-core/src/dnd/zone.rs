//! Drop zones
//!
//! A zone is a precise drop target bound to one element. Zones nest through
//! element ancestry; the coordinator picks the innermost zone whose
//! [`ZoneOptions::accepts`] predicate approves the live operation.

use std::fmt;
use std::sync::Arc;

use tokio::sync::watch;

use super::event::GestureEvent;
use super::operation::DragOperation;
use super::position::{DropEffect, RowKind};
use super::types::ElementId;

/// Predicate deciding whether a zone is eligible for an operation
pub type AcceptsFn = Arc<dyn Fn(&DragOperation) -> bool + Send + Sync>;

/// Application callbacks for a zone
///
/// Callbacks run outside the coordinator's lock and may call back into it.
pub trait ZoneListener: Send + Sync {
    /// The zone became the current target. The event is already proceeded.
    fn on_enter(&self, _event: &GestureEvent) {}

    /// Pointer moved within the zone. Set index/position hints here.
    fn on_over(&self, _event: &GestureEvent) {}

    /// The zone stopped being the current target
    fn on_leave(&self, _event: &GestureEvent) {}

    /// Payload dropped. Settle the event, now or later from a clone.
    ///
    /// Zones without drop handling reject.
    fn on_drop(&self, event: &GestureEvent) {
        event.abort();
    }

    /// This zone was the source and its payload was accepted elsewhere
    fn on_drag_end(&self, _event: &GestureEvent) {}
}

/// Listener that ignores everything and rejects drops
#[derive(Debug, Clone, Copy, Default)]
pub struct InertZone;

impl ZoneListener for InertZone {}

/// Row layout of an index-aware zone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListLayout {
    /// Number of rows currently rendered
    pub rows: usize,
    /// Kind of rows
    pub kind: RowKind,
}

/// Zone configuration
#[derive(Clone)]
pub struct ZoneOptions {
    accepts: AcceptsFn,
    /// Allowed drop effects in order of preference
    pub effects: Vec<DropEffect>,
    /// Row layout for automatic index/position hints
    pub layout: Option<ListLayout>,
}

impl Default for ZoneOptions {
    fn default() -> Self {
        Self {
            accepts: Arc::new(|_| true),
            effects: vec![DropEffect::Move, DropEffect::Copy, DropEffect::Link],
            layout: None,
        }
    }
}

impl ZoneOptions {
    /// Accepts every operation
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the eligibility predicate
    #[must_use]
    pub fn accepts(mut self, accepts: impl Fn(&DragOperation) -> bool + Send + Sync + 'static) -> Self {
        self.accepts = Arc::new(accepts);
        self
    }

    /// Only custom drags whose data carries `key`
    #[must_use]
    pub fn accepts_key(self, key: &'static str) -> Self {
        self.accepts(move |op| op.data().is_some_and(|d| d.has(key)))
    }

    /// Sets the allowed effects
    #[must_use]
    pub fn effects(mut self, effects: &[DropEffect]) -> Self {
        self.effects = effects.to_vec();
        self
    }

    /// Makes the zone index-aware
    #[must_use]
    pub const fn list(mut self, rows: usize, kind: RowKind) -> Self {
        self.layout = Some(ListLayout { rows, kind });
        self
    }
}

impl fmt::Debug for ZoneOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ZoneOptions")
            .field("effects", &self.effects)
            .field("layout", &self.layout)
            .finish_non_exhaustive()
    }
}

/// A registered zone (arena entry)
pub(crate) struct Zone {
    pub(crate) element: ElementId,
    pub(crate) options: ZoneOptions,
    pub(crate) listener: Arc<dyn ZoneListener>,
    pub(crate) is_target: watch::Sender<bool>,
}

impl Zone {
    pub(crate) fn new(
        element: ElementId,
        options: ZoneOptions,
        listener: Arc<dyn ZoneListener>,
    ) -> Self {
        let (is_target, _) = watch::channel(false);
        Self {
            element,
            options,
            listener,
            is_target,
        }
    }

    /// Predicate plus effect negotiation for native payloads
    pub(crate) fn accepts(&self, operation: &DragOperation) -> bool {
        if !(self.options.accepts)(operation) {
            return false;
        }
        operation
            .transfer()
            .is_none_or(|t| t.negotiate(&self.options.effects).is_some())
    }

    pub(crate) fn set_target(&self, value: bool) {
        self.is_target.send_if_modified(|current| {
            let changed = *current != value;
            *current = value;
            changed
        });
    }
}
