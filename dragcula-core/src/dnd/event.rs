//! Cancelable, awaitable gesture events
//!
//! Every lifecycle transition is delivered to application code as a
//! [`GestureEvent`]. A handler settles the event with [`GestureEvent::proceed`]
//! or [`GestureEvent::abort`]; the dispatcher awaits the paired
//! [`Settlement`] where the transition allows it (drops).
//!
//! Enter events are proceeded at construction. The host has to decide
//! synchronously whether the pointer may drop here, so there is nothing an
//! asynchronous veto could change.
//!
//! Settlement is first-call-wins. If every handle to an unsettled event is
//! dropped, the settlement resolves to [`RejectReason::Abandoned`].

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::time::Duration;

use tokio::sync::oneshot;

use super::data::DragData;
use super::item::DragItem;
use super::lock_or_recover;
use super::operation::DragOperation;
use super::position::DropPosition;
use super::types::{AreaKey, Modifiers, ZoneKey};

/// Lifecycle transition an event describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GestureKind {
    /// Zone became the current target
    DragEnter,
    /// Pointer moved while the zone is the current target
    DragOver,
    /// Zone stopped being the current target
    DragLeave,
    /// Payload dropped on the zone
    Drop,
    /// Source zone: the payload was accepted elsewhere
    DragEnd,
    /// Area became the current area
    AreaEnter,
    /// Area stopped being the current area
    AreaLeave,
}

/// Native event that triggered a dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NativeEventKind {
    /// `dragenter`
    DragEnter,
    /// `drag` (fired on the source)
    Drag,
    /// `dragover`
    DragOver,
    /// `dragleave`
    DragLeave,
    /// `drop`
    Drop,
    /// `dragend` (fired on the source)
    DragEnd,
}

/// Why a drop was not accepted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// A handler called [`GestureEvent::abort`]
    Aborted,
    /// Every handle was dropped without settling
    Abandoned,
    /// The configured drop timeout elapsed
    TimedOut,
}

/// Outcome of a settled event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// A handler proceeded
    Accepted,
    /// The event was rejected
    Rejected(RejectReason),
}

impl Verdict {
    /// Returns true for [`Verdict::Accepted`]
    #[must_use]
    pub const fn is_accepted(self) -> bool {
        matches!(self, Self::Accepted)
    }
}

/// Where an event is addressed and what triggered it
#[derive(Debug, Clone, Copy, Default)]
pub struct EventContext {
    /// Zone the pointer came from (or the source zone for `DragEnd`)
    pub from: Option<ZoneKey>,
    /// Zone the event concerns
    pub to: Option<ZoneKey>,
    /// Area the event concerns
    pub area: Option<AreaKey>,
    /// Native trigger, if any
    pub native: Option<NativeEventKind>,
    /// Modifier keys at dispatch time
    pub modifiers: Modifiers,
}

#[derive(Debug, Default)]
struct SettleState {
    sender: Option<oneshot::Sender<bool>>,
    settled: Option<bool>,
}

#[derive(Debug, Default, Clone, Copy)]
struct Hints {
    index: Option<usize>,
    drop_position: Option<DropPosition>,
}

struct EventInner {
    kind: GestureKind,
    operation: DragOperation,
    context: EventContext,
    settle: Mutex<SettleState>,
    propagation_stopped: AtomicBool,
    hints: Mutex<Hints>,
}

/// A lifecycle notification; clones share settlement state
#[derive(Clone)]
pub struct GestureEvent {
    inner: Arc<EventInner>,
}

impl GestureEvent {
    /// Creates an event over a snapshot of `operation`
    ///
    /// Returns the event and the future its settlement resolves.
    #[must_use]
    pub fn new(
        kind: GestureKind,
        operation: DragOperation,
        context: EventContext,
    ) -> (Self, Settlement) {
        let (tx, rx) = oneshot::channel();
        let event = Self {
            inner: Arc::new(EventInner {
                kind,
                operation,
                context,
                settle: Mutex::new(SettleState {
                    sender: Some(tx),
                    settled: None,
                }),
                propagation_stopped: AtomicBool::new(false),
                hints: Mutex::new(Hints::default()),
            }),
        };
        if kind == GestureKind::DragEnter {
            event.proceed();
        }
        (event, Settlement { rx })
    }

    /// Accepts the transition. Returns false if already settled.
    pub fn proceed(&self) -> bool {
        self.settle(true)
    }

    /// Rejects the transition. Returns false if already settled.
    pub fn abort(&self) -> bool {
        self.settle(false)
    }

    fn settle(&self, accepted: bool) -> bool {
        let mut state = lock_or_recover(&self.inner.settle);
        if state.settled.is_some() {
            return false;
        }
        state.settled = Some(accepted);
        if let Some(tx) = state.sender.take() {
            let _ = tx.send(accepted);
        }
        true
    }

    /// `Some(true)` once proceeded, `Some(false)` once aborted
    #[must_use]
    pub fn settled(&self) -> Option<bool> {
        lock_or_recover(&self.inner.settle).settled
    }

    /// Returns true once either `proceed` or `abort` has been called
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.settled().is_some()
    }

    /// Asks the host to stop propagating the underlying native event
    pub fn stop_propagation(&self) {
        self.inner.propagation_stopped.store(true, Ordering::SeqCst);
    }

    /// Returns true if a handler called [`Self::stop_propagation`]
    #[must_use]
    pub fn propagation_stopped(&self) -> bool {
        self.inner.propagation_stopped.load(Ordering::SeqCst)
    }

    /// Reports where the payload would land (index-aware listeners)
    pub fn set_index(&self, index: usize) {
        lock_or_recover(&self.inner.hints).index = Some(index);
    }

    /// Reports the fine-grained drop qualifier
    pub fn set_drop_position(&self, position: DropPosition) {
        lock_or_recover(&self.inner.hints).drop_position = Some(position);
    }

    pub(crate) fn hints(&self) -> (Option<usize>, Option<DropPosition>) {
        let hints = *lock_or_recover(&self.inner.hints);
        (hints.index, hints.drop_position)
    }

    /// Transition kind
    #[must_use]
    pub fn kind(&self) -> GestureKind {
        self.inner.kind
    }

    /// Operation snapshot taken at dispatch
    #[must_use]
    pub fn operation(&self) -> &DragOperation {
        &self.inner.operation
    }

    /// Zone the pointer came from
    #[must_use]
    pub fn from(&self) -> Option<ZoneKey> {
        self.inner.context.from
    }

    /// Zone the event concerns
    #[must_use]
    pub fn to(&self) -> Option<ZoneKey> {
        self.inner.context.to
    }

    /// Area the event concerns
    #[must_use]
    pub fn area(&self) -> Option<AreaKey> {
        self.inner.context.area
    }

    /// Native trigger, if any
    #[must_use]
    pub fn native(&self) -> Option<NativeEventKind> {
        self.inner.context.native
    }

    /// Modifier keys at dispatch time
    #[must_use]
    pub fn modifiers(&self) -> Modifiers {
        self.inner.context.modifiers
    }

    /// Index hint: the listener's own hint if set, else the operation's
    #[must_use]
    pub fn index(&self) -> Option<usize> {
        self.hints().0.or(self.inner.operation.index)
    }

    /// Drop position hint: the listener's own hint if set, else the operation's
    #[must_use]
    pub fn drop_position(&self) -> Option<DropPosition> {
        self.hints().1.or(self.inner.operation.drop_position)
    }

    /// The dragged item of a custom drag
    #[must_use]
    pub fn item(&self) -> Option<&DragItem> {
        self.inner.operation.item()
    }

    /// The dragged item's data container
    #[must_use]
    pub fn data(&self) -> Option<&DragData> {
        self.inner.operation.data()
    }
}

impl fmt::Debug for GestureEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GestureEvent")
            .field("kind", &self.inner.kind)
            .field("operation", &self.inner.operation.id)
            .field("context", &self.inner.context)
            .field("settled", &self.settled())
            .finish()
    }
}

/// Resolves once the paired event is settled or abandoned
#[derive(Debug)]
#[must_use = "a settlement does nothing unless awaited"]
pub struct Settlement {
    rx: oneshot::Receiver<bool>,
}

impl Settlement {
    /// Awaits the verdict, giving up after `timeout` if one is set
    pub async fn wait(self, timeout: Option<Duration>) -> Verdict {
        match timeout {
            Some(limit) => tokio::time::timeout(limit, self)
                .await
                .unwrap_or(Verdict::Rejected(RejectReason::TimedOut)),
            None => self.await,
        }
    }
}

impl Future for Settlement {
    type Output = Verdict;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx).poll(cx).map(|result| match result {
            Ok(true) => Verdict::Accepted,
            Ok(false) => Verdict::Rejected(RejectReason::Aborted),
            Err(_) => Verdict::Rejected(RejectReason::Abandoned),
        })
    }
}
