//! The drag coordinator
//!
//! [`Dragcula`] owns every zone and area registration, the single live
//! [`DragOperation`] and the body-level markers. It is a cheap-clone handle;
//! all clones share one state behind a mutex that is never held while
//! application callbacks run or across an await point.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use slotmap::SlotMap;
use tokio::sync::watch;
use tracing::{Instrument, debug, info, trace, warn};

use super::area::{Area, AreaListener};
use super::event::{EventContext, GestureEvent, GestureKind, NativeEventKind, RejectReason, Verdict};
use super::item::{DragItem, ItemHooks};
use super::lock_or_recover;
use super::operation::{DragOperation, DragPayload};
use super::position::{DropEffect, DropPosition, indicator_offset, resolve_list_hint};
use super::surface::{ElementTree, Surface};
use super::transfer::NativeTransfer;
use super::types::{AreaKey, ElementId, Modifiers, OperationId, Point, SubscriptionId, ZoneKey};
use super::zone::{Zone, ZoneListener, ZoneOptions};
use crate::config::DndSettings;
use crate::error::{DndError, DndResult};
use crate::tracing::span_names;
use crate::trace_operation;

/// Callback for global drag lifecycle subscriptions
pub type DragCallback = Arc<dyn Fn(&DragOperation) + Send + Sync>;

/// Global lifecycle notifications
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GlobalDragEvent {
    /// A drag operation was created
    DragStart,
    /// A drag operation is about to be cleared
    DragEnd,
}

/// A native drag event forwarded by the host
#[derive(Debug, Clone, Default)]
pub struct NativeDragEvent {
    /// Which native event fired
    pub kind: Option<NativeEventKind>,
    /// Pointer position
    pub position: Point,
    /// False for synthetic events, which never bootstrap a drag
    pub trusted: bool,
    /// Transfer handle carried by the event
    pub transfer: Option<NativeTransfer>,
    /// `relatedTarget` of a leave event: the element the pointer moved to
    pub related: Option<ElementId>,
    /// Modifier keys
    pub modifiers: Modifiers,
}

impl NativeDragEvent {
    /// Creates a trusted event of `kind` at `position`
    #[must_use]
    pub fn new(kind: NativeEventKind, position: Point) -> Self {
        Self {
            kind: Some(kind),
            position,
            trusted: true,
            ..Self::default()
        }
    }

    /// Attaches a transfer handle
    #[must_use]
    pub fn with_transfer(mut self, transfer: NativeTransfer) -> Self {
        self.transfer = Some(transfer);
        self
    }

    /// Sets the related element of a leave event
    #[must_use]
    pub const fn with_related(mut self, related: Option<ElementId>) -> Self {
        self.related = related;
        self
    }

    /// Marks the event as synthetic
    #[must_use]
    pub const fn untrusted(mut self) -> Self {
        self.trusted = false;
        self
    }
}

/// What the host should do with the native event it forwarded
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NativeResponse {
    /// Prevent the default action so the platform allows a drop here
    pub allow_drop: bool,
    /// A listener asked to stop propagation
    pub stop_propagation: bool,
    /// Effect negotiated with the current target
    pub drop_effect: Option<DropEffect>,
    /// Surface y of the insertion line in an index-aware target
    pub indicator_y: Option<f64>,
}

/// Result of a drop attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropOutcome {
    /// No drag was in progress
    NoOperation,
    /// The pointer was not over an accepting zone
    NoTarget,
    /// A drop for this operation is already being handled
    Ignored,
    /// The target's handler proceeded
    Accepted(ZoneKey),
    /// The target's handler aborted, timed out or dropped the event
    Rejected(ZoneKey, RejectReason),
}

impl DropOutcome {
    /// Returns true for [`DropOutcome::Accepted`]
    #[must_use]
    pub const fn is_accepted(self) -> bool {
        matches!(self, Self::Accepted(_))
    }
}

/// Notification collected under the lock, delivered after releasing it
enum Pending {
    Zone(Arc<dyn ZoneListener>, GestureEvent),
    Area(Arc<dyn AreaListener>, GestureEvent),
    ItemEnter(Arc<dyn ItemHooks>, ZoneKey),
    ItemLeave(Arc<dyn ItemHooks>, ZoneKey),
    Subscriber(DragCallback, DragOperation),
}

struct Subscription {
    id: SubscriptionId,
    event: GlobalDragEvent,
    callback: DragCallback,
}

struct State<S> {
    surface: S,
    zones: SlotMap<ZoneKey, Zone>,
    areas: SlotMap<AreaKey, Area>,
    zone_elements: HashMap<ElementId, ZoneKey>,
    area_elements: HashMap<ElementId, AreaKey>,
    operation: Option<DragOperation>,
    hovered: Option<ElementId>,
    pointer: Option<Point>,
    previews: Vec<ElementId>,
    subscriptions: Vec<Subscription>,
    next_subscription: u64,
}

impl<S: Surface> State<S> {
    /// Live operation; callers have already checked that one exists
    fn live(&mut self) -> &mut DragOperation {
        match self.operation.as_mut() {
            Some(op) => op,
            None => panic!("drag event handled without a live operation"),
        }
    }

    /// Nearest area and nearest accepting zone on `hit`'s ancestry
    fn resolve(&self, hit: Option<ElementId>, op: &DragOperation) -> (Option<AreaKey>, Option<ZoneKey>) {
        let mut area = None;
        let mut zone = None;
        let mut current = hit;
        while let Some(element) = current {
            if area.is_none() {
                area = self.area_elements.get(&element).copied();
            }
            if zone.is_none() {
                zone = self
                    .zone_elements
                    .get(&element)
                    .copied()
                    .filter(|key| self.zones.get(*key).is_some_and(|z| z.accepts(op)));
            }
            if area.is_some() && zone.is_some() {
                break;
            }
            current = self.surface.parent(element);
        }
        (area, zone)
    }

    fn list_hint(&self, key: ZoneKey, point: Option<Point>, settings: &DndSettings) -> Option<(usize, DropPosition)> {
        let zone = self.zones.get(key)?;
        let layout = zone.options.layout?;
        let bounds = self.surface.bounds(zone.element)?;
        let point = point?;
        Some(resolve_list_hint(
            point.y - bounds.y,
            layout.rows,
            layout.kind,
            &settings.drop_config(),
        ))
    }

    /// Insertion line for the operation's current hints
    fn indicator(&self, op: &DragOperation, settings: &DndSettings) -> Option<f64> {
        let zone = self.zones.get(op.target?)?;
        zone.options.layout?;
        let bounds = self.surface.bounds(zone.element)?;
        indicator_offset(op.index?, op.drop_position?, &settings.drop_config()).map(|y| bounds.y + y)
    }

    fn subscribers(&self, event: GlobalDragEvent, op: &DragOperation) -> Vec<Pending> {
        self.subscriptions
            .iter()
            .filter(|s| s.event == event)
            .map(|s| Pending::Subscriber(Arc::clone(&s.callback), op.clone()))
            .collect()
    }
}

struct Markers {
    dragging: watch::Sender<bool>,
    target: watch::Sender<bool>,
}

fn set_flag(flag: &watch::Sender<bool>, value: bool) {
    flag.send_if_modified(|current| {
        let changed = *current != value;
        *current = value;
        changed
    });
}

struct Inner<S> {
    state: Mutex<State<S>>,
    settings: DndSettings,
    markers: Markers,
}

/// Drag-and-drop coordinator
///
/// Zones and areas are registered against elements of the surface `S`.
/// Gestures come in either as custom pointer calls ([`Self::start_drag`],
/// [`Self::pointer_move`], [`Self::release`]) or as forwarded native events
/// ([`Self::native_event`], [`Self::native_drop`]).
pub struct Dragcula<S = ElementTree> {
    inner: Arc<Inner<S>>,
}

impl<S> Clone for Dragcula<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: Surface + 'static> Dragcula<S> {
    /// Creates a coordinator over `surface`
    #[must_use]
    pub fn new(surface: S, settings: DndSettings) -> Self {
        let (dragging, _) = watch::channel(false);
        let (target, _) = watch::channel(false);
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(State {
                    surface,
                    zones: SlotMap::with_key(),
                    areas: SlotMap::with_key(),
                    zone_elements: HashMap::new(),
                    area_elements: HashMap::new(),
                    operation: None,
                    hovered: None,
                    pointer: None,
                    previews: Vec::new(),
                    subscriptions: Vec::new(),
                    next_subscription: 0,
                }),
                settings,
                markers: Markers { dragging, target },
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State<S>> {
        lock_or_recover(&self.inner.state)
    }

    /// Engine settings
    #[must_use]
    pub fn settings(&self) -> &DndSettings {
        &self.inner.settings
    }

    /// Runs `f` with mutable access to the surface
    ///
    /// Changing the layout invalidates the hover cache.
    pub fn with_surface<R>(&self, f: impl FnOnce(&mut S) -> R) -> R {
        let mut state = self.lock();
        state.hovered = None;
        f(&mut state.surface)
    }

    // === Registration ===

    /// Marks `element` as a drop zone
    ///
    /// # Errors
    ///
    /// Fails if the element does not exist or already carries a zone.
    pub fn register_zone(
        &self,
        element: ElementId,
        options: ZoneOptions,
        listener: Arc<dyn ZoneListener>,
    ) -> DndResult<ZoneKey> {
        let mut state = self.lock();
        if !state.surface.has_element(element) {
            return Err(DndError::UnknownElement(element.to_string()));
        }
        if state.zone_elements.contains_key(&element) {
            return Err(DndError::ElementTaken(element.to_string(), "zone"));
        }
        let key = state.zones.insert(Zone::new(element, options, listener));
        state.zone_elements.insert(element, key);
        state.hovered = None;
        debug!(%element, ?key, "Zone registered");
        Ok(key)
    }

    /// Removes a zone
    ///
    /// If it was the current target, the operation loses its target and
    /// the body target marker is cleared. No leave event is sent.
    ///
    /// # Errors
    ///
    /// Fails for an unknown key.
    pub fn unregister_zone(&self, key: ZoneKey) -> DndResult<()> {
        let mut state = self.lock();
        let zone = state.zones.remove(key).ok_or(DndError::UnknownZone)?;
        state.zone_elements.remove(&zone.element);
        state.hovered = None;
        if let Some(op) = state.operation.as_mut() {
            if op.target == Some(key) {
                op.target = None;
                op.index = None;
                op.drop_position = None;
                set_flag(&self.inner.markers.target, false);
            }
            if op.source == Some(key) {
                op.source = None;
            }
        }
        debug!(?key, "Zone unregistered");
        Ok(())
    }

    /// Marks `element` as a drag area
    ///
    /// # Errors
    ///
    /// Fails if the element does not exist or already carries an area.
    pub fn register_area(&self, element: ElementId, listener: Arc<dyn AreaListener>) -> DndResult<AreaKey> {
        let mut state = self.lock();
        if !state.surface.has_element(element) {
            return Err(DndError::UnknownElement(element.to_string()));
        }
        if state.area_elements.contains_key(&element) {
            return Err(DndError::ElementTaken(element.to_string(), "area"));
        }
        let key = state.areas.insert(Area::new(element, listener));
        state.area_elements.insert(element, key);
        state.hovered = None;
        debug!(%element, ?key, "Area registered");
        Ok(key)
    }

    /// Removes an area
    ///
    /// # Errors
    ///
    /// Fails for an unknown key.
    pub fn unregister_area(&self, key: AreaKey) -> DndResult<()> {
        let mut state = self.lock();
        let area = state.areas.remove(key).ok_or(DndError::UnknownArea)?;
        state.area_elements.remove(&area.element);
        state.hovered = None;
        if let Some(op) = state.operation.as_mut()
            && op.area == Some(key)
        {
            op.area = None;
        }
        Ok(())
    }

    /// Updates the row count of an index-aware zone
    ///
    /// # Errors
    ///
    /// Fails for an unknown key.
    pub fn set_zone_rows(&self, key: ZoneKey, rows: usize) -> DndResult<()> {
        let mut state = self.lock();
        let zone = state.zones.get_mut(key).ok_or(DndError::UnknownZone)?;
        if let Some(layout) = zone.options.layout.as_mut() {
            layout.rows = rows;
        }
        Ok(())
    }

    /// Element a zone is bound to
    #[must_use]
    pub fn zone_element(&self, key: ZoneKey) -> Option<ElementId> {
        self.lock().zones.get(key).map(|z| z.element)
    }

    // === Markers ===

    /// Reactive "this zone is the current target" flag
    #[must_use]
    pub fn zone_target(&self, key: ZoneKey) -> Option<watch::Receiver<bool>> {
        self.lock().zones.get(key).map(|z| z.is_target.subscribe())
    }

    /// Reactive "pointer is inside this area" flag
    #[must_use]
    pub fn area_active(&self, key: AreaKey) -> Option<watch::Receiver<bool>> {
        self.lock().areas.get(key).map(|a| a.is_active.subscribe())
    }

    /// Body-level "a drag is in progress" marker
    #[must_use]
    pub fn dragging(&self) -> watch::Receiver<bool> {
        self.inner.markers.dragging.subscribe()
    }

    /// Body-level "the operation has a target" marker
    #[must_use]
    pub fn has_target(&self) -> watch::Receiver<bool> {
        self.inner.markers.target.subscribe()
    }

    // === Queries and subscriptions ===

    /// Snapshot of the live operation
    #[must_use]
    pub fn operation(&self) -> Option<DragOperation> {
        self.lock().operation.clone()
    }

    /// Surface y where the host should draw the insertion line
    ///
    /// `None` without an index-aware target, or when the drop lands on a
    /// row rather than between rows.
    #[must_use]
    pub fn drop_indicator(&self) -> Option<f64> {
        let state = self.lock();
        let op = state.operation.as_ref()?;
        state.indicator(op, &self.inner.settings)
    }

    /// Returns true while an operation exists
    #[must_use]
    pub fn is_dragging(&self) -> bool {
        self.lock().operation.is_some()
    }

    /// Subscribes to global drag start/end
    pub fn on(&self, event: GlobalDragEvent, callback: DragCallback) -> SubscriptionId {
        let mut state = self.lock();
        state.next_subscription += 1;
        let id = SubscriptionId(state.next_subscription);
        state.subscriptions.push(Subscription { id, event, callback });
        id
    }

    /// Removes a subscription. Returns false if it was unknown.
    pub fn off(&self, id: SubscriptionId) -> bool {
        let mut state = self.lock();
        let before = state.subscriptions.len();
        state.subscriptions.retain(|s| s.id != id);
        state.subscriptions.len() != before
    }

    /// Registers a drag preview to be force-removed at cleanup
    pub fn attach_preview(&self, element: ElementId) {
        let mut state = self.lock();
        if !state.previews.contains(&element) {
            state.previews.push(element);
        }
    }

    /// Removes a drag preview now
    pub fn detach_preview(&self, element: ElementId) {
        let mut state = self.lock();
        state.previews.retain(|p| *p != element);
        state.surface.detach(element);
        state.hovered = None;
    }

    // === Custom gestures ===

    /// Starts an in-app drag of `item`
    ///
    /// # Errors
    ///
    /// Fails if a drag is already in progress or `source` is unknown.
    pub fn start_drag(
        &self,
        item: DragItem,
        source: Option<ZoneKey>,
        at: Point,
        modifiers: Modifiers,
    ) -> DndResult<OperationId> {
        let (id, pending) = {
            let mut state = self.lock();
            if let Some(op) = &state.operation {
                return Err(DndError::AlreadyDragging(op.id.to_string()));
            }
            if source.is_some_and(|key| !state.zones.contains_key(key)) {
                return Err(DndError::UnknownZone);
            }
            let mut pending = self.bootstrap(&mut state, source, DragPayload::Item(item));
            let hit = state.surface.element_at(at);
            pending.extend(self.sample(&mut state, hit, Some(at), None, modifiers));
            (state.live().id, pending)
        };
        info!(%id, "Custom drag started");
        self.deliver(pending);
        Ok(id)
    }

    /// Moves the pointer of an in-app drag
    ///
    /// Returns the current target, or `None` if no drag is in progress.
    pub fn pointer_move(&self, at: Point, modifiers: Modifiers) -> Option<ZoneKey> {
        let pending = {
            let mut state = self.lock();
            if !state.operation.as_ref().is_some_and(|op| !op.ending) {
                return None;
            }
            let hit = state.surface.element_at(at);
            self.sample(&mut state, hit, Some(at), None, modifiers)
        };
        self.deliver(pending);
        self.lock().operation.as_ref().and_then(|op| op.target)
    }

    /// Releases the pointer: drops on the current target, then cleans up
    ///
    /// A release while an earlier drop of the same operation is still
    /// awaiting settlement returns [`DropOutcome::Ignored`] and leaves the
    /// operation to the call that owns the drop.
    pub async fn release(&self, at: Point, modifiers: Modifiers) -> DropOutcome {
        let live = self
            .lock()
            .operation
            .as_ref()
            .filter(|op| !op.ending)
            .map(|op| (op.id, op.dropping));
        let id = match live {
            None => return DropOutcome::NoOperation,
            Some((_, true)) => return DropOutcome::Ignored,
            Some((id, false)) => id,
        };
        self.pointer_move(at, modifiers);
        let outcome = self.dispatch_drop(None, modifiers).await;
        if matches!(outcome, DropOutcome::Ignored | DropOutcome::NoOperation) {
            return outcome;
        }
        self.finish(Some(id));
        outcome
    }

    /// Abandons the live drag without dropping
    ///
    /// Returns false if nothing was in progress.
    pub fn cancel(&self) -> bool {
        self.finish(None)
    }

    // === Native gestures ===

    /// Handles a forwarded native drag event (everything except `drop`)
    ///
    /// Trusted enter/over events bootstrap a native operation when none
    /// exists. A `dragend` cleans up.
    pub fn native_event(&self, event: NativeDragEvent) -> NativeResponse {
        let Some(kind) = event.kind else {
            return NativeResponse::default();
        };
        match kind {
            NativeEventKind::DragEnter | NativeEventKind::Drag | NativeEventKind::DragOver => {
                self.native_over(kind, event)
            }
            NativeEventKind::DragLeave => self.native_leave(event),
            NativeEventKind::DragEnd => {
                self.finish(None);
                NativeResponse::default()
            }
            NativeEventKind::Drop => {
                warn!("Native drop forwarded to native_event; use native_drop");
                NativeResponse::default()
            }
        }
    }

    fn native_over(&self, kind: NativeEventKind, event: NativeDragEvent) -> NativeResponse {
        let (pending, started) = {
            let mut state = self.lock();
            let mut pending = Vec::new();
            let started = match &state.operation {
                Some(op) if op.ending => return NativeResponse::default(),
                Some(_) => None,
                None if !event.trusted => return NativeResponse::default(),
                None => {
                    let transfer = event.transfer.clone().unwrap_or_default();
                    pending.extend(self.bootstrap(&mut state, None, DragPayload::Native(transfer)));
                    Some(state.live().id)
                }
            };
            let hit = state.surface.element_at(event.position);
            pending.extend(self.sample(
                &mut state,
                hit,
                Some(event.position),
                Some(kind),
                event.modifiers,
            ));
            (pending, started)
        };
        if let Some(id) = started {
            info!(%id, "Native drag started");
        }
        let stopped = self.deliver(pending);
        self.native_response(stopped)
    }

    fn native_leave(&self, event: NativeDragEvent) -> NativeResponse {
        let pending = {
            let mut state = self.lock();
            let Some(op) = state.operation.as_ref().filter(|op| !op.ending) else {
                return NativeResponse::default();
            };
            let target_element = op.target.and_then(|key| state.zones.get(key)).map(|z| z.element);
            if let (Some(zone_element), Some(related)) = (target_element, event.related)
                && state.surface.is_within(zone_element, related)
            {
                trace!(%related, "Ignoring dragleave into the target's own subtree");
                return self.native_response_locked(&state, false);
            }
            self.sample(
                &mut state,
                event.related,
                Some(event.position),
                Some(NativeEventKind::DragLeave),
                event.modifiers,
            )
        };
        let stopped = self.deliver(pending);
        self.native_response(stopped)
    }

    /// Handles a native `drop`, then cleans up the native operation
    pub async fn native_drop(&self, event: NativeDragEvent) -> DropOutcome {
        let (id, pending) = {
            let mut state = self.lock();
            let Some(op) = state.operation.as_mut().filter(|op| !op.ending) else {
                return DropOutcome::NoOperation;
            };
            if op.dropping {
                debug!(operation_id = %op.id, "Drop already pending, ignoring duplicate");
                return DropOutcome::Ignored;
            }
            if let (DragPayload::Native(current), Some(fresh)) = (&mut op.payload, event.transfer) {
                let effect = current.drop_effect;
                *current = fresh;
                current.drop_effect = current.drop_effect.or(effect);
            }
            let id = op.id;
            let hit = state.surface.element_at(event.position);
            let pending = self.sample(
                &mut state,
                hit,
                Some(event.position),
                Some(NativeEventKind::Drop),
                event.modifiers,
            );
            (id, pending)
        };
        self.deliver(pending);
        let outcome = self
            .dispatch_drop(Some(NativeEventKind::Drop), event.modifiers)
            .await;
        if matches!(outcome, DropOutcome::Ignored | DropOutcome::NoOperation) {
            return outcome;
        }
        let native = self.lock().operation.as_ref().is_some_and(|op| op.id == id && op.is_native());
        if native {
            self.finish(Some(id));
        }
        outcome
    }

    fn native_response(&self, stopped: bool) -> NativeResponse {
        let state = self.lock();
        self.native_response_locked(&state, stopped)
    }

    fn native_response_locked(&self, state: &State<S>, stopped: bool) -> NativeResponse {
        let Some(op) = state.operation.as_ref() else {
            return NativeResponse {
                stop_propagation: stopped,
                ..NativeResponse::default()
            };
        };
        let effects = op.target.and_then(|key| state.zones.get(key)).map(|z| &z.options.effects);
        let drop_effect = match (op.transfer(), effects) {
            (Some(transfer), Some(effects)) => transfer.negotiate(effects),
            (None, Some(effects)) => effects.first().copied(),
            _ => None,
        };
        NativeResponse {
            allow_drop: op.target.is_some(),
            stop_propagation: stopped,
            drop_effect,
            indicator_y: state.indicator(op, &self.inner.settings),
        }
    }

    // === Dispatch internals ===

    fn bootstrap(&self, state: &mut State<S>, source: Option<ZoneKey>, payload: DragPayload) -> Vec<Pending> {
        let op = DragOperation::new(source, payload);
        let pending = state.subscribers(GlobalDragEvent::DragStart, &op);
        state.operation = Some(op);
        state.hovered = None;
        set_flag(&self.inner.markers.dragging, true);
        pending
    }

    /// Recomputes area and target for `hit` and collects the transitions
    fn sample(
        &self,
        state: &mut State<S>,
        hit: Option<ElementId>,
        point: Option<Point>,
        native: Option<NativeEventKind>,
        modifiers: Modifiers,
    ) -> Vec<Pending> {
        let settings = &self.inner.settings;
        let op = state.live().clone();
        // The cache skips the ancestry walk only; eligibility is re-checked.
        let cached = settings.hover_cache
            && hit.is_some()
            && state.hovered == hit
            && op
                .target
                .is_none_or(|key| state.zones.get(key).is_some_and(|z| z.accepts(&op)));
        let (new_area, new_target) = if cached {
            trace!(?hit, "Hover cache hit");
            (op.area, op.target)
        } else {
            state.resolve(hit, &op)
        };
        state.hovered = hit;
        if point.is_some() {
            state.pointer = point;
        }

        let mut pending = Vec::new();
        let context = EventContext {
            native,
            modifiers,
            ..EventContext::default()
        };

        let old_area = state.live().area;
        if old_area != new_area {
            state.live().area = new_area;
            let snapshot = state.live().clone();
            if let Some(area) = old_area.and_then(|key| state.areas.get(key)) {
                area.set_active(false);
                let ctx = EventContext { area: old_area, ..context };
                let (event, _) = GestureEvent::new(GestureKind::AreaLeave, snapshot.clone(), ctx);
                pending.push(Pending::Area(Arc::clone(&area.listener), event));
            }
            if let Some(area) = new_area.and_then(|key| state.areas.get(key)) {
                area.set_active(true);
                let ctx = EventContext { area: new_area, ..context };
                let (event, _) = GestureEvent::new(GestureKind::AreaEnter, snapshot, ctx);
                pending.push(Pending::Area(Arc::clone(&area.listener), event));
            }
        }

        let old_target = state.live().target;
        let hooks = state.live().item().and_then(DragItem::hooks);
        if old_target == new_target {
            if let Some(key) = new_target {
                let hint = state.list_hint(key, point, settings);
                let op = state.live();
                if let Some((index, position)) = hint {
                    op.index = Some(index);
                    op.drop_position = Some(position);
                }
                let snapshot = op.clone();
                if let Some(zone) = state.zones.get(key) {
                    let ctx = EventContext {
                        from: Some(key),
                        to: Some(key),
                        area: new_area,
                        ..context
                    };
                    let (event, _) = GestureEvent::new(GestureKind::DragOver, snapshot, ctx);
                    pending.push(Pending::Zone(Arc::clone(&zone.listener), event));
                }
            }
            return pending;
        }

        {
            let op = state.live();
            op.target = new_target;
            op.index = None;
            op.drop_position = None;
        }
        if let Some(old) = old_target {
            let snapshot = state.live().clone();
            if let Some(zone) = state.zones.get(old) {
                zone.set_target(false);
                let ctx = EventContext {
                    from: Some(old),
                    to: new_target,
                    area: new_area,
                    ..context
                };
                let (event, _) = GestureEvent::new(GestureKind::DragLeave, snapshot, ctx);
                pending.push(Pending::Zone(Arc::clone(&zone.listener), event));
            }
            if let Some(hooks) = &hooks {
                pending.push(Pending::ItemLeave(Arc::clone(hooks), old));
            }
        }
        if let Some(new) = new_target {
            if let Some((index, position)) = state.list_hint(new, point, settings) {
                let op = state.live();
                op.index = Some(index);
                op.drop_position = Some(position);
            }
            let snapshot = state.live().clone();
            if let Some(zone) = state.zones.get(new) {
                zone.set_target(true);
                let ctx = EventContext {
                    from: old_target,
                    to: Some(new),
                    area: new_area,
                    ..context
                };
                let (event, _) = GestureEvent::new(GestureKind::DragEnter, snapshot, ctx);
                pending.push(Pending::Zone(Arc::clone(&zone.listener), event));
            }
            if let Some(hooks) = &hooks {
                pending.push(Pending::ItemEnter(Arc::clone(hooks), new));
            }
        }
        set_flag(&self.inner.markers.target, new_target.is_some());
        debug!(from = ?old_target, to = ?new_target, "Drag target changed");
        pending
    }

    /// Runs callbacks outside the lock, then copies listener hints back
    ///
    /// Returns true if any listener stopped propagation.
    fn deliver(&self, pending: Vec<Pending>) -> bool {
        let mut stopped = false;
        let mut hinted = Vec::new();
        for notice in pending {
            match notice {
                Pending::Zone(listener, event) => {
                    match event.kind() {
                        GestureKind::DragEnter => listener.on_enter(&event),
                        GestureKind::DragOver => listener.on_over(&event),
                        GestureKind::DragLeave => listener.on_leave(&event),
                        GestureKind::Drop => listener.on_drop(&event),
                        GestureKind::DragEnd => listener.on_drag_end(&event),
                        GestureKind::AreaEnter | GestureKind::AreaLeave => {}
                    }
                    stopped |= event.propagation_stopped();
                    if matches!(event.kind(), GestureKind::DragEnter | GestureKind::DragOver) {
                        hinted.push(event);
                    }
                }
                Pending::Area(listener, event) => {
                    match event.kind() {
                        GestureKind::AreaEnter => listener.on_enter(&event),
                        _ => listener.on_leave(&event),
                    }
                    stopped |= event.propagation_stopped();
                }
                Pending::ItemEnter(hooks, zone) => hooks.on_target_enter(zone),
                Pending::ItemLeave(hooks, zone) => hooks.on_target_leave(zone),
                Pending::Subscriber(callback, op) => callback(&op),
            }
        }
        if !hinted.is_empty() {
            let mut guard = self.lock();
            let state = &mut *guard;
            if let Some(op) = state.operation.as_mut() {
                let kind = op
                    .target
                    .and_then(|key| state.zones.get(key))
                    .and_then(|zone| zone.options.layout)
                    .map(|layout| layout.kind);
                for event in hinted {
                    if event.operation().id != op.id || event.to() != op.target {
                        continue;
                    }
                    let (index, position) = event.hints();
                    if index.is_some() {
                        op.index = index;
                    }
                    match position {
                        Some(position) if kind.is_none_or(|kind| kind.allows(position)) => {
                            op.drop_position = Some(position);
                        }
                        Some(position) => {
                            debug!(%position, ?kind, "Ignoring drop position the row kind refuses");
                        }
                        None => {}
                    }
                }
            }
        }
        stopped
    }

    async fn dispatch_drop(&self, native: Option<NativeEventKind>, modifiers: Modifiers) -> DropOutcome {
        let (listener, event, settlement, target, snapshot) = {
            let mut state = self.lock();
            let Some(op) = state.operation.as_mut().filter(|op| !op.ending) else {
                return DropOutcome::NoOperation;
            };
            let Some(target) = op.target else {
                return DropOutcome::NoTarget;
            };
            if op.dropping {
                return DropOutcome::Ignored;
            }
            op.dropping = true;
            let snapshot = op.clone();
            let Some(zone) = state.zones.get(target) else {
                return DropOutcome::NoTarget;
            };
            let ctx = EventContext {
                from: snapshot.source,
                to: Some(target),
                area: snapshot.area,
                native,
                modifiers,
            };
            let (event, settlement) = GestureEvent::new(GestureKind::Drop, snapshot.clone(), ctx);
            (Arc::clone(&zone.listener), event, settlement, target, snapshot)
        };

        let span = trace_operation!(span_names::DROP, operation_id = %snapshot.id);
        async {
            listener.on_drop(&event);
            drop(event);
            let verdict = settlement.wait(self.inner.settings.drop_timeout()).await;
            let outcome = match verdict {
                Verdict::Accepted => {
                    info!(
                        index = ?snapshot.index,
                        drop_position = ?snapshot.drop_position,
                        "Drop accepted"
                    );
                    self.notify_source(&snapshot, target, native, modifiers);
                    DropOutcome::Accepted(target)
                }
                Verdict::Rejected(reason) => {
                    warn!(?reason, "Drop rejected");
                    DropOutcome::Rejected(target, reason)
                }
            };
            if let Some(op) = self.lock().operation.as_mut()
                && op.id == snapshot.id
            {
                op.dropping = false;
            }
            outcome
        }
        .instrument(span)
        .await
    }

    /// Tells the source zone its payload was accepted elsewhere
    fn notify_source(
        &self,
        snapshot: &DragOperation,
        target: ZoneKey,
        native: Option<NativeEventKind>,
        modifiers: Modifiers,
    ) {
        let Some(source) = snapshot.source.filter(|s| *s != target) else {
            return;
        };
        let listener = self.lock().zones.get(source).map(|z| Arc::clone(&z.listener));
        let Some(listener) = listener else {
            return;
        };
        let ctx = EventContext {
            from: Some(source),
            to: Some(target),
            area: snapshot.area,
            native,
            modifiers,
        };
        let (event, _) = GestureEvent::new(GestureKind::DragEnd, snapshot.clone(), ctx);
        self.deliver(vec![Pending::Zone(listener, event)]);
    }

    /// Clears every marker, notifies `DragEnd` subscribers once and drops
    /// the operation
    ///
    /// With `expected`, only that operation is finished. Returns false if
    /// there was nothing to finish.
    fn finish(&self, expected: Option<OperationId>) -> bool {
        let (id, pending) = {
            let mut state = self.lock();
            let Some(op) = state.operation.as_mut() else {
                return false;
            };
            if op.ending || expected.is_some_and(|id| id != op.id) {
                return false;
            }
            op.ending = true;
            let snapshot = op.clone();

            set_flag(&self.inner.markers.dragging, false);
            set_flag(&self.inner.markers.target, false);
            for zone in state.zones.values() {
                zone.set_target(false);
            }
            for area in state.areas.values() {
                area.set_active(false);
            }

            let mut pending = Vec::new();
            if let Some(area) = snapshot.area.and_then(|key| state.areas.get(key)) {
                let ctx = EventContext {
                    area: snapshot.area,
                    ..EventContext::default()
                };
                let (event, _) = GestureEvent::new(GestureKind::AreaLeave, snapshot.clone(), ctx);
                pending.push(Pending::Area(Arc::clone(&area.listener), event));
            }

            let previews = std::mem::take(&mut state.previews);
            for preview in previews {
                state.surface.detach(preview);
            }
            state.hovered = None;
            state.pointer = None;

            pending.extend(state.subscribers(GlobalDragEvent::DragEnd, &snapshot));
            (snapshot.id, pending)
        };

        let span = trace_operation!(span_names::CLEANUP, operation_id = %id);
        let _guard = span.enter();
        self.deliver(pending);
        let mut state = self.lock();
        if state.operation.as_ref().is_some_and(|op| op.id == id) {
            state.operation = None;
        }
        info!("Drag operation cleared");
        true
    }
}

impl<S> std::fmt::Debug for Dragcula<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dragcula")
            .field("settings", &self.inner.settings)
            .finish_non_exhaustive()
    }
}
