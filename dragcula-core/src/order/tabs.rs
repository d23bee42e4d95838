//! Tab ordering and pinning
//!
//! Tabs form one list split into a pinned prefix and an unpinned suffix.
//! A drop decides both where the tab lands and whether it crosses the
//! boundary between the two sections.

use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{Instrument, debug, info, warn};

use super::transition::{NoTransition, ViewTransition, run_in_transition};
use super::{BusyGuard, spawn_drop};
use crate::dnd::{
    DropPosition, GestureEvent, ZoneListener, keys, landing_index, lock_or_recover,
};
use crate::error::{OrderError, OrderResult};
use crate::trace_operation;
use crate::tracing::span_names;

/// One tab as the tab service reports it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabEntry {
    /// Tab id
    pub id: String,
    /// Whether the tab is pinned
    #[serde(default)]
    pub pinned: bool,
}

impl TabEntry {
    /// Creates an entry
    #[must_use]
    pub fn new(id: impl Into<String>, pinned: bool) -> Self {
        Self {
            id: id.into(),
            pinned,
        }
    }
}

/// Tab collection the applier mutates
#[async_trait]
pub trait TabService: Send + Sync {
    /// Current tabs, pinned first
    async fn tabs(&self) -> OrderResult<Vec<TabEntry>>;

    /// Pins a tab
    async fn pin_tab(&self, id: &str) -> OrderResult<()>;

    /// Unpins a tab
    async fn unpin_tab(&self, id: &str) -> OrderResult<()>;

    /// Moves a tab to `index` of the canonical order
    async fn reorder_tab(&self, id: &str, index: usize) -> OrderResult<()>;
}

/// Stable partition: pinned tabs first, relative order kept in each section
#[must_use]
pub fn canonical_order(tabs: &[TabEntry]) -> Vec<TabEntry> {
    let (mut pinned, unpinned): (Vec<_>, Vec<_>) = tabs.iter().cloned().partition(|t| t.pinned);
    pinned.extend(unpinned);
    pinned
}

/// Pin-state transition decided for a move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PinChange {
    /// Pin state unchanged
    Keep,
    /// Tab becomes pinned
    Pin,
    /// Tab becomes unpinned
    Unpin,
}

/// What a tab drop should do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabMovePlan {
    /// The tab no longer exists
    Stale,
    /// Nothing to do
    Unchanged,
    /// Change pin state (maybe), then reorder to `index`
    Apply {
        /// Pin transition
        pin: PinChange,
        /// Final index in the canonical order
        index: usize,
    },
}

/// Decides the pin transition and final index of a tab move
///
/// The boundary is the number of pinned tabs not counting the dragged one.
/// A target inside the pinned section pins, one inside the unpinned section
/// unpins, and a target exactly at the boundary is decided by `position`.
/// With no pinned tabs at all, dropping at index 0 pins.
#[must_use]
pub fn plan_tab_move(
    tabs: &[TabEntry],
    tab_id: &str,
    target: usize,
    position: DropPosition,
) -> TabMovePlan {
    let canonical = canonical_order(tabs);
    let Some(current) = canonical.iter().position(|t| t.id == tab_id) else {
        return TabMovePlan::Stale;
    };
    let pinned = canonical[current].pinned;
    let boundary = canonical.iter().filter(|t| t.pinned && t.id != tab_id).count();
    let target = target.min(canonical.len() - 1);

    let pin = if !pinned && boundary == 0 && target == 0 {
        PinChange::Pin
    } else if target < boundary {
        if pinned { PinChange::Keep } else { PinChange::Pin }
    } else if target > boundary {
        if pinned { PinChange::Unpin } else { PinChange::Keep }
    } else {
        match (pinned, position) {
            (true, DropPosition::Before) => PinChange::Unpin,
            (false, DropPosition::After) => PinChange::Pin,
            _ => PinChange::Keep,
        }
    };

    let index = match pin {
        PinChange::Pin => target.min(boundary),
        PinChange::Unpin => target.max(boundary),
        PinChange::Keep => target,
    };
    if pin == PinChange::Keep && index == current {
        return TabMovePlan::Unchanged;
    }
    TabMovePlan::Apply { pin, index }
}

/// Result of a tab move
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TabMoveOutcome {
    /// Another tab move was in progress; nothing was done
    Busy,
    /// The dragged tab no longer exists
    Stale,
    /// The tab is already where it was dropped
    Unchanged,
    /// The tab was moved
    Moved {
        /// Pin transition applied
        pin: PinChange,
        /// Final index
        index: usize,
    },
}

/// Applies tab drops to a [`TabService`]
///
/// Clones share the busy flag. Registered as a [`ZoneListener`], it handles
/// drops of payloads carrying [`keys::TAB`] on the tab strip.
#[derive(Clone)]
pub struct TabOrderApplier {
    tabs: Arc<dyn TabService>,
    transition: Arc<dyn ViewTransition>,
    busy: Arc<AtomicBool>,
}

impl TabOrderApplier {
    /// Creates an applier without a visual transition
    #[must_use]
    pub fn new(tabs: Arc<dyn TabService>) -> Self {
        Self::with_transition(tabs, Arc::new(NoTransition))
    }

    /// Creates an applier that brackets mutations with `transition`
    #[must_use]
    pub fn with_transition(tabs: Arc<dyn TabService>, transition: Arc<dyn ViewTransition>) -> Self {
        Self {
            tabs,
            transition,
            busy: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Moves `tab_id` to `target` of the canonical order
    ///
    /// # Errors
    ///
    /// Propagates tab service failures. The busy flag is released either way.
    pub async fn apply_move(
        &self,
        tab_id: &str,
        target: usize,
        position: DropPosition,
    ) -> OrderResult<TabMoveOutcome> {
        let Some(_guard) = BusyGuard::try_acquire(&self.busy) else {
            debug!(tab_id, "Tab move already in progress, ignoring");
            return Ok(TabMoveOutcome::Busy);
        };

        let span = trace_operation!(span_names::TABS_APPLY, tab_id, target, %position);
        self.apply_unguarded(tab_id, target, position)
            .instrument(span)
            .await
    }

    async fn apply_unguarded(
        &self,
        tab_id: &str,
        target: usize,
        position: DropPosition,
    ) -> OrderResult<TabMoveOutcome> {
        let tabs = self.tabs.tabs().await?;
        let (pin, index) = match plan_tab_move(&tabs, tab_id, target, position) {
            TabMovePlan::Stale => {
                warn!("Dropped tab no longer exists");
                return Ok(TabMoveOutcome::Stale);
            }
            TabMovePlan::Unchanged => return Ok(TabMoveOutcome::Unchanged),
            TabMovePlan::Apply { pin, index } => (pin, index),
        };

        run_in_transition(self.transition.as_ref(), async {
            match pin {
                PinChange::Pin => self.tabs.pin_tab(tab_id).await?,
                PinChange::Unpin => self.tabs.unpin_tab(tab_id).await?,
                PinChange::Keep => {}
            }
            self.tabs.reorder_tab(tab_id, index).await
        })
        .await?;

        info!(?pin, index, "Tab moved");
        Ok(TabMoveOutcome::Moved { pin, index })
    }

    /// Handles a drop event on the tab strip and proceeds it
    ///
    /// The event's index hint is the hovered row; it is converted into the
    /// tab's final index. Dropping a tab on its own row changes nothing,
    /// whichever half of the row the pointer is in. Events without a tab
    /// payload are aborted.
    ///
    /// # Errors
    ///
    /// Propagates tab service failures after proceeding the event.
    pub async fn handle_drop(&self, event: &GestureEvent) -> OrderResult<TabMoveOutcome> {
        let Some(tab_id) = event.data().and_then(|d| d.get::<String>(keys::TAB)).cloned() else {
            event.abort();
            return Ok(TabMoveOutcome::Stale);
        };
        let result = self.drop_tab(&tab_id, event).await;
        event.proceed();
        result
    }

    async fn drop_tab(&self, tab_id: &str, event: &GestureEvent) -> OrderResult<TabMoveOutcome> {
        let Some(row) = event.index() else {
            return Ok(TabMoveOutcome::Unchanged);
        };
        let position = event.drop_position().unwrap_or(DropPosition::Before);
        let canonical = canonical_order(&self.tabs.tabs().await?);
        let Some(current) = canonical.iter().position(|t| t.id == tab_id) else {
            warn!(tab_id, "Dropped tab no longer exists");
            return Ok(TabMoveOutcome::Stale);
        };
        if row == current {
            debug!(tab_id, row, "Tab dropped on its own row");
            return Ok(TabMoveOutcome::Unchanged);
        }
        self.apply_move(tab_id, landing_index(row, position, current), position)
            .await
    }
}

impl ZoneListener for TabOrderApplier {
    fn on_drop(&self, event: &GestureEvent) {
        let applier = self.clone();
        let handle = event.clone();
        spawn_drop(event, async move {
            if let Err(e) = applier.handle_drop(&handle).await {
                warn!(error = %e, "Tab drop failed");
            }
        });
    }
}

/// Tab list kept in memory
///
/// Every mutation is appended to a log, which tests and the CLI use to show
/// what a drop did.
#[derive(Debug, Default)]
pub struct InMemoryTabs {
    tabs: Mutex<Vec<TabEntry>>,
    log: Mutex<Vec<String>>,
}

impl InMemoryTabs {
    /// Creates a tab list; the order is normalised to pinned-first
    #[must_use]
    pub fn new(tabs: Vec<TabEntry>) -> Self {
        Self {
            tabs: Mutex::new(canonical_order(&tabs)),
            log: Mutex::new(Vec::new()),
        }
    }

    /// Current tabs
    #[must_use]
    pub fn snapshot(&self) -> Vec<TabEntry> {
        lock_or_recover(&self.tabs).clone()
    }

    /// Mutations performed so far
    #[must_use]
    pub fn mutations(&self) -> Vec<String> {
        lock_or_recover(&self.log).clone()
    }

    fn set_pinned(&self, id: &str, pinned: bool) -> OrderResult<()> {
        let mut tabs = lock_or_recover(&self.tabs);
        let tab = tabs
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| OrderError::not_found("tab", id))?;
        tab.pinned = pinned;
        *tabs = canonical_order(&tabs);
        Ok(())
    }

    fn record(&self, entry: String) {
        lock_or_recover(&self.log).push(entry);
    }
}

#[async_trait]
impl TabService for InMemoryTabs {
    async fn tabs(&self) -> OrderResult<Vec<TabEntry>> {
        Ok(self.snapshot())
    }

    async fn pin_tab(&self, id: &str) -> OrderResult<()> {
        self.set_pinned(id, true)?;
        self.record(format!("pin {id}"));
        Ok(())
    }

    async fn unpin_tab(&self, id: &str) -> OrderResult<()> {
        self.set_pinned(id, false)?;
        self.record(format!("unpin {id}"));
        Ok(())
    }

    async fn reorder_tab(&self, id: &str, index: usize) -> OrderResult<()> {
        {
            let mut tabs = lock_or_recover(&self.tabs);
            let from = tabs
                .iter()
                .position(|t| t.id == id)
                .ok_or_else(|| OrderError::not_found("tab", id))?;
            let tab = tabs.remove(from);
            let index = index.min(tabs.len());
            tabs.insert(index, tab);
            *tabs = canonical_order(&tabs);
        }
        self.record(format!("reorder {id} {index}"));
        Ok(())
    }
}
