//! `Dragcula` Core Library
//!
//! Drag-and-drop coordination for a tabbed, notebook-based workspace, plus
//! the ordering logic that turns completed drops into mutations of tab and
//! notebook collections.
//!
//! # Crate Structure
//!
//! - [`dnd`] - Coordinator, zones, areas, gesture events, drop geometry
//! - [`order`] - Tab and notebook-tree appliers, order reconciliation, persisted order lists
//! - [`config`] - Application settings and persistence
//! - [`tracing`] - Structured logging setup
//! - [`error`] - Error types

#![warn(missing_docs)]

pub mod config;
pub mod dnd;
pub mod error;
pub mod order;
pub mod tracing;

// =============================================================================
// Convenience re-exports
//
// Property and integration tests and the CLI import through the flat
// namespace; library code uses modular paths.
// =============================================================================

pub use config::{AppSettings, ConfigManager, DndSettings, LoggingSettings};
pub use dnd::{
    AreaKey, AreaListener, DragData, DragItem, DragOperation, Dragcula, DropConfig, DropEffect,
    DropOutcome, DropPosition, ElementId, ElementTree, GestureEvent, GestureKind, GlobalDragEvent,
    InertZone, Modifiers, NativeDragEvent, NativeEventKind, NativeTransfer, Point, Rect,
    RejectReason, RowKind, Surface, Verdict, ZoneKey, ZoneListener, ZoneOptions, keys,
};
pub use error::{
    ConfigError, ConfigResult, DndError, DndResult, DragculaError, OrderError, OrderResult,
};
pub use order::{
    CountingTransition, CustomData, CustomDataStore, InMemoryNotebooks, InMemoryTabs,
    JsonCustomDataStore, MemoryCustomDataStore, NoTransition, NotebookEntry, NotebookService,
    NotebookTreeApplier, NotebookZone, PinChange, TabEntry, TabMoveOutcome, TabOrderApplier,
    TabService, TreeMoveOutcome, TreeNode, ViewTransition, canonical_order, plan_tab_move,
    reconcile_order,
};
pub use tracing::{TracingConfig, TracingLevel, TracingOutput, init_tracing};
