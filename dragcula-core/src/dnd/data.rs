//! Typed key/value container carried by a drag item
//!
//! Values are stored type-erased and recovered with [`DragData::get`]. The
//! container is cheap to clone (values are shared), which lets operation
//! snapshots carry the same payload the item was created with.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Well-known keys used by the ordering appliers
pub mod keys {
    /// Tab id (`String`)
    pub const TAB: &str = "tab";
    /// Notebook tree node ([`TreeNode`](crate::order::TreeNode))
    pub const TREE_NODE: &str = "tree-node";
}

/// Typed key/value bag
#[derive(Clone, Default)]
pub struct DragData {
    entries: HashMap<String, Arc<dyn Any + Send + Sync>>,
}

impl DragData {
    /// Creates an empty container
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`Self::set`]
    #[must_use]
    pub fn with<T: Any + Send + Sync>(mut self, key: impl Into<String>, value: T) -> Self {
        self.set(key, value);
        self
    }

    /// Stores `value` under `key`, replacing any previous value
    pub fn set<T: Any + Send + Sync>(&mut self, key: impl Into<String>, value: T) {
        self.entries.insert(key.into(), Arc::new(value));
    }

    /// Returns the value under `key` if present and of type `T`
    #[must_use]
    pub fn get<T: Any>(&self, key: &str) -> Option<&T> {
        self.entries.get(key)?.downcast_ref::<T>()
    }

    /// Returns true if a value (of any type) is stored under `key`
    #[must_use]
    pub fn has(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Removes the value under `key`, returning whether one was present
    pub fn remove(&mut self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    /// Removes every entry
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of stored entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no entries are stored
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Stored keys, sorted
    #[must_use]
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }
}

impl fmt::Debug for DragData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DragData")
            .field("keys", &self.keys())
            .finish()
    }
}
