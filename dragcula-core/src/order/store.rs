//! Persisted order lists
//!
//! The notebook store does not keep order, so the tree applier persists it
//! separately as `{ notebookOrder, noteOrders }` in an application-level
//! custom-data document.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::dnd::lock_or_recover;
use crate::error::{OrderError, OrderResult};

/// Explicit order lists
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CustomData {
    /// Root notebook order
    pub notebook_order: Vec<String>,
    /// Note order per notebook id
    pub note_orders: BTreeMap<String, Vec<String>>,
}

/// Key-value document holding [`CustomData`]
#[async_trait]
pub trait CustomDataStore: Send + Sync {
    /// Reads the document; a store that was never written yields defaults
    async fn get_custom_data(&self) -> OrderResult<CustomData>;

    /// Replaces the document
    async fn update_custom_data(&self, data: CustomData) -> OrderResult<()>;
}

/// Store kept in memory
#[derive(Debug, Default)]
pub struct MemoryCustomDataStore {
    data: Mutex<CustomData>,
}

impl MemoryCustomDataStore {
    /// Creates a store holding `data`
    #[must_use]
    pub fn new(data: CustomData) -> Self {
        Self {
            data: Mutex::new(data),
        }
    }

    /// Current document
    #[must_use]
    pub fn snapshot(&self) -> CustomData {
        lock_or_recover(&self.data).clone()
    }
}

#[async_trait]
impl CustomDataStore for MemoryCustomDataStore {
    async fn get_custom_data(&self) -> OrderResult<CustomData> {
        Ok(self.snapshot())
    }

    async fn update_custom_data(&self, data: CustomData) -> OrderResult<()> {
        *lock_or_recover(&self.data) = data;
        Ok(())
    }
}

/// Store backed by a JSON file
#[derive(Debug, Clone)]
pub struct JsonCustomDataStore {
    path: PathBuf,
}

impl JsonCustomDataStore {
    /// Creates a store at `path`; the file is created on first write
    #[must_use]
    pub const fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Backing file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl CustomDataStore for JsonCustomDataStore {
    async fn get_custom_data(&self) -> OrderResult<CustomData> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) if content.trim().is_empty() => Ok(CustomData::default()),
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(CustomData::default()),
            Err(e) => Err(OrderError::Store(format!("{}: {e}", self.path.display()))),
        }
    }

    async fn update_custom_data(&self, data: CustomData) -> OrderResult<()> {
        let content = serde_json::to_string_pretty(&data)?;
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&self.path, content).await?;
        tracing::debug!(path = %self.path.display(), "Custom data written");
        Ok(())
    }
}
