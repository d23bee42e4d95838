//! JSON workspace file
//!
//! ```json
//! {
//!   "tabs": [{ "id": "A", "pinned": true }],
//!   "notebooks": [{ "id": "X", "notes": ["N", "P"] }],
//!   "customData": { "notebookOrder": ["X"], "noteOrders": { "X": ["P", "N"] } }
//! }
//! ```

use std::path::Path;
use std::sync::Arc;

use dragcula_core::{
    CustomData, InMemoryNotebooks, InMemoryTabs, MemoryCustomDataStore, NotebookEntry, TabEntry,
};
use serde::{Deserialize, Serialize};

use crate::error::CliError;

/// Workspace document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Workspace {
    /// Tabs in strip order
    pub tabs: Vec<TabEntry>,
    /// Notebooks with their notes in natural order
    pub notebooks: Vec<NotebookEntry>,
    /// Persisted order lists
    pub custom_data: CustomData,
}

impl Workspace {
    /// Reads the workspace; a missing file is an empty workspace
    pub fn load(path: &Path) -> Result<Self, CliError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No workspace file, starting empty");
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(CliError::Workspace(format!("{}: {e}", path.display())));
            }
        };
        serde_json::from_str(&content)
            .map_err(|e| CliError::Workspace(format!("{}: {e}", path.display())))
    }

    /// Writes the workspace, creating the parent directory if needed
    pub fn save(&self, path: &Path) -> Result<(), CliError> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| CliError::Workspace(format!("Failed to serialize workspace: {e}")))?;
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// In-memory services seeded from this document
    pub fn services(&self) -> Services {
        Services {
            tabs: Arc::new(InMemoryTabs::new(self.tabs.clone())),
            notebooks: Arc::new(InMemoryNotebooks::new(self.notebooks.clone())),
            store: Arc::new(MemoryCustomDataStore::new(self.custom_data.clone())),
        }
    }

    /// Document reflecting the current state of `services`
    pub fn from_services(services: &Services) -> Self {
        Self {
            tabs: services.tabs.snapshot(),
            notebooks: services.notebooks.snapshot(),
            custom_data: services.store.snapshot(),
        }
    }
}

/// Services a command mutates
pub struct Services {
    /// Tab strip
    pub tabs: Arc<InMemoryTabs>,
    /// Notebook collection
    pub notebooks: Arc<InMemoryNotebooks>,
    /// Order lists
    pub store: Arc<MemoryCustomDataStore>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_is_empty_workspace() {
        let temp = TempDir::new().unwrap();
        let ws = Workspace::load(&temp.path().join("none.json")).unwrap();
        assert_eq!(ws, Workspace::default());
    }

    #[test]
    fn test_save_then_load() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("ws.json");
        let ws = Workspace {
            tabs: vec![TabEntry::new("A", true)],
            notebooks: vec![NotebookEntry::new("X", &["N"])],
            custom_data: CustomData::default(),
        };
        ws.save(&path).unwrap();
        assert_eq!(Workspace::load(&path).unwrap(), ws);
    }

    #[test]
    fn test_invalid_json_is_workspace_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("ws.json");
        std::fs::write(&path, "[1, 2").unwrap();
        assert!(matches!(Workspace::load(&path), Err(CliError::Workspace(_))));
    }

    #[test]
    fn test_services_reflect_document() {
        let ws = Workspace {
            tabs: vec![TabEntry::new("B", false), TabEntry::new("A", true)],
            ..Workspace::default()
        };
        let services = ws.services();
        let back = Workspace::from_services(&services);
        // the tab service normalises to pinned-first
        assert_eq!(back.tabs[0].id, "A");
    }
}
