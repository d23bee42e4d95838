//! Native transfer handle
//!
//! Mirror of the OS/browser transfer object that travels with a native drag:
//! MIME-keyed string data, dragged files, and the allowed/chosen effects.

use std::collections::BTreeMap;
use std::path::PathBuf;

use super::position::DropEffect;

/// A file carried by a native drag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferFile {
    /// File name
    pub name: String,
    /// Size in bytes
    pub size: u64,
    /// MIME type reported by the OS
    pub mime_type: String,
    /// Local path, when the OS exposes one
    pub path: Option<PathBuf>,
}

/// Native transfer handle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NativeTransfer {
    data: BTreeMap<String, String>,
    files: Vec<TransferFile>,
    /// Effects the source allows; empty means unrestricted
    pub effect_allowed: Vec<DropEffect>,
    /// Effect chosen by the current target
    pub drop_effect: Option<DropEffect>,
}

impl NativeTransfer {
    /// Creates an empty transfer
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`Self::set_data`]
    #[must_use]
    pub fn with_data(mut self, format: &str, data: &str) -> Self {
        self.set_data(format, data);
        self
    }

    /// Builder-style effect restriction
    #[must_use]
    pub fn with_effects(mut self, effects: &[DropEffect]) -> Self {
        self.effect_allowed = effects.to_vec();
        self
    }

    /// Sets the data for a format
    pub fn set_data(&mut self, format: &str, data: &str) {
        self.data.insert(format.to_ascii_lowercase(), data.to_string());
    }

    /// Gets the data for a format
    #[must_use]
    pub fn get_data(&self, format: &str) -> Option<&str> {
        self.data.get(&format.to_ascii_lowercase()).map(String::as_str)
    }

    /// Available formats, plus `"Files"` when files are attached
    #[must_use]
    pub fn types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = self.data.keys().map(String::as_str).collect();
        if !self.files.is_empty() {
            types.push("Files");
        }
        types
    }

    /// Attaches a file
    pub fn add_file(&mut self, file: TransferFile) {
        self.files.push(file);
    }

    /// Attached files
    #[must_use]
    pub fn files(&self) -> &[TransferFile] {
        &self.files
    }

    /// Returns true if the source permits `effect`
    #[must_use]
    pub fn allows(&self, effect: DropEffect) -> bool {
        self.effect_allowed.is_empty() || self.effect_allowed.contains(&effect)
    }

    /// Picks the first of `preferred` that the source permits
    #[must_use]
    pub fn negotiate(&self, preferred: &[DropEffect]) -> Option<DropEffect> {
        preferred.iter().copied().find(|e| self.allows(*e))
    }
}
