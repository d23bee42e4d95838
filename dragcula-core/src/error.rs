//! Error types for `Dragcula`
//!
//! Each concern has its own error enum; [`DragculaError`] unifies them for
//! callers (such as the CLI) that only need to report a failure.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type
#[derive(Debug, Error)]
pub enum DragculaError {
    /// Drag-and-drop engine error
    #[error("Drag-and-drop error: {0}")]
    Dnd(#[from] DndError),

    /// Ordering applier or collaborator error
    #[error("Ordering error: {0}")]
    Order(#[from] OrderError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by the drag-and-drop engine for misuse of its API.
///
/// Invariant violations (an operation asserted to exist that does not) are
/// not represented here: they panic.
#[derive(Debug, Error)]
pub enum DndError {
    /// A drag is already in progress
    #[error("a drag operation is already in progress ({0})")]
    AlreadyDragging(String),

    /// The zone key is not (or no longer) registered
    #[error("zone is not registered")]
    UnknownZone,

    /// The area key is not (or no longer) registered
    #[error("area is not registered")]
    UnknownArea,

    /// The element is already bound to another zone or area
    #[error("element {0} already carries a {1} marker")]
    ElementTaken(String, &'static str),

    /// The element does not exist on the surface
    #[error("element {0} is not part of the surface")]
    UnknownElement(String),
}

/// Errors raised by the ordering appliers and their collaborators
#[derive(Debug, Error)]
pub enum OrderError {
    /// A collaborator service failed
    #[error("{service} failed: {reason}")]
    Service {
        /// Name of the failing service operation
        service: &'static str,
        /// Human readable reason
        reason: String,
    },

    /// Persisted custom data could not be read or written
    #[error("custom data store error: {0}")]
    Store(String),

    /// Referenced entity does not exist
    #[error("{kind} not found: {id}")]
    NotFound {
        /// Entity kind (tab, notebook, note)
        kind: &'static str,
        /// Entity id
        id: String,
    },

    /// Serialization failure
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl OrderError {
    /// Creates a service error for the named operation
    #[must_use]
    pub fn service(service: &'static str, reason: impl Into<String>) -> Self {
        Self::Service {
            service,
            reason: reason.into(),
        }
    }

    /// Creates a not-found error
    #[must_use]
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to parse configuration file
    #[error("Failed to parse {path}: {reason}")]
    Parse {
        /// File that failed to parse
        path: PathBuf,
        /// Parser message
        reason: String,
    },

    /// Failed to serialize configuration
    #[error("Failed to serialize configuration: {0}")]
    Serialize(String),

    /// Invalid value
    #[error("Invalid value for {field}: {reason}")]
    Validation {
        /// Field name
        field: String,
        /// Why the value was rejected
        reason: String,
    },

    /// No configuration directory could be determined
    #[error("Could not determine configuration directory")]
    NoConfigDir,

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for the engine
pub type DndResult<T> = Result<T, DndError>;
/// Result alias for appliers
pub type OrderResult<T> = Result<T, OrderError>;
/// Result alias for configuration
pub type ConfigResult<T> = Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_error_display_service() {
        let err = OrderError::service("pin_tab", "backend offline");
        assert_eq!(err.to_string(), "pin_tab failed: backend offline");
    }

    #[test]
    fn test_order_error_display_not_found() {
        let err = OrderError::not_found("notebook", "nb-1");
        assert_eq!(err.to_string(), "notebook not found: nb-1");
    }

    #[test]
    fn test_top_level_wraps_config_error() {
        let err: DragculaError = ConfigError::NoConfigDir.into();
        assert!(err.to_string().contains("Configuration error"));
    }

    #[test]
    fn test_dnd_error_element_taken() {
        let err = DndError::ElementTaken("el-3".to_string(), "zone");
        assert_eq!(err.to_string(), "element el-3 already carries a zone marker");
    }
}
