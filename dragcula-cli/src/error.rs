//! CLI error types and exit codes.

use dragcula_core::{ConfigError, DndError, OrderError};

/// Exit codes for CLI operations
pub mod exit_codes {
    /// General error - configuration, workspace file, or IO failures
    pub const GENERAL_ERROR: i32 = 1;
    /// The move did not happen - unknown entity or rejected drop
    pub const MOVE_FAILED: i32 = 2;
}

/// CLI error type
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Workspace file could not be read or written
    #[error("Workspace error: {0}")]
    Workspace(String),

    /// Tab, notebook or note not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// The drop was not accepted
    #[error("Drop rejected: {0}")]
    DropRejected(String),

    /// Drag-and-drop engine error
    #[error("Drag-and-drop error: {0}")]
    Dnd(#[from] DndError),

    /// Ordering applier error
    #[error("Ordering error: {0}")]
    Order(#[from] OrderError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

impl CliError {
    /// Returns the appropriate exit code for this error type.
    ///
    /// Exit codes:
    /// - 0: Success (not an error)
    /// - 1: General error (configuration, workspace, engine, IO)
    /// - 2: Move failed (unknown entity, rejected drop)
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::NotFound(_) | Self::DropRejected(_) => exit_codes::MOVE_FAILED,
            Self::Config(_) | Self::Workspace(_) | Self::Dnd(_) | Self::Order(_) | Self::Io(_) => {
                exit_codes::GENERAL_ERROR
            }
        }
    }
}
