//! Shared utility functions used across command modules.

use std::path::{Path, PathBuf};

use dragcula_core::config::ConfigManager;
use dragcula_core::{AppSettings, LoggingSettings, TracingConfig, TracingLevel, init_tracing};

use crate::error::CliError;

/// File name of the default workspace inside the configuration directory
pub const WORKSPACE_FILE: &str = "workspace.json";

/// Creates a `ConfigManager` using the optional custom config directory
/// from CLI args.
pub fn create_config_manager(config_path: Option<&Path>) -> Result<ConfigManager, CliError> {
    match config_path {
        Some(path) => Ok(ConfigManager::with_config_dir(path.to_path_buf())),
        None => ConfigManager::new()
            .map_err(|e| CliError::Config(format!("Failed to initialize config: {e}"))),
    }
}

/// Loads settings from the configuration directory
pub fn load_settings(config_path: Option<&Path>) -> Result<AppSettings, CliError> {
    let manager = create_config_manager(config_path)?;
    manager
        .load_settings()
        .map_err(|e| CliError::Config(format!("Failed to load settings: {e}")))
}

/// Starts logging to stderr
///
/// `-v` flags override the configured level; `--quiet` limits output to
/// errors.
pub fn init_logging(settings: &LoggingSettings, verbose: u8, quiet: bool) {
    let mut config = TracingConfig::from_settings(settings).with_thread_ids(false);
    if quiet {
        config = config.with_level(TracingLevel::Error);
        config.filter = None;
    } else if verbose > 0 {
        config = config.with_level(TracingLevel::from_verbosity(verbose));
        config.filter = None;
    }
    if let Err(e) = init_tracing(&config) {
        eprintln!("Warning: logging disabled: {e}");
    }
}

/// Everything a command needs besides its own arguments
#[derive(Debug)]
pub struct Context {
    /// Loaded settings
    pub settings: AppSettings,
    /// Workspace file to operate on
    pub workspace_path: PathBuf,
}

impl Context {
    /// Resolves the workspace path: explicit flag, then the config directory
    pub fn new(config_path: Option<&Path>, workspace: Option<&Path>, settings: AppSettings) -> Self {
        let workspace_path = workspace.map_or_else(
            || {
                create_config_manager(config_path).map_or_else(
                    |_| PathBuf::from(WORKSPACE_FILE),
                    |manager| manager.config_dir().join(WORKSPACE_FILE),
                )
            },
            Path::to_path_buf,
        );
        Self {
            settings,
            workspace_path,
        }
    }
}

/// Creates the runtime commands drive the async engine on
pub fn runtime() -> Result<tokio::runtime::Runtime, CliError> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(CliError::Io)
}
