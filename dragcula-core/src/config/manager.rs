//! Settings persistence

use std::path::{Path, PathBuf};

use super::settings::AppSettings;
use crate::error::{ConfigError, ConfigResult};

/// File name of the settings document inside the config directory
pub const SETTINGS_FILE: &str = "settings.toml";

/// Environment variable overriding the configuration directory
const CONFIG_DIR_ENV: &str = "DRAGCULA_CONFIG_DIR";

/// Loads and saves [`AppSettings`] as TOML
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_dir: PathBuf,
}

impl ConfigManager {
    /// Creates a manager for the default configuration directory
    ///
    /// Honors `DRAGCULA_CONFIG_DIR`, falling back to
    /// `$XDG_CONFIG_HOME/dragcula`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NoConfigDir`] if no directory can be determined.
    pub fn new() -> ConfigResult<Self> {
        if let Some(dir) = std::env::var_os(CONFIG_DIR_ENV) {
            return Ok(Self::with_config_dir(PathBuf::from(dir)));
        }
        let base = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(Self::with_config_dir(base.join("dragcula")))
    }

    /// Creates a manager rooted at `config_dir`
    #[must_use]
    pub const fn with_config_dir(config_dir: PathBuf) -> Self {
        Self { config_dir }
    }

    /// The configuration directory
    #[must_use]
    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Full path of the settings file
    #[must_use]
    pub fn settings_path(&self) -> PathBuf {
        self.config_dir.join(SETTINGS_FILE)
    }

    /// Loads settings, returning defaults if the file does not exist
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read, parsed or
    /// validated.
    pub fn load_settings(&self) -> ConfigResult<AppSettings> {
        let path = self.settings_path();
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No settings file, using defaults");
            return Ok(AppSettings::default());
        }
        let content = std::fs::read_to_string(&path)?;
        Self::parse(&path, &content)
    }

    /// Async variant of [`Self::load_settings`]
    ///
    /// # Errors
    ///
    /// See [`Self::load_settings`].
    pub async fn load_settings_async(&self) -> ConfigResult<AppSettings> {
        let path = self.settings_path();
        match tokio::fs::read_to_string(&path).await {
            Ok(content) => Self::parse(&path, &content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(AppSettings::default()),
            Err(e) => Err(e.into()),
        }
    }

    /// Saves settings, creating the directory if needed
    ///
    /// # Errors
    ///
    /// Returns an error if validation, serialization or writing fails.
    pub fn save_settings(&self, settings: &AppSettings) -> ConfigResult<()> {
        settings.validate()?;
        let content =
            toml::to_string_pretty(settings).map_err(|e| ConfigError::Serialize(e.to_string()))?;
        std::fs::create_dir_all(&self.config_dir)?;
        std::fs::write(self.settings_path(), content)?;
        Ok(())
    }

    /// Async variant of [`Self::save_settings`]
    ///
    /// # Errors
    ///
    /// See [`Self::save_settings`].
    pub async fn save_settings_async(&self, settings: &AppSettings) -> ConfigResult<()> {
        settings.validate()?;
        let content =
            toml::to_string_pretty(settings).map_err(|e| ConfigError::Serialize(e.to_string()))?;
        tokio::fs::create_dir_all(&self.config_dir).await?;
        tokio::fs::write(self.settings_path(), content).await?;
        Ok(())
    }

    fn parse(path: &Path, content: &str) -> ConfigResult<AppSettings> {
        let settings: AppSettings = toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        settings.validate()?;
        Ok(settings)
    }
}
