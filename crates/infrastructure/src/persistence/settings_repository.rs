//! Engine settings persistence.
//!
//! Settings live in the platform-specific config directory unless an
//! explicit file is given:
//! - Linux: ~/.config/courier/settings.json
//! - macOS: ~/Library/Application Support/courier/settings.json
//! - Windows: %APPDATA%/courier/settings.json

use std::path::PathBuf;

use tokio::fs;

use crate::serialization::{SerializationError, from_json_bytes, to_json_stable_bytes};
use crate::settings::EngineSettings;

/// Error type for settings operations.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// IO error during file operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] SerializationError),

    /// Could not determine config directory.
    #[error("Could not determine config directory")]
    NoConfigDir,
}

/// Repository for engine settings.
#[derive(Debug, Clone, Default)]
pub struct SettingsRepository {
    path: Option<PathBuf>,
}

impl SettingsRepository {
    /// Creates a repository backed by the default config location.
    #[must_use]
    pub const fn new() -> Self {
        Self { path: None }
    }

    /// Creates a repository backed by an explicit file.
    #[must_use]
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("courier").join("settings.json"))
    }

    /// Returns the file this repository reads and writes, if one can be
    /// determined.
    #[must_use]
    pub fn settings_path(&self) -> Option<PathBuf> {
        self.path.clone().or_else(Self::default_path)
    }

    /// Loads settings from disk.
    ///
    /// Returns default settings if the file doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub async fn load(&self) -> Result<EngineSettings, SettingsError> {
        let Some(path) = self.settings_path() else {
            return Ok(EngineSettings::default());
        };

        if !fs::try_exists(&path).await? {
            tracing::debug!(path = %path.display(), "no settings file, using defaults");
            return Ok(EngineSettings::default());
        }

        let content = fs::read(&path).await?;
        Ok(from_json_bytes(&content)?)
    }

    /// Saves settings to disk, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if no location is known or the write fails.
    pub async fn save(&self, settings: &EngineSettings) -> Result<(), SettingsError> {
        let Some(path) = self.settings_path() else {
            return Err(SettingsError::NoConfigDir);
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }

        let content = to_json_stable_bytes(settings)?;
        fs::write(&path, content).await?;
        Ok(())
    }
}
