//! Application configuration persisted as RON

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use vi_renderer::RendererConfig;

use crate::state::ViewportSettings;

/// Configuration file errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialize(String),
    #[error("Deserialization error: {0}")]
    Deserialize(String),
}

/// Everything saved between sessions
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub renderer: RendererConfig,
    pub viewport: ViewportSettings,
}

impl AppConfig {
    pub fn to_ron(&self) -> Result<String, ConfigError> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| ConfigError::Serialize(e.to_string()))
    }

    /// Parse a config; missing fields take their defaults
    pub fn from_ron(content: &str) -> Result<Self, ConfigError> {
        let mut config: AppConfig =
            ron::from_str(content).map_err(|e| ConfigError::Deserialize(e.to_string()))?;
        config.renderer.camera = config.renderer.camera.sanitized();
        config.renderer.picking = config.renderer.picking.sanitized();
        Ok(config)
    }
}

/// Loads and saves [`AppConfig`] at a fixed path
#[derive(Debug, Clone)]
pub struct ConfigManager {
    path: PathBuf,
    config: AppConfig,
}

impl ConfigManager {
    /// Manager for `path` holding the default config until loaded
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            config: AppConfig::default(),
        }
    }

    /// Load `path`, falling back to defaults if it is missing or invalid
    pub fn load_or_default(path: impl Into<PathBuf>) -> Self {
        let mut manager = Self::new(path);
        match manager.load() {
            Ok(()) => tracing::info!("Loaded config from {}", manager.path.display()),
            Err(ConfigError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No config at {}, using defaults", manager.path.display());
            }
            Err(e) => tracing::warn!("Failed to load config, using defaults: {e}"),
        }
        manager
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut AppConfig {
        &mut self.config
    }

    /// Re-read the file, replacing the in-memory config
    pub fn load(&mut self) -> Result<(), ConfigError> {
        let content = std::fs::read_to_string(&self.path)?;
        self.config = AppConfig::from_ron(&content)?;
        Ok(())
    }

    /// Write the in-memory config, creating parent directories
    pub fn save(&self) -> Result<(), ConfigError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, self.config.to_ron()?)?;
        tracing::debug!("Saved config to {}", self.path.display());
        Ok(())
    }
}
