//! File-based configuration provider (YAML)
//!
//! The user-level file lives at `~/.config/toolbridge/config.yaml`; any other
//! path can be given explicitly.

use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;

use super::error::{ConfigError, ConfigResult};
use super::settings::ConfigLayer;

/// Reads and writes a `ConfigLayer` as YAML.
///
/// # Example
///
/// ```no_run
/// use toolbridge_core::config::FileConfigProvider;
///
/// let layer = FileConfigProvider::user().load().unwrap_or_default();
/// ```
pub struct FileConfigProvider {
    path: PathBuf,
    cache: RwLock<Option<ConfigLayer>>,
}

impl FileConfigProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cache: RwLock::new(None),
        }
    }

    /// User-level config (~/.config/toolbridge/config.yaml)
    pub fn user() -> Self {
        // XDG config directory (~/.config on Linux, ~/Library/Application Support on macOS)
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")).join(".config"));
        Self::new(config_dir.join("toolbridge").join("config.yaml"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Cached contents; a missing file is an empty layer
    pub fn load(&self) -> ConfigResult<ConfigLayer> {
        if let Some(layer) = self.cache.read().as_ref() {
            return Ok(layer.clone());
        }
        self.reload()
    }

    /// Re-read from disk, replacing the cache
    pub fn reload(&self) -> ConfigResult<ConfigLayer> {
        let layer = self.read_from_disk()?;
        *self.cache.write() = Some(layer.clone());
        Ok(layer)
    }

    fn read_from_disk(&self) -> ConfigResult<ConfigLayer> {
        if !self.path.exists() {
            return Ok(ConfigLayer::default());
        }

        let content = fs::read_to_string(&self.path).map_err(|source| ConfigError::Io {
            path: self.path.clone(),
            source,
        })?;
        if content.trim().is_empty() {
            return Ok(ConfigLayer::default());
        }

        serde_yaml::from_str(&content).map_err(|source| ConfigError::Yaml {
            path: self.path.clone(),
            source,
        })
    }

    /// Write `layer`, creating parent directories as needed
    pub fn save(&self, layer: &ConfigLayer) -> ConfigResult<()> {
        let io_err = |source| ConfigError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }

        let content = serde_yaml::to_string(layer).map_err(|source| ConfigError::Yaml {
            path: self.path.clone(),
            source,
        })?;
        fs::write(&self.path, content).map_err(io_err)?;

        *self.cache.write() = Some(layer.clone());
        Ok(())
    }
}

impl std::fmt::Debug for FileConfigProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileConfigProvider")
            .field("path", &self.path)
            .field("exists", &self.exists())
            .finish()
    }
}
