//! Global configuration management for Drydock.
//!
//! This module handles the user-wide configuration file (`~/.drydockrc`) which
//! currently stores a single override: the root directory Drydock uses for its
//! binary-cache and mirror storage (§4.2, §6). The file is optional — when
//! absent, [`crate::utils::platform::get_cache_dir`] supplies the platform
//! default.
//!
//! # File Format
//!
//! ```yaml
//! cache_root: /mnt/shared/drydock-cache
//! ```
//!
//! # Examples
//!
//! ```rust,no_run
//! use drydock_cli::config::{GlobalConfig, GlobalConfigManager};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let global = GlobalConfig::load().await?;
//! let cache_root = global.resolved_cache_root()?;
//!
//! let mut manager = GlobalConfigManager::new()?;
//! let config = manager.get_mut().await?;
//! config.cache_root = Some("/mnt/shared/drydock-cache".into());
//! manager.save().await?;
//! # Ok(())
//! # }
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Global, user-wide configuration for Drydock.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct GlobalConfig {
    /// Overrides the platform-default cache root (`<home>/<cache-root>` in §4.2).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_root: Option<PathBuf>,

    /// Tier-3 binary cache command template (§4.2 "custom fetch command").
    /// Invoked with `CACHE_DEPENDENCY_NAME`/`CACHE_DEPENDENCY_VERSION`/
    /// `CACHE_DEPENDENCY_HASH`/`CACHE_BUILD_CONFIGURATION`/
    /// `CACHE_TOOLCHAIN_VERSION`/`CACHE_TARGET_FILE_PATH` set in its environment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_fetch_command: Option<String>,

    /// Caps the Orchestrator's intra-level concurrency and the Retriever's
    /// prefetch queue (§4.5, §4.2); defaults to the detected CPU count.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parallelism: Option<usize>,
}

impl GlobalConfig {
    /// Load global configuration from the default platform-specific location,
    /// returning a default (empty) configuration when the file doesn't exist.
    pub async fn load() -> Result<Self> {
        let path = Self::default_path()?;
        if path.exists() {
            Self::load_from(&path).await
        } else {
            Ok(Self::default())
        }
    }

    /// Load global configuration from a specific file path.
    pub async fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read global config from {}", path.display()))?;

        serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse global config from {}", path.display()))
    }

    /// Save global configuration to the default platform-specific location.
    pub async fn save(&self) -> Result<()> {
        let path = Self::default_path()?;
        self.save_to(&path).await
    }

    /// Save global configuration to a specific file path.
    pub async fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let content = serde_yaml::to_string(self).context("Failed to serialize global config")?;

        fs::write(path, content)
            .await
            .with_context(|| format!("Failed to write global config to {}", path.display()))?;

        Ok(())
    }

    /// Default path for the global configuration file: `~/.drydockrc`.
    pub fn default_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| anyhow::anyhow!("Unable to determine home directory"))?;
        Ok(home.join(".drydockrc"))
    }

    /// Resolve the effective cache root: the configured override, or the
    /// platform default from [`crate::utils::platform::get_cache_dir`].
    pub fn resolved_cache_root(&self) -> Result<PathBuf> {
        match &self.cache_root {
            Some(path) => Ok(path.clone()),
            None => crate::utils::platform::get_cache_dir(),
        }
    }
}

/// Configuration manager with caching for global configuration, used by the
/// CLI to avoid re-reading `~/.drydockrc` on every access within a single run.
pub struct GlobalConfigManager {
    config: Option<GlobalConfig>,
    path: PathBuf,
}

impl GlobalConfigManager {
    /// Create a new configuration manager using the default global config path.
    pub fn new() -> Result<Self> {
        Ok(Self {
            config: None,
            path: GlobalConfig::default_path()?,
        })
    }

    /// Create a configuration manager with a custom file path (used in tests).
    #[must_use]
    pub const fn with_path(path: PathBuf) -> Self {
        Self {
            config: None,
            path,
        }
    }

    /// Get a reference to the global configuration, loading it if necessary.
    pub async fn get(&mut self) -> Result<&GlobalConfig> {
        if self.config.is_none() {
            self.config = Some(if self.path.exists() {
                GlobalConfig::load_from(&self.path).await?
            } else {
                GlobalConfig::default()
            });
        }

        Ok(self.config.as_ref().unwrap())
    }

    /// Get a mutable reference to the global configuration, loading it if necessary.
    pub async fn get_mut(&mut self) -> Result<&mut GlobalConfig> {
        if self.config.is_none() {
            self.config = Some(if self.path.exists() {
                GlobalConfig::load_from(&self.path).await?
            } else {
                GlobalConfig::default()
            });
        }

        Ok(self.config.as_mut().unwrap())
    }

    /// Save the current cached configuration to disk, if any was loaded.
    pub async fn save(&self) -> Result<()> {
        if let Some(config) = &self.config {
            config.save_to(&self.path).await?;
        }
        Ok(())
    }

    /// Reload the configuration from disk, discarding cached data.
    pub async fn reload(&mut self) -> Result<()> {
        self.config = Some(if self.path.exists() {
            GlobalConfig::load_from(&self.path).await?
        } else {
            GlobalConfig::default()
        });
        Ok(())
    }
}
