//! Configuration management for Drydock.
//!
//! Drydock has a single layer of ambient configuration beyond the project
//! `Cartfile` itself: an optional, user-wide `~/.drydockrc` (see [`global`])
//! that overrides where the binary cache and git mirrors live on disk. All
//! project-level configuration (dependencies, pinned versions) lives in the
//! manifest types under [`crate::manifest`] instead.
//!
//! # Configuration Priority
//!
//! 1. `DRYDOCK_CACHE_ROOT` environment variable, if set
//! 2. `cache_root` in `~/.drydockrc`
//! 3. Platform cache directory default

mod global;

pub use global::{GlobalConfig, GlobalConfigManager};

use anyhow::Result;
use std::path::PathBuf;

/// Resolve the effective Drydock cache root.
///
/// Checks `DRYDOCK_CACHE_ROOT` first (primarily for tests), then falls back to
/// `global`'s resolution of `~/.drydockrc` and the platform default.
pub fn get_cache_dir(global: &GlobalConfig) -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("DRYDOCK_CACHE_ROOT") {
        return Ok(PathBuf::from(dir));
    }

    let cache_dir = global.resolved_cache_root()?;
    if !cache_dir.exists() {
        std::fs::create_dir_all(&cache_dir)?;
    }

    Ok(cache_dir)
}
