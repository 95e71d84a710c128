//! Platform-specific utilities and cross-platform compatibility helpers
//!
//! This module provides abstractions over platform differences to ensure Drydock
//! works consistently across Windows, macOS, and Linux.

use anyhow::{Context, Result};
use regex::Regex;
use std::path::{Path, PathBuf};

/// Checks if the current platform is Windows.
#[must_use]
pub const fn is_windows() -> bool {
    cfg!(windows)
}

/// Gets the home directory path for the current user.
///
/// Uses `%USERPROFILE%` on Windows, `$HOME` on Unix-like systems. This is the
/// `<home>` in the cache-root path `<home>/<cache-root>/<toolchain>/...` (§4.2).
pub fn get_home_dir() -> Result<PathBuf> {
    dirs::home_dir().ok_or_else(|| {
        let platform_help = if is_windows() {
            "On Windows: check that the USERPROFILE environment variable is set"
        } else {
            "On Unix/Linux: check that the HOME environment variable is set"
        };
        anyhow::anyhow!("Could not determine home directory.\n\n{platform_help}")
    })
}

/// Returns the appropriate Git command name for the current platform.
#[must_use]
pub const fn get_git_command() -> &'static str {
    if is_windows() { "git.exe" } else { "git" }
}

/// Resolves a path with tilde expansion and environment variable substitution.
///
/// Supports `~/path`, `$VAR` (Unix), `%VAR%` (Windows), and `${VAR}` syntax. Used
/// for raw-git local-path dependencies (§3 Dependency variant b) and for the
/// configured binary cache root.
pub fn resolve_path(path: &str) -> Result<PathBuf> {
    let expanded = if let Some(stripped) = path.strip_prefix("~/") {
        let home = get_home_dir()?;
        home.join(stripped)
    } else if path.starts_with('~') {
        return Err(anyhow::anyhow!(
            "Invalid path: {path}\n\nTilde expansion only supports '~/' for the home directory."
        ));
    } else {
        PathBuf::from(path)
    };

    let path_str = expanded.to_string_lossy();

    let expanded_str = if is_windows() && path_str.contains('%') {
        let mut result = path_str.to_string();
        let re = Regex::new(r"%([^%]+)%").unwrap();

        for cap in re.captures_iter(&path_str) {
            if let Some(var_name) = cap.get(1)
                && let Ok(value) = std::env::var(var_name.as_str())
            {
                result = result.replace(&format!("%{}%", var_name.as_str()), &value);
            }
        }

        match shellexpand::env(&result) {
            Ok(expanded) => expanded.into_owned(),
            Err(_) => result,
        }
    } else {
        shellexpand::env(&path_str)
            .with_context(|| format!("Failed to expand environment variables in path: {path_str}"))?
            .into_owned()
    };

    Ok(windows_long_path(&PathBuf::from(expanded_str)))
}

/// Normalizes a path for cross-platform storage by converting separators to `/`.
///
/// Used whenever a path is written into a `VersionFile`, resolved manifest, or
/// other on-disk record that must be stable across platforms.
#[must_use]
pub fn normalize_path_for_storage<P: AsRef<Path>>(path: P) -> String {
    let path_str = path.as_ref().to_string_lossy();

    let cleaned = if let Some(stripped) = path_str.strip_prefix(r"\\?\UNC\") {
        format!("//{stripped}")
    } else if let Some(stripped) = path_str.strip_prefix(r"\\?\") {
        stripped.to_string()
    } else {
        path_str.to_string()
    };

    cleaned.replace('\\', "/")
}

/// Canonicalizes a path with proper cross-platform handling.
pub fn safe_canonicalize(path: &Path) -> Result<PathBuf> {
    let canonical = path
        .canonicalize()
        .with_context(|| format!("Failed to canonicalize path: {}", path.display()))?;

    #[cfg(windows)]
    {
        Ok(windows_long_path(&canonical))
    }

    #[cfg(not(windows))]
    {
        Ok(canonical)
    }
}

/// Checks if a command is available in the system `PATH`.
#[must_use]
pub fn command_exists(cmd: &str) -> bool {
    which::which(cmd).is_ok()
}

/// Returns the platform-specific cache root directory for Drydock.
///
/// This is the default `<home>/<cache-root>` from §4.2 when no override is
/// configured via [`crate::config::GlobalConfig`].
pub fn get_cache_dir() -> Result<PathBuf> {
    dirs::cache_dir().map(|p| p.join("drydock")).ok_or_else(|| {
        let platform_help = if is_windows() {
            "On Windows: check that the LOCALAPPDATA environment variable is set"
        } else if cfg!(target_os = "macos") {
            "On macOS: check that the HOME environment variable is set"
        } else {
            "On Linux: check that the XDG_CACHE_HOME or HOME environment variable is set"
        };
        anyhow::anyhow!("Could not determine cache directory.\n\n{platform_help}")
    })
}

/// Handles Windows long paths (>260 characters) by applying UNC prefixes. No-op
/// elsewhere.
#[cfg(windows)]
#[must_use]
pub fn windows_long_path(path: &Path) -> PathBuf {
    if path.as_os_str().len() < 200 {
        return path.to_path_buf();
    }

    let path_str = path.to_string_lossy();
    if path_str.len() > 260 && !path_str.starts_with(r"\\?\") {
        let absolute_path = if path.is_relative() {
            std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")).join(path)
        } else {
            path.to_path_buf()
        };

        let absolute_str = absolute_path.to_string_lossy();
        if absolute_str.len() > 260 {
            if let Some(stripped) = absolute_str.strip_prefix(r"\\") {
                PathBuf::from(format!(r"\\?\UNC\{stripped}"))
            } else {
                PathBuf::from(format!(r"\\?\{absolute_str}"))
            }
        } else {
            absolute_path
        }
    } else {
        path.to_path_buf()
    }
}

/// No-op implementation of [`windows_long_path`] for non-Windows platforms.
#[cfg(not(windows))]
#[must_use]
pub fn windows_long_path(path: &Path) -> PathBuf {
    path.to_path_buf()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_home_dir() -> Result<()> {
        let home_path = get_home_dir()?;
        assert!(home_path.exists());
        Ok(())
    }

    #[test]
    fn test_resolve_path_tilde() {
        let home = get_home_dir().unwrap();
        assert_eq!(resolve_path("~/test").unwrap(), home.join("test"));
    }

    #[test]
    fn test_resolve_path_absolute() {
        assert_eq!(resolve_path("/tmp/test").unwrap(), PathBuf::from("/tmp/test"));
    }

    #[test]
    fn test_resolve_path_invalid_tilde() {
        assert!(resolve_path("~test").is_err());
    }

    #[test]
    fn test_normalize_path_for_storage() {
        assert_eq!(
            normalize_path_for_storage(Path::new("Checkouts/Foo")),
            "Checkouts/Foo"
        );
        assert_eq!(
            normalize_path_for_storage(Path::new(r"Checkouts\Foo")),
            "Checkouts/Foo"
        );
    }

    #[test]
    fn test_get_cache_dir() {
        let dir = get_cache_dir().unwrap();
        assert!(dir.to_string_lossy().contains("drydock"));
    }

    #[test]
    fn test_safe_canonicalize_nonexistent() {
        assert!(safe_canonicalize(Path::new("/nonexistent/path/to/file")).is_err());
    }
}
