//! Project-root discovery: locating the directory that holds `Cartfile`
//! from a nested working directory.

use anyhow::Result;
use std::path::{Path, PathBuf};

/// Finds the project root by searching for `marker` in the directory hierarchy.
///
/// Starts from `start` and walks upward until a directory containing `marker`
/// is found, the same way Git locates a repository root by looking for `.git`.
/// Used to locate the directory holding `Cartfile` from a nested working directory.
///
/// # Errors
///
/// Returns an error if `marker` is not found before reaching the filesystem root.
pub fn find_upwards(start: &Path, marker: &str) -> Result<PathBuf> {
    let mut current = start.canonicalize().unwrap_or_else(|_| start.to_path_buf());

    loop {
        if current.join(marker).exists() {
            return Ok(current);
        }

        if !current.pop() {
            return Err(anyhow::anyhow!(
                "No {marker} found in current directory or any parent directory"
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_find_upwards() {
        let temp = tempdir().unwrap();
        let project = temp.path().join("project");
        let subdir = project.join("src").join("subdir");

        crate::utils::fs::ensure_dir(&subdir).unwrap();
        std::fs::write(project.join("Cartfile"), "").unwrap();

        let root = find_upwards(&subdir, "Cartfile").unwrap();
        assert_eq!(root.canonicalize().unwrap(), project.canonicalize().unwrap());
    }

    #[test]
    fn test_find_upwards_not_found() {
        let temp = tempdir().unwrap();
        let result = find_upwards(temp.path(), "Cartfile");
        assert!(result.is_err());
    }

    #[test]
    fn test_find_upwards_closest_marker() {
        let temp = tempdir().unwrap();
        let root = temp.path().join("project");
        let subproject = root.join("subproject");
        let deep = subproject.join("src");

        crate::utils::fs::ensure_dir(&deep).unwrap();
        std::fs::write(root.join("Cartfile"), "").unwrap();
        std::fs::write(subproject.join("Cartfile"), "").unwrap();

        let found = find_upwards(&deep, "Cartfile").unwrap();
        assert_eq!(found.canonicalize().unwrap(), subproject.canonicalize().unwrap());
    }
}
