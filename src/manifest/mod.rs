//! Manifest parsing: `Cartfile`, `Cartfile.private`, `Cartfile.resolved`, and
//! the optional `Cartfile.project` descriptor (spec §3 DATA MODEL, §6
//! EXTERNAL INTERFACES).

mod cartfile;
mod dependency;
mod project;
mod resolved;

pub use dependency::Dependency;
pub use project::{ProjectManifest, SchemeDescriptor};
pub use resolved::ResolvedManifest;

use crate::core::DrydockError;
use crate::version::VersionSpecifier;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Merged root constraint map: a dependency's [`VersionSpecifier`] as
/// declared across the public and private Cartfiles.
pub type Manifest = BTreeMap<Dependency, VersionSpecifier>;

/// A manifest loaded from disk, keeping the paths it was read from so
/// `ManifestParseError`s can report a useful file name.
#[derive(Debug, Clone)]
pub struct ManifestSet {
    pub root: PathBuf,
    pub merged: Manifest,
}

impl ManifestSet {
    /// Load `Cartfile` (required) and `Cartfile.private` (optional) from
    /// `dir`, merging them into a single root constraint map.
    ///
    /// # Errors
    /// - [`DrydockError::ManifestNotFound`] if `dir/Cartfile` does not exist.
    /// - [`DrydockError::ManifestParseError`] on malformed syntax.
    /// - [`DrydockError::ManifestValidationError`] if a dependency appears in
    ///   both files (spec §3: "a dependency declared in both is a hard error").
    pub async fn load(dir: &Path) -> Result<Self, DrydockError> {
        let public_path = dir.join("Cartfile");
        if !public_path.exists() {
            return Err(DrydockError::ManifestNotFound);
        }

        let public_contents = tokio::fs::read_to_string(&public_path).await?;
        let public = cartfile::parse("Cartfile", &public_contents)?;

        let private_path = dir.join("Cartfile.private");
        let private = if private_path.exists() {
            let contents = tokio::fs::read_to_string(&private_path).await?;
            cartfile::parse("Cartfile.private", &contents)?
        } else {
            Manifest::new()
        };

        let merged = merge(public, private)?;

        Ok(Self {
            root: dir.to_path_buf(),
            merged,
        })
    }

    /// Locate the project root by walking up from `start` looking for a
    /// `Cartfile`, then load as in [`ManifestSet::load`].
    pub async fn discover(start: &Path) -> Result<Self, DrydockError> {
        let root = crate::utils::fs::find_upwards(start, "Cartfile")
            .map_err(|_| DrydockError::ManifestNotFound)?;
        Self::load(&root).await
    }
}

/// Merge a public and private manifest; a dependency present in both is a
/// hard error regardless of whether the specifiers agree.
fn merge(public: Manifest, private: Manifest) -> Result<Manifest, DrydockError> {
    let mut merged = public;
    for (dep, spec) in private {
        if merged.contains_key(&dep) {
            return Err(DrydockError::ManifestValidationError {
                reason: format!("'{}' is declared in both Cartfile and Cartfile.private", dep.name()),
            });
        }
        merged.insert(dep, spec);
    }
    Ok(merged)
}

/// Load `Cartfile.resolved` from `dir`, if present.
pub async fn load_resolved(dir: &Path) -> Result<Option<ResolvedManifest>, DrydockError> {
    let path = dir.join("Cartfile.resolved");
    if !path.exists() {
        return Ok(None);
    }
    let contents = tokio::fs::read_to_string(&path).await?;
    Ok(Some(resolved::parse("Cartfile.resolved", &contents)?))
}

/// Write `Cartfile.resolved` to `dir` atomically.
pub async fn write_resolved(dir: &Path, map: &ResolvedManifest) -> Result<(), DrydockError> {
    let path = dir.join("Cartfile.resolved");
    let contents = resolved::serialize(map);
    crate::utils::fs::atomic_write(&path, contents.as_bytes()).map_err(|e| DrydockError::RetrievalWriteFailed {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}

/// Load `Cartfile.project`, if present; an absent file is equivalent to an
/// empty one (auto-discovery fallback, spec §8).
pub async fn load_project(dir: &Path) -> Result<ProjectManifest, DrydockError> {
    let path = dir.join("Cartfile.project");
    if !path.exists() {
        return Ok(ProjectManifest::new());
    }
    let contents = tokio::fs::read_to_string(&path).await?;
    project::parse(&contents).map_err(|e| DrydockError::ManifestParseError {
        file: "Cartfile.project".to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_load_missing_cartfile_errors() {
        let temp = TempDir::new().unwrap();
        let err = ManifestSet::load(temp.path()).await.unwrap_err();
        assert!(matches!(err, DrydockError::ManifestNotFound));
    }

    #[tokio::test]
    async fn test_load_merges_public_and_private() {
        let temp = TempDir::new().unwrap();
        tokio::fs::write(temp.path().join("Cartfile"), "github \"owner/a\" ~> 1.0\n")
            .await
            .unwrap();
        tokio::fs::write(temp.path().join("Cartfile.private"), "github \"owner/b\" >= 2.0\n")
            .await
            .unwrap();

        let set = ManifestSet::load(temp.path()).await.unwrap();
        assert_eq!(set.merged.len(), 2);
    }

    #[tokio::test]
    async fn test_duplicate_across_manifests_errors() {
        let temp = TempDir::new().unwrap();
        tokio::fs::write(temp.path().join("Cartfile"), "github \"owner/a\" ~> 1.0\n")
            .await
            .unwrap();
        tokio::fs::write(temp.path().join("Cartfile.private"), "github \"owner/a\" >= 2.0\n")
            .await
            .unwrap();

        let err = ManifestSet::load(temp.path()).await.unwrap_err();
        assert!(matches!(err, DrydockError::ManifestValidationError { .. }));
    }

    #[tokio::test]
    async fn test_resolved_roundtrip_through_disk() {
        let temp = TempDir::new().unwrap();
        let mut map = ResolvedManifest::new();
        map.insert(Dependency::github("github.com", "owner", "a"), crate::version::PinnedVersion::new("v1.0.0"));
        write_resolved(temp.path(), &map).await.unwrap();

        let loaded = load_resolved(temp.path()).await.unwrap().unwrap();
        assert_eq!(loaded, map);
    }
}
