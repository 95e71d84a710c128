//! The Retriever (spec §4.2): turns a [`Dependency`] into a local checkout or
//! binary artifact, backed by a bare git mirror per dependency plus a
//! three-tier binary cache.
//!
//! Grounded in the teacher's `source::SourceManager` + `cache::Cache`
//! bare-mirror/worktree design: one bare clone per remote under the cache
//! root, with per-version worktrees checked out on demand.

pub mod archive;
pub mod binary_cache;
pub mod http;
pub mod mirror;

use crate::core::error::DrydockError;
use crate::git::GitRepo;
use crate::lock::FileLock;
use crate::manifest::Dependency;
use crate::resolver::DependencyProvider;
use crate::version::{PinnedVersion, VersionSpecifier};
use binary_cache::{ArtifactKey, BinaryCache};
use mirror::MirrorCache;
use std::path::{Path, PathBuf};

/// Resolves dependencies against live git mirrors and a binary cache.
pub struct Retriever {
    cache_root: PathBuf,
    mirrors: MirrorCache,
    binaries: BinaryCache,
}

impl Retriever {
    #[must_use]
    pub fn new(cache_root: PathBuf, custom_fetch_command: Option<String>) -> Self {
        Self {
            mirrors: MirrorCache::new(cache_root.clone()),
            binaries: BinaryCache::new(cache_root.clone(), custom_fetch_command),
            cache_root,
        }
    }

    fn locks_dir(&self) -> PathBuf {
        self.cache_root.join("locks")
    }

    async fn lock_for(&self, name: &str) -> Result<FileLock, DrydockError> {
        FileLock::acquire_default(&self.locks_dir().join(format!("{name}.lock"))).await
    }

    /// Ensures a fresh bare mirror exists for `dep`, cloning it on first use
    /// and fetching again only once its fetch-cache entry has expired (spec
    /// §4.2 "a second fetch within the freshness window is a no-op").
    pub async fn clone_or_fetch(&self, dep: &Dependency) -> Result<GitRepo, DrydockError> {
        let url = dep.clone_url().ok_or_else(|| DrydockError::GitCloneFailed {
            url: dep.locator(),
            reason: "binary dependencies have no git remote".to_string(),
        })?;
        let mirror_path = self.mirrors.mirror_path(dep);
        let _lock = self.lock_for(&dep.name()).await?;

        if mirror_path.is_dir() {
            if self.mirrors.is_fresh(&url) {
                return Ok(GitRepo::new(&mirror_path));
            }
            let repo = GitRepo::new(&mirror_path);
            match repo.fetch(None).await {
                Ok(()) => {
                    self.mirrors.mark_fetched(&url);
                    return Ok(repo);
                }
                Err(_) => {
                    // Corrupt mirror: remove and re-clone once.
                    std::fs::remove_dir_all(&mirror_path).ok();
                }
            }
        }

        if let Some(parent) = mirror_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| DrydockError::RetrievalWriteFailed {
                path: parent.display().to_string(),
                reason: e.to_string(),
            })?;
        }
        let repo = GitRepo::clone_bare(&url, &mirror_path).await.map_err(|e| DrydockError::GitCloneFailed {
            url: url.clone(),
            reason: e.to_string(),
        })?;
        self.mirrors.mark_fetched(&url);
        Ok(repo)
    }

    /// Checks out `pinned` for `dep` into `checkouts_root/<name>`, returning
    /// the checkout path.
    pub async fn checkout(&self, dep: &Dependency, pinned: &PinnedVersion, checkouts_root: &Path) -> Result<PathBuf, DrydockError> {
        let repo = self.clone_or_fetch(dep).await?;
        let dest = checkouts_root.join(dep.name());
        if dest.exists() {
            std::fs::remove_dir_all(&dest).map_err(|e| DrydockError::RetrievalWriteFailed {
                path: dest.display().to_string(),
                reason: e.to_string(),
            })?;
        }
        repo.create_worktree(&dest, Some(pinned.as_str())).await.map_err(|e| DrydockError::GitCheckoutFailed {
            reference: pinned.as_str().to_string(),
            reason: e.to_string(),
        })?;
        Ok(dest)
    }

    /// Attempts to satisfy `dep`@`pinned` from the binary cache, placing the
    /// artifact in `dest_dir`. Returns `true` on a cache hit.
    pub async fn install_binary(&self, key: &ArtifactKey<'_>, dest_dir: &Path) -> Result<bool, DrydockError> {
        self.binaries.install(key, dest_dir).await
    }

    /// Promotes a freshly-built artifact into the binary cache's local tier.
    pub fn store_binary(&self, key: &ArtifactKey<'_>, artifact_dir: &Path) -> Result<PathBuf, DrydockError> {
        self.binaries.store(key, artifact_dir)
    }

    /// Warms mirrors for a batch of dependencies ahead of resolution, bounded
    /// by the caller's concurrency limit (spec §4.2 "prefetch").
    pub async fn prefetch(&self, deps: &[Dependency], max_concurrency: usize) -> Vec<Result<(), DrydockError>> {
        use futures::stream::{self, StreamExt};
        stream::iter(deps)
            .map(|dep| async move { self.clone_or_fetch(dep).await.map(|_| ()) })
            .buffer_unordered(max_concurrency.max(1))
            .collect()
            .await
    }
}

impl DependencyProvider for Retriever {
    async fn versions_of(&self, dep: &Dependency) -> Result<Vec<PinnedVersion>, DrydockError> {
        let repo = self.clone_or_fetch(dep).await?;
        let tags = repo.list_tags().await.map_err(|e| DrydockError::GitCommandError {
            operation: "tag".to_string(),
            stderr: e.to_string(),
        })?;
        // Only SemVer-parseable tags are candidates (spec §4.2); a tag like
        // "nightly" would otherwise be accepted as the resolved version for
        // an unconstrained `VersionSpecifier::Any` dependency.
        Ok(tags.into_iter().map(PinnedVersion::new).filter(PinnedVersion::is_semantic).collect())
    }

    async fn dependencies_of(&self, dep: &Dependency, version: &PinnedVersion) -> Result<Vec<(Dependency, VersionSpecifier)>, DrydockError> {
        let repo = self.clone_or_fetch(dep).await?;
        let tmp = tempfile::Builder::new().prefix("drydock-manifest-").tempdir().map_err(|e| DrydockError::RetrievalReadFailed {
            path: dep.name(),
            reason: e.to_string(),
        })?;
        let worktree = repo.create_worktree(tmp.path(), Some(version.as_str())).await.map_err(|e| DrydockError::GitCheckoutFailed {
            reference: version.as_str().to_string(),
            reason: e.to_string(),
        })?;
        if !worktree.path().join("Cartfile").exists() {
            return Ok(Vec::new());
        }
        let manifest = crate::manifest::ManifestSet::load(worktree.path()).await?;
        Ok(manifest.merged.into_iter().collect())
    }

    async fn resolve_ref(&self, dep: &Dependency, reference: &str) -> Result<PinnedVersion, DrydockError> {
        let repo = self.clone_or_fetch(dep).await?;
        let sha = repo.resolve_to_sha(Some(reference)).await.map_err(|e| DrydockError::GitCheckoutFailed {
            reference: reference.to_string(),
            reason: e.to_string(),
        })?;
        Ok(PinnedVersion::new(sha))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn init_bare_source_repo(dir: &Path) {
        std::process::Command::new("git").arg("init").arg(dir).output().unwrap();
        std::fs::write(dir.join("README.md"), "hi").unwrap();
        std::process::Command::new("git").args(["-C"]).arg(dir).args(["add", "."]).output().unwrap();
        std::process::Command::new("git")
            .args(["-C"])
            .arg(dir)
            .args(["-c", "user.email=t@example.com", "-c", "user.name=t", "commit", "-m", "init"])
            .output()
            .unwrap();
        std::process::Command::new("git").args(["-C"]).arg(dir).args(["tag", "v1.0.0"]).output().unwrap();
    }

    #[tokio::test]
    async fn test_clone_or_fetch_then_checkout() {
        let source = TempDir::new().unwrap();
        init_bare_source_repo(source.path());

        let cache_root = TempDir::new().unwrap();
        let retriever = Retriever::new(cache_root.path().to_path_buf(), None);
        let dep = Dependency::git(format!("file://{}", source.path().display()));

        let versions = retriever.versions_of(&dep).await.unwrap();
        assert_eq!(versions.len(), 1);
        assert_eq!(versions[0].as_str(), "v1.0.0");

        let checkouts = TempDir::new().unwrap();
        let checkout_path = retriever.checkout(&dep, &versions[0], checkouts.path()).await.unwrap();
        assert!(checkout_path.join("README.md").exists());
    }

    #[tokio::test]
    async fn test_versions_of_filters_out_non_semver_tags() {
        let source = TempDir::new().unwrap();
        init_bare_source_repo(source.path());
        std::process::Command::new("git").args(["-C"]).arg(source.path()).args(["tag", "nightly"]).output().unwrap();

        let cache_root = TempDir::new().unwrap();
        let retriever = Retriever::new(cache_root.path().to_path_buf(), None);
        let dep = Dependency::git(format!("file://{}", source.path().display()));

        let versions = retriever.versions_of(&dep).await.unwrap();
        assert_eq!(versions.len(), 1);
        assert_eq!(versions[0].as_str(), "v1.0.0");
        assert!(versions.iter().all(PinnedVersion::is_semantic));
    }
}
