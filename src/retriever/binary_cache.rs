//! Three-tier binary-artifact cache (spec §4.2 "binary cache"):
//!
//! 1. local artifact store under the cache root, keyed by dependency name,
//!    pinned version, and content fingerprint;
//! 2. a git host's releases API, queried for an asset matching the pinned tag;
//! 3. a user-configured custom fetch command, invoked as a subprocess.
//!
//! Each tier is tried in order; the first hit populates the local store so
//! subsequent lookups for the same key are tier-1 hits.

use crate::core::error::DrydockError;
use crate::manifest::Dependency;
use crate::retriever::archive;
use crate::retriever::http::ReqwestFacade;
use crate::version::PinnedVersion;
use std::path::{Path, PathBuf};
use tokio::process::Command;

/// Identifies one cached build artifact.
#[derive(Debug, Clone)]
pub struct ArtifactKey<'a> {
    pub dependency: &'a Dependency,
    pub pinned: &'a PinnedVersion,
    /// Content fingerprint of the checked-out source (spec §4.4 VersionFile).
    pub content_hash: &'a str,
    pub build_configuration: &'a str,
    pub toolchain_version: &'a str,
}

pub struct BinaryCache {
    root: PathBuf,
    http: ReqwestFacade,
    custom_fetch_command: Option<String>,
}

impl BinaryCache {
    #[must_use]
    pub fn new(root: PathBuf, custom_fetch_command: Option<String>) -> Self {
        Self {
            root,
            http: ReqwestFacade::new(),
            custom_fetch_command,
        }
    }

    fn local_dir(&self, key: &ArtifactKey<'_>) -> PathBuf {
        self.root.join("binaries").join(key.dependency.name()).join(key.pinned.as_str()).join(&key.content_hash[..16.min(key.content_hash.len())])
    }

    /// Attempts to populate `dest_dir` with a cached artifact for `key`,
    /// returning `true` on a hit (from any tier) or `false` if none of the
    /// three tiers produced one.
    pub async fn install(&self, key: &ArtifactKey<'_>, dest_dir: &Path) -> Result<bool, DrydockError> {
        let local = self.local_dir(key);
        if local.is_dir() {
            copy_dir(&local, dest_dir)?;
            return Ok(true);
        }

        if let Some((host, owner, repo)) = key.dependency.host_repo() {
            if let Some(bytes) = self.fetch_from_release_api(host, owner, repo, key.pinned.as_str()).await? {
                self.store_archive_bytes(key, &bytes, dest_dir)?;
                return Ok(true);
            }
        }

        if let Some(command) = &self.custom_fetch_command {
            if self.fetch_via_custom_command(command, key, dest_dir).await? {
                self.store(key, dest_dir)?;
                return Ok(true);
            }
        }

        Ok(false)
    }

    async fn fetch_from_release_api(&self, host: &str, owner: &str, repo: &str, tag: &str) -> Result<Option<Vec<u8>>, DrydockError> {
        let assets = self.http.list_release_assets(host, owner, repo, tag).await?;
        let Some(asset) = assets.into_iter().find(|a| a.name.ends_with(".zip")) else {
            return Ok(None);
        };
        let (bytes, _content_type) = self.http.get_bytes(&asset.download_url).await?;
        Ok(Some(bytes))
    }

    fn store_archive_bytes(&self, key: &ArtifactKey<'_>, bytes: &[u8], dest_dir: &Path) -> Result<(), DrydockError> {
        let tmp = tempfile::Builder::new().suffix(".zip").tempfile().map_err(|e| DrydockError::RetrievalWriteFailed {
            path: dest_dir.display().to_string(),
            reason: e.to_string(),
        })?;
        std::fs::write(tmp.path(), bytes).map_err(|e| DrydockError::RetrievalWriteFailed {
            path: tmp.path().display().to_string(),
            reason: e.to_string(),
        })?;
        archive::unzip(tmp.path(), dest_dir)?;
        self.store(key, dest_dir).map(|_| ())
    }

    async fn fetch_via_custom_command(&self, command: &str, key: &ArtifactKey<'_>, dest_dir: &Path) -> Result<bool, DrydockError> {
        std::fs::create_dir_all(dest_dir).map_err(|e| DrydockError::RetrievalWriteFailed {
            path: dest_dir.display().to_string(),
            reason: e.to_string(),
        })?;
        let status = Command::new("sh")
            .arg("-c")
            .arg(command)
            .env("CACHE_DEPENDENCY_NAME", key.dependency.name())
            .env("CACHE_DEPENDENCY_VERSION", key.pinned.as_str())
            .env("CACHE_DEPENDENCY_HASH", key.content_hash)
            .env("CACHE_BUILD_CONFIGURATION", key.build_configuration)
            .env("CACHE_TOOLCHAIN_VERSION", key.toolchain_version)
            .env("CACHE_TARGET_FILE_PATH", dest_dir)
            .status()
            .await
            .map_err(|e| DrydockError::RetrievalReadFailed {
                path: command.to_string(),
                reason: e.to_string(),
            })?;
        Ok(status.success())
    }

    /// Promotes an already-fetched artifact directory into the local store so
    /// later lookups for the same key are tier-1 hits.
    pub fn store(&self, key: &ArtifactKey<'_>, artifact_dir: &Path) -> Result<PathBuf, DrydockError> {
        let local = self.local_dir(key);
        if !local.is_dir() {
            copy_dir(artifact_dir, &local)?;
        }
        Ok(local)
    }
}

fn copy_dir(src: &Path, dest: &Path) -> Result<(), DrydockError> {
    std::fs::create_dir_all(dest).map_err(|e| DrydockError::RetrievalWriteFailed {
        path: dest.display().to_string(),
        reason: e.to_string(),
    })?;
    for entry in walkdir::WalkDir::new(src).into_iter().filter_map(Result::ok) {
        let path = entry.path();
        let relative = path.strip_prefix(src).unwrap_or(path);
        if relative.as_os_str().is_empty() {
            continue;
        }
        let target = dest.join(relative);
        if path.is_dir() {
            std::fs::create_dir_all(&target).map_err(|e| DrydockError::RetrievalWriteFailed {
                path: target.display().to_string(),
                reason: e.to_string(),
            })?;
        } else if path.is_file() {
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent).ok();
            }
            std::fs::copy(path, &target).map_err(|e| DrydockError::RetrievalWriteFailed {
                path: target.display().to_string(),
                reason: e.to_string(),
            })?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_install_tier1_hit_from_local_store() {
        let cache_root = TempDir::new().unwrap();
        let cache = BinaryCache::new(cache_root.path().to_path_buf(), None);

        let dep = Dependency::github("github.com", "example", "Foo");
        let pinned = PinnedVersion::new("v1.0.0");
        let key = ArtifactKey {
            dependency: &dep,
            pinned: &pinned,
            content_hash: "abcdef0123456789",
            build_configuration: "Release",
            toolchain_version: "16.0",
        };

        let artifact = TempDir::new().unwrap();
        std::fs::write(artifact.path().join("Foo.framework"), b"binary").unwrap();
        cache.store(&key, artifact.path()).unwrap();

        let dest = TempDir::new().unwrap();
        let hit = cache.install(&key, dest.path()).await.unwrap();
        assert!(hit);
        assert!(dest.path().join("Foo.framework").exists());
    }

    #[tokio::test]
    async fn test_install_miss_with_no_tiers_configured() {
        let cache_root = TempDir::new().unwrap();
        let cache = BinaryCache::new(cache_root.path().to_path_buf(), None);
        let dep = Dependency::git("https://example.com/Foo.git");
        let pinned = PinnedVersion::new("v1.0.0");
        let key = ArtifactKey {
            dependency: &dep,
            pinned: &pinned,
            content_hash: "0000000000000000",
            build_configuration: "Release",
            toolchain_version: "16.0",
        };
        let dest = TempDir::new().unwrap();
        let hit = cache.install(&key, dest.path()).await.unwrap();
        assert!(!hit);
    }
}
