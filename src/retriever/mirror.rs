//! Per-URL mirror paths and the fetch-cache freshness table (spec §4.2
//! "Concurrency & ordering"), grounded in the teacher's `cache::Cache`/
//! `source::SourceManager` per-source directory naming.

use crate::constants::fetch_freshness_window;
use crate::manifest::Dependency;
use dashmap::DashMap;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Tracks one cache root's mirror directories and the monotonic per-URL
/// fetch timestamps used to skip redundant fetches.
#[derive(Debug, Default)]
pub struct MirrorCache {
    root: PathBuf,
    fetch_times: DashMap<String, Instant>,
}

impl MirrorCache {
    #[must_use]
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            fetch_times: DashMap::new(),
        }
    }

    /// Directory housing every bare mirror under this cache root.
    #[must_use]
    pub fn mirrors_dir(&self) -> PathBuf {
        self.root.join("mirrors")
    }

    /// The stable on-disk directory for `dep`'s bare mirror: its canonical
    /// name plus a short content hash of its clone URL, so two dependencies
    /// that happen to share a name never collide.
    #[must_use]
    pub fn mirror_path(&self, dep: &Dependency) -> PathBuf {
        let url = dep.clone_url().unwrap_or_else(|| dep.locator());
        self.mirrors_dir().join(mirror_dirname(&dep.name(), &url))
    }

    /// `true` iff `url` was fetched within [`fetch_freshness_window`].
    #[must_use]
    pub fn is_fresh(&self, url: &str) -> bool {
        self.fetch_times.get(url).is_some_and(|t| t.elapsed() < fetch_freshness_window())
    }

    pub fn mark_fetched(&self, url: &str) {
        self.fetch_times.insert(url.to_string(), Instant::now());
    }

    #[must_use]
    pub fn checkouts_dir(&self, project_root: &Path) -> PathBuf {
        project_root.join("Checkouts")
    }
}

fn mirror_dirname(name: &str, url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(url.as_bytes());
    let digest = hasher.finalize();
    format!("{name}-{}", hex::encode(&digest[..8]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mirror_path_stable_for_same_url() {
        let cache = MirrorCache::new(PathBuf::from("/cache"));
        let dep = Dependency::git("https://example.com/Foo.git");
        assert_eq!(cache.mirror_path(&dep), cache.mirror_path(&dep));
    }

    #[test]
    fn test_mirror_path_differs_for_same_name_different_url() {
        let cache = MirrorCache::new(PathBuf::from("/cache"));
        let a = Dependency::git("https://mirror1.example.com/Foo.git");
        let b = Dependency::git("https://mirror2.example.com/Foo.git");
        assert_ne!(cache.mirror_path(&a), cache.mirror_path(&b));
    }

    #[test]
    fn test_freshness_window() {
        let cache = MirrorCache::new(PathBuf::from("/cache"));
        assert!(!cache.is_fresh("https://example.com/Foo.git"));
        cache.mark_fetched("https://example.com/Foo.git");
        assert!(cache.is_fresh("https://example.com/Foo.git"));
    }
}
