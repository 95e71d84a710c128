//! Process-wide directory-hash memoization (spec §4.1 "Caching", §5
//! "Process-wide memo caches ... monotonic-write").
//!
//! File hashes are cheap enough not to need memoizing; only directory
//! digests are cached, keyed by absolute path. Once a digest is inserted it
//! is never overwritten — a second `hash_directory` call for the same path
//! within one process returns the cached value without touching disk again.

use dashmap::DashMap;
use std::path::{Path, PathBuf};

/// A shared, append-only table of directory digests.
#[derive(Debug, Default)]
pub struct DirectoryHashCache {
    entries: DashMap<PathBuf, [u8; 32]>,
}

impl DirectoryHashCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, path: &Path) -> Option<[u8; 32]> {
        self.entries.get(path).map(|entry| *entry)
    }

    /// Record `digest` for `path` if nothing is recorded yet. Returns the
    /// value now stored for `path` (either the one just inserted, or a
    /// racing insert that won first) so callers always observe a single
    /// stable digest per path.
    pub fn insert_if_absent(&self, path: PathBuf, digest: [u8; 32]) -> [u8; 32] {
        *self.entries.entry(path).or_insert(digest)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_get() {
        let cache = DirectoryHashCache::new();
        let path = PathBuf::from("/tmp/example");
        assert!(cache.get(&path).is_none());
        let digest = [1u8; 32];
        assert_eq!(cache.insert_if_absent(path.clone(), digest), digest);
        assert_eq!(cache.get(&path), Some(digest));
    }

    #[test]
    fn test_insert_if_absent_keeps_first_value() {
        let cache = DirectoryHashCache::new();
        let path = PathBuf::from("/tmp/example");
        let first = [1u8; 32];
        let second = [2u8; 32];
        assert_eq!(cache.insert_if_absent(path.clone(), first), first);
        assert_eq!(cache.insert_if_absent(path.clone(), second), first);
    }
}
