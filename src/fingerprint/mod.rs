//! Fingerprint (C1): stable content digests of source trees and binary
//! files (spec §4.1).
//!
//! `hash_file`/`hash_directory` feed bytes into a single SHA-256 context —
//! the same digest family the teacher crate already used for its own
//! checksum helper — so adding this module introduces no new crate.

pub mod cache;
pub mod ignore;

pub use cache::DirectoryHashCache;
pub use ignore::IgnoreStack;

use crate::core::DrydockError;
use sha2::{Digest, Sha256};
use std::fs;
use std::io::Read;
use std::path::Path;

/// Hash a single file's contents. Not memoized (spec §4.1: "File hashes are
/// not memoized").
pub fn hash_file(path: &Path) -> Result<[u8; 32], DrydockError> {
    let mut file = fs::File::open(path).map_err(|e| DrydockError::RetrievalReadFailed {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 64 * 1024];
    loop {
        let n = file.read(&mut buf).map_err(|e| DrydockError::RetrievalReadFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hasher.finalize().into())
}

/// Hash a directory tree per spec §4.1's algorithm: children sorted
/// ascending by raw filename bytes, gitignore-style filtering with
/// directory-vs-file distinction, one shared digest context across the
/// whole recursion, symlinks and special files ignored. `cache`, when
/// given, memoizes the result by absolute path.
pub fn hash_directory(path: &Path, ignore: &IgnoreStack, cache: Option<&DirectoryHashCache>) -> Result<[u8; 32], DrydockError> {
    let absolute = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    if let Some(cache) = cache {
        if let Some(hit) = cache.get(&absolute) {
            return Ok(hit);
        }
    }

    let mut hasher = Sha256::new();
    let mut components: Vec<String> = Vec::new();
    walk(path, &mut components, ignore, &mut hasher)?;
    let digest: [u8; 32] = hasher.finalize().into();

    Ok(match cache {
        Some(cache) => cache.insert_if_absent(absolute, digest),
        None => digest,
    })
}

fn walk(dir: &Path, components: &mut Vec<String>, ignore: &IgnoreStack, hasher: &mut Sha256) -> Result<(), DrydockError> {
    let gitignore_path = dir.join(".gitignore");
    let gitignore_contents = fs::read_to_string(&gitignore_path).ok();
    let level_ignore = ignore.push(components.len(), gitignore_contents.as_deref());

    let mut children: Vec<fs::DirEntry> = fs::read_dir(dir)
        .map_err(|e| DrydockError::RetrievalReadFailed {
            path: dir.display().to_string(),
            reason: e.to_string(),
        })?
        .filter_map(Result::ok)
        .collect();
    children.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    for entry in children {
        let file_name = entry.file_name();
        let name = file_name.to_string_lossy().into_owned();
        let file_type = match entry.file_type() {
            Ok(ft) => ft,
            Err(_) => continue,
        };
        if file_type.is_symlink() || (!file_type.is_dir() && !file_type.is_file()) {
            continue;
        }

        components.push(name.clone());
        let rel: Vec<&str> = components.iter().map(String::as_str).collect();
        let ignored = level_ignore.is_ignored(&rel, file_type.is_dir());

        if !ignored {
            if file_type.is_dir() {
                walk(&entry.path(), components, &level_ignore, hasher)?;
            } else {
                let mut file = fs::File::open(entry.path()).map_err(|e| DrydockError::RetrievalReadFailed {
                    path: entry.path().display().to_string(),
                    reason: e.to_string(),
                })?;
                let mut buf = [0u8; 64 * 1024];
                loop {
                    let n = file.read(&mut buf).map_err(|e| DrydockError::RetrievalReadFailed {
                        path: entry.path().display().to_string(),
                        reason: e.to_string(),
                    })?;
                    if n == 0 {
                        break;
                    }
                    hasher.update(&buf[..n]);
                }
            }
        }
        components.pop();
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &Path, rel: &str, content: &str) {
        let path = dir.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_hash_file_deterministic() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("a.txt");
        fs::write(&file, b"hello").unwrap();
        assert_eq!(hash_file(&file).unwrap(), hash_file(&file).unwrap());
    }

    #[test]
    fn test_hash_directory_stable_across_copies() {
        let a = TempDir::new().unwrap();
        write(a.path(), "src/main.rs", "fn main() {}");
        write(a.path(), "README.md", "hello");

        let b = TempDir::new().unwrap();
        write(b.path(), "src/main.rs", "fn main() {}");
        write(b.path(), "README.md", "hello");

        let ignore = IgnoreStack::with_defaults();
        assert_eq!(
            hash_directory(a.path(), &ignore, None).unwrap(),
            hash_directory(b.path(), &ignore, None).unwrap()
        );
    }

    #[test]
    fn test_hash_directory_ignores_default_build_dir() {
        let with_build = TempDir::new().unwrap();
        write(with_build.path(), "src/main.rs", "fn main() {}");
        write(with_build.path(), "Build/output.bin", "binary-garbage");

        let without_build = TempDir::new().unwrap();
        write(without_build.path(), "src/main.rs", "fn main() {}");

        let ignore = IgnoreStack::with_defaults();
        assert_eq!(
            hash_directory(with_build.path(), &ignore, None).unwrap(),
            hash_directory(without_build.path(), &ignore, None).unwrap()
        );
    }

    #[test]
    fn test_hash_directory_changes_when_content_changes() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "src/main.rs", "fn main() {}");
        let ignore = IgnoreStack::with_defaults();
        let before = hash_directory(dir.path(), &ignore, None).unwrap();

        write(dir.path(), "src/main.rs", "fn main() { println!(\"x\"); }");
        let after = hash_directory(dir.path(), &ignore, None).unwrap();
        assert_ne!(before, after);
    }

    #[test]
    fn test_hash_directory_cache_memoizes() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a.txt", "content");
        let ignore = IgnoreStack::with_defaults();
        let cache = DirectoryHashCache::new();

        let first = hash_directory(dir.path(), &ignore, Some(&cache)).unwrap();
        write(dir.path(), "a.txt", "different content");
        let second = hash_directory(dir.path(), &ignore, Some(&cache)).unwrap();
        assert_eq!(first, second, "cached digest should not reflect the on-disk change");
    }
}
