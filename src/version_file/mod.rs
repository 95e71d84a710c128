//! The cache-validity record the Orchestrator consults before rebuilding a
//! dependency (spec §4.4): pairs a built artifact set with the inputs that
//! produced it and answers cache-hit/miss with a typed [`VersionStatus`]
//! rather than a bool, so a rebuild can explain itself.

use crate::core::error::DrydockError;
use crate::lock::FileLock;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// One built framework's recorded digest and the toolchain that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameworkArtifact {
    pub name: String,
    pub hash: String,
    #[serde(rename = "toolchainVersion", default, skip_serializing_if = "Option::is_none")]
    pub toolchain_version: Option<String>,
}

/// The on-disk `Build/.<dep>.version` record (spec §6 "Version file format").
///
/// `platforms` is `#[serde(flatten)]`ed so each platform name becomes its own
/// top-level JSON key alongside `commitish`/`configuration`, matching the
/// wire format's `{ "commitish": ..., "iOS": [...], "macOS": [...] }` shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionFile {
    pub commitish: String,
    #[serde(rename = "sourceHash", default, skip_serializing_if = "Option::is_none")]
    pub source_hash: Option<String>,
    #[serde(rename = "resolvedDependenciesHash", default, skip_serializing_if = "Option::is_none")]
    pub resolved_dependencies_hash: Option<String>,
    pub configuration: String,
    /// Platform name to the frameworks built for it, e.g. `"iOS"` -> `[...]`.
    #[serde(flatten)]
    pub platforms: BTreeMap<String, Vec<FrameworkArtifact>>,
}

/// A requested framework to check, with its digest recomputed fresh from the
/// artifact currently on disk (`None` if the artifact is missing entirely).
#[derive(Debug, Clone)]
pub struct RequestedFramework {
    pub name: String,
    pub recomputed_hash: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RequestedPlatform {
    pub name: String,
    pub frameworks: Vec<RequestedFramework>,
}

/// The (platforms, toolchain, configuration, source-revision,
/// transitive-dependency-set, symbol-closure) tuple the Orchestrator asks a
/// [`VersionFile`] to validate against.
#[derive(Debug, Clone)]
pub struct MatchQuery {
    pub commitish: String,
    pub configuration: String,
    pub source_hash: Option<String>,
    pub resolved_dependencies_hash: Option<String>,
    pub platforms: Vec<RequestedPlatform>,
    pub local_toolchain_version: String,
    /// Undefined symbols referenced by a sibling framework's binary that are
    /// not defined by any known sibling, precomputed by the caller (symbol
    /// table inspection is outside this module's responsibility). An empty
    /// set means no mismatch.
    pub missing_symbols: Option<BTreeSet<String>>,
}

/// Outcome of [`VersionFile::matches`]. A variant rather than a bool so the
/// Orchestrator can explain why it is rebuilding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionStatus {
    Matching,
    VersionFileNotFound,
    SourceHashMismatch,
    DependenciesHashMismatch,
    ConfigurationMismatch,
    CommitishMismatch,
    PlatformMissing(String),
    ToolchainMismatch,
    BinaryHashMismatch,
    BinaryHashUnavailable,
    SymbolsMismatch(BTreeSet<String>),
}

impl VersionFile {
    /// Loads the version file at `path`, returning `None` if it doesn't exist.
    pub async fn load(path: &Path) -> Result<Option<Self>, DrydockError> {
        if !path.exists() {
            return Ok(None);
        }
        let contents = tokio::fs::read_to_string(path).await.map_err(|e| DrydockError::RetrievalReadFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let parsed = serde_json::from_str(&contents).map_err(|e| DrydockError::InvalidBinaryJson {
            url: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Ok(Some(parsed))
    }

    /// Writes this version file atomically (write-temp-and-rename), pretty
    /// printed with sorted keys, guarded by a file lock on `path`.
    pub async fn save(&self, path: &Path) -> Result<(), DrydockError> {
        let _lock = FileLock::acquire_default(path).await?;
        let json = serde_json::to_string_pretty(self).map_err(|e| DrydockError::InvalidBinaryJson {
            url: path.display().to_string(),
            reason: e.to_string(),
        })?;
        crate::utils::fs::atomic_write(path, json.as_bytes()).map_err(|e| DrydockError::RetrievalWriteFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }

    /// Runs the short-circuiting match algorithm (spec §4.4).
    #[must_use]
    pub fn matches(&self, query: &MatchQuery) -> VersionStatus {
        if self.commitish != query.commitish {
            return VersionStatus::CommitishMismatch;
        }
        if self.configuration != query.configuration {
            return VersionStatus::ConfigurationMismatch;
        }
        if let Some(expected) = &query.source_hash {
            if self.source_hash.as_deref() != Some(expected.as_str()) {
                return VersionStatus::SourceHashMismatch;
            }
        }
        if let Some(expected) = &query.resolved_dependencies_hash {
            if self.resolved_dependencies_hash.as_deref() != Some(expected.as_str()) {
                return VersionStatus::DependenciesHashMismatch;
            }
        }

        for platform in &query.platforms {
            let Some(cached) = self.platforms.get(&platform.name) else {
                return VersionStatus::PlatformMissing(platform.name.clone());
            };
            for framework in &platform.frameworks {
                let Some(cached_fw) = cached.iter().find(|f| f.name == framework.name) else {
                    return VersionStatus::PlatformMissing(platform.name.clone());
                };
                let Some(recomputed) = &framework.recomputed_hash else {
                    return VersionStatus::BinaryHashUnavailable;
                };
                if &cached_fw.hash != recomputed {
                    return VersionStatus::BinaryHashMismatch;
                }
                match &cached_fw.toolchain_version {
                    Some(tv) if toolchain_compatible(tv, &query.local_toolchain_version) => {}
                    Some(_) => return VersionStatus::ToolchainMismatch,
                    None => {}
                }
            }
        }

        if let Some(missing) = &query.missing_symbols {
            if !missing.is_empty() {
                return VersionStatus::SymbolsMismatch(missing.clone());
            }
        }

        VersionStatus::Matching
    }
}

/// Two toolchain version markers are compatible if they match exactly or
/// share a major version (the module-stability rule's resolved decision —
/// see DESIGN.md).
fn toolchain_compatible(required: &str, local: &str) -> bool {
    required == local || major_component(required) == major_component(local)
}

fn major_component(version: &str) -> &str {
    version.split('.').next().unwrap_or(version)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample() -> VersionFile {
        let mut platforms = BTreeMap::new();
        platforms.insert(
            "iOS".to_string(),
            vec![FrameworkArtifact {
                name: "Foo".to_string(),
                hash: "abc123".to_string(),
                toolchain_version: Some("16.0".to_string()),
            }],
        );
        VersionFile {
            commitish: "deadbeef".to_string(),
            source_hash: Some("src123".to_string()),
            resolved_dependencies_hash: Some("deps123".to_string()),
            configuration: "Release".to_string(),
            platforms,
        }
    }

    fn query_for(vf: &VersionFile) -> MatchQuery {
        MatchQuery {
            commitish: vf.commitish.clone(),
            configuration: vf.configuration.clone(),
            source_hash: vf.source_hash.clone(),
            resolved_dependencies_hash: vf.resolved_dependencies_hash.clone(),
            platforms: vec![RequestedPlatform {
                name: "iOS".to_string(),
                frameworks: vec![RequestedFramework {
                    name: "Foo".to_string(),
                    recomputed_hash: Some("abc123".to_string()),
                }],
            }],
            local_toolchain_version: "16.0".to_string(),
            missing_symbols: None,
        }
    }

    #[test]
    fn test_matching_inputs_yield_matching() {
        let vf = sample();
        assert_eq!(vf.matches(&query_for(&vf)), VersionStatus::Matching);
    }

    #[test]
    fn test_commitish_mismatch() {
        let vf = sample();
        let mut query = query_for(&vf);
        query.commitish = "other".to_string();
        assert_eq!(vf.matches(&query), VersionStatus::CommitishMismatch);
    }

    #[test]
    fn test_configuration_mismatch() {
        let vf = sample();
        let mut query = query_for(&vf);
        query.configuration = "Debug".to_string();
        assert_eq!(vf.matches(&query), VersionStatus::ConfigurationMismatch);
    }

    #[test]
    fn test_source_hash_mismatch() {
        let vf = sample();
        let mut query = query_for(&vf);
        query.source_hash = Some("different".to_string());
        assert_eq!(vf.matches(&query), VersionStatus::SourceHashMismatch);
    }

    #[test]
    fn test_source_hash_not_compared_when_absent_from_query() {
        let vf = sample();
        let mut query = query_for(&vf);
        query.source_hash = None;
        assert_eq!(vf.matches(&query), VersionStatus::Matching);
    }

    #[test]
    fn test_platform_missing() {
        let vf = sample();
        let mut query = query_for(&vf);
        query.platforms.push(RequestedPlatform {
            name: "macOS".to_string(),
            frameworks: vec![],
        });
        assert_eq!(vf.matches(&query), VersionStatus::PlatformMissing("macOS".to_string()));
    }

    #[test]
    fn test_binary_hash_mismatch() {
        let vf = sample();
        let mut query = query_for(&vf);
        query.platforms[0].frameworks[0].recomputed_hash = Some("tampered".to_string());
        assert_eq!(vf.matches(&query), VersionStatus::BinaryHashMismatch);
    }

    #[test]
    fn test_binary_hash_unavailable() {
        let vf = sample();
        let mut query = query_for(&vf);
        query.platforms[0].frameworks[0].recomputed_hash = None;
        assert_eq!(vf.matches(&query), VersionStatus::BinaryHashUnavailable);
    }

    #[test]
    fn test_toolchain_mismatch_across_major_versions() {
        let vf = sample();
        let mut query = query_for(&vf);
        query.local_toolchain_version = "15.0".to_string();
        assert_eq!(vf.matches(&query), VersionStatus::ToolchainMismatch);
    }

    #[test]
    fn test_toolchain_compatible_within_same_major() {
        let vf = sample();
        let mut query = query_for(&vf);
        query.local_toolchain_version = "16.2".to_string();
        assert_eq!(vf.matches(&query), VersionStatus::Matching);
    }

    #[test]
    fn test_symbols_mismatch() {
        let vf = sample();
        let mut query = query_for(&vf);
        let mut missing = BTreeSet::new();
        missing.insert("_OBJC_CLASS_$_Bar".to_string());
        query.missing_symbols = Some(missing.clone());
        assert_eq!(vf.matches(&query), VersionStatus::SymbolsMismatch(missing));
    }

    #[tokio::test]
    async fn test_save_then_load_round_trips() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".Foo.version");
        let vf = sample();
        vf.save(&path).await.unwrap();
        let loaded = VersionFile::load(&path).await.unwrap().unwrap();
        assert_eq!(loaded, vf);
    }

    #[tokio::test]
    async fn test_load_missing_file_returns_none() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".Missing.version");
        assert!(VersionFile::load(&path).await.unwrap().is_none());
    }
}
