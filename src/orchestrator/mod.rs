//! Build Orchestrator (spec §4.5): topologically sorts the resolved
//! dependency map into concurrency levels, decides per node whether a cached
//! artifact satisfies the request or a fresh build is needed, and propagates
//! rebuilds along the reverse graph.
//!
//! Grounded in the teacher's `resolver::graph` DFS/toposort pattern plus its
//! `tokio::sync::Semaphore`-bounded worker pool for concurrent installs.

use crate::build::{BuildRequest, BuildTaskFacade};
use crate::core::error::DrydockError;
use crate::manifest::{Dependency, ProjectManifest, ResolvedManifest};
use crate::resolver::DependencyProvider;
use crate::retriever::binary_cache::ArtifactKey;
use crate::retriever::Retriever;
use crate::version_file::{MatchQuery, RequestedFramework, RequestedPlatform, VersionFile, VersionStatus};
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use sha2::{Digest, Sha256};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;

/// Parameters shared across every node in one orchestrator run.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    pub use_binaries: bool,
    pub cache_builds: bool,
    pub configuration: String,
    pub platforms: Vec<String>,
    pub toolchain_version: String,
    pub parallelism: Option<usize>,
}

/// What happened to one dependency's build.
#[derive(Debug)]
pub enum NodeOutcome {
    SkippedBuildingCached,
    Built { framework_paths: Vec<PathBuf> },
}

struct LevelPlan {
    levels: Vec<Vec<Dependency>>,
    /// `dep -> deps that directly depend on it`, for rebuild propagation.
    dependents: HashMap<Dependency, Vec<Dependency>>,
    /// `dep -> its direct children`, for hashing each dependency's resolved
    /// sub-manifest into `resolved_dependencies_hash`.
    children: HashMap<Dependency, Vec<Dependency>>,
}

/// Drives the full build from a resolved dependency map.
pub struct Orchestrator<B: BuildTaskFacade> {
    retriever: Arc<Retriever>,
    build_task: Arc<B>,
    project_root: PathBuf,
}

impl<B: BuildTaskFacade + 'static> Orchestrator<B> {
    #[must_use]
    pub fn new(retriever: Arc<Retriever>, build_task: B, project_root: PathBuf) -> Self {
        Self {
            retriever,
            build_task: Arc::new(build_task),
            project_root,
        }
    }

    fn checkouts_dir(&self) -> PathBuf {
        self.project_root.join("Checkouts")
    }

    fn build_dir(&self) -> PathBuf {
        self.project_root.join("Build")
    }

    fn log_path(&self, dep: &Dependency) -> PathBuf {
        self.build_dir().join(".logs").join(format!("{}.log", dep.name()))
    }

    fn version_file_path(&self, dep: &Dependency) -> PathBuf {
        self.build_dir().join(format!(".{}.version", dep.name()))
    }

    /// Loads `Cartfile.project`, if present, for scheme-level build-unit
    /// overrides (spec §6 "Project manifest"). An empty or absent file
    /// yields an empty map, which callers read as "auto-discover".
    async fn load_project_manifest(&self) -> Result<ProjectManifest, DrydockError> {
        crate::manifest::load_project(&self.project_root).await
    }

    /// Builds a Kahn's-algorithm topological level assignment (longest path
    /// from any leaf, alphabetical tie-break) plus the reverse-dependency
    /// index used for rebuild propagation.
    async fn plan<P: DependencyProvider>(&self, provider: &P, resolved: &ResolvedManifest) -> Result<LevelPlan, DrydockError> {
        let mut graph: DiGraph<Dependency, ()> = DiGraph::new();
        let mut index: HashMap<Dependency, NodeIndex> = HashMap::new();
        for dep in resolved.keys() {
            let idx = graph.add_node(dep.clone());
            index.insert(dep.clone(), idx);
        }
        let mut children: HashMap<Dependency, Vec<Dependency>> = HashMap::new();
        for (dep, pinned) in resolved {
            let deps_of = provider.dependencies_of(dep, pinned).await?;
            let mut direct = Vec::with_capacity(deps_of.len());
            for (child, _spec) in deps_of {
                if let (Some(&from), Some(&to)) = (index.get(dep), index.get(&child)) {
                    graph.add_edge(from, to, ());
                }
                direct.push(child);
            }
            children.insert(dep.clone(), direct);
        }

        let order = toposort(&graph, None).map_err(|cycle| DrydockError::DependencyCycle {
            chain: graph[cycle.node_id()].name(),
        })?;

        // `order` is dependents-before-dependencies; walk it in reverse so
        // leaves (no outgoing edges) are assigned level 0 first.
        let mut level_of: HashMap<NodeIndex, usize> = HashMap::new();
        for &node in order.iter().rev() {
            let level = graph
                .neighbors(node)
                .filter_map(|child| level_of.get(&child))
                .copied()
                .max()
                .map_or(0, |max_child_level| max_child_level + 1);
            level_of.insert(node, level);
        }

        let max_level = level_of.values().copied().max().unwrap_or(0);
        let mut levels: Vec<Vec<Dependency>> = vec![Vec::new(); max_level + 1];
        for (&node, &level) in &level_of {
            levels[level].push(graph[node].clone());
        }
        for level in &mut levels {
            level.sort_by(|a, b| a.name().cmp(&b.name()));
        }

        let mut dependents: HashMap<Dependency, Vec<Dependency>> = HashMap::new();
        for edge in graph.edge_indices() {
            let (from, to) = graph.edge_endpoints(edge).unwrap();
            dependents.entry(graph[to].clone()).or_default().push(graph[from].clone());
        }

        Ok(LevelPlan { levels, dependents, children })
    }

    /// Runs the full build. `provider` answers `dependencies_of` for graph
    /// construction; in production this is the same [`Retriever`] passed to
    /// [`Self::new`], exposed separately so tests can substitute a fake.
    pub async fn run<P: DependencyProvider + Sync>(&self, provider: &P, resolved: &ResolvedManifest, options: &BuildOptions) -> Result<HashMap<Dependency, NodeOutcome>, DrydockError> {
        let plan = self.plan(provider, resolved).await?;
        let project_manifest = Arc::new(self.load_project_manifest().await?);
        let permits = crate::constants::effective_parallelism(options.parallelism);
        let semaphore = Arc::new(Semaphore::new(permits));

        let mut outcomes: HashMap<Dependency, NodeOutcome> = HashMap::new();
        let mut must_rebuild: HashSet<Dependency> = HashSet::new();

        for level in &plan.levels {
            let mut handles = Vec::new();
            for dep in level {
                let pinned = resolved.get(dep).cloned();
                let Some(pinned) = pinned else { continue };
                let force_rebuild = must_rebuild.contains(dep);
                let permit = Arc::clone(&semaphore);
                let checkout_dest = self.checkouts_dir();
                let dep = dep.clone();
                let retriever = Arc::clone(&self.retriever);
                let build_task = Arc::clone(&self.build_task);
                let options = options.clone();
                let version_file_path = self.version_file_path(&dep);
                let log_path = self.log_path(&dep);
                let build_dir = self.build_dir();
                let project_manifest = Arc::clone(&project_manifest);
                let resolved_dependencies_hash = resolved_dependencies_hash_for(&dep, &plan.children, resolved);

                handles.push(tokio::spawn(async move {
                    let _permit = permit.acquire_owned().await.expect("semaphore not closed");
                    let checkout_path = retriever.checkout(&dep, &pinned, &checkout_dest).await?;
                    let scheme = project_manifest.get(dep.name().as_str());
                    build_one(
                        &retriever,
                        build_task.as_ref(),
                        &dep,
                        &pinned,
                        &checkout_path,
                        &version_file_path,
                        &log_path,
                        &build_dir,
                        &options,
                        force_rebuild,
                        scheme,
                        resolved_dependencies_hash,
                    )
                    .await
                }));
            }

            for (dep, handle) in level.iter().cloned().zip(handles) {
                let result = handle.await.map_err(|e| DrydockError::BuildFailed {
                    target: dep.name(),
                    reason: format!("build task panicked: {e}"),
                })??;
                if let NodeOutcome::Built { .. } = &result {
                    if let Some(downstream) = plan.dependents.get(&dep) {
                        must_rebuild.extend(downstream.iter().cloned());
                    }
                }
                outcomes.insert(dep, result);
            }
        }

        Ok(outcomes)
    }
}

#[allow(clippy::too_many_arguments)]
async fn build_one<B: BuildTaskFacade>(
    retriever: &Retriever,
    build_task: &B,
    dep: &Dependency,
    pinned: &crate::version::PinnedVersion,
    checkout_path: &Path,
    version_file_path: &Path,
    log_path: &Path,
    build_dir: &Path,
    options: &BuildOptions,
    force_rebuild: bool,
    scheme: Option<&crate::manifest::SchemeDescriptor>,
    resolved_dependencies_hash: Option<String>,
) -> Result<NodeOutcome, DrydockError> {
    let source_hash = crate::fingerprint::hash_directory(checkout_path, &crate::fingerprint::IgnoreStack::with_defaults(), None)?;
    let source_hash_hex = hex::encode(source_hash);

    if !force_rebuild {
        if options.use_binaries {
            let key = ArtifactKey {
                dependency: dep,
                pinned,
                content_hash: &source_hash_hex,
                build_configuration: &options.configuration,
                toolchain_version: &options.toolchain_version,
            };
            let dest = build_dir.join(dep.name());
            if retriever.install_binary(&key, &dest).await? {
                // The cache key already ties this hit to `source_hash_hex`,
                // `options.configuration`, and `options.toolchain_version`;
                // write a version file for it now so the next run's
                // `cache_builds` check (and a bare `Build/` on first use)
                // recognizes this installed artifact instead of discarding it.
                let artifacts = framework_artifacts_under(&dest, &options.toolchain_version);
                let mut platforms = std::collections::BTreeMap::new();
                for platform in &options.platforms {
                    platforms.insert(platform.clone(), artifacts.clone());
                }
                let vf = VersionFile {
                    commitish: pinned.as_str().to_string(),
                    source_hash: Some(source_hash_hex.clone()),
                    resolved_dependencies_hash: resolved_dependencies_hash.clone(),
                    configuration: options.configuration.clone(),
                    platforms,
                };
                vf.save(version_file_path).await?;
                return Ok(NodeOutcome::SkippedBuildingCached);
            }
        }

        if options.cache_builds {
            if let Some(vf) = VersionFile::load(version_file_path).await? {
                let dest = build_dir.join(dep.name());
                let query = match_query(pinned, &source_hash_hex, resolved_dependencies_hash.as_deref(), options, &dest);
                if vf.matches(&query) == VersionStatus::Matching {
                    return Ok(NodeOutcome::SkippedBuildingCached);
                }
            }
        }
    }

    let (project_descriptor, platform) = match scheme {
        Some(descriptor) => (
            checkout_path.join(descriptor.workspace.as_ref().unwrap_or(&descriptor.project)),
            descriptor.sdks.first().cloned().unwrap_or_else(|| options.platforms.first().cloned().unwrap_or_default()),
        ),
        None => (checkout_path.to_path_buf(), options.platforms.first().cloned().unwrap_or_default()),
    };

    let request = BuildRequest {
        project_descriptor,
        scheme: dep.name(),
        platform,
        configuration: options.configuration.clone(),
        toolchain: options.toolchain_version.clone(),
        derived_data: build_dir.join(".derived-data").join(dep.name()),
    };

    let output = build_task.run(&request, log_path).await?;

    let mut platforms = std::collections::BTreeMap::new();
    let frameworks = output
        .framework_paths
        .iter()
        .filter_map(|p| {
            let hash = crate::fingerprint::hash_directory(p, &crate::fingerprint::IgnoreStack::with_defaults(), None).ok()?;
            Some(crate::version_file::FrameworkArtifact {
                name: p.file_stem()?.to_string_lossy().to_string(),
                hash: hex::encode(hash),
                toolchain_version: Some(options.toolchain_version.clone()),
            })
        })
        .collect();
    platforms.insert(output.platform.clone(), frameworks);

    let vf = VersionFile {
        commitish: pinned.as_str().to_string(),
        source_hash: Some(source_hash_hex),
        resolved_dependencies_hash,
        configuration: options.configuration.clone(),
        platforms,
    };
    vf.save(version_file_path).await?;

    Ok(NodeOutcome::Built {
        framework_paths: output.framework_paths,
    })
}

/// A dependency's direct children, each at its own resolved pinned version,
/// hashed into a single digest (spec §4.4/§4.5 `resolvedDependenciesHash`):
/// changes when any transitive sub-dependency moves even if `dep`'s own
/// source doesn't. `None` for a leaf with no children, matching
/// [`MatchQuery::resolved_dependencies_hash`]'s "absent means skip" semantics.
fn resolved_dependencies_hash_for(dep: &Dependency, children: &HashMap<Dependency, Vec<Dependency>>, resolved: &ResolvedManifest) -> Option<String> {
    let kids = children.get(dep)?;
    if kids.is_empty() {
        return None;
    }
    let mut pairs: Vec<(String, String)> = kids.iter().filter_map(|child| resolved.get(child).map(|pinned| (child.name(), pinned.as_str().to_string()))).collect();
    pairs.sort();

    let mut hasher = Sha256::new();
    for (name, version) in &pairs {
        hasher.update(name.as_bytes());
        hasher.update(b"@");
        hasher.update(version.as_bytes());
        hasher.update(b"\n");
    }
    Some(hex::encode(hasher.finalize()))
}

fn match_query(pinned: &crate::version::PinnedVersion, source_hash: &str, resolved_dependencies_hash: Option<&str>, options: &BuildOptions, artifact_dir: &Path) -> MatchQuery {
    let platforms = options
        .platforms
        .iter()
        .map(|platform| RequestedPlatform {
            name: platform.clone(),
            frameworks: frameworks_under(artifact_dir),
        })
        .collect();
    MatchQuery {
        commitish: pinned.as_str().to_string(),
        configuration: options.configuration.clone(),
        source_hash: Some(source_hash.to_string()),
        resolved_dependencies_hash: resolved_dependencies_hash.map(str::to_string),
        platforms,
        local_toolchain_version: options.toolchain_version.clone(),
        missing_symbols: None,
    }
}

fn frameworks_under(dir: &Path) -> Vec<RequestedFramework> {
    walkdir::WalkDir::new(dir)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.path().extension().is_some_and(|ext| ext == "framework"))
        .filter_map(|e| {
            let name = e.path().file_stem()?.to_string_lossy().to_string();
            let hash = crate::fingerprint::hash_directory(e.path(), &crate::fingerprint::IgnoreStack::with_defaults(), None).ok();
            Some(RequestedFramework {
                name,
                recomputed_hash: hash.map(hex::encode),
            })
        })
        .collect()
}

/// Like [`frameworks_under`] but producing the [`crate::version_file::FrameworkArtifact`]
/// shape a [`VersionFile`] persists, stamped with the toolchain that produced it.
fn framework_artifacts_under(dir: &Path, toolchain_version: &str) -> Vec<crate::version_file::FrameworkArtifact> {
    walkdir::WalkDir::new(dir)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.path().extension().is_some_and(|ext| ext == "framework"))
        .filter_map(|e| {
            let name = e.path().file_stem()?.to_string_lossy().to_string();
            let hash = crate::fingerprint::hash_directory(e.path(), &crate::fingerprint::IgnoreStack::with_defaults(), None).ok()?;
            Some(crate::version_file::FrameworkArtifact {
                name,
                hash: hex::encode(hash),
                toolchain_version: Some(toolchain_version.to_string()),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::PinnedVersion;

    fn dep(name: &str) -> Dependency {
        Dependency::github("github.com", "example", name)
    }

    #[test]
    fn test_resolved_dependencies_hash_is_none_for_leaf() {
        let children = HashMap::new();
        let resolved = ResolvedManifest::new();
        assert_eq!(resolved_dependencies_hash_for(&dep("Leaf"), &children, &resolved), None);
    }

    #[test]
    fn test_resolved_dependencies_hash_changes_when_a_childs_pin_moves() {
        let mut children = HashMap::new();
        children.insert(dep("Parent"), vec![dep("Child")]);
        let mut resolved = ResolvedManifest::new();
        resolved.insert(dep("Parent"), PinnedVersion::new("v1.0.0"));
        resolved.insert(dep("Child"), PinnedVersion::new("v1.0.0"));

        let before = resolved_dependencies_hash_for(&dep("Parent"), &children, &resolved);
        assert!(before.is_some());

        resolved.insert(dep("Child"), PinnedVersion::new("v2.0.0"));
        let after = resolved_dependencies_hash_for(&dep("Parent"), &children, &resolved);
        assert_ne!(before, after);
    }

    #[test]
    fn test_resolved_dependencies_hash_is_order_independent() {
        let mut children = HashMap::new();
        children.insert(dep("Parent"), vec![dep("A"), dep("B")]);
        let mut resolved = ResolvedManifest::new();
        resolved.insert(dep("A"), PinnedVersion::new("v1.0.0"));
        resolved.insert(dep("B"), PinnedVersion::new("v2.0.0"));
        let forward = resolved_dependencies_hash_for(&dep("Parent"), &children, &resolved);

        let mut children_reordered = HashMap::new();
        children_reordered.insert(dep("Parent"), vec![dep("B"), dep("A")]);
        let reordered = resolved_dependencies_hash_for(&dep("Parent"), &children_reordered, &resolved);

        assert_eq!(forward, reordered);
    }

    #[test]
    fn test_level_assignment_places_leaves_first() {
        // Exercised indirectly via graph construction helpers; full
        // end-to-end orchestration is covered by the integration suite,
        // which drives real git checkouts.
        let mut graph: DiGraph<&str, ()> = DiGraph::new();
        let a = graph.add_node("A");
        let b = graph.add_node("B");
        let c = graph.add_node("C");
        graph.add_edge(a, b, ());
        graph.add_edge(b, c, ());
        let order = toposort(&graph, None).unwrap();
        assert_eq!(order, vec![a, b, c]);
    }
}
