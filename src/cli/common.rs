//! Shared plumbing every subcommand uses: locating the project root, turning
//! CLI flags into an [`orchestrator::BuildOptions`], and the
//! resolve-then-write sequence `bootstrap`/`update` both drive.

use crate::core::Session;
use crate::manifest::{Dependency, ManifestSet, ResolvedManifest};
use crate::orchestrator::{BuildOptions, Orchestrator};
use crate::resolver::{BacktrackingResolver, UpdatePolicy};
use anyhow::{Context, Result};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Default platforms built when `--platform` is not given.
pub const DEFAULT_PLATFORMS: &[&str] = &["iOS"];

/// Locates the project root, preferring an explicit `--manifest-path`'s
/// parent directory, falling back to walking up from the current directory
/// looking for a `Cartfile`.
pub async fn project_root(manifest_path: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = manifest_path {
        let dir = if path.is_dir() {
            path.to_path_buf()
        } else {
            path.parent().map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from("."))
        };
        return Ok(dir);
    }

    let cwd = std::env::current_dir().context("Failed to determine current directory")?;
    let set = ManifestSet::discover(&cwd).await?;
    Ok(set.root)
}

/// Parses `dependenciesToUpdate` into an [`UpdatePolicy`]: empty means "move
/// everything", per spec §9's resolved interpretation of `update` with no
/// arguments.
#[must_use]
pub fn update_policy(names: &[String]) -> UpdatePolicy {
    if names.is_empty() {
        UpdatePolicy::All
    } else {
        UpdatePolicy::Subset(names.iter().cloned().collect::<HashSet<_>>())
    }
}

/// Runs the resolver against the project's merged manifest.
pub async fn resolve(
    session: &Session,
    root: &Path,
    policy: &UpdatePolicy,
) -> Result<ResolvedManifest> {
    let manifest = ManifestSet::load(root).await?;
    let previous = crate::manifest::load_resolved(root).await?;

    let resolver = BacktrackingResolver::new(session.retriever.as_ref());
    Ok(resolver.resolve(&manifest.merged, previous.as_ref(), policy).await?)
}

/// Persists a freshly resolved manifest to `Cartfile.resolved`.
pub async fn write_resolved(root: &Path, resolved: &ResolvedManifest) -> Result<()> {
    Ok(crate::manifest::write_resolved(root, resolved).await?)
}

/// Assembles [`BuildOptions`] from the shared build-flag set every
/// build-driving subcommand exposes.
#[must_use]
pub fn build_options(
    session: &Session,
    configuration: &str,
    platforms: &[String],
    toolchain_version: &str,
    use_binaries: bool,
    cache_builds: bool,
    parallelism: Option<usize>,
) -> BuildOptions {
    let platforms = if platforms.is_empty() {
        DEFAULT_PLATFORMS.iter().map(ToString::to_string).collect()
    } else {
        platforms.to_vec()
    };

    BuildOptions {
        use_binaries,
        cache_builds,
        configuration: configuration.to_string(),
        platforms,
        toolchain_version: toolchain_version.to_string(),
        parallelism: parallelism.or(Some(session.parallelism())),
    }
}

/// Drives the orchestrator over an already-resolved manifest, reporting one
/// line per dependency outcome on success.
pub async fn run_build(
    session: &Session,
    root: &Path,
    resolved: &ResolvedManifest,
    options: &BuildOptions,
    quiet: bool,
) -> Result<()> {
    let orchestrator = Orchestrator::new(
        session.retriever.clone(),
        crate::build::SubprocessBuildTask::new(),
        root.to_path_buf(),
    );

    let outcomes = orchestrator.run(session.retriever.as_ref(), resolved, options).await?;

    if !quiet {
        let mut names: Vec<&Dependency> = outcomes.keys().collect();
        names.sort_by_key(|d| d.name());
        for dep in names {
            match &outcomes[dep] {
                crate::orchestrator::NodeOutcome::SkippedBuildingCached => {
                    println!("* {} — cached, skipped", dep.name());
                }
                crate::orchestrator::NodeOutcome::Built { framework_paths } => {
                    println!("* {} — built ({} artifact(s))", dep.name(), framework_paths.len());
                }
            }
        }
    }

    Ok(())
}
