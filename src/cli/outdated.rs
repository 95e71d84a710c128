//! `drydock outdated` — report dependencies pinned to something older than
//! the newest version their root constraint still admits.
//!
//! Read-only: never touches `Cartfile.resolved` or the filesystem checkout
//! state, unlike `update`.

use crate::cli::common;
use crate::core::Session;
use crate::manifest::ManifestSet;
use crate::resolver::DependencyProvider;
use crate::version::{ConcreteVersion, VersionSpecifier};
use anyhow::Result;
use clap::Args;
use std::collections::BTreeSet;
use std::path::PathBuf;

/// List dependencies with a newer admissible version than the one pinned.
#[derive(Args, Debug)]
pub struct OutdatedArgs {
    /// Exit with status 1 if any dependency is outdated, for CI gating.
    #[arg(long)]
    pub fail_if_outdated: bool,
}

impl OutdatedArgs {
    pub async fn execute_with_manifest_path(self, manifest_path: Option<PathBuf>, quiet: bool) -> Result<()> {
        let session = Session::new(crate::config::GlobalConfig::load().await?)?;
        let root = common::project_root(manifest_path.as_deref()).await?;

        let resolved = crate::manifest::load_resolved(&root).await?.ok_or_else(|| {
            crate::core::DrydockError::Other {
                message: "No Cartfile.resolved found; run `drydock bootstrap` first".to_string(),
            }
        })?;
        let manifest = ManifestSet::load(&root).await?;

        let mut any_outdated = false;
        for (dep, pinned) in &resolved {
            // A transitively-pulled-in dependency has no root constraint of
            // its own; treat it as unconstrained rather than skipping it.
            let spec = manifest.merged.get(dep).cloned().unwrap_or(VersionSpecifier::Any);
            if matches!(spec, VersionSpecifier::GitReference(_) | VersionSpecifier::Exactly(_)) {
                // Pinned to a single admissible version by construction; never outdated.
                continue;
            }

            let candidates = session.retriever.versions_of(dep).await?;
            let best = candidates
                .into_iter()
                .filter(|candidate| spec.admits(candidate))
                .map(ConcreteVersion::new)
                .collect::<BTreeSet<_>>()
                .into_iter()
                .next();

            let Some(best) = best else { continue };
            let best = best.into_pinned();
            if best.as_str() != pinned.as_str() {
                any_outdated = true;
                if !quiet {
                    println!("{}: {} -> {}", dep.name(), pinned.as_str(), best.as_str());
                }
            }
        }

        if any_outdated && self.fail_if_outdated {
            anyhow::bail!("one or more dependencies have a newer admissible version");
        }

        Ok(())
    }
}
