//! `drydock bootstrap` — resolve (only if no `Cartfile.resolved` exists yet)
//! and build every dependency.
//!
//! Unlike `update`, bootstrap never lets an existing resolved manifest move:
//! if `Cartfile.resolved` is already present it is used as-is (spec §8
//! boundary behavior "Resolver with `lastResolved=R0` and
//! `dependenciesToUpdate=∅` returns `R0` unchanged iff `R0` still satisfies
//! `M`").

use crate::cli::common;
use crate::core::Session;
use crate::resolver::UpdatePolicy;
use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

/// Resolve (if needed) and build every dependency in the manifest.
#[derive(Args, Debug)]
pub struct BootstrapArgs {
    /// Platforms to build for (repeatable); defaults to `iOS`.
    #[arg(long = "platform")]
    pub platforms: Vec<String>,

    /// Build configuration passed through to the build task facade.
    #[arg(long, default_value = "Release")]
    pub configuration: String,

    /// Local toolchain version string recorded in and matched against
    /// version files.
    #[arg(long, default_value = "unspecified")]
    pub toolchain_version: String,

    /// Skip the prebuilt binary cache and always build from source.
    #[arg(long, env = "DRYDOCK_NO_BINARIES")]
    pub no_use_binaries: bool,

    /// Skip the on-disk version-file cache and always rebuild.
    #[arg(long)]
    pub no_cache_builds: bool,

    /// Override the intra-level build concurrency.
    #[arg(long)]
    pub parallelism: Option<usize>,

    /// Resolve (if needed) and write `Cartfile.resolved` without building.
    #[arg(long)]
    pub no_build: bool,
}

impl BootstrapArgs {
    pub async fn execute_with_manifest_path(self, manifest_path: Option<PathBuf>, quiet: bool) -> Result<()> {
        let session = Session::new(crate::config::GlobalConfig::load().await?)?;
        let root = common::project_root(manifest_path.as_deref()).await?;

        let resolved = match crate::manifest::load_resolved(&root).await? {
            Some(resolved) => resolved,
            None => {
                let resolved = common::resolve(&session, &root, &UpdatePolicy::All).await?;
                common::write_resolved(&root, &resolved).await?;
                resolved
            }
        };

        if self.no_build {
            return Ok(());
        }

        let options = common::build_options(
            &session,
            &self.configuration,
            &self.platforms,
            &self.toolchain_version,
            !self.no_use_binaries,
            !self.no_cache_builds,
            self.parallelism,
        );

        common::run_build(&session, &root, &resolved, &options, quiet).await
    }
}
