//! `drydock update` — re-resolve dependencies, optionally restricted to a
//! named subset, then build.

use crate::cli::common;
use crate::core::Session;
use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

/// Re-resolve the manifest and build the result.
#[derive(Args, Debug)]
pub struct UpdateArgs {
    /// Dependency names to update; omit to let every dependency move
    /// (`dependenciesToUpdate = ∅` per spec §9).
    pub dependencies: Vec<String>,

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

    /// Re-resolve without building afterward.
    #[arg(long)]
    pub no_build: bool,
}

impl UpdateArgs {
    pub async fn execute_with_manifest_path(self, manifest_path: Option<PathBuf>, quiet: bool) -> Result<()> {
        let session = Session::new(crate::config::GlobalConfig::load().await?)?;
        let root = common::project_root(manifest_path.as_deref()).await?;

        let policy = common::update_policy(&self.dependencies);
        let resolved = common::resolve(&session, &root, &policy).await?;
        common::write_resolved(&root, &resolved).await?;

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
