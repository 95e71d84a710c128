//! `drydock build` — build the already-resolved `Cartfile.resolved` as-is,
//! without touching the resolver.

use crate::cli::common;
use crate::core::Session;
use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

/// Build every dependency pinned in `Cartfile.resolved`.
#[derive(Args, Debug)]
pub struct BuildArgs {
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
}

impl BuildArgs {
    pub async fn execute_with_manifest_path(self, manifest_path: Option<PathBuf>, quiet: bool) -> Result<()> {
        let session = Session::new(crate::config::GlobalConfig::load().await?)?;
        let root = common::project_root(manifest_path.as_deref()).await?;

        let resolved = crate::manifest::load_resolved(&root).await?.ok_or_else(|| {
            crate::core::DrydockError::Other {
                message: "No Cartfile.resolved found; run `drydock bootstrap` first".to_string(),
            }
        })?;

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
