//! Command-line surface (spec §6 EXTERNAL INTERFACES): argument parsing,
//! the four subcommands, and the exit-code taxonomy used by [`crate`]'s
//! `main`.
//!
//! Mirrors the teacher's `Cli`/`CliConfig` split: [`Cli`] is the clap-derived
//! argument tree, [`CliConfig`] is the plain-data subset `main` needs before
//! the tracing subscriber is installed, and [`Cli::execute_with_config`]
//! dispatches to each subcommand's own `execute_with_manifest_path`.

mod bootstrap;
mod build;
mod common;
mod outdated;
mod update;

use crate::core::DrydockError;
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// A decentralized dependency manager for compiled framework artifacts.
#[derive(Parser, Debug)]
#[command(name = "drydock", version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug-level logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress progress bars and per-dependency build output.
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Path to the project's `Cartfile` (or its containing directory);
    /// defaults to walking up from the current directory.
    #[arg(long, global = true)]
    manifest_path: Option<PathBuf>,

    /// Disable progress bars even when output is a terminal.
    #[arg(long, global = true)]
    no_progress: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Resolve (if no `Cartfile.resolved` exists) and build every dependency.
    Bootstrap(bootstrap::BootstrapArgs),
    /// Re-resolve dependencies, optionally restricted to the named ones.
    Update(update::UpdateArgs),
    /// Build the already-resolved `Cartfile.resolved` as-is.
    Build(build::BuildArgs),
    /// Report dependencies with a newer admissible version than the one pinned.
    Outdated(outdated::OutdatedArgs),
}

/// The subset of [`Cli`]'s flags `main` needs before dispatch, namely to
/// configure logging ahead of parsing the rest of the command.
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub log_level: Option<String>,
    pub no_progress: bool,
}

impl Cli {
    /// Derive a [`CliConfig`] from the parsed flags: `--verbose` requests
    /// debug logging, `--quiet` requests none, otherwise the default `info`.
    #[must_use]
    pub fn build_config(&self) -> CliConfig {
        let log_level = if self.verbose {
            Some("debug".to_string())
        } else if self.quiet {
            None
        } else {
            Some("info".to_string())
        };

        CliConfig {
            log_level,
            no_progress: self.no_progress || self.quiet,
        }
    }

    /// Dispatches to the selected subcommand, threading `config.no_progress`
    /// into each command's own quiet handling.
    pub async fn execute_with_config(self, config: CliConfig) -> Result<()> {
        let quiet = self.quiet || config.no_progress;
        match self.command {
            Commands::Bootstrap(args) => args.execute_with_manifest_path(self.manifest_path, quiet).await,
            Commands::Update(args) => args.execute_with_manifest_path(self.manifest_path, quiet).await,
            Commands::Build(args) => args.execute_with_manifest_path(self.manifest_path, quiet).await,
            Commands::Outdated(args) => args.execute_with_manifest_path(self.manifest_path, quiet).await,
        }
    }
}

/// Maps an error to spec §6's exit-code taxonomy: `0` success (handled by the
/// caller), `1` user error (manifest/resolution/toolchain), `2` I/O error
/// (retrieval read/write/lock failures), `3` subprocess failure (the build
/// itself). Errors that don't downcast to [`DrydockError`] — argument
/// parsing, `anyhow::Context` wrapping an I/O failure outside retrieval —
/// fall back to `1`.
#[must_use]
pub fn exit_code_for(error: &anyhow::Error) -> i32 {
    let Some(err) = error.downcast_ref::<DrydockError>() else {
        return 1;
    };

    match err {
        DrydockError::ManifestNotFound
        | DrydockError::ManifestParseError { .. }
        | DrydockError::ManifestValidationError { .. }
        | DrydockError::UnsatisfiableDependencyList { .. }
        | DrydockError::IncompatibleRequirements { .. }
        | DrydockError::RequiredVersionNotFound { .. }
        | DrydockError::TaggedVersionNotFound { .. }
        | DrydockError::DependencyCycle { .. }
        | DrydockError::IncompatibleDependencies { .. }
        | DrydockError::UnknownLocalToolchainVersion { .. }
        | DrydockError::IncompatibleToolchainVersions { .. }
        | DrydockError::ConfigError { .. }
        | DrydockError::GitAuthenticationFailed { .. }
        | DrydockError::GitNotFound
        | DrydockError::GitRepoInvalid { .. }
        | DrydockError::SemverError(_)
        | DrydockError::Other { .. } => 1,

        DrydockError::RetrievalReadFailed { .. }
        | DrydockError::RetrievalWriteFailed { .. }
        | DrydockError::LockError { .. }
        | DrydockError::IoError(_)
        | DrydockError::HttpError { .. }
        | DrydockError::InvalidBinaryJson { .. }
        | DrydockError::GitCommandError { .. }
        | DrydockError::GitCloneFailed { .. }
        | DrydockError::GitCheckoutFailed { .. } => 2,

        DrydockError::BuildFailed { .. } | DrydockError::IncompatibleArtifacts { .. } => 3,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_user_errors() {
        assert_eq!(exit_code_for(&DrydockError::ManifestNotFound.into()), 1);
        assert_eq!(
            exit_code_for(&DrydockError::DependencyCycle { chain: "A".to_string() }.into()),
            1
        );
    }

    #[test]
    fn test_exit_code_io_errors() {
        assert_eq!(
            exit_code_for(
                &DrydockError::RetrievalWriteFailed {
                    path: "x".to_string(),
                    reason: "disk full".to_string()
                }
                .into()
            ),
            2
        );
    }

    #[test]
    fn test_exit_code_build_errors() {
        assert_eq!(
            exit_code_for(
                &DrydockError::BuildFailed {
                    target: "Foo".to_string(),
                    reason: "xcodebuild exited 65".to_string()
                }
                .into()
            ),
            3
        );
    }

    #[test]
    fn test_exit_code_non_drydock_error_defaults_to_one() {
        assert_eq!(exit_code_for(&anyhow::anyhow!("boom")), 1);
    }

    #[test]
    fn test_build_config_verbose() {
        let cli = Cli::parse_from(["drydock", "--verbose", "build"]);
        assert_eq!(cli.build_config().log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_build_config_quiet() {
        let cli = Cli::parse_from(["drydock", "--quiet", "build"]);
        assert_eq!(cli.build_config().log_level, None);
        assert!(cli.build_config().no_progress);
    }

    #[test]
    fn test_build_config_default() {
        let cli = Cli::parse_from(["drydock", "build"]);
        assert_eq!(cli.build_config().log_level, Some("info".to_string()));
    }
}
