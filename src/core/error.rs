//! Error handling for Drydock
//!
//! The error system is built around two types:
//! - [`DrydockError`] - every failure mode the Resolver, Retriever, VersionFile
//!   matcher, and Build Orchestrator can produce
//! - [`ErrorContext`] - wraps a [`DrydockError`] with an optional suggestion and
//!   extra details for CLI display
//!
//! # Examples
//!
//! ```rust,no_run
//! use drydock_cli::core::{DrydockError, ErrorContext};
//!
//! let error = DrydockError::GitNotFound;
//! let context = ErrorContext::new(error)
//!     .with_suggestion("Install git from https://git-scm.com/")
//!     .with_details("Drydock requires git for repository operations");
//!
//! context.display();
//! ```

use colored::Colorize;
use std::fmt;
use thiserror::Error;

/// The main error type for Drydock operations.
///
/// Variants are grouped by the subsystem that raises them: git/HTTP retrieval,
/// manifest parsing, dependency resolution, toolchain compatibility, and the
/// build orchestrator.
#[derive(Error, Debug)]
pub enum DrydockError {
    // --- Retriever: git ---
    /// Git executable not found in `PATH`.
    #[error("Git is not installed or not found in PATH")]
    GitNotFound,

    /// A git subprocess returned a non-zero exit code.
    #[error("Git operation failed: {operation}")]
    GitCommandError {
        /// The git operation that failed (e.g. "clone", "fetch", "checkout")
        operation: String,
        /// Captured stderr from the git process
        stderr: String,
    },

    /// A path was expected to be a git repository mirror but isn't.
    #[error("Not a valid git repository: {path}")]
    GitRepoInvalid {
        /// The path that was expected to contain a git repository
        path: String,
    },

    /// Git authentication failed for a remote repository.
    #[error("Git authentication failed for repository: {url}")]
    GitAuthenticationFailed {
        /// The repository URL that failed authentication
        url: String,
    },

    /// `cloneOrFetch` failed outright.
    #[error("Failed to clone repository: {url}\n{reason}")]
    GitCloneFailed {
        /// The repository URL that failed to clone
        url: String,
        /// The reason for the clone failure
        reason: String,
    },

    /// Checking out a resolved git reference failed.
    #[error("Failed to checkout reference '{reference}' in repository")]
    GitCheckoutFailed {
        /// The git reference (branch, tag, or commit) that failed to checkout
        reference: String,
        /// The reason for the checkout failure
        reason: String,
    },

    // --- Retriever: binary cache / HTTP ---
    /// A binary-cache download returned a non-success HTTP status or transport error.
    #[error("HTTP error fetching {url}: {reason}")]
    HttpError {
        /// The URL that was being fetched
        url: String,
        /// Description of the failure
        reason: String,
    },

    /// A binary manifest JSON file could not be parsed.
    #[error("Invalid binary manifest JSON at {url}: {reason}")]
    InvalidBinaryJson {
        /// The URL or path the manifest was read from
        url: String,
        /// The JSON parsing failure
        reason: String,
    },

    /// Reading a cached artifact from disk failed.
    #[error("Failed to read '{path}': {reason}")]
    RetrievalReadFailed {
        /// The path that could not be read
        path: String,
        /// The underlying I/O failure
        reason: String,
    },

    /// Writing a fetched artifact to disk failed.
    #[error("Failed to write '{path}': {reason}")]
    RetrievalWriteFailed {
        /// The path that could not be written
        path: String,
        /// The underlying I/O failure
        reason: String,
    },

    // --- Manifest ---
    /// No `Cartfile` found in the current directory or any parent directory.
    #[error("No Cartfile found in current directory or any parent directory")]
    ManifestNotFound,

    /// A `Cartfile`/`Cartfile.resolved` line could not be parsed.
    #[error("Invalid manifest syntax in {file}: {reason}")]
    ManifestParseError {
        /// Path to the manifest file that failed to parse
        file: String,
        /// Specific reason for the parsing failure
        reason: String,
    },

    /// A manifest parsed successfully but failed semantic validation.
    #[error("Manifest validation failed: {reason}")]
    ManifestValidationError {
        /// Reason why manifest validation failed
        reason: String,
    },

    // --- Resolver ---
    /// The resolver exhausted its search without finding a consistent set.
    #[error("Unable to resolve a dependency list: {reason}")]
    UnsatisfiableDependencyList {
        /// Summary of why no resolution was found
        reason: String,
    },

    /// Two requirements on the same dependency cannot both hold.
    #[error("Incompatible requirements on '{dependency}': {reason}")]
    IncompatibleRequirements {
        /// The dependency with conflicting requirements
        dependency: String,
        /// Description of the conflicting requirements
        reason: String,
    },

    /// No version of a dependency satisfies its specifier.
    #[error("No version of '{dependency}' satisfies {version}")]
    RequiredVersionNotFound {
        /// The dependency being resolved
        dependency: String,
        /// The version specifier that could not be satisfied
        version: String,
    },

    /// A `==`-pinned tag does not exist on the dependency's repository.
    #[error("Tag '{tag}' not found for '{dependency}'")]
    TaggedVersionNotFound {
        /// The dependency being resolved
        dependency: String,
        /// The tag that could not be found
        tag: String,
    },

    /// The dependency graph contains a cycle.
    #[error("Dependency cycle detected: {chain}")]
    DependencyCycle {
        /// String representation of the cycle
        chain: String,
    },

    /// Two dependencies in the resolved set cannot coexist (e.g. two
    /// `gitReference` specifiers for the same repository pinning different commits).
    #[error("'{first}' and '{second}' are incompatible")]
    IncompatibleDependencies {
        /// Name of the first conflicting dependency
        first: String,
        /// Name of the second conflicting dependency
        second: String,
    },

    // --- VersionFile / toolchain ---
    /// A version file references a toolchain version drydock does not recognize locally.
    #[error("Unknown local toolchain version recorded in {path}")]
    UnknownLocalToolchainVersion {
        /// Path to the version file
        path: String,
    },

    /// The toolchain used to build a cached binary is incompatible with the one in use.
    #[error("Incompatible toolchain versions: required {required}, found {found}")]
    IncompatibleToolchainVersions {
        /// Toolchain version the cached artifact was built with
        required: String,
        /// Toolchain version currently in use
        found: String,
    },

    // --- Build Orchestrator ---
    /// A build task's subprocess exited non-zero.
    #[error("Build failed for '{target}': {reason}")]
    BuildFailed {
        /// Name of the target that failed to build
        target: String,
        /// Captured failure output or description
        reason: String,
    },

    /// Two build artifacts destined for the same output location are incompatible.
    #[error("Incompatible build artifacts: {reason}")]
    IncompatibleArtifacts {
        /// Description of the incompatibility
        reason: String,
    },

    // --- Ambient ---
    /// Configuration error (global config, `.drydockrc`).
    #[error("Configuration error: {message}")]
    ConfigError {
        /// Description of the configuration error
        message: String,
    },

    /// Acquiring the cache lock file timed out or failed.
    #[error("Failed to acquire lock on {path}: {reason}")]
    LockError {
        /// Path to the lock file
        path: String,
        /// Reason the lock could not be acquired
        reason: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Semver parsing error
    #[error("Semver parsing error: {0}")]
    SemverError(#[from] semver::Error),

    /// Catch-all for errors that don't fit another category.
    #[error("{message}")]
    Other {
        /// Generic error message
        message: String,
    },
}

/// Error context wrapper that adds a suggestion and details to a [`DrydockError`]
/// for CLI display.
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying Drydock error
    pub error: DrydockError,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a new error context from a [`DrydockError`] with no suggestion or details.
    #[must_use]
    pub const fn new(error: DrydockError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    /// Attach an actionable suggestion, shown in green.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Attach additional explanatory details, shown in yellow.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Print the error, details, and suggestion to stderr with terminal colors.
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }

    /// Create an [`ErrorContext`] with only a suggestion, for generic errors.
    pub fn suggestion(suggestion: impl Into<String>) -> Self {
        Self {
            error: DrydockError::Other {
                message: String::new(),
            },
            suggestion: Some(suggestion.into()),
            details: None,
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Extension trait for converting a [`DrydockError`] into [`anyhow::Error`] while
/// keeping the attached [`ErrorContext`] suggestion/details.
pub trait IntoAnyhowWithContext {
    /// Convert the error to an [`anyhow::Error`] with the provided context.
    fn into_anyhow_with_context(self, context: ErrorContext) -> anyhow::Error;
}

impl IntoAnyhowWithContext for DrydockError {
    fn into_anyhow_with_context(self, context: ErrorContext) -> anyhow::Error {
        anyhow::Error::new(ErrorContext {
            error: self,
            suggestion: context.suggestion,
            details: context.details,
        })
    }
}

/// Convert a [`DrydockError`] into an [`ErrorContext`] with a tailored suggestion,
/// falling back to a generic context for variants with no specific guidance.
#[must_use]
pub fn create_error_context(error: &DrydockError) -> ErrorContext {
    match error {
        DrydockError::GitNotFound => ErrorContext::new(DrydockError::GitNotFound)
            .with_suggestion("Install git from https://git-scm.com/ or your package manager"),

        DrydockError::ManifestNotFound => ErrorContext::new(DrydockError::ManifestNotFound)
            .with_suggestion("Create a Cartfile listing your dependencies"),

        DrydockError::GitCommandError {
            operation,
            stderr,
        } => {
            let suggestion = match operation.as_str() {
                "fetch" | "pull" => "Check your internet connection and git credentials",
                "checkout" => "Verify the branch, tag, or commit exists in the repository",
                _ => "Check the git output above for details",
            };
            ErrorContext::new(DrydockError::GitCommandError {
                operation: operation.clone(),
                stderr: stderr.clone(),
            })
            .with_suggestion(suggestion)
        }

        DrydockError::GitCloneFailed {
            url,
            reason,
        } => ErrorContext::new(DrydockError::GitCloneFailed {
            url: url.clone(),
            reason: reason.clone(),
        })
        .with_suggestion(format!("Verify that {url} is reachable and accessible"))
        .with_details(reason.clone()),

        DrydockError::RequiredVersionNotFound {
            dependency,
            version,
        } => ErrorContext::new(DrydockError::RequiredVersionNotFound {
            dependency: dependency.clone(),
            version: version.clone(),
        })
        .with_suggestion(format!(
            "List available tags for '{dependency}' or loosen its version specifier"
        )),

        DrydockError::DependencyCycle {
            chain,
        } => ErrorContext::new(DrydockError::DependencyCycle {
            chain: chain.clone(),
        })
        .with_details("Dependencies cannot form a cycle; break it by removing one edge")
        .with_suggestion("Review the Cartfiles of the repositories in the cycle"),

        DrydockError::ManifestParseError {
            file,
            reason,
        } => ErrorContext::new(DrydockError::ManifestParseError {
            file: file.clone(),
            reason: reason.clone(),
        })
        .with_suggestion(format!("Fix the syntax error in {file}"))
        .with_details(reason.clone()),

        DrydockError::LockError {
            path,
            reason,
        } => ErrorContext::new(DrydockError::LockError {
            path: path.clone(),
            reason: reason.clone(),
        })
        .with_suggestion("Another drydock process may be running; wait for it to finish"),

        other => ErrorContext::new(DrydockError::Other {
            message: other.to_string(),
        }),
    }
}

/// Convert any error into a user-friendly [`ErrorContext`] for CLI display.
#[must_use]
pub fn user_friendly_error(error: &anyhow::Error) -> ErrorContext {
    if let Some(drydock_err) = error.downcast_ref::<DrydockError>() {
        return create_error_context(drydock_err);
    }

    if let Some(io_err) = error.downcast_ref::<std::io::Error>() {
        return match io_err.kind() {
            std::io::ErrorKind::PermissionDenied => {
                ErrorContext::new(DrydockError::Other {
                    message: io_err.to_string(),
                })
                .with_suggestion("Check file permissions")
            }
            std::io::ErrorKind::NotFound => ErrorContext::new(DrydockError::Other {
                message: io_err.to_string(),
            })
            .with_suggestion("Verify the path exists"),
            _ => ErrorContext::new(DrydockError::Other {
                message: io_err.to_string(),
            }),
        };
    }

    ErrorContext::new(DrydockError::Other {
        message: error.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = DrydockError::GitNotFound;
        assert_eq!(error.to_string(), "Git is not installed or not found in PATH");

        let error = DrydockError::RequiredVersionNotFound {
            dependency: "Alamofire".to_string(),
            version: ">= 4.0".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "No version of 'Alamofire' satisfies >= 4.0"
        );
    }

    #[test]
    fn test_error_context_builder() {
        let ctx = ErrorContext::new(DrydockError::GitNotFound)
            .with_suggestion("Install git using your package manager")
            .with_details("Git is required for Drydock to function");

        assert_eq!(ctx.suggestion, Some("Install git using your package manager".to_string()));
        assert_eq!(ctx.details, Some("Git is required for Drydock to function".to_string()));
    }

    #[test]
    fn test_error_context_display() {
        let ctx = ErrorContext::new(DrydockError::GitNotFound).with_suggestion("Install git");
        let display = format!("{ctx}");
        assert!(display.contains("Git is not installed or not found in PATH"));
    }

    #[test]
    fn test_from_semver_error() {
        let result = semver::Version::parse("invalid-version");
        if let Err(e) = result {
            let err = DrydockError::from(e);
            assert!(matches!(err, DrydockError::SemverError(_)));
        }
    }

    #[test]
    fn test_create_error_context_dependency_cycle() {
        let ctx = create_error_context(&DrydockError::DependencyCycle {
            chain: "A -> B -> A".to_string(),
        });
        assert!(ctx.suggestion.is_some());
        assert!(ctx.details.is_some());
    }

    #[test]
    fn test_create_error_context_manifest_not_found() {
        let ctx = create_error_context(&DrydockError::ManifestNotFound);
        assert!(ctx.suggestion.unwrap().contains("Cartfile"));
    }
}
