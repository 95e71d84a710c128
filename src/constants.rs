//! Global constants used throughout the Drydock codebase.
//!
//! This module contains timeout durations, retry parameters, and other
//! numeric constants that are used across multiple modules. Defining
//! them centrally improves maintainability and makes magic numbers
//! more discoverable.

use std::time::Duration;

/// Default timeout for acquiring a cache lock file (§5 lock-file primitive).
///
/// Must comfortably exceed a single mirror clone or binary-cache write so
/// that a lock holder doing real work is never mistaken for a stale lock.
pub fn default_lock_timeout() -> Duration {
    Duration::from_secs(120)
}

/// Maximum backoff delay for exponential backoff (500ms).
///
/// The Retriever applies exactly one retry after a transient failure (§7);
/// this caps how long that single retry waits.
pub const MAX_BACKOFF_DELAY_MS: u64 = 500;

/// Starting delay for exponential backoff (10ms).
///
/// This is the initial delay used in exponential backoff calculations,
/// which doubles on each retry attempt.
pub const STARTING_BACKOFF_DELAY_MS: u64 = 10;

/// Timeout for Git fetch operations (60 seconds).
///
/// Prevents a hung network connection from blocking `cloneOrFetch` indefinitely.
pub const GIT_FETCH_TIMEOUT: Duration = Duration::from_secs(60);

/// Timeout for Git clone operations (120 seconds).
///
/// Clone operations may take longer than fetch, especially for large mirrors.
pub const GIT_CLONE_TIMEOUT: Duration = Duration::from_secs(120);

/// Timeout for batch operations using `join_all` (5 minutes).
///
/// This prevents indefinite blocking when batch futures hang.
pub fn batch_operation_timeout() -> Duration {
    Duration::from_secs(300)
}

/// Default CPU core count when detection fails.
///
/// Used as a fallback when `std::thread::available_parallelism()` returns an error.
pub const FALLBACK_CORE_COUNT: usize = 4;

/// How long a mirror's fetch-cache timestamp is trusted before a repeat
/// `cloneOrFetch` call performs another network fetch (§4.2 "a second fetch
/// within the configured freshness window is a no-op").
pub fn fetch_freshness_window() -> Duration {
    Duration::from_secs(5 * 60)
}

/// Content types accepted from a git host's releases API as a valid
/// prebuilt binary archive (§4.2 tier 2, §9 open question: the source
/// leaves this ambiguous, so this list is the resolved decision — see
/// DESIGN.md).
pub const BINARY_ASSET_CONTENT_TYPES: &[&str] = &["application/zip", "application/octet-stream", "application/gzip", "application/x-zip-compressed"];

/// Detected CPU count, or [`FALLBACK_CORE_COUNT`] if detection fails.
#[must_use]
pub fn cpu_count() -> usize {
    std::thread::available_parallelism().map_or(FALLBACK_CORE_COUNT, std::num::NonZeroUsize::get)
}

/// Default bound on the Orchestrator's intra-level concurrency and the
/// Retriever's prefetch queue when `~/.drydockrc`'s `parallelism` is unset
/// (§4.5 "bounded worker pool sized by active processor count").
#[must_use]
pub fn default_parallelism() -> usize {
    cpu_count()
}

/// The effective concurrency bound: the smaller of the detected CPU count
/// and `configured` (or [`default_parallelism`] if unset), per §5's "the
/// smaller of (CPU count, user-configured parallelism)". Never zero.
#[must_use]
pub fn effective_parallelism(configured: Option<usize>) -> usize {
    cpu_count().min(configured.unwrap_or_else(default_parallelism)).max(1)
}
