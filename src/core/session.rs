//! A [`Session`] bundles the process-wide memoization caches that would
//! otherwise be module-level statics (spec §9 design note "group these
//! caches into a `Session` object passed explicitly, owning the lock
//! discipline"): the Fingerprint directory-hash cache and the Retriever's
//! per-URL fetch-freshness table, plus the resolved [`GlobalConfig`].

use crate::config::GlobalConfig;
use crate::fingerprint::DirectoryHashCache;
use crate::retriever::Retriever;
use std::path::PathBuf;
use std::sync::Arc;

/// Owns every cache a single `bootstrap`/`update`/`build` invocation shares
/// across its Resolver, Retriever, and Fingerprint calls.
pub struct Session {
    pub config: GlobalConfig,
    pub cache_root: PathBuf,
    pub directory_hashes: DirectoryHashCache,
    pub retriever: Arc<Retriever>,
}

impl Session {
    /// Resolves the effective cache root from `config` and constructs a
    /// fresh set of process-wide caches.
    pub fn new(config: GlobalConfig) -> anyhow::Result<Self> {
        let cache_root = crate::config::get_cache_dir(&config)?;
        let retriever = Arc::new(Retriever::new(cache_root.clone(), config.custom_fetch_command.clone()));
        Ok(Self {
            config,
            cache_root,
            directory_hashes: DirectoryHashCache::default(),
            retriever,
        })
    }

    /// The effective parallelism bound for this run (spec §4.5): the
    /// smaller of the detected CPU count and `~/.drydockrc`'s `parallelism`
    /// override, so a configured value above the core count never
    /// oversubscribes the machine.
    #[must_use]
    pub fn parallelism(&self) -> usize {
        crate::constants::effective_parallelism(self.config.parallelism)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_resolves_cache_root() {
        let session = Session::new(GlobalConfig::default()).unwrap();
        assert!(session.cache_root.to_string_lossy().contains("drydock"));
        assert!(session.directory_hashes.is_empty());
    }

    #[test]
    fn test_session_parallelism_defaults_to_detected_cores() {
        let session = Session::new(GlobalConfig::default()).unwrap();
        assert!(session.parallelism() > 0);
    }

    #[test]
    fn test_session_parallelism_honors_override() {
        let config = GlobalConfig {
            parallelism: Some(3),
            ..Default::default()
        };
        let session = Session::new(config).unwrap();
        assert_eq!(session.parallelism(), 3);
    }
}
