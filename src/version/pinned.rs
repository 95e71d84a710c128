//! Pinned and ordered concrete version identifiers.
//!
//! A [`PinnedVersion`] is what the Resolver settles on for a single
//! dependency: a commit-ish string that is either a tag parseable as a
//! [`SemanticVersion`] or a raw (40-hex-ish) git object id. [`ConcreteVersion`]
//! adds the ordering the Resolver's candidate sets need: semantic versions
//! first (highest first), then non-semantic commit-ish strings in
//! lexicographic order.

use super::semantic::SemanticVersion;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// A commit-ish identifier for a resolved dependency: either a tag that
/// parses as a [`SemanticVersion`], or an opaque commit id / branch name.
#[derive(Debug, Clone, Eq)]
pub struct PinnedVersion {
    raw: String,
    semantic: Option<SemanticVersion>,
}

impl PinnedVersion {
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let semantic = SemanticVersion::parse_lenient(&raw).ok();
        Self { raw, semantic }
    }

    /// `true` iff this commit-ish parses as a [`SemanticVersion`].
    #[must_use]
    pub fn is_semantic(&self) -> bool {
        self.semantic.is_some()
    }

    #[must_use]
    pub fn as_semantic(&self) -> Option<&SemanticVersion> {
        self.semantic.as_ref()
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl PartialEq for PinnedVersion {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl std::hash::Hash for PinnedVersion {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.raw.hash(state);
    }
}

impl fmt::Display for PinnedVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

impl FromStr for PinnedVersion {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

/// Ordered wrapper around [`PinnedVersion`] for candidate-set iteration.
///
/// Ordering places semantic versions first, descending (so the best
/// candidate is the minimum element — `BTreeSet::first`/`iter().next()`),
/// then non-semantic commit-ish strings, ascending lexicographically.
/// Inserting an equal `ConcreteVersion` into a `BTreeSet` is a no-op, which
/// gives `ConcreteVersionSet` the "duplicate inserts are ignored" behavior
/// spec §3 requires for free.
#[derive(Debug, Clone, Eq)]
pub struct ConcreteVersion(PinnedVersion);

impl ConcreteVersion {
    #[must_use]
    pub fn new(version: PinnedVersion) -> Self {
        Self(version)
    }

    #[must_use]
    pub fn pinned(&self) -> &PinnedVersion {
        &self.0
    }

    #[must_use]
    pub fn into_pinned(self) -> PinnedVersion {
        self.0
    }
}

impl PartialEq for ConcreteVersion {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl std::hash::Hash for ConcreteVersion {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl PartialOrd for ConcreteVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ConcreteVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.0.as_semantic(), other.0.as_semantic()) {
            (Some(a), Some(b)) => b.cmp(a).then_with(|| self.0.as_str().cmp(other.0.as_str())),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => self.0.as_str().cmp(other.0.as_str()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn test_pinned_version_semantic_detection() {
        let tag = PinnedVersion::new("v1.2.3");
        assert!(tag.is_semantic());
        assert_eq!(tag.as_semantic().unwrap(), &SemanticVersion::new(1, 2, 3));

        let sha = PinnedVersion::new("a1b2c3d4e5f6a1b2c3d4e5f6a1b2c3d4e5f6a1b2");
        assert!(!sha.is_semantic());
    }

    #[test]
    fn test_concrete_version_semantic_sorts_before_non_semantic() {
        let set: BTreeSet<ConcreteVersion> = [
            ConcreteVersion::new(PinnedVersion::new("deadbeef")),
            ConcreteVersion::new(PinnedVersion::new("v1.0.0")),
            ConcreteVersion::new(PinnedVersion::new("abcdef0")),
        ]
        .into_iter()
        .collect();

        let ordered: Vec<&str> = set.iter().map(|v| v.pinned().as_str()).collect();
        assert_eq!(ordered, vec!["v1.0.0", "abcdef0", "deadbeef"]);
    }

    #[test]
    fn test_concrete_version_semantic_descending() {
        let set: BTreeSet<ConcreteVersion> = [
            ConcreteVersion::new(PinnedVersion::new("v1.0.0")),
            ConcreteVersion::new(PinnedVersion::new("v2.0.0")),
            ConcreteVersion::new(PinnedVersion::new("v1.5.0")),
        ]
        .into_iter()
        .collect();

        let best = set.iter().next().unwrap();
        assert_eq!(best.pinned().as_str(), "v2.0.0");
    }

    #[test]
    fn test_duplicate_insert_ignored() {
        let mut set: BTreeSet<ConcreteVersion> = BTreeSet::new();
        set.insert(ConcreteVersion::new(PinnedVersion::new("v1.0.0")));
        set.insert(ConcreteVersion::new(PinnedVersion::new("v1.0.0")));
        assert_eq!(set.len(), 1);
    }
}
