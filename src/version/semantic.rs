//! Semantic version type used throughout the Resolver and Retriever.
//!
//! `SemanticVersion` is a thin wrapper around [`semver::Version`]: dotted
//! major.minor.patch ordering, prerelease identifiers sort below the
//! corresponding release, and build metadata is ignored for ordering — all of
//! which `semver::Version` already implements, so this type exists only to
//! give the resolver's domain vocabulary its own name and a couple of
//! construction helpers tolerant of the `v`/`version-`/`release-` tag
//! prefixes real repositories use.

use semver::Version;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// A parsed `major.minor.patch[-prerelease][+build]` version.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SemanticVersion(Version);

impl SemanticVersion {
    #[must_use]
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self(Version::new(major, minor, patch))
    }

    #[must_use]
    pub fn major(&self) -> u64 {
        self.0.major
    }

    #[must_use]
    pub fn minor(&self) -> u64 {
        self.0.minor
    }

    #[must_use]
    pub fn patch(&self) -> u64 {
        self.0.patch
    }

    #[must_use]
    pub fn is_prerelease(&self) -> bool {
        !self.0.pre.is_empty()
    }

    #[must_use]
    pub fn inner(&self) -> &Version {
        &self.0
    }

    /// Parse a version, stripping the `v`/`version-`/`release-` tag prefixes
    /// git hosting conventions commonly attach to semantic version tags.
    pub fn parse_lenient(s: &str) -> Result<Self, semver::Error> {
        let stripped = s
            .strip_prefix("version-")
            .or_else(|| s.strip_prefix("release-"))
            .or_else(|| s.strip_prefix('v'))
            .unwrap_or(s);
        Version::parse(stripped).map(Self)
    }

    /// The exclusive upper bound of `compatibleWith(self)` per the caret
    /// semantics in spec §3: next incompatible major, or next minor when
    /// major is 0.
    #[must_use]
    pub fn next_incompatible(&self) -> Self {
        if self.0.major > 0 {
            Self(Version::new(self.0.major + 1, 0, 0))
        } else {
            Self(Version::new(0, self.0.minor + 1, 0))
        }
    }
}

impl FromStr for SemanticVersion {
    type Err = semver::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Version::parse(s).map(Self)
    }
}

impl fmt::Display for SemanticVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl PartialOrd for SemanticVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SemanticVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordering_ignores_build_metadata() {
        let a = SemanticVersion::from_str("1.2.3+build1").unwrap();
        let b = SemanticVersion::from_str("1.2.3+build2").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_prerelease_less_than_release() {
        let pre = SemanticVersion::from_str("1.0.0-beta.1").unwrap();
        let rel = SemanticVersion::from_str("1.0.0").unwrap();
        assert!(pre < rel);
    }

    #[test]
    fn test_parse_lenient_prefixes() {
        assert_eq!(
            SemanticVersion::parse_lenient("v1.2.3").unwrap(),
            SemanticVersion::new(1, 2, 3)
        );
        assert_eq!(
            SemanticVersion::parse_lenient("version-1.2.3").unwrap(),
            SemanticVersion::new(1, 2, 3)
        );
        assert_eq!(
            SemanticVersion::parse_lenient("release-1.2.3").unwrap(),
            SemanticVersion::new(1, 2, 3)
        );
    }

    #[test]
    fn test_next_incompatible_major() {
        let v = SemanticVersion::new(2, 3, 1);
        assert_eq!(v.next_incompatible(), SemanticVersion::new(3, 0, 0));
    }

    #[test]
    fn test_next_incompatible_zero_major() {
        let v = SemanticVersion::new(0, 4, 1);
        assert_eq!(v.next_incompatible(), SemanticVersion::new(0, 5, 0));
    }
}
