//! [`ConcreteVersionSet`] — the live candidate set and constraint history for
//! a single dependency during resolution (spec §4.3 "Key structures").

use crate::manifest::Dependency;
use crate::version::{ConcreteVersion, VersionSpecifier};
use std::collections::BTreeSet;

/// Who constrained a dependency, and with what specifier. `definer: None`
/// means the root manifest itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Definition {
    pub definer: Option<Dependency>,
    pub specifier: VersionSpecifier,
}

/// The candidate versions still in play for one dependency, plus the stack
/// of specifiers that narrowed it there.
#[derive(Debug, Clone)]
pub struct ConcreteVersionSet {
    dependency: Dependency,
    candidates: BTreeSet<ConcreteVersion>,
    definitions: Vec<Definition>,
    pinned: Option<ConcreteVersion>,
}

impl ConcreteVersionSet {
    #[must_use]
    pub fn new(dependency: Dependency, candidates: BTreeSet<ConcreteVersion>) -> Self {
        Self {
            dependency,
            candidates,
            definitions: Vec::new(),
            pinned: None,
        }
    }

    #[must_use]
    pub fn dependency(&self) -> &Dependency {
        &self.dependency
    }

    #[must_use]
    pub fn definitions(&self) -> &[Definition] {
        &self.definitions
    }

    pub fn push_definition(&mut self, definition: Definition) {
        self.definitions.push(definition);
    }

    /// Narrow the candidate set to versions admitted by `specifier`.
    /// Returns `true` iff at least one candidate survives.
    pub fn intersect(&mut self, specifier: &VersionSpecifier) -> bool {
        self.candidates.retain(|c| specifier.admits(c.pinned()));
        if let Some(pinned) = &self.pinned
            && !specifier.admits(pinned.pinned())
        {
            self.pinned = None;
        }
        !self.candidates.is_empty() || self.pinned.is_some()
    }

    /// Pin the set to an exact candidate (used for root-supplied previous
    /// resolutions and `gitReference` specifiers). Returns `true` if
    /// `version` was a legal candidate. Clears the remaining candidates —
    /// once pinned, a `ConcreteVersionSet` is resolved.
    pub fn pin(&mut self, version: ConcreteVersion) -> bool {
        let ok = self.candidates.contains(&version) || self.pinned.as_ref() == Some(&version);
        if ok {
            self.pinned = Some(version);
            self.candidates.clear();
        }
        ok
    }

    /// The best remaining candidate: the pinned one if set, else the
    /// minimum of the ordered candidate set (spec §3 `ConcreteVersion`
    /// ordering puts the best candidate first).
    #[must_use]
    pub fn first(&self) -> Option<&ConcreteVersion> {
        self.pinned.as_ref().or_else(|| self.candidates.iter().next())
    }

    #[must_use]
    pub fn is_pinned(&self) -> bool {
        self.pinned.is_some()
    }

    /// `true` once the set is pinned to a single candidate — either
    /// explicitly via [`Self::pin`], or because only one ever existed.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.pinned.is_some() || self.candidates.len() == 1
    }

    /// Remove a candidate from the set (used when backtracking: "drop that
    /// candidate in the original set to try alternatives later").
    pub fn drop_candidate(&mut self, version: &ConcreteVersion) {
        self.candidates.remove(version);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::{PinnedVersion, SemanticVersion};

    fn set(versions: &[&str]) -> ConcreteVersionSet {
        let candidates = versions.iter().map(|v| ConcreteVersion::new(PinnedVersion::new(*v))).collect();
        ConcreteVersionSet::new(Dependency::git("https://example.com/A.git"), candidates)
    }

    #[test]
    fn test_first_is_best_candidate() {
        let s = set(&["v1.0.0", "v2.0.0", "v1.5.0"]);
        assert_eq!(s.first().unwrap().pinned().as_str(), "v2.0.0");
    }

    #[test]
    fn test_intersect_narrows_candidates() {
        let mut s = set(&["v1.0.0", "v2.0.0", "v1.5.0"]);
        let ok = s.intersect(&VersionSpecifier::CompatibleWith(SemanticVersion::new(1, 0, 0)));
        assert!(ok);
        assert_eq!(s.first().unwrap().pinned().as_str(), "v1.5.0");
    }

    #[test]
    fn test_intersect_to_empty_returns_false() {
        let mut s = set(&["v1.0.0"]);
        let ok = s.intersect(&VersionSpecifier::AtLeast(SemanticVersion::new(5, 0, 0)));
        assert!(!ok);
    }

    #[test]
    fn test_pin_and_drop_candidate() {
        let mut s = set(&["v1.0.0", "v2.0.0"]);
        let best = s.first().unwrap().clone();
        assert!(s.pin(best.clone()));
        assert_eq!(s.first().unwrap(), &best);
    }
}
