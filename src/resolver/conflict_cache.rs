//! [`ConflictCache`] — learned no-goods keyed by (dependency, candidate),
//! so sibling search branches skip candidates already proven dead
//! (spec §4.3 "Key structures").

use crate::version::ConcreteVersion;
use std::collections::HashMap;

/// A previously discovered rejection reason for a `(dependency name,
/// candidate)` pair, plus the other dependency/version that caused it.
#[derive(Debug, Clone)]
pub struct Conflict {
    pub error: String,
    pub conflicting: Vec<(String, ConcreteVersion)>,
}

#[derive(Debug, Clone, Default)]
pub struct ConflictCache {
    entries: HashMap<(String, ConcreteVersion), Conflict>,
}

impl ConflictCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, dep_name: impl Into<String>, candidate: ConcreteVersion, conflict: Conflict) {
        self.entries.insert((dep_name.into(), candidate), conflict);
    }

    #[must_use]
    pub fn lookup(&self, dep_name: &str, candidate: &ConcreteVersion) -> Option<&Conflict> {
        self.entries.get(&(dep_name.to_string(), candidate.clone()))
    }
}
