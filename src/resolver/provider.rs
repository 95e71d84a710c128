//! The Resolver's seam onto the Retriever (spec §2: "C3 uses C2 to answer
//! versions-of and dependencies-of queries").
//!
//! `resolver` depends only on this trait, never on `retriever` directly, so
//! the backtracking search can be exercised against an in-memory double in
//! tests (see `test_utils`) without touching git or the network.

use crate::core::DrydockError;
use crate::manifest::Dependency;
use crate::version::{PinnedVersion, VersionSpecifier};

/// Everything the Resolver needs to ask about a dependency's catalog.
pub trait DependencyProvider {
    /// All known versions of `dep`, newest-candidate-first is not required —
    /// the resolver sorts them into a [`crate::version::ConcreteVersion`] set itself.
    fn versions_of(
        &self,
        dep: &Dependency,
    ) -> impl std::future::Future<Output = Result<Vec<PinnedVersion>, DrydockError>> + Send;

    /// The transitive manifest of `dep` at `version`: the set of
    /// `(child, specifier)` pairs it declares.
    fn dependencies_of(
        &self,
        dep: &Dependency,
        version: &PinnedVersion,
    ) -> impl std::future::Future<Output = Result<Vec<(Dependency, VersionSpecifier)>, DrydockError>> + Send;

    /// Resolve a `gitReference` specifier's string to the commit it names.
    fn resolve_ref(
        &self,
        dep: &Dependency,
        reference: &str,
    ) -> impl std::future::Future<Output = Result<PinnedVersion, DrydockError>> + Send;
}
