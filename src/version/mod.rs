//! Version types shared by the Resolver, Retriever, and manifest parser
//! (spec §3 DATA MODEL).
//!
//! - [`SemanticVersion`] — a parsed `major.minor.patch[-pre][+build]`.
//! - [`VersionSpecifier`] — the predicate a manifest line declares.
//! - [`PinnedVersion`] — a resolved commit-ish, semantic or opaque.
//! - [`ConcreteVersion`] — the ordered wrapper the Resolver's candidate sets
//!   are built from.

mod pinned;
mod semantic;
mod specifier;

pub use pinned::{ConcreteVersion, PinnedVersion};
pub use semantic::SemanticVersion;
pub use specifier::VersionSpecifier;
