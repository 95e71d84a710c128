use super::*;
use crate::manifest::Manifest;
use crate::version::SemanticVersion;
use std::collections::HashMap;

/// An in-memory catalog: each dependency has a fixed version list and a
/// fixed transitive manifest per version, keyed by dependency name.
#[derive(Default)]
struct FakeCatalog {
    versions: HashMap<String, Vec<&'static str>>,
    children: HashMap<(String, &'static str), Vec<(Dependency, VersionSpecifier)>>,
    refs: HashMap<(String, String), &'static str>,
}

impl FakeCatalog {
    fn new() -> Self {
        Self::default()
    }

    fn with_versions(mut self, dep: &Dependency, versions: &[&'static str]) -> Self {
        self.versions.insert(dep.name(), versions.to_vec());
        self
    }

    fn with_children(mut self, dep: &Dependency, version: &'static str, children: Vec<(Dependency, VersionSpecifier)>) -> Self {
        self.children.insert((dep.name(), version), children);
        self
    }

    fn with_ref(mut self, dep: &Dependency, reference: &str, resolves_to: &'static str) -> Self {
        self.refs.insert((dep.name(), reference.to_string()), resolves_to);
        self
    }
}

impl DependencyProvider for FakeCatalog {
    async fn versions_of(&self, dep: &Dependency) -> Result<Vec<PinnedVersion>, DrydockError> {
        Ok(self
            .versions
            .get(&dep.name())
            .map(|vs| vs.iter().map(|v| PinnedVersion::new(*v)).collect())
            .unwrap_or_default())
    }

    async fn dependencies_of(&self, dep: &Dependency, version: &PinnedVersion) -> Result<Vec<(Dependency, VersionSpecifier)>, DrydockError> {
        Ok(self.children.get(&(dep.name(), version.as_str())).cloned().unwrap_or_default())
    }

    async fn resolve_ref(&self, dep: &Dependency, reference: &str) -> Result<PinnedVersion, DrydockError> {
        self.refs
            .get(&(dep.name(), reference.to_string()))
            .map(|v| PinnedVersion::new(*v))
            .ok_or_else(|| DrydockError::TaggedVersionNotFound {
                dependency: dep.name(),
                tag: reference.to_string(),
            })
    }
}

fn manifest(entries: &[(Dependency, VersionSpecifier)]) -> Manifest {
    entries.iter().cloned().collect()
}

// (a) linear chain: A ~> 1.0 -> B ~> 2.0 -> C (any)
#[tokio::test]
async fn test_linear_chain_resolves_deepest_first_constraint() {
    let a = Dependency::git("https://h/A.git");
    let b = Dependency::git("https://h/B.git");
    let c = Dependency::git("https://h/C.git");

    let catalog = FakeCatalog::new()
        .with_versions(&a, &["v1.0.0", "v1.5.0"])
        .with_versions(&b, &["v2.0.0", "v2.1.0"])
        .with_versions(&c, &["v1.0.0"])
        .with_children(&a, "v1.5.0", vec![(b.clone(), VersionSpecifier::CompatibleWith(SemanticVersion::new(2, 0, 0)))])
        .with_children(&a, "v1.0.0", vec![(b.clone(), VersionSpecifier::CompatibleWith(SemanticVersion::new(2, 0, 0)))])
        .with_children(&b, "v2.1.0", vec![(c.clone(), VersionSpecifier::Any)])
        .with_children(&b, "v2.0.0", vec![(c.clone(), VersionSpecifier::Any)]);

    let root = manifest(&[(a.clone(), VersionSpecifier::CompatibleWith(SemanticVersion::new(1, 0, 0)))]);
    let resolver = BacktrackingResolver::new(&catalog);
    let result = resolver.resolve(&root, None, &UpdatePolicy::All).await.unwrap();

    assert_eq!(result.get(&a).unwrap().as_str(), "v1.5.0");
    assert_eq!(result.get(&b).unwrap().as_str(), "v2.1.0");
    assert_eq!(result.get(&c).unwrap().as_str(), "v1.0.0");
}

// (b) conflict: A requires B ~> 2.0, C requires B ~> 3.0; resolver must
// backtrack A down to a version whose B requirement is satisfiable, or fail.
#[tokio::test]
async fn test_conflicting_transitive_requirements_is_unsatisfiable() {
    let a = Dependency::git("https://h/A.git");
    let c = Dependency::git("https://h/C.git");
    let b = Dependency::git("https://h/B.git");

    let catalog = FakeCatalog::new()
        .with_versions(&a, &["v1.0.0"])
        .with_versions(&c, &["v1.0.0"])
        .with_versions(&b, &["v2.0.0", "v3.0.0"])
        .with_children(&a, "v1.0.0", vec![(b.clone(), VersionSpecifier::CompatibleWith(SemanticVersion::new(2, 0, 0)))])
        .with_children(&c, "v1.0.0", vec![(b.clone(), VersionSpecifier::CompatibleWith(SemanticVersion::new(3, 0, 0)))]);

    let root = manifest(&[
        (a.clone(), VersionSpecifier::Any),
        (c.clone(), VersionSpecifier::Any),
    ]);
    let resolver = BacktrackingResolver::new(&catalog);
    let err = resolver.resolve(&root, None, &UpdatePolicy::All).await.unwrap_err();
    assert!(matches!(
        err,
        DrydockError::IncompatibleRequirements { .. } | DrydockError::UnsatisfiableDependencyList { .. }
    ));
}

// (c) gitReference pinning: "feature-x" resolves to a fixed commit and
// nothing else is considered.
#[tokio::test]
async fn test_git_reference_pins_to_resolved_commit() {
    let a = Dependency::git("https://h/A.git");
    let catalog = FakeCatalog::new()
        .with_versions(&a, &["v1.0.0", "v2.0.0"])
        .with_ref(&a, "feature-x", "deadbeefcafe");

    let root = manifest(&[(a.clone(), VersionSpecifier::GitReference("feature-x".to_string()))]);
    let resolver = BacktrackingResolver::new(&catalog);
    let result = resolver.resolve(&root, None, &UpdatePolicy::All).await.unwrap();

    assert_eq!(result.get(&a).unwrap().as_str(), "deadbeefcafe");
}

// (d) subset update: last_resolved pins A and B; updating only A must leave
// B's sibling C untouched at its previous pin, while A's own subtree may move.
#[tokio::test]
async fn test_subset_update_locks_unrelated_dependencies() {
    let a = Dependency::git("https://h/A.git");
    let b = Dependency::git("https://h/B.git");

    let catalog = FakeCatalog::new()
        .with_versions(&a, &["v1.0.0", "v2.0.0"])
        .with_versions(&b, &["v1.0.0", "v2.0.0"]);

    let mut last_resolved = crate::manifest::ResolvedManifest::new();
    last_resolved.insert(a.clone(), PinnedVersion::new("v1.0.0"));
    last_resolved.insert(b.clone(), PinnedVersion::new("v1.0.0"));

    let root = manifest(&[(a.clone(), VersionSpecifier::Any), (b.clone(), VersionSpecifier::Any)]);
    let resolver = BacktrackingResolver::new(&catalog);

    let policy = UpdatePolicy::Subset(["A".to_string()].into_iter().collect());
    let result = resolver.resolve(&root, Some(&last_resolved), &policy).await.unwrap();

    assert_eq!(result.get(&a).unwrap().as_str(), "v2.0.0");
    assert_eq!(result.get(&b).unwrap().as_str(), "v1.0.0");
}

// Empty subset: must reproduce last_resolved exactly when it still satisfies
// the manifest (spec §8 boundary behavior).
#[tokio::test]
async fn test_empty_subset_reproduces_last_resolved_when_still_valid() {
    let a = Dependency::git("https://h/A.git");
    let catalog = FakeCatalog::new().with_versions(&a, &["v1.0.0", "v2.0.0"]);

    let mut last_resolved = crate::manifest::ResolvedManifest::new();
    last_resolved.insert(a.clone(), PinnedVersion::new("v1.0.0"));

    let root = manifest(&[(a.clone(), VersionSpecifier::Any)]);
    let resolver = BacktrackingResolver::new(&catalog);
    let policy = UpdatePolicy::Subset(HashSet::new());
    let result = resolver.resolve(&root, Some(&last_resolved), &policy).await.unwrap();

    assert_eq!(result, last_resolved);
}

#[tokio::test]
async fn test_empty_subset_fails_when_last_resolved_no_longer_satisfies() {
    let a = Dependency::git("https://h/A.git");
    let catalog = FakeCatalog::new().with_versions(&a, &["v1.0.0", "v2.0.0"]);

    let mut last_resolved = crate::manifest::ResolvedManifest::new();
    last_resolved.insert(a.clone(), PinnedVersion::new("v1.0.0"));

    // The manifest now requires >= 2.0, which the locked v1.0.0 pin cannot satisfy.
    let root = manifest(&[(a.clone(), VersionSpecifier::AtLeast(SemanticVersion::new(2, 0, 0)))]);
    let resolver = BacktrackingResolver::new(&catalog);
    let policy = UpdatePolicy::Subset(HashSet::new());
    let err = resolver.resolve(&root, Some(&last_resolved), &policy).await.unwrap_err();

    assert!(matches!(err, DrydockError::UnsatisfiableDependencyList { .. }));
}

#[tokio::test]
async fn test_dependency_cycle_is_rejected() {
    let a = Dependency::git("https://h/A.git");
    let b = Dependency::git("https://h/B.git");

    let catalog = FakeCatalog::new()
        .with_versions(&a, &["v1.0.0"])
        .with_versions(&b, &["v1.0.0"])
        .with_children(&a, "v1.0.0", vec![(b.clone(), VersionSpecifier::Any)])
        .with_children(&b, "v1.0.0", vec![(a.clone(), VersionSpecifier::Any)]);

    let root = manifest(&[(a.clone(), VersionSpecifier::Any)]);
    let resolver = BacktrackingResolver::new(&catalog);
    let err = resolver.resolve(&root, None, &UpdatePolicy::All).await.unwrap_err();
    assert!(matches!(err, DrydockError::DependencyCycle { .. }));
}

// Same-name elimination: two different locators resolving to the same
// dependency name but pinned to different commits via gitReference must
// raise IncompatibleDependencies.
#[tokio::test]
async fn test_same_name_different_git_references_is_incompatible() {
    let a1 = Dependency::git("https://mirror1/Shared.git");
    let a2 = Dependency::git("https://mirror2/Shared.git");
    let root_consumer_a = Dependency::git("https://h/ConsumerA.git");
    let root_consumer_b = Dependency::git("https://h/ConsumerB.git");

    let catalog = FakeCatalog::new()
        .with_versions(&root_consumer_a, &["v1.0.0"])
        .with_versions(&root_consumer_b, &["v1.0.0"])
        .with_versions(&a1, &["v1.0.0"])
        .with_versions(&a2, &["v1.0.0"])
        .with_ref(&a1, "ref-one", "commit-one")
        .with_ref(&a2, "ref-two", "commit-two")
        .with_children(
            &root_consumer_a,
            "v1.0.0",
            vec![(a1.clone(), VersionSpecifier::GitReference("ref-one".to_string()))],
        )
        .with_children(
            &root_consumer_b,
            "v1.0.0",
            vec![(a2.clone(), VersionSpecifier::GitReference("ref-two".to_string()))],
        );

    let root = manifest(&[
        (root_consumer_a.clone(), VersionSpecifier::Any),
        (root_consumer_b.clone(), VersionSpecifier::Any),
    ]);
    let resolver = BacktrackingResolver::new(&catalog);
    let err = resolver.resolve(&root, None, &UpdatePolicy::All).await.unwrap_err();
    assert!(matches!(err, DrydockError::IncompatibleDependencies { .. }));
}
