//! The backtracking constraint solver (C3, spec §4.3).
//!
//! [`BacktrackingResolver::resolve`] takes a root [`Manifest`], an optional
//! previous [`ResolvedManifest`], and an [`UpdatePolicy`], and produces a new
//! `ResolvedManifest` satisfying every constraint, direct and transitive
//! (spec §8 invariant 1), acyclic (invariant 2), with unique names
//! (invariant 4).

mod conflict_cache;
mod graph;
mod provider;
mod version_set;

pub use conflict_cache::{Conflict, ConflictCache};
pub use graph::DependencyGraph;
pub use provider::DependencyProvider;
pub use version_set::{ConcreteVersionSet, Definition};

use crate::core::DrydockError;
use crate::manifest::{Dependency, Manifest, ResolvedManifest};
use crate::version::{ConcreteVersion, PinnedVersion, VersionSpecifier};
use futures::future::{BoxFuture, FutureExt};
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// Which dependencies the caller allows to move away from `last_resolved`.
///
/// Resolves spec §9's "subset update" design by making the empty-vs-nonempty
/// ambiguity in the source (`dependenciesToUpdate: [String]`) explicit: an
/// empty list there is read as "Cartfile.resolved satisfies as-is or fail",
/// matching spec §8's boundary behavior ("Resolver with lastResolved=R0 and
/// dependenciesToUpdate=∅ returns R0 unchanged iff R0 still satisfies M").
/// `All` is the "fresh resolve" / `drydock update` (no args) path.
#[derive(Debug, Clone)]
pub enum UpdatePolicy {
    /// Every dependency may move; `last_resolved` is consulted only for
    /// preferring stability, never required to hold.
    All,
    /// Only the named dependencies (and anything reachable only through a
    /// dependency that itself moved) may move; everything else must keep
    /// its `last_resolved` pin.
    Subset(HashSet<String>),
}

#[derive(Debug, Clone, Default)]
struct SearchState {
    sets: BTreeMap<Dependency, ConcreteVersionSet>,
    /// Names allowed to move, growing as updatable parents expand into new
    /// children (spec §4.3 "Subset update" propagation).
    updatable: HashSet<String>,
    /// Dependencies whose transitive manifest has already been folded in.
    /// A set can have exactly one remaining candidate without having been
    /// expanded yet — candidate count and "have we visited its children"
    /// are independent, so they are tracked separately.
    expanded: BTreeSet<Dependency>,
}

/// Entry point: owns a reference to the dependency catalog ([`DependencyProvider`]).
pub struct BacktrackingResolver<'p, P: DependencyProvider> {
    provider: &'p P,
}

impl<'p, P: DependencyProvider + Sync> BacktrackingResolver<'p, P> {
    #[must_use]
    pub fn new(provider: &'p P) -> Self {
        Self { provider }
    }

    /// Run the search to completion and return the resolved map.
    pub async fn resolve(
        &self,
        root: &Manifest,
        last_resolved: Option<&ResolvedManifest>,
        policy: &UpdatePolicy,
    ) -> Result<ResolvedManifest, DrydockError> {
        let search = Search {
            provider: self.provider,
            last_resolved,
        };
        let initial = search.seed(root, policy).await?;
        let mut cache = ConflictCache::new();
        let mut hot: BTreeMap<String, u32> = BTreeMap::new();
        let resolved = search.run(initial, &mut cache, &mut hot).await?;
        search.finalize(resolved).await
    }
}

/// One resolution run's working context: the catalog and the previous
/// resolved map, both borrowed for the duration of the search.
struct Search<'p, P: DependencyProvider> {
    provider: &'p P,
    last_resolved: Option<&'p ResolvedManifest>,
}

impl<'p, P: DependencyProvider + Sync> Search<'p, P> {
    /// Resolve a `gitReference` specifier to the commit it names, so every
    /// later `admits`/`intersect` call compares concrete commits rather than
    /// an unresolved reference string against a resolved one. Non-reference
    /// specifiers pass through unchanged.
    async fn resolve_effective(&self, dep: &Dependency, spec: &VersionSpecifier) -> Result<VersionSpecifier, DrydockError> {
        if let VersionSpecifier::GitReference(reference) = spec {
            let pinned = self.provider.resolve_ref(dep, reference).await?;
            Ok(VersionSpecifier::GitReference(pinned.as_str().to_string()))
        } else {
            Ok(spec.clone())
        }
    }

    /// Materialize the candidate set for an already-resolved specifier.
    async fn candidates_for(&self, dep: &Dependency, effective_spec: &VersionSpecifier) -> Result<BTreeSet<ConcreteVersion>, DrydockError> {
        if let VersionSpecifier::GitReference(resolved_commit) = effective_spec {
            Ok([ConcreteVersion::new(PinnedVersion::new(resolved_commit.clone()))].into_iter().collect())
        } else {
            let versions = self.provider.versions_of(dep).await?;
            Ok(versions.into_iter().map(ConcreteVersion::new).collect())
        }
    }

    async fn seed(&self, root: &Manifest, policy: &UpdatePolicy) -> Result<SearchState, DrydockError> {
        let mut state = SearchState {
            updatable: match policy {
                UpdatePolicy::All => root.keys().map(Dependency::name).collect(),
                UpdatePolicy::Subset(names) => names.clone(),
            },
            ..Default::default()
        };

        for (dep, spec) in root {
            let name = dep.name();
            let locked_pin = (!state.updatable.contains(&name))
                .then(|| self.last_resolved.and_then(|r| r.get(dep)))
                .flatten();

            let (mut set, effective_spec) = if let Some(prev) = locked_pin {
                let effective_spec = locked_effective_spec(spec, prev);
                let set = ConcreteVersionSet::new(dep.clone(), [ConcreteVersion::new(prev.clone())].into_iter().collect());
                (set, effective_spec)
            } else {
                let effective_spec = self.resolve_effective(dep, spec).await?;
                let candidates = self.candidates_for(dep, &effective_spec).await?;
                (ConcreteVersionSet::new(dep.clone(), candidates), effective_spec)
            };

            set.push_definition(Definition {
                definer: None,
                specifier: effective_spec.clone(),
            });

            if !set.intersect(&effective_spec) {
                return Err(if locked_pin.is_some() {
                    DrydockError::UnsatisfiableDependencyList {
                        reason: format!("'{name}' cannot keep its previous pin and satisfy {spec}"),
                    }
                } else {
                    DrydockError::RequiredVersionNotFound {
                        dependency: name,
                        version: spec.to_string(),
                    }
                });
            }

            state.sets.insert(dep.clone(), set);
        }

        Ok(state)
    }

    /// Depth-first search with memoized no-goods. Returns a state where
    /// every `ConcreteVersionSet` is resolved to a single candidate.
    fn run<'a>(
        &'a self,
        mut state: SearchState,
        cache: &'a mut ConflictCache,
        hot: &'a mut BTreeMap<String, u32>,
    ) -> BoxFuture<'a, Result<SearchState, DrydockError>> {
        async move {
            let Some(dep) = self.next_unresolved(&state, hot) else {
                return Ok(state);
            };

            loop {
                let Some(candidate) = state.sets[&dep].first().cloned() else {
                    return Err(DrydockError::UnsatisfiableDependencyList {
                        reason: format!("no remaining candidates for '{}'", dep.name()),
                    });
                };

                if cache.lookup(&dep.name(), &candidate).is_some() {
                    state.sets.get_mut(&dep).unwrap().drop_candidate(&candidate);
                    *hot.entry(dep.name()).or_insert(0) += 1;
                    continue;
                }

                let mut branch = state.clone();
                branch.sets.get_mut(&dep).unwrap().pin(candidate.clone());
                branch.expanded.insert(dep.clone());

                // The other dependencies already pinned in this branch at the
                // moment `candidate` was chosen — the context that made it
                // unsatisfiable, recorded so a later no-good lookup can
                // explain which assignments it conflicts with.
                let conflicting: Vec<(String, ConcreteVersion)> = branch
                    .sets
                    .iter()
                    .filter(|(d, _)| **d != dep)
                    .filter_map(|(d, set)| set.first().cloned().map(|c| (d.name(), c)))
                    .collect();

                let outcome = match self.expand(&dep, candidate.pinned().clone(), &mut branch).await {
                    Ok(()) => self.run(branch, cache, hot).await,
                    Err(e) => Err(e),
                };

                match outcome {
                    Ok(resolved) => return Ok(resolved),
                    Err(e) => {
                        cache.record(
                            dep.name(),
                            candidate.clone(),
                            Conflict {
                                error: e.to_string(),
                                conflicting,
                            },
                        );
                        state.sets.get_mut(&dep).unwrap().drop_candidate(&candidate);
                        *hot.entry(dep.name()).or_insert(0) += 1;
                    }
                }
            }
        }
        .boxed()
    }

    fn next_unresolved(&self, state: &SearchState, hot: &BTreeMap<String, u32>) -> Option<Dependency> {
        state
            .sets
            .keys()
            .filter(|dep| !state.expanded.contains(*dep))
            .cloned()
            .max_by_key(|dep| hot.get(&dep.name()).copied().unwrap_or(0))
    }

    /// Query `dep`'s transitive manifest at `version` and fold each child
    /// into `branch`, per spec §4.3 step 3.
    async fn expand(&self, dep: &Dependency, version: PinnedVersion, branch: &mut SearchState) -> Result<(), DrydockError> {
        let parent_moved = branch.updatable.contains(&dep.name());
        let children = self.provider.dependencies_of(dep, &version).await?;

        for (child, spec) in children {
            let child_name = child.name();
            if parent_moved {
                branch.updatable.insert(child_name.clone());
            }

            if let Some(existing) = branch.sets.get_mut(&child) {
                let effective_spec = self.resolve_effective(&child, &spec).await?;
                let previous_definitions = existing.definitions().len();
                existing.push_definition(Definition {
                    definer: Some(dep.clone()),
                    specifier: effective_spec.clone(),
                });
                if !existing.intersect(&effective_spec) {
                    return Err(if previous_definitions == 1 {
                        DrydockError::IncompatibleRequirements {
                            dependency: child_name,
                            reason: format!("cannot also satisfy {spec} required by '{}'", dep.name()),
                        }
                    } else {
                        DrydockError::UnsatisfiableDependencyList { reason: child_name }
                    });
                }
            } else {
                let locked_pin = (!branch.updatable.contains(&child_name))
                    .then(|| self.last_resolved.and_then(|r| r.get(&child)))
                    .flatten();

                let (candidates, effective_spec) = if let Some(prev) = locked_pin {
                    let effective_spec = locked_effective_spec(&spec, prev);
                    ([ConcreteVersion::new(prev.clone())].into_iter().collect(), effective_spec)
                } else {
                    let effective_spec = self.resolve_effective(&child, &spec).await?;
                    let candidates = self.candidates_for(&child, &effective_spec).await?;
                    (candidates, effective_spec)
                };

                let mut set = ConcreteVersionSet::new(child.clone(), candidates);
                set.push_definition(Definition {
                    definer: Some(dep.clone()),
                    specifier: effective_spec.clone(),
                });
                if !set.intersect(&effective_spec) {
                    return Err(DrydockError::RequiredVersionNotFound {
                        dependency: child_name,
                        version: spec.to_string(),
                    });
                }
                branch.sets.insert(child, set);
            }
        }

        Ok(())
    }

    /// Same-name elimination, cycle check, and conversion to the public
    /// `ResolvedManifest` (spec §4.3 step 2).
    async fn finalize(&self, state: SearchState) -> Result<ResolvedManifest, DrydockError> {
        let mut by_name: BTreeMap<String, Vec<(&Dependency, &ConcreteVersionSet)>> = BTreeMap::new();
        for (dep, set) in &state.sets {
            by_name.entry(dep.name()).or_default().push((dep, set));
        }

        let mut result = ResolvedManifest::new();
        for (_name, group) in by_name {
            let (dep, version) = Self::eliminate(group)?;
            result.insert(dep, version.into_pinned());
        }

        let mut graph = DependencyGraph::new();
        for (dep, pinned) in &result {
            let children = self.provider.dependencies_of(dep, pinned).await?;
            for (child, _) in children {
                if result.contains_key(&child) {
                    graph.add_dependency(dep.clone(), child);
                }
            }
        }
        graph.detect_cycle()?;

        Ok(result)
    }

    fn eliminate(group: Vec<(&Dependency, &ConcreteVersionSet)>) -> Result<(Dependency, ConcreteVersion), DrydockError> {
        let mut best: Option<(&Dependency, &ConcreteVersionSet, u8)> = None;
        for (dep, set) in &group {
            let precedence = set.definitions().iter().map(|d| d.specifier.precedence()).max().unwrap_or(0);
            match best {
                None => best = Some((dep, set, precedence)),
                Some((_, _, best_prec)) if precedence > best_prec => best = Some((dep, set, precedence)),
                Some((best_dep, best_set, best_prec)) if precedence == best_prec && precedence > 0 => {
                    if set.first() != best_set.first() {
                        return Err(DrydockError::IncompatibleDependencies {
                            first: best_dep.name(),
                            second: dep.name(),
                        });
                    }
                }
                _ => {}
            }
        }
        let (dep, set, _) = best.expect("group is never empty");
        let version = set.first().cloned().expect("resolved sets always have a candidate");
        Ok((dep.clone(), version))
    }
}

/// The specifier to record/intersect against when a dependency is locked to
/// its previous pin: for `gitReference` specs this substitutes the locked
/// commit itself (the original reference name was never re-resolved, so
/// comparing against it would always fail); every other kind is compared
/// as written, so a pin that no longer satisfies its manifest line is still
/// caught (spec §8's empty-subset-update boundary case).
fn locked_effective_spec(spec: &VersionSpecifier, prev: &PinnedVersion) -> VersionSpecifier {
    match spec {
        VersionSpecifier::GitReference(_) => VersionSpecifier::GitReference(prev.as_str().to_string()),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests;
