//! Cycle detection and topological order over a resolved dependency map
//! (spec §4.3 step 2, §8 invariant 2), adapted from the same DFS-coloring
//! approach the teacher uses for its resource dependency graph.

use crate::core::DrydockError;
use crate::manifest::Dependency;
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    White,
    Gray,
    Black,
}

/// A directed graph over [`Dependency`] nodes: edge `from -> to` means
/// `from` depends on `to`.
#[derive(Debug, Default)]
pub struct DependencyGraph {
    graph: DiGraph<Dependency, ()>,
    node_map: HashMap<Dependency, NodeIndex>,
}

impl DependencyGraph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn ensure_node(&mut self, dep: Dependency) -> NodeIndex {
        if let Some(&idx) = self.node_map.get(&dep) {
            idx
        } else {
            let idx = self.graph.add_node(dep.clone());
            self.node_map.insert(dep, idx);
            idx
        }
    }

    pub fn add_dependency(&mut self, from: Dependency, to: Dependency) {
        let from_idx = self.ensure_node(from);
        let to_idx = self.ensure_node(to);
        if !self.graph.contains_edge(from_idx, to_idx) {
            self.graph.add_edge(from_idx, to_idx, ());
        }
    }

    /// Detect a cycle via DFS coloring; returns the offending chain as a
    /// `->`-joined string of dependency names for `DependencyCycle`.
    pub fn detect_cycle(&self) -> Result<(), DrydockError> {
        let mut colors: HashMap<NodeIndex, Color> =
            self.graph.node_indices().map(|n| (n, Color::White)).collect();
        let mut path = Vec::new();

        for node in self.graph.node_indices() {
            if colors[&node] == Color::White
                && let Some(cycle) = self.dfs_visit(node, &mut colors, &mut path)
            {
                let chain = cycle.iter().map(Dependency::name).collect::<Vec<_>>().join(" -> ");
                return Err(DrydockError::DependencyCycle { chain });
            }
        }
        Ok(())
    }

    fn dfs_visit(
        &self,
        node: NodeIndex,
        colors: &mut HashMap<NodeIndex, Color>,
        path: &mut Vec<Dependency>,
    ) -> Option<Vec<Dependency>> {
        colors.insert(node, Color::Gray);
        path.push(self.graph[node].clone());

        for neighbor in self.graph.neighbors(node) {
            match colors.get(&neighbor) {
                Some(Color::Gray) => {
                    let start = path.iter().position(|d| *d == self.graph[neighbor]).unwrap();
                    let mut cycle = path[start..].to_vec();
                    cycle.push(self.graph[neighbor].clone());
                    return Some(cycle);
                }
                Some(Color::White) => {
                    if let Some(cycle) = self.dfs_visit(neighbor, colors, path) {
                        return Some(cycle);
                    }
                }
                _ => {}
            }
        }

        path.pop();
        colors.insert(node, Color::Black);
        None
    }

    /// Topological order, dependencies before dependents. Ties are broken
    /// by `petgraph`'s stable insertion order (callers that need
    /// alphabetical tie-breaking — the Orchestrator — build their own
    /// leveled sort instead of reusing this one).
    pub fn topological_order(&self) -> Result<Vec<Dependency>, DrydockError> {
        self.detect_cycle()?;
        match toposort(&self.graph, None) {
            Ok(indices) => Ok(indices.into_iter().rev().map(|idx| self.graph[idx].clone()).collect()),
            Err(_) => unreachable!("detect_cycle already ruled out cycles"),
        }
    }
}
