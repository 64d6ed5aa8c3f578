//! Hardware connectivity graphs.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::error::{EmbedError, EmbedResult};
use crate::topology::TopologyKind;

/// Undirected, simple qubit connectivity graph of an annealing processor.
///
/// Nodes are linear qubit indices; the [`TopologyKind`] says how those
/// indices map onto structural coordinates. Edges are stored with the
/// smaller endpoint first.
#[derive(Debug, Clone)]
pub struct HardwareGraph {
    kind: TopologyKind,
    nodes: Vec<u32>,
    node_set: FxHashSet<u32>,
    edges: Vec<(u32, u32)>,
    adjacency: FxHashMap<u32, Vec<u32>>,
}

impl HardwareGraph {
    /// Build a graph from nodes and edges.
    ///
    /// Duplicate edges (in either direction) collapse. Self-loops and
    /// edges touching unknown nodes are rejected.
    pub fn new(
        kind: TopologyKind,
        nodes: impl IntoIterator<Item = u32>,
        edges: impl IntoIterator<Item = (u32, u32)>,
    ) -> EmbedResult<Self> {
        let node_set: FxHashSet<u32> = nodes.into_iter().collect();
        let mut nodes: Vec<u32> = node_set.iter().copied().collect();
        nodes.sort_unstable();

        let mut seen = FxHashSet::default();
        let mut normalized = Vec::new();
        for (a, b) in edges {
            if a == b {
                return Err(EmbedError::InvalidEdge(a, b, "self-loop"));
            }
            if !node_set.contains(&a) || !node_set.contains(&b) {
                return Err(EmbedError::InvalidEdge(a, b, "endpoint is not a node"));
            }
            let edge = (a.min(b), a.max(b));
            if seen.insert(edge) {
                normalized.push(edge);
            }
        }
        normalized.sort_unstable();

        let mut adjacency: FxHashMap<u32, Vec<u32>> = FxHashMap::default();
        for &(a, b) in &normalized {
            adjacency.entry(a).or_default().push(b);
            adjacency.entry(b).or_default().push(a);
        }

        Ok(Self {
            kind,
            nodes,
            node_set,
            edges: normalized,
            adjacency,
        })
    }

    /// Topology family and shape.
    pub fn kind(&self) -> &TopologyKind {
        &self.kind
    }

    /// Qubits, ascending.
    pub fn nodes(&self) -> &[u32] {
        &self.nodes
    }

    /// Couplers as `(low, high)` pairs, ascending.
    pub fn edges(&self) -> &[(u32, u32)] {
        &self.edges
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    pub fn has_node(&self, q: u32) -> bool {
        self.node_set.contains(&q)
    }

    pub fn has_edge(&self, a: u32, b: u32) -> bool {
        self.adjacency
            .get(&a)
            .is_some_and(|neighbors| neighbors.contains(&b))
    }

    /// Neighbors of `q` (empty for unknown qubits).
    pub fn neighbors(&self, q: u32) -> impl Iterator<Item = u32> + '_ {
        self.adjacency.get(&q).into_iter().flatten().copied()
    }

    pub fn degree(&self, q: u32) -> usize {
        self.adjacency.get(&q).map_or(0, Vec::len)
    }

    /// Copy of this graph with `dead` qubits and their couplers removed.
    pub fn with_removed(&self, dead: impl IntoIterator<Item = u32>) -> EmbedResult<Self> {
        let dead: FxHashSet<u32> = dead.into_iter().collect();
        let nodes = self.nodes.iter().copied().filter(|q| !dead.contains(q));
        let edges = self
            .edges
            .iter()
            .copied()
            .filter(|(a, b)| !dead.contains(a) && !dead.contains(b));
        Self::new(self.kind.clone(), nodes, edges)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_graph_normalizes_edges() {
        let graph =
            HardwareGraph::new(TopologyKind::Custom, 0..3, [(1, 0), (0, 1), (2, 1)]).unwrap();
        assert_eq!(graph.edges(), &[(0, 1), (1, 2)]);
        assert_eq!(graph.num_edges(), 2);
        assert!(graph.has_edge(1, 0));
        assert!(!graph.has_edge(0, 2));
        assert_eq!(graph.degree(1), 2);
    }

    #[test]
    fn test_graph_rejects_self_loop() {
        let result = HardwareGraph::new(TopologyKind::Custom, 0..3, [(1, 1)]);
        assert!(matches!(result, Err(EmbedError::InvalidEdge(1, 1, _))));
    }

    #[test]
    fn test_graph_rejects_dangling_edge() {
        let result = HardwareGraph::new(TopologyKind::Custom, 0..3, [(0, 9)]);
        assert!(matches!(result, Err(EmbedError::InvalidEdge(0, 9, _))));
    }

    #[test]
    fn test_with_removed() {
        let graph =
            HardwareGraph::new(TopologyKind::Custom, 0..4, [(0, 1), (1, 2), (2, 3)]).unwrap();
        let pruned = graph.with_removed([1]).unwrap();
        assert_eq!(pruned.nodes(), &[0, 2, 3]);
        assert_eq!(pruned.edges(), &[(2, 3)]);
        assert_eq!(pruned.neighbors(0).count(), 0);
    }
}
