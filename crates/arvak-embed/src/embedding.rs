//! Chain embeddings of logical variables onto hardware qubits.
//!
//! An [`Embedding`] assigns every logical [`Variable`] a [`Chain`] of
//! physical qubits. Chains are non-empty and pairwise disjoint; for a
//! clique embedding every pair of chains is joined by at least one
//! hardware edge and every chain is connected on its own.

use std::fmt;
use std::ops::Deref;

use petgraph::algo::connected_components;
use petgraph::graphmap::UnGraphMap;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use crate::error::{EmbedError, EmbedResult};
use crate::graph::HardwareGraph;

/// A logical variable label.
///
/// Labels may be integers or strings, and a single problem may mix both.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Variable {
    /// Integer label.
    Index(i64),
    /// String label.
    Label(String),
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variable::Index(i) => write!(f, "{i}"),
            Variable::Label(s) => write!(f, "'{s}'"),
        }
    }
}

impl From<i64> for Variable {
    fn from(i: i64) -> Self {
        Variable::Index(i)
    }
}

impl From<i32> for Variable {
    fn from(i: i32) -> Self {
        Variable::Index(i64::from(i))
    }
}

impl From<usize> for Variable {
    #[allow(clippy::cast_possible_wrap)]
    fn from(i: usize) -> Self {
        Variable::Index(i as i64)
    }
}

impl From<&str> for Variable {
    fn from(s: &str) -> Self {
        Variable::Label(s.to_string())
    }
}

impl From<String> for Variable {
    fn from(s: String) -> Self {
        Variable::Label(s)
    }
}

/// A connected set of physical qubits realizing one logical variable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Chain(Vec<u32>);

impl Chain {
    /// Create a chain from qubit indices, dropping repeats.
    pub fn new(qubits: impl IntoIterator<Item = u32>) -> Self {
        let mut seen = FxHashSet::default();
        Self(qubits.into_iter().filter(|q| seen.insert(*q)).collect())
    }

    /// Physical qubits in this chain.
    pub fn qubits(&self) -> &[u32] {
        &self.0
    }

    /// Whether the chain is connected in the subgraph of `graph` it induces.
    pub fn is_connected_in(&self, graph: &HardwareGraph) -> bool {
        if self.0.is_empty() || !self.0.iter().all(|&q| graph.has_node(q)) {
            return false;
        }

        let mut sub = UnGraphMap::<u32, ()>::new();
        for &q in &self.0 {
            sub.add_node(q);
        }
        for (i, &a) in self.0.iter().enumerate() {
            for &b in &self.0[i + 1..] {
                if graph.has_edge(a, b) {
                    sub.add_edge(a, b, ());
                }
            }
        }

        connected_components(&sub) == 1
    }

    /// Whether any hardware edge joins this chain to `other`.
    pub fn touches(&self, other: &Chain, graph: &HardwareGraph) -> bool {
        self.0
            .iter()
            .any(|&a| graph.neighbors(a).any(|b| other.0.contains(&b)))
    }
}

impl Deref for Chain {
    type Target = [u32];

    fn deref(&self) -> &[u32] {
        &self.0
    }
}

impl From<Vec<u32>> for Chain {
    fn from(qubits: Vec<u32>) -> Self {
        Self::new(qubits)
    }
}

/// Ordered mapping from logical variables to chains.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Embedding {
    chains: Vec<(Variable, Chain)>,
    index: FxHashMap<Variable, usize>,
}

impl Embedding {
    /// Create an empty embedding.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an embedding from `(variable, chain)` pairs, in order.
    ///
    /// Rejects repeated variables, empty chains, and chains that share
    /// a qubit.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (Variable, Chain)>) -> EmbedResult<Self> {
        let mut embedding = Self::new();
        let mut used = FxHashSet::default();

        for (variable, chain) in pairs {
            if embedding.index.contains_key(&variable) {
                return Err(EmbedError::DuplicateVariable(variable));
            }
            if chain.is_empty() {
                return Err(EmbedError::MissingChain(variable));
            }
            if let Some(&q) = chain.iter().find(|q| !used.insert(**q)) {
                return Err(EmbedError::InvalidShape(format!(
                    "qubit {q} is shared by two chains"
                )));
            }
            embedding.index.insert(variable.clone(), embedding.chains.len());
            embedding.chains.push((variable, chain));
        }

        Ok(embedding)
    }

    /// Append a pair the caller already knows to be valid.
    pub(crate) fn push_unchecked(&mut self, variable: Variable, chain: Chain) {
        self.index.insert(variable.clone(), self.chains.len());
        self.chains.push((variable, chain));
    }

    /// Number of embedded variables.
    pub fn len(&self) -> usize {
        self.chains.len()
    }

    /// Whether the embedding is empty.
    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }

    /// Chain assigned to `variable`.
    pub fn get(&self, variable: &Variable) -> Option<&Chain> {
        self.index.get(variable).map(|&i| &self.chains[i].1)
    }

    /// Whether `variable` is embedded.
    pub fn contains(&self, variable: &Variable) -> bool {
        self.index.contains_key(variable)
    }

    /// Embedded variables in order.
    pub fn variables(&self) -> impl Iterator<Item = &Variable> {
        self.chains.iter().map(|(v, _)| v)
    }

    /// `(variable, chain)` pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (&Variable, &Chain)> {
        self.chains.iter().map(|(v, c)| (v, c))
    }

    /// Longest chain length, or 0 when empty.
    pub fn max_chain_length(&self) -> usize {
        self.chains.iter().map(|(_, c)| c.len()).max().unwrap_or(0)
    }

    /// Total number of physical qubits used.
    pub fn num_qubits(&self) -> usize {
        self.chains.iter().map(|(_, c)| c.len()).sum()
    }

    /// Check every clique invariant against `graph`.
    ///
    /// Each chain must be connected, and every pair of chains must share
    /// at least one edge.
    pub fn verify_clique(&self, graph: &HardwareGraph) -> EmbedResult<()> {
        for (variable, chain) in &self.chains {
            if !chain.is_connected_in(graph) {
                return Err(EmbedError::InvalidShape(format!(
                    "chain for {variable} is broken"
                )));
            }
        }
        for (i, (u, a)) in self.chains.iter().enumerate() {
            for (v, b) in &self.chains[i + 1..] {
                if !a.touches(b, graph) {
                    return Err(EmbedError::DisconnectedChains(u.clone(), v.clone()));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::TopologyKind;

    fn path_graph(n: u32) -> HardwareGraph {
        let edges: Vec<_> = (0..n.saturating_sub(1)).map(|i| (i, i + 1)).collect();
        HardwareGraph::new(TopologyKind::Custom, 0..n, edges).unwrap()
    }

    #[test]
    fn test_variable_display() {
        assert_eq!(Variable::from(3i64).to_string(), "3");
        assert_eq!(Variable::from("a").to_string(), "'a'");
    }

    #[test]
    fn test_chain_dedup() {
        let chain = Chain::new([3, 1, 3, 2]);
        assert_eq!(chain.qubits(), &[3, 1, 2]);
    }

    #[test]
    fn test_chain_connectivity() {
        let graph = path_graph(5);
        assert!(Chain::new([1, 2, 3]).is_connected_in(&graph));
        assert!(!Chain::new([1, 3]).is_connected_in(&graph));
        assert!(!Chain::new([4, 7]).is_connected_in(&graph));
    }

    #[test]
    fn test_embedding_rejects_shared_qubit() {
        let result = Embedding::from_pairs([
            (Variable::from(0i64), Chain::new([0, 1])),
            (Variable::from(1i64), Chain::new([1, 2])),
        ]);
        assert!(matches!(result, Err(EmbedError::InvalidShape(_))));
    }

    #[test]
    fn test_embedding_rejects_duplicate_variable() {
        let result = Embedding::from_pairs([
            (Variable::from("a"), Chain::new([0])),
            (Variable::from("a"), Chain::new([1])),
        ]);
        assert!(matches!(result, Err(EmbedError::DuplicateVariable(_))));
    }

    #[test]
    fn test_verify_clique_on_path() {
        let graph = path_graph(4);
        let ok = Embedding::from_pairs([
            (Variable::from(0i64), Chain::new([0, 1])),
            (Variable::from(1i64), Chain::new([2, 3])),
        ])
        .unwrap();
        assert!(ok.verify_clique(&graph).is_ok());
        assert_eq!(ok.max_chain_length(), 2);
        assert_eq!(ok.num_qubits(), 4);

        let bad = Embedding::from_pairs([
            (Variable::from(0i64), Chain::new([0])),
            (Variable::from(1i64), Chain::new([3])),
        ])
        .unwrap();
        assert!(matches!(
            bad.verify_clique(&graph),
            Err(EmbedError::DisconnectedChains(_, _))
        ));
    }
}
