//! Clique embeddings onto structured hardware topologies.
//!
//! The hardware graphs are regular enough that the largest embeddable
//! clique comes from a closed-form tiling construction rather than a
//! search. Each topology family has its own [`CliqueStrategy`]; the
//! six-tile strategy delegates to the four-group construction over its
//! fragment lattice.
//!
//! # Example
//!
//! ```
//! use arvak_embed::{four_group_graph, CliqueEmbedder, Variable};
//!
//! let graph = four_group_graph(4, 4, 4).unwrap();
//! let embedder = CliqueEmbedder::new(&graph).unwrap();
//! assert_eq!(embedder.largest_clique_size(), 16);
//!
//! let embedding = embedder
//!     .clique_for(&[Variable::from("a"), Variable::from(1i64)])
//!     .unwrap();
//! assert_eq!(embedding.len(), 2);
//! ```

mod four_group;
mod native;
mod six_tile;

use rustc_hash::FxHashSet;
use tracing::{info, instrument};

use crate::embedding::{Chain, Embedding, Variable};
use crate::error::{EmbedError, EmbedResult};
use crate::graph::HardwareGraph;
use crate::topology::TopologyKind;

pub use four_group::FourGroupClique;
pub use six_tile::SixTileClique;

/// A way of embedding cliques onto one topology family.
pub trait CliqueStrategy: Send + Sync {
    /// Name of this strategy.
    fn name(&self) -> &'static str;

    /// Chains of the largest clique, in canonical order.
    ///
    /// Must be deterministic: the same graph always yields the same chains
    /// in the same order.
    fn canonical_chains(&self, graph: &HardwareGraph) -> EmbedResult<Vec<Chain>>;
}

/// Pick the strategy matching a topology family.
pub fn strategy_for(kind: &TopologyKind) -> EmbedResult<Box<dyn CliqueStrategy>> {
    match kind {
        TopologyKind::FourGroup(_) => Ok(Box::new(FourGroupClique)),
        TopologyKind::SixTile(_) => Ok(Box::new(SixTileClique)),
        TopologyKind::Custom => Err(EmbedError::UnsupportedTopology(
            "no closed-form clique construction for custom graphs".into(),
        )),
    }
}

/// What clique to build: a size, or an explicit list of labels.
#[derive(Debug, Clone, PartialEq)]
pub enum CliqueSpec {
    /// Variables `0..k`.
    Size(usize),
    /// These variables, in order.
    Variables(Vec<Variable>),
}

impl CliqueSpec {
    pub fn len(&self) -> usize {
        match self {
            CliqueSpec::Size(k) => *k,
            CliqueSpec::Variables(labels) => labels.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<usize> for CliqueSpec {
    fn from(k: usize) -> Self {
        CliqueSpec::Size(k)
    }
}

impl From<Vec<Variable>> for CliqueSpec {
    fn from(labels: Vec<Variable>) -> Self {
        CliqueSpec::Variables(labels)
    }
}

impl From<&[Variable]> for CliqueSpec {
    fn from(labels: &[Variable]) -> Self {
        CliqueSpec::Variables(labels.to_vec())
    }
}

/// Clique embeddings for one hardware graph.
///
/// The canonical chain list is computed once; every embedding handed out
/// is a prefix of it, so the chain assigned to the `i`-th variable never
/// depends on how many variables were requested.
#[derive(Debug, Clone)]
pub struct CliqueEmbedder {
    family: &'static str,
    chains: Vec<Chain>,
}

impl CliqueEmbedder {
    /// Compute the canonical chains for `graph`.
    #[instrument(skip(graph), fields(family = graph.kind().family(), qubits = graph.num_nodes()))]
    pub fn new(graph: &HardwareGraph) -> EmbedResult<Self> {
        let strategy = strategy_for(graph.kind())?;
        let chains = strategy.canonical_chains(graph)?;

        info!(
            strategy = strategy.name(),
            size = chains.len(),
            max_chain = chains.iter().map(|c| c.len()).max().unwrap_or(0),
            "Computed largest clique"
        );

        Ok(Self {
            family: strategy.name(),
            chains,
        })
    }

    /// Strategy that produced the chains.
    pub fn family(&self) -> &'static str {
        self.family
    }

    /// Canonical chains, largest clique first to last.
    pub fn chains(&self) -> &[Chain] {
        &self.chains
    }

    pub fn largest_clique_size(&self) -> usize {
        self.chains.len()
    }

    /// The largest clique, labelled `0..size`.
    pub fn largest_clique(&self) -> Embedding {
        self.indexed(self.chains.len())
    }

    /// A clique of `k` variables labelled `0..k`.
    pub fn clique(&self, k: usize) -> EmbedResult<Embedding> {
        self.check_capacity(k)?;
        Ok(self.indexed(k))
    }

    /// A clique over `labels`, in the given order.
    pub fn clique_for(&self, labels: &[Variable]) -> EmbedResult<Embedding> {
        self.check_capacity(labels.len())?;

        let mut seen = FxHashSet::default();
        if let Some(dup) = labels.iter().find(|v| !seen.insert(*v)) {
            return Err(EmbedError::DuplicateVariable(dup.clone()));
        }

        Embedding::from_pairs(labels.iter().cloned().zip(self.chains.iter().cloned()))
    }

    /// Dispatch on a [`CliqueSpec`].
    pub fn embed(&self, spec: impl Into<CliqueSpec>) -> EmbedResult<Embedding> {
        match spec.into() {
            CliqueSpec::Size(k) => self.clique(k),
            CliqueSpec::Variables(labels) => self.clique_for(&labels),
        }
    }

    fn check_capacity(&self, requested: usize) -> EmbedResult<()> {
        if requested > self.chains.len() {
            return Err(EmbedError::Capacity {
                requested,
                available: self.chains.len(),
            });
        }
        Ok(())
    }

    fn indexed(&self, k: usize) -> Embedding {
        let mut embedding = Embedding::new();
        for (i, chain) in self.chains.iter().take(k).enumerate() {
            embedding.push_unchecked(Variable::from(i), chain.clone());
        }
        embedding
    }
}

/// Largest clique embedding constructible on `graph`.
pub fn largest_clique(graph: &HardwareGraph) -> EmbedResult<Embedding> {
    Ok(CliqueEmbedder::new(graph)?.largest_clique())
}

/// Clique embedding of a given size or label set on `graph`.
pub fn clique(graph: &HardwareGraph, spec: impl Into<CliqueSpec>) -> EmbedResult<Embedding> {
    CliqueEmbedder::new(graph)?.embed(spec)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::{four_group_graph, six_tile_graph};

    #[test]
    fn test_largest_clique_four_group() {
        let graph = four_group_graph(4, 4, 4).unwrap();
        let embedding = largest_clique(&graph).unwrap();
        assert_eq!(embedding.len(), 16);
        embedding.verify_clique(&graph).unwrap();
    }

    #[test]
    fn test_clique_sizes() {
        let graph = four_group_graph(4, 4, 4).unwrap();
        let embedder = CliqueEmbedder::new(&graph).unwrap();
        assert_eq!(embedder.clique(2).unwrap().len(), 2);
        assert_eq!(embedder.clique(16).unwrap().len(), 16);
        assert!(embedder.clique(0).unwrap().is_empty());
    }

    #[test]
    fn test_clique_too_large() {
        let graph = four_group_graph(4, 4, 4).unwrap();
        let result = clique(&graph, 17usize);
        assert_eq!(
            result,
            Err(EmbedError::Capacity {
                requested: 17,
                available: 16
            })
        );
    }

    #[test]
    fn test_mixed_labels() {
        let graph = four_group_graph(4, 4, 4).unwrap();
        let embedder = CliqueEmbedder::new(&graph).unwrap();
        let labels = vec![Variable::from("a"), Variable::from(1i64)];
        let embedding = embedder.embed(labels.clone()).unwrap();

        assert_eq!(embedding.variables().cloned().collect::<Vec<_>>(), labels);
        let by_index = embedder.clique(2).unwrap();
        assert_eq!(
            embedding.get(&Variable::from("a")),
            by_index.get(&Variable::from(0i64))
        );
        assert_eq!(
            embedding.get(&Variable::from(1i64)),
            by_index.get(&Variable::from(1i64))
        );
    }

    #[test]
    fn test_duplicate_labels_rejected() {
        let graph = four_group_graph(2, 2, 4).unwrap();
        let embedder = CliqueEmbedder::new(&graph).unwrap();
        let result = embedder.clique_for(&[Variable::from("x"), Variable::from("x")]);
        assert!(matches!(result, Err(EmbedError::DuplicateVariable(_))));
    }

    #[test]
    fn test_truncation_is_stable() {
        let graph = six_tile_graph(3).unwrap();
        let embedder = CliqueEmbedder::new(&graph).unwrap();
        let small = embedder.clique(5).unwrap();
        let large = embedder.clique(12).unwrap();
        for (variable, chain) in small.iter() {
            assert_eq!(large.get(variable), Some(chain));
        }
    }

    #[test]
    fn test_deterministic() {
        let graph = six_tile_graph(3).unwrap();
        let a = CliqueEmbedder::new(&graph).unwrap();
        let b = CliqueEmbedder::new(&graph).unwrap();
        assert_eq!(a.chains(), b.chains());
    }

    #[test]
    fn test_custom_topology_unsupported() {
        let graph = HardwareGraph::new(TopologyKind::Custom, 0..2, [(0, 1)]).unwrap();
        assert!(matches!(
            CliqueEmbedder::new(&graph),
            Err(EmbedError::UnsupportedTopology(_))
        ));
    }
}
