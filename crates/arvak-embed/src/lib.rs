//! Arvak Clique Embedding
//!
//! Annealing processors wire their qubits into a sparse, highly regular
//! graph. To run a problem whose variables all interact with each other,
//! every logical variable is realized as a connected *chain* of physical
//! qubits such that each pair of chains shares a coupler.
//!
//! # Overview
//!
//! - [`HardwareGraph`]: the processor's connectivity, tagged with its
//!   [`TopologyKind`]
//! - [`topology`]: structural coordinates and generators for the
//!   four-group and six-tile families
//! - [`FragmentMapper`]: cuts six-tile qubits into four-group lattice
//!   fragments and stitches them back
//! - [`CliqueEmbedder`]: largest clique and prefix cliques over a graph
//!
//! # Example
//!
//! ```
//! use arvak_embed::{six_tile_graph, clique, CliqueSpec};
//!
//! let graph = six_tile_graph(3).unwrap();
//! let embedding = clique(&graph, CliqueSpec::Size(10)).unwrap();
//!
//! assert_eq!(embedding.len(), 10);
//! assert!(embedding.verify_clique(&graph).is_ok());
//! ```

pub mod clique;
pub mod embedding;
pub mod error;
pub mod fragment;
pub mod graph;
pub mod topology;

pub use clique::{
    clique, largest_clique, strategy_for, CliqueEmbedder, CliqueSpec, CliqueStrategy,
    FourGroupClique, SixTileClique,
};
pub use embedding::{Chain, Embedding, Variable};
pub use error::{EmbedError, EmbedResult};
pub use fragment::{FragmentCoord, FragmentMapper, FragmentOffsets};
pub use graph::HardwareGraph;
pub use topology::{
    four_group_graph, six_tile_graph, six_tile_graph_with_offsets, FourGroupCoord,
    FourGroupShape, SixTileCoord, SixTileShape, TopologyKind,
};
