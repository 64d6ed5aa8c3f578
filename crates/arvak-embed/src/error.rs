//! Error types for the embedding crate.

use thiserror::Error;

use crate::embedding::Variable;

/// Errors that can occur while building graphs or embeddings.
#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum EmbedError {
    /// Requested clique is larger than the topology can realize.
    #[error("Clique of size {requested} exceeds the largest embeddable clique ({available})")]
    Capacity {
        /// Number of variables requested.
        requested: usize,
        /// Largest clique the graph supports.
        available: usize,
    },

    /// Same label given twice in an explicit variable list.
    #[error("Variable {0} appears more than once")]
    DuplicateVariable(Variable),

    /// A variable has no chain in the embedding.
    #[error("Variable {0} has no chain in the embedding")]
    MissingChain(Variable),

    /// Two chains that must interact share no hardware edge.
    #[error("Chains for {0} and {1} are not adjacent in the target graph")]
    DisconnectedChains(Variable, Variable),

    /// Self-loop or dangling edge in a hardware graph.
    #[error("Invalid edge ({0}, {1}): {2}")]
    InvalidEdge(u32, u32, &'static str),

    /// Topology shape parameters are unusable.
    #[error("Invalid topology shape: {0}")]
    InvalidShape(String),

    /// Fragment offset tables are malformed.
    #[error("Invalid fragment offsets: {0}")]
    InvalidOffsets(String),

    /// Topology family not understood.
    #[error("Unsupported topology: {0}")]
    UnsupportedTopology(String),
}

/// Result type for embedding operations.
pub type EmbedResult<T> = Result<T, EmbedError>;
