//! Error types for the annealing crate.
//!
//! The sampler distinguishes four failure classes that callers routinely
//! branch on:
//!
//! | Variant | Raised | Retried |
//! |---------|--------|---------|
//! | `Capacity` | before submission | never |
//! | `RangeViolation` | before submission | never |
//! | `BackendUnavailable` | during submission | via failover, per policy |
//! | `FailoverExhausted` | during failover | never |

use arvak_embed::EmbedError;
use thiserror::Error;

use crate::calibrate::RangeBound;
use crate::properties::BiasRange;

/// Errors that can occur while calibrating or sampling a problem.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AnnealError {
    /// Problem needs more variables than the target can embed.
    #[error("Problem has {requested} variables but the largest embeddable clique holds {available}")]
    Capacity {
        /// Number of logical variables in the problem.
        requested: usize,
        /// Largest clique size of the bound backend.
        available: usize,
    },

    /// A hardware bias or coupling sum falls outside a declared range.
    #[error("{bound} value {value} at {location} is outside {range}")]
    RangeViolation {
        /// Which declared range was violated.
        bound: RangeBound,
        /// The offending value.
        value: f64,
        /// The allowed range.
        range: BiasRange,
        /// Qubit or coupler carrying the value.
        location: String,
    },

    /// Remote device is offline or unreachable.
    #[error("Backend not available: {0}")]
    BackendUnavailable(String),

    /// No alternate device could be bound.
    #[error("Failover exhausted: {0}")]
    FailoverExhausted(String),

    /// Embedding failed for a reason other than capacity.
    #[error("Embedding error: {0}")]
    Embed(EmbedError),

    /// Logical problem is malformed.
    #[error("Invalid problem: {0}")]
    InvalidProblem(String),

    /// Declared properties or sampler configuration are unusable.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic backend error.
    #[error("Backend error: {0}")]
    Backend(String),
}

impl AnnealError {
    /// Whether this error means the bound device went away.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, AnnealError::BackendUnavailable(_))
    }
}

impl From<EmbedError> for AnnealError {
    fn from(err: EmbedError) -> Self {
        match err {
            EmbedError::Capacity {
                requested,
                available,
            } => AnnealError::Capacity {
                requested,
                available,
            },
            other => AnnealError::Embed(other),
        }
    }
}

/// Result type for annealing operations.
pub type AnnealResult<T> = Result<T, AnnealError>;
