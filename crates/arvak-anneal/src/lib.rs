//! Arvak Resilient Annealing
//!
//! Submits fully connected logical problems to annealing devices whose
//! qubit graphs are sparse. Each problem is placed on a clique embedding
//! of the bound device, its biases are checked against the ranges that
//! device declares, and a device going offline mid-session triggers a
//! failover to another one.
//!
//! # Overview
//!
//! - [`AnnealingBackend`]: what a device must offer: properties, sampling
//!   and failover
//! - [`RangeCalibrator`]: rewrites a [`BinaryQuadraticModel`] onto chains
//!   and validates it against a [`RangeSpec`]
//! - [`SessionCache`]: graph, ranges and embedder of the bound device
//! - [`ResilientCompositeSampler`]: the end-to-end sampler
//!
//! # Failure classes
//!
//! | Error | Meaning | Retried |
//! |-------|---------|---------|
//! | [`AnnealError::Capacity`] | more variables than the largest clique | no |
//! | [`AnnealError::RangeViolation`] | a bias is out of declared range | no |
//! | [`AnnealError::BackendUnavailable`] | device offline | via failover |
//! | [`AnnealError::FailoverExhausted`] | no alternate device | no |
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use arvak_anneal::{ResilientCompositeSampler, SampleParams, SamplerConfig};
//!
//! let sampler = ResilientCompositeSampler::with_config(
//!     Arc::new(my_backend),
//!     SamplerConfig::new().with_failover(true),
//! )?;
//!
//! let n = sampler.largest_clique_size()?;
//! let j = (0..n as i64).flat_map(|u| (u + 1..n as i64).map(move |v| ((u, v), -1.0)));
//! let outcome = sampler.sample_ising([], j, &SampleParams::new()).await?;
//! println!("lowest energy: {:?}", outcome.sampleset.lowest());
//! ```

pub mod backend;
pub mod cache;
pub mod calibrate;
pub mod config;
pub mod error;
pub mod problem;
pub mod properties;
pub mod sampler;
pub mod sampleset;

pub use backend::{AnnealingBackend, BindingId, SampleHandle, SubmitParams};
pub use cache::{CachedTarget, SessionCache};
pub use calibrate::{
    CalibratedProblem, HardwareProblem, RangeBound, RangeCalibrator, RangeSpec,
    DEFAULT_CHAIN_STRENGTH_PREFACTOR,
};
pub use config::{SampleParams, SamplerConfig};
pub use error::{AnnealError, AnnealResult};
pub use problem::{BinaryQuadraticModel, Vartype};
pub use properties::{BiasRange, QpuProperties, TopologyDescriptor};
pub use sampler::{ResilientCompositeSampler, SampleOutcome};
pub use sampleset::SampleSet;
