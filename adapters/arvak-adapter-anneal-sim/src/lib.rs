//! Arvak Simulated Annealing Adapter
//!
//! An in-process pool of simulated annealing devices for the
//! [`arvak_anneal`] sampler. Devices can be taken offline at runtime, so
//! the failover path can be exercised without real hardware.
//!
//! # Features
//!
//! - Four-group and six-tile devices, with optional dead qubits
//! - Metropolis annealing with a linear inverse-temperature schedule
//! - Round-robin failover to the next online device
//! - Reproducible sampling via [`SimulatedAnnealerPool::with_seed`]
//!
//! # Submission parameters
//!
//! | Key | Type | Default |
//! |-----|------|---------|
//! | `num_reads` | positive integer | 10 |
//! | `num_sweeps` | positive integer | 200 |
//! | `beta_range` | `[lo, hi]` | `[0.1, 5.0]` |
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use arvak_adapter_anneal_sim::{SimDevice, SimulatedAnnealerPool};
//! use arvak_anneal::{ResilientCompositeSampler, SamplerConfig};
//!
//! let pool = Arc::new(SimulatedAnnealerPool::new([
//!     SimDevice::four_group("primary", 16, 16, 4, [])?,
//!     SimDevice::four_group("backup", 16, 16, 4, [3, 77])?,
//! ])?);
//! let sampler = ResilientCompositeSampler::with_config(
//!     pool.clone(),
//!     SamplerConfig::new().with_failover(true),
//! )?;
//! pool.set_online("primary", false)?;
//! ```

mod anneal;
mod device;
mod pool;

pub use anneal::{AnnealSchedule, simulated_anneal};
pub use device::{
    DEFAULT_EXTENDED_J_RANGE, DEFAULT_H_RANGE, DEFAULT_J_RANGE, DEFAULT_PER_QUBIT_COUPLING_RANGE,
    SimDevice,
};
pub use pool::SimulatedAnnealerPool;
