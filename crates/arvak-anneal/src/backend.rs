//! Backend capability for annealing devices.
//!
//! ```text
//!   properties() ──→ sample() ──→ SampleHandle::resolve()
//!    (sync, Arc)      (async)        (async)
//!        │
//!        └── trigger_failover() rebinds to another device; binding() changes
//! ```
//!
//! | Method | Kind | Returns |
//! |--------|------|---------|
//! | `name()` | sync | `&str` |
//! | `binding()` | sync | `BindingId` |
//! | `properties()` | sync | `Arc<QpuProperties>` |
//! | `sample()` | async | `AnnealResult<SampleHandle>` |
//! | `trigger_failover()` | async | `AnnealResult<()>` |

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};

use crate::calibrate::HardwareProblem;
use crate::error::AnnealResult;
use crate::properties::QpuProperties;
use crate::sampleset::SampleSet;

/// Identity of the device a backend is currently bound to.
///
/// Changes on every successful failover, even when the new device has
/// the same topology.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BindingId(pub String);

impl BindingId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for BindingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for BindingId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Parameters forwarded with a hardware submission.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubmitParams {
    /// Device-side global rescaling. The sampler always sends `false`.
    pub auto_scale: bool,
    /// Device-specific parameters (`num_reads`, `annealing_time`, ...).
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl SubmitParams {
    pub fn with_extra(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }
}

/// A submitted problem whose samples arrive later.
pub struct SampleHandle {
    binding: BindingId,
    future: BoxFuture<'static, AnnealResult<SampleSet>>,
}

impl SampleHandle {
    /// Wrap a pending result.
    pub fn new(
        binding: BindingId,
        future: impl Future<Output = AnnealResult<SampleSet>> + Send + 'static,
    ) -> Self {
        Self {
            binding,
            future: Box::pin(future),
        }
    }

    /// A handle that is already complete.
    pub fn ready(binding: BindingId, result: AnnealResult<SampleSet>) -> Self {
        Self::new(binding, futures::future::ready(result))
    }

    /// Device the problem was submitted to.
    pub fn binding(&self) -> &BindingId {
        &self.binding
    }

    /// Wait for the samples.
    pub async fn resolve(self) -> AnnealResult<SampleSet> {
        self.future.await
    }
}

impl fmt::Debug for SampleHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SampleHandle")
            .field("binding", &self.binding)
            .finish_non_exhaustive()
    }
}

/// Trait for annealing devices.
///
/// # Contract
///
/// - `properties()` MUST describe the currently bound device and be
///   cheap; implementations cache it and hand out the same `Arc`.
/// - `sample()` or the returned handle MUST fail with
///   `AnnealError::BackendUnavailable` when the device is offline.
/// - `trigger_failover()` MUST either bind a different device (changing
///   `binding()`) or fail with `AnnealError::FailoverExhausted`.
#[async_trait]
pub trait AnnealingBackend: Send + Sync {
    /// Get the name of this backend.
    fn name(&self) -> &str;

    /// Identity of the bound device.
    fn binding(&self) -> BindingId;

    /// Declared properties of the bound device.
    fn properties(&self) -> Arc<QpuProperties>;

    /// Submit a hardware problem.
    async fn sample(
        &self,
        problem: &HardwareProblem,
        params: &SubmitParams,
    ) -> AnnealResult<SampleHandle>;

    /// Bind an alternate device.
    async fn trigger_failover(&self) -> AnnealResult<()>;
}
