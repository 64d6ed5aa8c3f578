//! Clique sampler that survives devices going offline.
//!
//! One `sample` call runs:
//!
//! ```text
//!   target() ─→ capacity check ─→ calibrate ─→ submit ─→ resolve ─→ Ok
//!      ▲                                          │
//!      │                                 BackendUnavailable
//!      │                                          │
//!      └── invalidate ◄── trigger_failover ◄── budget left?
//!                                                 │ no
//!                                                 ▼
//!                                               Err
//! ```
//!
//! Capacity and range errors surface before anything is submitted and
//! are never retried. A failed failover ends the call with that failure.

use std::sync::{Arc, Mutex, PoisonError};

use arvak_embed::{CliqueEmbedder, CliqueSpec, Embedding, HardwareGraph};
use tracing::{info, instrument, warn};

use crate::backend::{AnnealingBackend, BindingId, SubmitParams};
use crate::cache::{CachedTarget, SessionCache};
use crate::calibrate::{CalibratedProblem, RangeCalibrator, RangeSpec};
use crate::config::{SampleParams, SamplerConfig};
use crate::error::{AnnealError, AnnealResult};
use crate::problem::BinaryQuadraticModel;
use crate::properties::BiasRange;
use crate::sampleset::SampleSet;

/// Samples from one successful submission.
#[derive(Debug, Clone)]
pub struct SampleOutcome {
    /// Samples over hardware qubits.
    pub sampleset: SampleSet,
    /// Chains the logical variables were placed on.
    pub embedding: Embedding,
    /// Chain strength used, before any rescaling.
    pub chain_strength: f64,
    /// Factor biases were divided by.
    pub scale: f64,
    /// Device that produced the samples.
    pub binding: BindingId,
    /// Failovers this call went through.
    pub failovers: u32,
}

/// Composite sampler: clique embedding, range calibration and failover
/// over an [`AnnealingBackend`].
pub struct ResilientCompositeSampler {
    backend: Arc<dyn AnnealingBackend>,
    config: SamplerConfig,
    cache: Mutex<SessionCache>,
}

impl ResilientCompositeSampler {
    /// Create a sampler with default settings (no failover).
    pub fn new(backend: Arc<dyn AnnealingBackend>) -> Self {
        Self {
            backend,
            config: SamplerConfig::default(),
            cache: Mutex::new(SessionCache::new()),
        }
    }

    /// Create a sampler with a validated configuration.
    pub fn with_config(
        backend: Arc<dyn AnnealingBackend>,
        config: SamplerConfig,
    ) -> AnnealResult<Self> {
        config.validate()?;
        Ok(Self {
            backend,
            config,
            cache: Mutex::new(SessionCache::new()),
        })
    }

    pub fn config(&self) -> &SamplerConfig {
        &self.config
    }

    pub fn backend(&self) -> &Arc<dyn AnnealingBackend> {
        &self.backend
    }

    /// Identity of the currently bound device.
    pub fn binding(&self) -> BindingId {
        self.backend.binding()
    }

    /// How many times the cached target has been built.
    pub fn cache_builds(&self) -> u64 {
        self.lock_cache().builds()
    }

    /// Working graph of the bound device.
    pub fn target_graph(&self) -> AnnealResult<Arc<HardwareGraph>> {
        Ok(Arc::clone(&self.target()?.graph))
    }

    /// All ranges of the bound device.
    pub fn range_spec(&self) -> AnnealResult<Arc<RangeSpec>> {
        Ok(Arc::clone(&self.target()?.ranges))
    }

    /// Linear range of the bound device.
    pub fn qpu_linear_range(&self) -> AnnealResult<Arc<BiasRange>> {
        Ok(Arc::clone(&self.target()?.linear_range))
    }

    /// Quadratic range of the bound device.
    pub fn qpu_quadratic_range(&self) -> AnnealResult<Arc<BiasRange>> {
        Ok(Arc::clone(&self.target()?.quadratic_range))
    }

    /// Clique embedder of the bound device.
    pub fn embedder(&self) -> AnnealResult<Arc<CliqueEmbedder>> {
        Ok(Arc::clone(&self.target()?.embedder))
    }

    pub fn largest_clique_size(&self) -> AnnealResult<usize> {
        Ok(self.target()?.embedder.largest_clique_size())
    }

    pub fn largest_clique(&self) -> AnnealResult<Embedding> {
        Ok(self.target()?.embedder.largest_clique())
    }

    /// Clique embedding for a size or a list of labels.
    pub fn clique(&self, spec: impl Into<CliqueSpec>) -> AnnealResult<Embedding> {
        Ok(self.target()?.embedder.embed(spec)?)
    }

    /// Build a spin model from `h` and `j` and sample it.
    pub async fn sample_ising<V: Into<arvak_embed::Variable>>(
        &self,
        h: impl IntoIterator<Item = (V, f64)>,
        j: impl IntoIterator<Item = ((V, V), f64)>,
        params: &SampleParams,
    ) -> AnnealResult<SampleOutcome> {
        let bqm = BinaryQuadraticModel::from_ising(h, j)?;
        self.sample(&bqm, params).await
    }

    /// Embed, calibrate and submit `bqm`, failing over per configuration.
    #[instrument(skip_all, fields(backend = self.backend.name(), variables = bqm.num_variables()))]
    pub async fn sample(
        &self,
        bqm: &BinaryQuadraticModel,
        params: &SampleParams,
    ) -> AnnealResult<SampleOutcome> {
        let budget = self.config.failover_budget();
        let mut failovers = 0;

        loop {
            let target = self.target()?;
            let (embedding, calibrated) = self.prepare(&target, bqm, params)?;

            match self.submit(&calibrated, params).await {
                Ok(sampleset) => {
                    return Ok(SampleOutcome {
                        sampleset,
                        embedding,
                        chain_strength: calibrated.chain_strength,
                        scale: calibrated.scale,
                        binding: target.binding.clone(),
                        failovers,
                    });
                }
                Err(err) if err.is_unavailable() && failovers < budget => {
                    warn!(
                        binding = %target.binding,
                        attempt = failovers + 1,
                        "Device unavailable, triggering failover: {err}"
                    );
                    self.backend.trigger_failover().await?;
                    self.lock_cache().invalidate();
                    failovers += 1;
                    info!(binding = %self.backend.binding(), "Failed over");

                    if let Some(delay) = self.config.retry_delay() {
                        tokio::time::sleep(delay).await;
                    }
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Capacity check, embedding and calibration for one attempt.
    fn prepare(
        &self,
        target: &CachedTarget,
        bqm: &BinaryQuadraticModel,
        params: &SampleParams,
    ) -> AnnealResult<(Embedding, CalibratedProblem)> {
        let available = target.embedder.largest_clique_size();
        if bqm.num_variables() > available {
            return Err(AnnealError::Capacity {
                requested: bqm.num_variables(),
                available,
            });
        }

        let embedding = target.embedder.clique_for(bqm.variables())?;
        let calibrator = RangeCalibrator::new(*target.ranges)
            .with_prefactor(self.config.chain_strength_prefactor);
        let calibrated = calibrator.scale_and_validate(
            bqm,
            &embedding,
            &target.graph,
            params.chain_strength.or(self.config.chain_strength),
            params.auto_scale.unwrap_or(self.config.auto_scale),
        )?;

        Ok((embedding, calibrated))
    }

    /// Submit with device-side scaling off and wait for the samples.
    async fn submit(
        &self,
        calibrated: &CalibratedProblem,
        params: &SampleParams,
    ) -> AnnealResult<SampleSet> {
        let submit = SubmitParams {
            auto_scale: false,
            extra: params.extra.clone(),
        };
        let handle = self.backend.sample(&calibrated.problem, &submit).await?;
        handle.resolve().await
    }

    fn target(&self) -> AnnealResult<Arc<CachedTarget>> {
        self.lock_cache().get_or_build(self.backend.as_ref())
    }

    fn lock_cache(&self) -> std::sync::MutexGuard<'_, SessionCache> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for ResilientCompositeSampler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResilientCompositeSampler")
            .field("backend", &self.backend.name())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
