//! Per-session cache of everything derived from the bound device.
//!
//! ```text
//!   Empty ──get_or_build()──→ Ready(binding) ──invalidate()──→ Empty
//!                                  │
//!                                  └─ backend.binding() != binding ─→ rebuilt
//! ```
//!
//! Everything in a [`CachedTarget`] is handed out as an `Arc`, so callers
//! can tell a rebuilt target from the old one by pointer identity.

use std::sync::Arc;

use arvak_embed::{CliqueEmbedder, HardwareGraph};
use tracing::{debug, info, instrument};

use crate::backend::{AnnealingBackend, BindingId};
use crate::calibrate::RangeSpec;
use crate::error::AnnealResult;
use crate::properties::BiasRange;

/// Graph, ranges and clique embedder of one bound device.
#[derive(Debug)]
pub struct CachedTarget {
    pub binding: BindingId,
    pub graph: Arc<HardwareGraph>,
    pub ranges: Arc<RangeSpec>,
    pub linear_range: Arc<BiasRange>,
    pub quadratic_range: Arc<BiasRange>,
    pub embedder: Arc<CliqueEmbedder>,
}

impl CachedTarget {
    /// Derive everything for the device `backend` is bound to now.
    #[instrument(skip(backend), fields(backend = backend.name()))]
    pub fn build(backend: &dyn AnnealingBackend) -> AnnealResult<Self> {
        let binding = backend.binding();
        let properties = backend.properties();

        let graph = properties.to_graph()?;
        let ranges = RangeSpec::from_properties(&properties)?;
        let embedder = CliqueEmbedder::new(&graph)?;

        info!(
            binding = %binding,
            qubits = graph.num_nodes(),
            clique = embedder.largest_clique_size(),
            "Built target for bound device"
        );

        Ok(Self {
            binding,
            graph: Arc::new(graph),
            linear_range: Arc::new(ranges.linear),
            quadratic_range: Arc::new(ranges.quadratic),
            ranges: Arc::new(ranges),
            embedder: Arc::new(embedder),
        })
    }
}

/// Lazily built target, keyed by device binding.
#[derive(Debug, Default)]
pub struct SessionCache {
    target: Option<Arc<CachedTarget>>,
    builds: u64,
}

impl SessionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached target, rebuilt if missing or bound to another device.
    pub fn get_or_build(&mut self, backend: &dyn AnnealingBackend) -> AnnealResult<Arc<CachedTarget>> {
        if let Some(target) = &self.target {
            if target.binding == backend.binding() {
                return Ok(Arc::clone(target));
            }
            debug!(stale = %target.binding, "Cached target is stale");
        }

        let target = Arc::new(CachedTarget::build(backend)?);
        self.target = Some(Arc::clone(&target));
        self.builds += 1;
        Ok(target)
    }

    /// Drop the cached target.
    pub fn invalidate(&mut self) {
        if let Some(target) = self.target.take() {
            debug!(binding = %target.binding, "Invalidated cached target");
        }
    }

    pub fn is_ready(&self) -> bool {
        self.target.is_some()
    }

    /// How many times a target has been built.
    pub fn builds(&self) -> u64 {
        self.builds
    }
}
