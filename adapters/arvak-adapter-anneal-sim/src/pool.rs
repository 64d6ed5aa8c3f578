//! A pool of simulated devices behind one [`AnnealingBackend`].

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use arvak_anneal::{
    AnnealError, AnnealResult, AnnealingBackend, BindingId, HardwareProblem, QpuProperties,
    SampleHandle, SubmitParams,
};
use arvak_embed::HardwareGraph;
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::anneal::{AnnealSchedule, simulated_anneal};
use crate::device::SimDevice;

struct Active {
    index: usize,
    binding: BindingId,
}

/// Simulated devices with round-robin failover.
///
/// One device is bound at a time. Submitting to a bound device that is
/// offline fails with [`AnnealError::BackendUnavailable`];
/// `trigger_failover` binds the next online device.
pub struct SimulatedAnnealerPool {
    devices: Vec<Arc<SimDevice>>,
    active: Mutex<Active>,
    rng: Mutex<StdRng>,
}

impl SimulatedAnnealerPool {
    /// Bind the first device of `devices`.
    pub fn new(devices: impl IntoIterator<Item = SimDevice>) -> AnnealResult<Self> {
        let devices: Vec<Arc<SimDevice>> = devices.into_iter().map(Arc::new).collect();
        let first = devices
            .first()
            .ok_or_else(|| AnnealError::Configuration("device pool is empty".into()))?;
        let binding = new_binding(first);
        Ok(Self {
            devices,
            active: Mutex::new(Active { index: 0, binding }),
            rng: Mutex::new(StdRng::from_entropy()),
        })
    }

    /// Make sampling reproducible.
    pub fn with_seed(self, seed: u64) -> Self {
        *lock(&self.rng) = StdRng::seed_from_u64(seed);
        self
    }

    pub fn devices(&self) -> &[Arc<SimDevice>] {
        &self.devices
    }

    /// The currently bound device.
    pub fn active_device(&self) -> Arc<SimDevice> {
        Arc::clone(&self.devices[lock(&self.active).index])
    }

    /// Look a device up by name.
    pub fn device(&self, name: &str) -> AnnealResult<Arc<SimDevice>> {
        self.devices
            .iter()
            .find(|d| d.name() == name)
            .cloned()
            .ok_or_else(|| AnnealError::Configuration(format!("no device named {name}")))
    }

    /// Take a device on- or offline.
    pub fn set_online(&self, name: &str, online: bool) -> AnnealResult<()> {
        self.device(name)?.set_online(online);
        info!(device = name, online, "Device availability changed");
        Ok(())
    }

    fn check_ranges(properties: &QpuProperties, problem: &HardwareProblem) -> AnnealResult<()> {
        let h = properties.h_range;
        let j = properties.extended_j_range.unwrap_or(properties.j_range);

        if let Some((q, bias)) = problem.linear().iter().find(|&(_, b)| !h.contains(*b)) {
            return Err(AnnealError::Backend(format!(
                "h[{q}] = {bias} outside {h}"
            )));
        }
        if let Some(((a, b), bias)) = problem.quadratic().iter().find(|&(_, v)| !j.contains(*v)) {
            return Err(AnnealError::Backend(format!(
                "J[{a}, {b}] = {bias} outside {j}"
            )));
        }
        if let Some(limit) = properties.per_qubit_coupling_range {
            if let Some((q, sum)) = problem
                .coupling_sums()
                .into_iter()
                .find(|(_, s)| !limit.contains(*s))
            {
                return Err(AnnealError::Backend(format!(
                    "coupling sum {sum} at qubit {q} outside {limit}"
                )));
            }
        }
        Ok(())
    }

    fn check_graph(graph: &HardwareGraph, problem: &HardwareProblem) -> AnnealResult<()> {
        if let Some(q) = problem.qubits().find(|&q| !graph.has_node(q)) {
            return Err(AnnealError::Backend(format!("qubit {q} is not working")));
        }
        if let Some((a, b)) = problem
            .quadratic()
            .keys()
            .find(|(a, b)| !graph.has_edge(*a, *b))
        {
            return Err(AnnealError::Backend(format!("no coupler between {a} and {b}")));
        }
        Ok(())
    }
}

fn new_binding(device: &SimDevice) -> BindingId {
    BindingId::new(format!("{}:{}", device.name(), Uuid::new_v4()))
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[async_trait]
impl AnnealingBackend for SimulatedAnnealerPool {
    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "simulated-annealer-pool"
    }

    fn binding(&self) -> BindingId {
        lock(&self.active).binding.clone()
    }

    fn properties(&self) -> Arc<QpuProperties> {
        self.active_device().properties()
    }

    #[instrument(skip(self, problem, params), fields(qubits = problem.num_qubits()))]
    async fn sample(
        &self,
        problem: &HardwareProblem,
        params: &SubmitParams,
    ) -> AnnealResult<SampleHandle> {
        let (device, binding) = {
            let active = lock(&self.active);
            (Arc::clone(&self.devices[active.index]), active.binding.clone())
        };
        if !device.is_online() {
            return Err(AnnealError::BackendUnavailable(format!(
                "{} is offline",
                device.name()
            )));
        }
        if params.auto_scale {
            return Err(AnnealError::Backend(
                "device-side auto_scale is not supported".into(),
            ));
        }

        Self::check_graph(&device.graph(), problem)?;
        Self::check_ranges(&device.properties(), problem)?;
        let schedule = AnnealSchedule::from_params(params)?;

        let seed = lock(&self.rng).gen_range(0..=u64::MAX);
        debug!(
            device = device.name(),
            reads = schedule.num_reads,
            sweeps = schedule.num_sweeps,
            "Submitting to simulated device"
        );

        let problem = problem.clone();
        Ok(SampleHandle::new(binding, async move {
            tokio::task::spawn_blocking(move || {
                simulated_anneal(&problem, &schedule, &mut StdRng::seed_from_u64(seed))
            })
            .await
            .map_err(|e| AnnealError::Backend(format!("annealing task failed: {e}")))?
        }))
    }

    #[instrument(skip(self))]
    async fn trigger_failover(&self) -> AnnealResult<()> {
        let mut active = lock(&self.active);
        let n = self.devices.len();
        let next = (1..n)
            .map(|step| (active.index + step) % n)
            .find(|&i| self.devices[i].is_online())
            .ok_or_else(|| {
                AnnealError::FailoverExhausted(format!(
                    "no online device besides {}",
                    self.devices[active.index].name()
                ))
            })?;

        let device = &self.devices[next];
        active.index = next;
        active.binding = new_binding(device);
        info!(device = device.name(), binding = %active.binding, "Bound new device");
        Ok(())
    }
}

impl std::fmt::Debug for SimulatedAnnealerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulatedAnnealerPool")
            .field("devices", &self.devices)
            .field("binding", &self.binding())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arvak_anneal::{BinaryQuadraticModel, RangeCalibrator, RangeSpec, Vartype};
    use arvak_embed::{Chain, Embedding, Variable};

    fn pool() -> SimulatedAnnealerPool {
        SimulatedAnnealerPool::new([
            SimDevice::four_group("a", 2, 2, 4, []).unwrap(),
            SimDevice::four_group("b", 2, 2, 4, [0]).unwrap(),
            SimDevice::four_group("c", 2, 2, 4, []).unwrap(),
        ])
        .unwrap()
        .with_seed(11)
    }

    #[test]
    fn test_empty_pool_rejected() {
        let err = SimulatedAnnealerPool::new(Vec::new()).unwrap_err();
        assert!(matches!(err, AnnealError::Configuration(_)));
    }

    #[test]
    fn test_binding_names_device() {
        let pool = pool();
        assert!(pool.binding().0.starts_with("a:"));
        assert_eq!(pool.active_device().name(), "a");
        assert!(pool.device("z").is_err());
    }

    #[tokio::test]
    async fn test_failover_skips_offline_devices() {
        let pool = pool();
        pool.set_online("b", false).unwrap();
        let before = pool.binding();

        pool.trigger_failover().await.unwrap();
        assert_eq!(pool.active_device().name(), "c");
        assert_ne!(pool.binding(), before);

        pool.trigger_failover().await.unwrap();
        assert_eq!(pool.active_device().name(), "a");
    }

    #[tokio::test]
    async fn test_failover_exhausted() {
        let pool = pool();
        pool.set_online("b", false).unwrap();
        pool.set_online("c", false).unwrap();

        let err = pool.trigger_failover().await.unwrap_err();
        assert!(matches!(err, AnnealError::FailoverExhausted(_)));
        assert_eq!(pool.active_device().name(), "a");
    }

    #[tokio::test]
    async fn test_offline_device_is_unavailable() {
        let pool = pool();
        pool.set_online("a", false).unwrap();

        let err = pool
            .sample(&HardwareProblem::default(), &SubmitParams::default())
            .await
            .unwrap_err();
        assert!(err.is_unavailable());
    }

    #[tokio::test]
    async fn test_handle_binding_names_sampled_device() {
        let pool = pool();
        let handle = pool
            .sample(&HardwareProblem::default(), &SubmitParams::default())
            .await
            .unwrap();
        assert!(handle.binding().0.starts_with("a:"));
        assert_eq!(handle.binding(), &pool.binding());

        pool.trigger_failover().await.unwrap();
        let handle = pool
            .sample(&HardwareProblem::default(), &SubmitParams::default())
            .await
            .unwrap();
        assert!(handle.binding().0.starts_with("b:"));
        assert_eq!(handle.binding(), &pool.binding());
    }

    #[tokio::test]
    async fn test_dead_qubit_rejected_by_device_graph() {
        let pool = pool();
        let full = pool.active_device();
        let mut bqm = BinaryQuadraticModel::empty(Vartype::Spin);
        bqm.add_linear(0i64, 0.5);
        let embedding = Embedding::from_pairs([(Variable::from(0i64), Chain::new([0]))]).unwrap();
        let problem = RangeCalibrator::new(RangeSpec::from_properties(&full.properties()).unwrap())
            .embed(&bqm, &embedding, &full.graph(), 1.0)
            .unwrap();

        // Device b lost qubit 0; its graph is built once and reused.
        pool.trigger_failover().await.unwrap();
        let degraded = pool.active_device();
        assert!(Arc::ptr_eq(&degraded.graph(), &degraded.graph()));
        assert!(!degraded.graph().has_node(0));

        let err = pool
            .sample(&problem, &SubmitParams::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AnnealError::Backend(_)));
    }

    #[tokio::test]
    async fn test_device_auto_scale_refused() {
        let pool = pool();
        let params = SubmitParams {
            auto_scale: true,
            ..SubmitParams::default()
        };
        let err = pool
            .sample(&HardwareProblem::default(), &params)
            .await
            .unwrap_err();
        assert!(matches!(err, AnnealError::Backend(_)));
    }
}
