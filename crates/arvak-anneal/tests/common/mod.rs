//! A scripted annealing backend for sampler tests.
//!
//! Each submission consumes one [`Step`] from the script; once the script
//! runs out every submission succeeds. Like a real device, the backend
//! refuses problems that exceed its declared ranges or ask for device-side
//! auto-scaling, so a test that reaches it with a bad problem fails loudly.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use arvak_anneal::{
    AnnealError, AnnealResult, AnnealingBackend, BiasRange, BindingId, HardwareProblem,
    QpuProperties, SampleHandle, SampleSet, SubmitParams, Vartype,
};
use arvak_embed::{four_group_graph, six_tile_graph, HardwareGraph};
use async_trait::async_trait;

/// What the next submission does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Return one all-up sample.
    Samples,
    /// Fail the submission call as offline.
    Offline,
    /// Accept the submission, then fail on resolve as offline.
    OfflineOnResolve,
    /// Fail with an error unrelated to availability.
    Broken,
}

pub struct ScriptedBackend {
    properties: Mutex<Arc<QpuProperties>>,
    next_properties: Mutex<Option<QpuProperties>>,
    binding: Mutex<BindingId>,
    script: Mutex<VecDeque<Step>>,
    failover_fails: bool,
    submissions: AtomicUsize,
    failovers: AtomicUsize,
    last_params: Mutex<Option<SubmitParams>>,
}

fn range(min: f64, max: f64) -> BiasRange {
    BiasRange::new(min, max).unwrap()
}

impl ScriptedBackend {
    pub fn new(properties: QpuProperties) -> Self {
        Self {
            properties: Mutex::new(Arc::new(properties)),
            next_properties: Mutex::new(None),
            binding: Mutex::new(BindingId::new("mock-0")),
            script: Mutex::new(VecDeque::new()),
            failover_fails: false,
            submissions: AtomicUsize::new(0),
            failovers: AtomicUsize::new(0),
            last_params: Mutex::new(None),
        }
    }

    /// Properties of a four-group `(4, 4, 4)` device.
    pub fn chimera_properties() -> QpuProperties {
        chimera_properties_on(&four_group_graph(4, 4, 4).unwrap())
    }

    /// A four-group `(4, 4, 4)` device.
    pub fn chimera() -> Self {
        Self::new(Self::chimera_properties())
    }

    /// A six-tile size-6 device without a per-qubit limit.
    pub fn pegasus() -> Self {
        let graph = six_tile_graph(6).unwrap();
        Self::new(
            QpuProperties::from_graph(&graph, range(-2.0, 2.0), range(-1.0, 1.0))
                .with_extended_j_range(range(-2.0, 1.0)),
        )
    }

    pub fn with_script(self, steps: impl IntoIterator<Item = Step>) -> Self {
        *lock(&self.script) = steps.into_iter().collect();
        self
    }

    pub fn with_failing_failover(mut self) -> Self {
        self.failover_fails = true;
        self
    }

    /// Properties the device bound by the next failover declares.
    pub fn with_next_properties(self, properties: QpuProperties) -> Self {
        *lock(&self.next_properties) = Some(properties);
        self
    }

    pub fn submissions(&self) -> usize {
        self.submissions.load(Ordering::SeqCst)
    }

    pub fn failovers(&self) -> usize {
        self.failovers.load(Ordering::SeqCst)
    }

    pub fn last_params(&self) -> Option<SubmitParams> {
        lock(&self.last_params).clone()
    }

    fn check_ranges(&self, problem: &HardwareProblem) -> AnnealResult<()> {
        let props = self.properties();
        let h = props.h_range;
        let j = props.extended_j_range.unwrap_or(props.j_range);

        if let Some((q, bias)) = problem.linear().iter().find(|&(_, &b)| !h.contains(b)) {
            return Err(AnnealError::Backend(format!("h[{q}] = {bias} out of range")));
        }
        if let Some((edge, bias)) = problem.quadratic().iter().find(|&(_, &b)| !j.contains(b)) {
            return Err(AnnealError::Backend(format!("J{edge:?} = {bias} out of range")));
        }
        if let Some(limit) = props.per_qubit_coupling_range {
            if let Some((q, sum)) = problem
                .coupling_sums()
                .into_iter()
                .find(|&(_, s)| !limit.contains(s))
            {
                return Err(AnnealError::Backend(format!(
                    "coupling sum {sum} at qubit {q} out of range"
                )));
            }
        }
        Ok(())
    }
}

/// Mock ranges of a four-group device on `graph`.
pub fn chimera_properties_on(graph: &HardwareGraph) -> QpuProperties {
    QpuProperties::from_graph(graph, range(-2.0, 2.0), range(-1.0, 1.0))
        .with_extended_j_range(range(-2.0, 1.0))
        .with_per_qubit_coupling_range(range(-9.0, 6.0))
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[async_trait]
impl AnnealingBackend for ScriptedBackend {
    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "scripted-mock"
    }

    fn binding(&self) -> BindingId {
        lock(&self.binding).clone()
    }

    fn properties(&self) -> Arc<QpuProperties> {
        Arc::clone(&lock(&self.properties))
    }

    async fn sample(
        &self,
        problem: &HardwareProblem,
        params: &SubmitParams,
    ) -> AnnealResult<SampleHandle> {
        self.submissions.fetch_add(1, Ordering::SeqCst);
        *lock(&self.last_params) = Some(params.clone());

        if params.auto_scale {
            return Err(AnnealError::Backend("device auto-scale must be off".into()));
        }
        self.check_ranges(problem)?;

        let step = lock(&self.script).pop_front().unwrap_or(Step::Samples);
        let binding = self.binding();
        match step {
            Step::Offline => Err(AnnealError::BackendUnavailable(format!("{binding} offline"))),
            Step::Broken => Err(AnnealError::Backend("internal device error".into())),
            Step::OfflineOnResolve => Ok(SampleHandle::new(binding.clone(), async move {
                Err(AnnealError::BackendUnavailable(format!("{binding} lost")))
            })),
            Step::Samples => {
                let qubits: Vec<u32> = problem.qubits().collect();
                let sample = vec![1i8; qubits.len()];
                let energy = problem.energy(&sample)?;
                let mut set = SampleSet::new(qubits, Vartype::Spin);
                set.push(sample, energy)?;
                Ok(SampleHandle::ready(binding, Ok(set)))
            }
        }
    }

    async fn trigger_failover(&self) -> AnnealResult<()> {
        let n = self.failovers.fetch_add(1, Ordering::SeqCst) + 1;
        if self.failover_fails {
            return Err(AnnealError::FailoverExhausted("no alternate device".into()));
        }

        let next = lock(&self.next_properties).take();
        let mut properties = lock(&self.properties);
        let fresh = next.unwrap_or_else(|| (**properties).clone());
        *properties = Arc::new(fresh);
        *lock(&self.binding) = BindingId::new(format!("mock-{n}"));
        Ok(())
    }
}
