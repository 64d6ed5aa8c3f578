//! Metropolis annealing over a [`HardwareProblem`].
//!
//! Each read starts from a random spin state and sweeps every qubit once
//! per step while the inverse temperature rises linearly across
//! `beta_range`.

use arvak_anneal::{AnnealError, AnnealResult, HardwareProblem, SampleSet, SubmitParams, Vartype};
use rand::Rng;
use rustc_hash::FxHashMap;

/// Sweep schedule of one submission.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnnealSchedule {
    pub num_reads: u32,
    pub num_sweeps: u32,
    /// Inverse temperature at the first and last sweep.
    pub beta_range: (f64, f64),
}

impl Default for AnnealSchedule {
    fn default() -> Self {
        Self {
            num_reads: 10,
            num_sweeps: 200,
            beta_range: (0.1, 5.0),
        }
    }
}

impl AnnealSchedule {
    /// Read `num_reads`, `num_sweeps` and `beta_range` from submission
    /// parameters, keeping defaults for absent keys.
    pub fn from_params(params: &SubmitParams) -> AnnealResult<Self> {
        let mut schedule = Self::default();
        if let Some(value) = params.extra.get("num_reads") {
            schedule.num_reads = positive_u32("num_reads", value)?;
        }
        if let Some(value) = params.extra.get("num_sweeps") {
            schedule.num_sweeps = positive_u32("num_sweeps", value)?;
        }
        if let Some(value) = params.extra.get("beta_range") {
            let (lo, hi): (f64, f64) = serde_json::from_value(value.clone())?;
            if !(lo > 0.0 && hi >= lo) {
                return Err(AnnealError::Configuration(format!(
                    "beta_range [{lo}, {hi}] must be positive and ascending"
                )));
            }
            schedule.beta_range = (lo, hi);
        }
        Ok(schedule)
    }

    fn beta(&self, sweep: u32) -> f64 {
        let (lo, hi) = self.beta_range;
        if self.num_sweeps <= 1 {
            return hi;
        }
        lo + (hi - lo) * f64::from(sweep) / f64::from(self.num_sweeps - 1)
    }
}

fn positive_u32(key: &str, value: &serde_json::Value) -> AnnealResult<u32> {
    value
        .as_u64()
        .and_then(|n| u32::try_from(n).ok())
        .filter(|&n| n > 0)
        .ok_or_else(|| AnnealError::Configuration(format!("{key} must be a positive integer")))
}

/// Dense view of a problem: qubit `i` of the sample is `qubits[i]`.
struct Couplings {
    qubits: Vec<u32>,
    linear: Vec<f64>,
    neighbors: Vec<Vec<(usize, f64)>>,
}

impl Couplings {
    fn new(problem: &HardwareProblem) -> Self {
        let qubits: Vec<u32> = problem.qubits().collect();
        let index: FxHashMap<u32, usize> =
            qubits.iter().enumerate().map(|(i, &q)| (q, i)).collect();
        let linear = problem.linear().values().copied().collect();

        let mut neighbors = vec![Vec::new(); qubits.len()];
        for (&(a, b), &bias) in problem.quadratic() {
            let (i, j) = (index[&a], index[&b]);
            neighbors[i].push((j, bias));
            neighbors[j].push((i, bias));
        }

        Self {
            qubits,
            linear,
            neighbors,
        }
    }

    /// Energy change from flipping spin `i`.
    fn flip_delta(&self, spins: &[i8], i: usize) -> f64 {
        let field = self.neighbors[i]
            .iter()
            .fold(self.linear[i], |acc, &(j, bias)| acc + bias * f64::from(spins[j]));
        -2.0 * f64::from(spins[i]) * field
    }
}

/// Draw `schedule.num_reads` samples of `problem`.
pub fn simulated_anneal<R: Rng>(
    problem: &HardwareProblem,
    schedule: &AnnealSchedule,
    rng: &mut R,
) -> AnnealResult<SampleSet> {
    let couplings = Couplings::new(problem);
    let n = couplings.qubits.len();
    let mut set = SampleSet::new(couplings.qubits.clone(), Vartype::Spin);

    for _ in 0..schedule.num_reads {
        let mut spins: Vec<i8> = (0..n)
            .map(|_| if rng.gen_bool(0.5) { 1 } else { -1 })
            .collect();

        for sweep in 0..schedule.num_sweeps {
            let beta = schedule.beta(sweep);
            for i in 0..n {
                let delta = couplings.flip_delta(&spins, i);
                if delta <= 0.0 || rng.gen_bool((-beta * delta).exp()) {
                    spins[i] = -spins[i];
                }
            }
        }

        let energy = problem.energy(&spins)?;
        set.push(spins, energy)?;
    }

    Ok(set)
}
