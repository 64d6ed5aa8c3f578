//! Chain-aware embedding of logical problems onto hardware biases.
//!
//! A logical model is rewritten onto physical qubits:
//!
//! ```text
//!   h_v            ──→ h_v / |chain(v)| on every qubit of chain(v)
//!   J_uv           ──→ one coupler between chain(u) and chain(v)
//!   (chain edges)  ──→ -chain_strength
//! ```
//!
//! Every resulting bias is then checked against the ranges the device
//! declares. Out-of-range values are an error; they are only rescaled
//! when the caller opts into auto-scaling, which divides every bias by
//! the same factor so chain couplers keep their relative strength.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use arvak_embed::{EmbedError, Embedding, HardwareGraph, Variable};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::error::{AnnealError, AnnealResult};
use crate::problem::BinaryQuadraticModel;
use crate::properties::{BiasRange, QpuProperties};

/// Default multiple of the largest logical bias used as chain strength.
pub const DEFAULT_CHAIN_STRENGTH_PREFACTOR: f64 = 1.5;

/// Which declared range a value is checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RangeBound {
    /// `h_range`, for qubit biases.
    Linear,
    /// `j_range`, for couplers carrying logical interactions.
    Quadratic,
    /// `extended_j_range`, for chain couplers.
    ExtendedQuadratic,
    /// `per_qubit_coupling_range`, for the coupling sum at one qubit.
    PerQubitCoupling,
}

impl fmt::Display for RangeBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RangeBound::Linear => "linear bias",
            RangeBound::Quadratic => "quadratic bias",
            RangeBound::ExtendedQuadratic => "chain coupler bias",
            RangeBound::PerQubitCoupling => "per-qubit coupling sum",
        };
        f.write_str(name)
    }
}

/// Numeric limits of one device.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RangeSpec {
    pub linear: BiasRange,
    pub quadratic: BiasRange,
    pub extended_quadratic: BiasRange,
    pub per_qubit_coupling: BiasRange,
}

impl RangeSpec {
    /// Read ranges from declared properties.
    ///
    /// The extended range falls back to `j_range`; the per-qubit limit
    /// falls back to unbounded.
    pub fn from_properties(properties: &QpuProperties) -> AnnealResult<Self> {
        let spec = Self {
            linear: properties.h_range,
            quadratic: properties.j_range,
            extended_quadratic: properties.extended_j_range.unwrap_or(properties.j_range),
            per_qubit_coupling: properties
                .per_qubit_coupling_range
                .unwrap_or_else(BiasRange::unbounded),
        };
        for bound in [
            RangeBound::Linear,
            RangeBound::Quadratic,
            RangeBound::ExtendedQuadratic,
            RangeBound::PerQubitCoupling,
        ] {
            spec.bound(bound).validate()?;
        }
        Ok(spec)
    }

    /// The range for `bound`.
    pub fn bound(&self, bound: RangeBound) -> BiasRange {
        match bound {
            RangeBound::Linear => self.linear,
            RangeBound::Quadratic => self.quadratic,
            RangeBound::ExtendedQuadratic => self.extended_quadratic,
            RangeBound::PerQubitCoupling => self.per_qubit_coupling,
        }
    }
}

/// A problem expressed over physical qubits, in the spin convention.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HardwareProblem {
    linear: BTreeMap<u32, f64>,
    quadratic: BTreeMap<(u32, u32), f64>,
    chain_couplers: BTreeSet<(u32, u32)>,
    offset: f64,
}

impl HardwareProblem {
    /// Qubit biases; every used qubit has an entry.
    pub fn linear(&self) -> &BTreeMap<u32, f64> {
        &self.linear
    }

    /// Coupler biases keyed `(low, high)`.
    pub fn quadratic(&self) -> &BTreeMap<(u32, u32), f64> {
        &self.quadratic
    }

    pub fn is_chain_coupler(&self, a: u32, b: u32) -> bool {
        self.chain_couplers.contains(&(a.min(b), a.max(b)))
    }

    pub fn num_chain_couplers(&self) -> usize {
        self.chain_couplers.len()
    }

    pub fn offset(&self) -> f64 {
        self.offset
    }

    /// Used qubits, ascending.
    pub fn qubits(&self) -> impl Iterator<Item = u32> + '_ {
        self.linear.keys().copied()
    }

    pub fn num_qubits(&self) -> usize {
        self.linear.len()
    }

    pub fn num_couplers(&self) -> usize {
        self.quadratic.len()
    }

    pub fn is_empty(&self) -> bool {
        self.linear.is_empty() && self.quadratic.is_empty()
    }

    /// Signed sum of coupler biases incident to each qubit.
    pub fn coupling_sums(&self) -> BTreeMap<u32, f64> {
        let mut sums = BTreeMap::new();
        for (&(a, b), &bias) in &self.quadratic {
            *sums.entry(a).or_insert(0.0) += bias;
            *sums.entry(b).or_insert(0.0) += bias;
        }
        sums
    }

    /// Energy of a spin assignment given in [`Self::qubits`] order.
    pub fn energy(&self, sample: &[i8]) -> AnnealResult<f64> {
        if sample.len() != self.linear.len() {
            return Err(AnnealError::InvalidProblem(format!(
                "sample has {} values for {} qubits",
                sample.len(),
                self.linear.len()
            )));
        }
        let spin: FxHashMap<u32, f64> = self
            .linear
            .keys()
            .zip(sample)
            .map(|(&q, &s)| (q, f64::from(s)))
            .collect();

        let linear: f64 = self.linear.iter().map(|(q, h)| h * spin[q]).sum();
        let quadratic: f64 = self
            .quadratic
            .iter()
            .map(|((a, b), j)| j * spin[a] * spin[b])
            .sum();
        Ok(self.offset + linear + quadratic)
    }

    fn scale(&mut self, factor: f64) {
        for bias in self.linear.values_mut().chain(self.quadratic.values_mut()) {
            *bias /= factor;
        }
        self.offset /= factor;
    }
}

/// A calibrated problem ready for submission.
#[derive(Debug, Clone, PartialEq)]
pub struct CalibratedProblem {
    pub problem: HardwareProblem,
    /// Chain strength before any rescaling.
    pub chain_strength: f64,
    /// Factor every bias was divided by (1.0 when not rescaled).
    pub scale: f64,
}

/// Rewrites logical problems onto hardware within declared ranges.
#[derive(Debug, Clone)]
pub struct RangeCalibrator {
    ranges: RangeSpec,
    prefactor: f64,
}

impl RangeCalibrator {
    pub fn new(ranges: RangeSpec) -> Self {
        Self {
            ranges,
            prefactor: DEFAULT_CHAIN_STRENGTH_PREFACTOR,
        }
    }

    /// Set the multiple of the largest bias used as default chain strength.
    pub fn with_prefactor(mut self, prefactor: f64) -> Self {
        self.prefactor = prefactor;
        self
    }

    pub fn ranges(&self) -> &RangeSpec {
        &self.ranges
    }

    /// Chain strength derived from the problem's biases.
    ///
    /// `prefactor * max|bias|` (1.0 for a biasless problem), capped so the
    /// chain coupler `-strength` stays inside the extended range.
    pub fn default_chain_strength(&self, bqm: &BinaryQuadraticModel) -> f64 {
        let max_abs = bqm.to_spin().max_abs_bias();
        let strength = if max_abs > 0.0 {
            self.prefactor * max_abs
        } else {
            1.0
        };

        let cap = -self.ranges.extended_quadratic.min;
        if cap > 0.0 { strength.min(cap) } else { strength }
    }

    /// Place `bqm` onto the chains of `embedding` without any checks on
    /// the resulting values.
    #[allow(clippy::cast_precision_loss)]
    pub fn embed(
        &self,
        bqm: &BinaryQuadraticModel,
        embedding: &Embedding,
        graph: &HardwareGraph,
        chain_strength: f64,
    ) -> AnnealResult<HardwareProblem> {
        if bqm.num_variables() > embedding.len() {
            return Err(AnnealError::Capacity {
                requested: bqm.num_variables(),
                available: embedding.len(),
            });
        }

        let spin = bqm.to_spin();
        let mut chains = Vec::with_capacity(spin.num_variables());
        let mut slot: FxHashMap<&Variable, usize> = FxHashMap::default();
        let mut owner: FxHashMap<u32, usize> = FxHashMap::default();
        for (i, v) in spin.variables().iter().enumerate() {
            let chain = embedding
                .get(v)
                .ok_or_else(|| EmbedError::MissingChain(v.clone()))?;
            for &q in chain.iter() {
                owner.insert(q, i);
            }
            slot.insert(v, i);
            chains.push(chain);
        }

        let mut problem = HardwareProblem {
            offset: spin.offset(),
            ..HardwareProblem::default()
        };

        for ((_, h), chain) in spin.iter_linear().zip(&chains) {
            let share = h / chain.len() as f64;
            for &q in chain.iter() {
                *problem.linear.entry(q).or_insert(0.0) += share;
            }
        }

        let mut load: FxHashMap<u32, f64> = FxHashMap::default();
        for (u, v, bias) in spin.iter_quadratic() {
            let (iu, iv) = (slot[u], slot[v]);
            let cost = |(a, b): (u32, u32)| {
                load.get(&a).copied().unwrap_or(0.0) + load.get(&b).copied().unwrap_or(0.0)
            };
            let owner = &owner;
            let edge = chains[iu]
                .iter()
                .flat_map(move |&p| {
                    graph
                        .neighbors(p)
                        .filter(move |q| owner.get(q) == Some(&iv))
                        .map(move |q| (p.min(q), p.max(q)))
                })
                .min_by(|&x, &y| cost(x).total_cmp(&cost(y)).then(x.cmp(&y)))
                .ok_or_else(|| EmbedError::DisconnectedChains(u.clone(), v.clone()))?;

            *problem.quadratic.entry(edge).or_insert(0.0) += bias;
            *load.entry(edge.0).or_insert(0.0) += bias.abs();
            *load.entry(edge.1).or_insert(0.0) += bias.abs();
        }

        for &(a, b) in graph.edges() {
            if let (Some(x), Some(y)) = (owner.get(&a), owner.get(&b)) {
                if x == y {
                    problem.quadratic.insert((a, b), -chain_strength);
                    problem.chain_couplers.insert((a, b));
                }
            }
        }

        Ok(problem)
    }

    /// Check every bias and coupling sum of `problem`.
    pub fn validate(&self, problem: &HardwareProblem) -> AnnealResult<()> {
        let violation = |bound: RangeBound, value: f64, location: String| {
            AnnealError::RangeViolation {
                bound,
                value,
                range: self.ranges.bound(bound),
                location,
            }
        };

        for (&q, &h) in &problem.linear {
            if !self.ranges.linear.contains(h) {
                return Err(violation(RangeBound::Linear, h, format!("qubit {q}")));
            }
        }
        for (&(a, b), &j) in &problem.quadratic {
            let bound = self.coupler_bound(problem, a, b);
            if !self.ranges.bound(bound).contains(j) {
                return Err(violation(bound, j, format!("coupler ({a}, {b})")));
            }
        }
        for (q, sum) in problem.coupling_sums() {
            if !self.ranges.per_qubit_coupling.contains(sum) {
                return Err(violation(
                    RangeBound::PerQubitCoupling,
                    sum,
                    format!("qubit {q}"),
                ));
            }
        }
        Ok(())
    }

    /// Smallest factor that brings every value of `problem` into range.
    ///
    /// Returns 1.0 when nothing overshoots. Infinite when a nonzero value
    /// meets a zero bound, which no rescaling can fix.
    pub fn auto_scale_factor(&self, problem: &HardwareProblem) -> f64 {
        let linear = problem
            .linear
            .values()
            .map(|&h| self.ranges.linear.overshoot(h));
        let quadratic = problem.quadratic.iter().map(|(&(a, b), &j)| {
            self.ranges
                .bound(self.coupler_bound(problem, a, b))
                .overshoot(j)
        });
        let sums = problem
            .coupling_sums()
            .into_values()
            .map(|s| self.ranges.per_qubit_coupling.overshoot(s));

        linear.chain(quadratic).chain(sums).fold(1.0, f64::max)
    }

    /// Embed, optionally rescale, and validate a logical problem.
    ///
    /// Fails with `Capacity` when `bqm` has more variables than
    /// `embedding`, and with `RangeViolation` when a value is out of range
    /// and `auto_scale` is off.
    #[instrument(skip_all, fields(variables = bqm.num_variables(), auto_scale = auto_scale))]
    pub fn scale_and_validate(
        &self,
        bqm: &BinaryQuadraticModel,
        embedding: &Embedding,
        graph: &HardwareGraph,
        chain_strength: Option<f64>,
        auto_scale: bool,
    ) -> AnnealResult<CalibratedProblem> {
        let chain_strength = match chain_strength {
            Some(strength) if !strength.is_finite() => {
                return Err(AnnealError::Configuration(format!(
                    "chain strength {strength} is not finite"
                )));
            }
            Some(strength) => strength,
            None => self.default_chain_strength(bqm),
        };

        let mut problem = self.embed(bqm, embedding, graph, chain_strength)?;

        let mut scale = 1.0;
        if auto_scale {
            let factor = self.auto_scale_factor(&problem);
            if factor.is_finite() && factor > 1.0 {
                problem.scale(factor);
                scale = factor;
            }
        }

        self.validate(&problem)?;

        debug!(
            chain_strength,
            scale,
            qubits = problem.num_qubits(),
            couplers = problem.num_couplers(),
            "Calibrated problem"
        );

        Ok(CalibratedProblem {
            problem,
            chain_strength,
            scale,
        })
    }

    fn coupler_bound(&self, problem: &HardwareProblem, a: u32, b: u32) -> RangeBound {
        if problem.is_chain_coupler(a, b) {
            RangeBound::ExtendedQuadratic
        } else {
            RangeBound::Quadratic
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::Vartype;
    use arvak_embed::{four_group_graph, CliqueEmbedder};

    fn chimera_ranges() -> RangeSpec {
        RangeSpec {
            linear: BiasRange::new(-2.0, 2.0).unwrap(),
            quadratic: BiasRange::new(-1.0, 1.0).unwrap(),
            extended_quadratic: BiasRange::new(-2.0, 1.0).unwrap(),
            per_qubit_coupling: BiasRange::new(-9.0, 6.0).unwrap(),
        }
    }

    fn target() -> (HardwareGraph, CliqueEmbedder) {
        let graph = four_group_graph(4, 4, 4).unwrap();
        let embedder = CliqueEmbedder::new(&graph).unwrap();
        (graph, embedder)
    }

    #[test]
    fn test_ranges_from_properties_defaults() {
        let graph = four_group_graph(1, 1, 4).unwrap();
        let j = BiasRange::new(-1.0, 1.0).unwrap();
        let props = QpuProperties::from_graph(&graph, BiasRange::new(-2.0, 2.0).unwrap(), j);
        let spec = RangeSpec::from_properties(&props).unwrap();
        assert_eq!(spec.extended_quadratic, j);
        assert_eq!(spec.per_qubit_coupling, BiasRange::unbounded());
    }

    #[test]
    fn test_ranges_from_properties_rejects_bad_range() {
        let graph = four_group_graph(1, 1, 4).unwrap();
        let j = BiasRange::new(-1.0, 1.0).unwrap();
        let mut props = QpuProperties::from_graph(&graph, j, j);
        props.h_range = BiasRange { min: 0.5, max: 1.0 };
        assert!(matches!(
            RangeSpec::from_properties(&props),
            Err(AnnealError::Configuration(_))
        ));
    }

    #[test]
    fn test_linear_bias_split_over_chain() {
        let (graph, embedder) = target();
        let embedding = embedder.clique(1).unwrap();
        let mut bqm = BinaryQuadraticModel::empty(Vartype::Spin);
        bqm.add_linear(0i64, 1.0);

        let problem = RangeCalibrator::new(chimera_ranges())
            .embed(&bqm, &embedding, &graph, 1.5)
            .unwrap();

        // Chain [0, 4, 12, 20, 28] is a path: four chain couplers.
        assert_eq!(problem.num_qubits(), 5);
        assert!(problem.linear().values().all(|&h| (h - 0.2).abs() < 1e-12));
        assert_eq!(problem.num_chain_couplers(), 4);
        assert!(problem.quadratic().values().all(|&j| j == -1.5));
    }

    #[test]
    fn test_interaction_on_one_coupler() {
        let (graph, embedder) = target();
        let embedding = embedder.clique(2).unwrap();
        let bqm = BinaryQuadraticModel::from_ising::<i64>([], [((0, 1), -0.5)]).unwrap();

        let problem = RangeCalibrator::new(chimera_ranges())
            .embed(&bqm, &embedding, &graph, 1.0)
            .unwrap();

        let logical: Vec<_> = problem
            .quadratic()
            .iter()
            .filter(|&(&(a, b), _)| !problem.is_chain_coupler(a, b))
            .collect();
        assert_eq!(logical.len(), 1);
        let (&(a, b), &j) = logical[0];
        assert_eq!(j, -0.5);
        assert!(graph.has_edge(a, b));
    }

    #[test]
    fn test_default_chain_strength() {
        let calibrator = RangeCalibrator::new(chimera_ranges());

        let bqm = BinaryQuadraticModel::from_ising::<i64>([], [((0, 1), -1.0)]).unwrap();
        assert_eq!(calibrator.default_chain_strength(&bqm), 1.5);

        // 1.5 * 2 is capped by the extended range minimum.
        let bqm = BinaryQuadraticModel::from_ising::<i64>([], [((0, 1), -2.0)]).unwrap();
        assert_eq!(calibrator.default_chain_strength(&bqm), 2.0);

        let bqm = BinaryQuadraticModel::with_variables(3, Vartype::Spin);
        assert_eq!(calibrator.default_chain_strength(&bqm), 1.0);
    }

    #[test]
    fn test_quadratic_violation_without_auto_scale() {
        let (graph, embedder) = target();
        let embedding = embedder.clique(2).unwrap();
        let bqm = BinaryQuadraticModel::from_ising::<i64>([], [((0, 1), -2.0)]).unwrap();
        let calibrator = RangeCalibrator::new(chimera_ranges());

        let err = calibrator
            .scale_and_validate(&bqm, &embedding, &graph, None, false)
            .unwrap_err();
        assert!(matches!(
            err,
            AnnealError::RangeViolation {
                bound: RangeBound::Quadratic,
                ..
            }
        ));

        let calibrated = calibrator
            .scale_and_validate(&bqm, &embedding, &graph, None, true)
            .unwrap();
        assert_eq!(calibrated.scale, 2.0);
        assert!(calibrator.validate(&calibrated.problem).is_ok());
    }

    #[test]
    fn test_per_qubit_violation() {
        let (graph, embedder) = target();
        let embedding = embedder.clique(2).unwrap();
        let bqm = BinaryQuadraticModel::from_ising::<i64>([], [((0, 1), -0.5)]).unwrap();
        let mut ranges = chimera_ranges();
        ranges.per_qubit_coupling = BiasRange::new(-3.0, 3.0).unwrap();

        // Middle chain qubits carry two chain couplers: -4 < -3.
        let err = RangeCalibrator::new(ranges)
            .scale_and_validate(&bqm, &embedding, &graph, Some(2.0), false)
            .unwrap_err();
        assert!(matches!(
            err,
            AnnealError::RangeViolation {
                bound: RangeBound::PerQubitCoupling,
                ..
            }
        ));
    }

    #[test]
    fn test_capacity_and_missing_chain() {
        let (graph, embedder) = target();
        let embedding = embedder.clique(2).unwrap();
        let calibrator = RangeCalibrator::new(chimera_ranges());

        let bqm = BinaryQuadraticModel::with_variables(3, Vartype::Spin);
        assert!(matches!(
            calibrator.embed(&bqm, &embedding, &graph, 1.0),
            Err(AnnealError::Capacity {
                requested: 3,
                available: 2
            })
        ));

        let mut bqm = BinaryQuadraticModel::empty(Vartype::Spin);
        bqm.add_linear("stranger", 1.0);
        assert!(matches!(
            calibrator.embed(&bqm, &embedding, &graph, 1.0),
            Err(AnnealError::Embed(EmbedError::MissingChain(_)))
        ));
    }

    #[test]
    fn test_binary_problem_converted_to_spin() {
        let (graph, embedder) = target();
        let embedding = embedder.clique(1).unwrap();
        let mut bqm = BinaryQuadraticModel::empty(Vartype::Binary);
        bqm.add_linear(0i64, 2.0);

        let problem = RangeCalibrator::new(chimera_ranges())
            .embed(&bqm, &embedding, &graph, 1.0)
            .unwrap();
        let total: f64 = problem.linear().values().sum();
        assert!((total - 1.0).abs() < 1e-12);
        assert_eq!(problem.offset(), 1.0);
    }

    #[test]
    fn test_hardware_energy() {
        let (graph, embedder) = target();
        let embedding = embedder.clique(1).unwrap();
        let bqm = BinaryQuadraticModel::with_variables(1, Vartype::Spin);
        let problem = RangeCalibrator::new(chimera_ranges())
            .embed(&bqm, &embedding, &graph, 1.0)
            .unwrap();

        // Aligned chain: four satisfied chain couplers.
        assert_eq!(problem.energy(&[1; 5]).unwrap(), -4.0);
        assert_eq!(problem.energy(&[-1; 5]).unwrap(), -4.0);
        assert!(problem.energy(&[1; 4]).is_err());
    }
}
