//! Logical binary quadratic models.

use std::collections::BTreeMap;

use arvak_embed::Variable;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::{AnnealError, AnnealResult};

/// Value convention of a model's variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Vartype {
    /// Variables take values in `{-1, +1}`.
    Spin,
    /// Variables take values in `{0, 1}`.
    Binary,
}

/// A quadratic model over labelled variables.
///
/// Variables keep insertion order; that order decides which canonical
/// chain each variable is assigned on the hardware. Interactions are
/// stored by variable index with the lower index first.
#[derive(Debug, Clone, PartialEq)]
pub struct BinaryQuadraticModel {
    vartype: Vartype,
    variables: Vec<Variable>,
    index: FxHashMap<Variable, usize>,
    linear: Vec<f64>,
    quadratic: BTreeMap<(usize, usize), f64>,
    offset: f64,
}

impl BinaryQuadraticModel {
    /// Create a model with no variables.
    pub fn empty(vartype: Vartype) -> Self {
        Self {
            vartype,
            variables: Vec::new(),
            index: FxHashMap::default(),
            linear: Vec::new(),
            quadratic: BTreeMap::new(),
            offset: 0.0,
        }
    }

    /// Create a model with variables `0..n` and no biases.
    pub fn with_variables(n: usize, vartype: Vartype) -> Self {
        let mut bqm = Self::empty(vartype);
        for i in 0..n {
            bqm.add_variable(Variable::from(i));
        }
        bqm
    }

    /// Build a spin model from linear and quadratic biases.
    pub fn from_ising<V: Into<Variable>>(
        h: impl IntoIterator<Item = (V, f64)>,
        j: impl IntoIterator<Item = ((V, V), f64)>,
    ) -> AnnealResult<Self> {
        let mut bqm = Self::empty(Vartype::Spin);
        for (v, bias) in h {
            bqm.add_linear(v, bias);
        }
        for ((u, v), bias) in j {
            bqm.add_quadratic(u, v, bias)?;
        }
        Ok(bqm)
    }

    pub fn vartype(&self) -> Vartype {
        self.vartype
    }

    /// Variables in insertion order.
    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    pub fn num_interactions(&self) -> usize {
        self.quadratic.len()
    }

    pub fn offset(&self) -> f64 {
        self.offset
    }

    pub fn set_offset(&mut self, offset: f64) {
        self.offset = offset;
    }

    /// Add a variable if absent; returns its index.
    pub fn add_variable(&mut self, v: impl Into<Variable>) -> usize {
        let v = v.into();
        if let Some(&i) = self.index.get(&v) {
            return i;
        }
        let i = self.variables.len();
        self.index.insert(v.clone(), i);
        self.variables.push(v);
        self.linear.push(0.0);
        i
    }

    /// Add `bias` to the linear term of `v`.
    pub fn add_linear(&mut self, v: impl Into<Variable>, bias: f64) {
        let i = self.add_variable(v);
        self.linear[i] += bias;
    }

    /// Add `bias` to the interaction between `u` and `v`.
    pub fn add_quadratic(
        &mut self,
        u: impl Into<Variable>,
        v: impl Into<Variable>,
        bias: f64,
    ) -> AnnealResult<()> {
        let (u, v) = (u.into(), v.into());
        if u == v {
            return Err(AnnealError::InvalidProblem(format!(
                "interaction of {u} with itself"
            )));
        }
        let a = self.add_variable(u);
        let b = self.add_variable(v);
        *self.quadratic.entry((a.min(b), a.max(b))).or_insert(0.0) += bias;
        Ok(())
    }

    /// Linear bias of `v` (zero when absent).
    pub fn linear(&self, v: &Variable) -> f64 {
        self.index.get(v).map_or(0.0, |&i| self.linear[i])
    }

    /// Interaction between `u` and `v` (zero when absent).
    pub fn quadratic(&self, u: &Variable, v: &Variable) -> f64 {
        match (self.index.get(u), self.index.get(v)) {
            (Some(&a), Some(&b)) => self
                .quadratic
                .get(&(a.min(b), a.max(b)))
                .copied()
                .unwrap_or(0.0),
            _ => 0.0,
        }
    }

    /// `(variable, bias)` pairs in variable order.
    pub fn iter_linear(&self) -> impl Iterator<Item = (&Variable, f64)> {
        self.variables.iter().zip(self.linear.iter().copied())
    }

    /// `(u, v, bias)` triples ordered by variable index.
    pub fn iter_quadratic(&self) -> impl Iterator<Item = (&Variable, &Variable, f64)> {
        self.quadratic
            .iter()
            .map(|(&(a, b), &bias)| (&self.variables[a], &self.variables[b], bias))
    }

    /// Largest absolute linear or quadratic bias, or 0 for a biasless model.
    pub fn max_abs_bias(&self) -> f64 {
        self.linear
            .iter()
            .chain(self.quadratic.values())
            .fold(0.0_f64, |acc, b| acc.max(b.abs()))
    }

    /// Equivalent model in the spin convention.
    ///
    /// Uses `x = (s + 1) / 2`; spin models are returned unchanged.
    pub fn to_spin(&self) -> Self {
        if self.vartype == Vartype::Spin {
            return self.clone();
        }

        let mut spin = self.clone();
        spin.vartype = Vartype::Spin;

        for (i, &h) in self.linear.iter().enumerate() {
            spin.linear[i] = h / 2.0;
            spin.offset += h / 2.0;
        }
        for (&(a, b), &j) in &self.quadratic {
            spin.quadratic.insert((a, b), j / 4.0);
            spin.linear[a] += j / 4.0;
            spin.linear[b] += j / 4.0;
            spin.offset += j / 4.0;
        }
        spin
    }

    /// Energy of `sample`, given in variable order.
    pub fn energy(&self, sample: &[i8]) -> AnnealResult<f64> {
        if sample.len() != self.variables.len() {
            return Err(AnnealError::InvalidProblem(format!(
                "sample has {} values for {} variables",
                sample.len(),
                self.variables.len()
            )));
        }

        let linear: f64 = self
            .linear
            .iter()
            .zip(sample)
            .map(|(h, &s)| h * f64::from(s))
            .sum();
        let quadratic: f64 = self
            .quadratic
            .iter()
            .map(|(&(a, b), j)| j * f64::from(sample[a]) * f64::from(sample[b]))
            .sum();

        Ok(self.offset + linear + quadratic)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quadratic_accumulates() {
        let mut bqm = BinaryQuadraticModel::empty(Vartype::Spin);
        bqm.add_quadratic("a", "b", -1.0).unwrap();
        bqm.add_quadratic("b", "a", -0.5).unwrap();
        assert_eq!(bqm.num_interactions(), 1);
        assert_eq!(
            bqm.quadratic(&Variable::from("a"), &Variable::from("b")),
            -1.5
        );
        assert_eq!(bqm.num_variables(), 2);
    }

    #[test]
    fn test_self_interaction_rejected() {
        let mut bqm = BinaryQuadraticModel::empty(Vartype::Spin);
        assert!(matches!(
            bqm.add_quadratic(1i64, 1i64, 1.0),
            Err(AnnealError::InvalidProblem(_))
        ));
    }

    #[test]
    fn test_from_ising_keeps_order() {
        let bqm = BinaryQuadraticModel::from_ising(
            [("x", 1.0), ("y", -2.0)],
            [(("y", "z"), 0.5)],
        )
        .unwrap();
        let labels: Vec<String> = bqm.variables().iter().map(ToString::to_string).collect();
        assert_eq!(labels, vec!["'x'", "'y'", "'z'"]);
        assert_eq!(bqm.max_abs_bias(), 2.0);
    }

    #[test]
    fn test_to_spin_preserves_energies() {
        let mut bqm = BinaryQuadraticModel::empty(Vartype::Binary);
        bqm.add_linear(0i64, 1.0);
        bqm.add_linear(1i64, -3.0);
        bqm.add_quadratic(0i64, 1i64, 2.0).unwrap();
        bqm.set_offset(0.5);

        let spin = bqm.to_spin();
        assert_eq!(spin.vartype(), Vartype::Spin);

        for (x0, x1) in [(0i8, 0i8), (0, 1), (1, 0), (1, 1)] {
            let binary = bqm.energy(&[x0, x1]).unwrap();
            let spins = spin.energy(&[2 * x0 - 1, 2 * x1 - 1]).unwrap();
            assert!((binary - spins).abs() < 1e-12);
        }
    }

    #[test]
    fn test_energy_length_checked() {
        let bqm = BinaryQuadraticModel::with_variables(3, Vartype::Spin);
        assert!(bqm.energy(&[1, -1]).is_err());
        assert_eq!(bqm.energy(&[1, -1, 1]).unwrap(), 0.0);
    }
}
