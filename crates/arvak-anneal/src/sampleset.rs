//! Samples returned by a device.

use serde::{Deserialize, Serialize};

use crate::error::{AnnealError, AnnealResult};
use crate::problem::Vartype;

/// Samples over hardware qubits, one row per distinct read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleSet {
    /// Qubits, in column order.
    pub variables: Vec<u32>,
    /// One row of values per sample.
    pub samples: Vec<Vec<i8>>,
    /// Energy of each sample.
    pub energies: Vec<f64>,
    /// How many reads produced each sample.
    pub num_occurrences: Vec<u32>,
    pub vartype: Vartype,
}

impl SampleSet {
    /// Create an empty sample set over `variables`.
    pub fn new(variables: Vec<u32>, vartype: Vartype) -> Self {
        Self {
            variables,
            samples: Vec::new(),
            energies: Vec::new(),
            num_occurrences: Vec::new(),
            vartype,
        }
    }

    /// Append one sample, merging it with an identical earlier row.
    pub fn push(&mut self, sample: Vec<i8>, energy: f64) -> AnnealResult<()> {
        if sample.len() != self.variables.len() {
            return Err(AnnealError::Backend(format!(
                "sample has {} values for {} qubits",
                sample.len(),
                self.variables.len()
            )));
        }
        if let Some(i) = self.samples.iter().position(|row| *row == sample) {
            self.num_occurrences[i] += 1;
        } else {
            self.samples.push(sample);
            self.energies.push(energy);
            self.num_occurrences.push(1);
        }
        Ok(())
    }

    /// Number of distinct samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Total reads across all samples.
    pub fn num_reads(&self) -> u32 {
        self.num_occurrences.iter().sum()
    }

    /// Sample with the lowest energy.
    pub fn lowest(&self) -> Option<(&[i8], f64)> {
        self.energies
            .iter()
            .enumerate()
            .min_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, &e)| (self.samples[i].as_slice(), e))
    }

    /// `(sample, energy, occurrences)` rows in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&[i8], f64, u32)> {
        self.samples
            .iter()
            .zip(&self.energies)
            .zip(&self.num_occurrences)
            .map(|((s, &e), &n)| (s.as_slice(), e, n))
    }
}
