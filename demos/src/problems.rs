//! Problem generators and sample diagnostics for the demos.

use arvak_anneal::{AnnealResult, BinaryQuadraticModel, SampleOutcome, Vartype};
use rand::Rng;
use rustc_hash::FxHashMap;

/// Complete ferromagnet: every pair of `0..n` coupled at `-1`.
pub fn ferromagnet(n: usize) -> AnnealResult<BinaryQuadraticModel> {
    let mut bqm = BinaryQuadraticModel::with_variables(n, Vartype::Spin);
    for u in 0..n {
        for v in u + 1..n {
            bqm.add_quadratic(u, v, -1.0)?;
        }
    }
    Ok(bqm)
}

/// Complete spin glass on `0..n` with `±1` couplings and fields in
/// `[-0.5, 0.5]`.
pub fn spin_glass<R: Rng>(n: usize, rng: &mut R) -> AnnealResult<BinaryQuadraticModel> {
    let mut bqm = BinaryQuadraticModel::with_variables(n, Vartype::Spin);
    for u in 0..n {
        bqm.add_linear(u, rng.gen_range(-0.5..=0.5));
        for v in u + 1..n {
            let bias = if rng.gen_bool(0.5) { 1.0 } else { -1.0 };
            bqm.add_quadratic(u, v, bias)?;
        }
    }
    Ok(bqm)
}

/// Fraction of chains, over all reads, whose qubits disagree.
#[allow(clippy::cast_precision_loss)]
pub fn chain_break_fraction(outcome: &SampleOutcome) -> f64 {
    let position: FxHashMap<u32, usize> = outcome
        .sampleset
        .variables
        .iter()
        .enumerate()
        .map(|(i, &q)| (q, i))
        .collect();

    let mut broken = 0u64;
    let mut total = 0u64;
    for (sample, _, occurrences) in outcome.sampleset.iter() {
        for (_, chain) in outcome.embedding.iter() {
            let mut spins = chain.iter().filter_map(|q| position.get(q).map(|&i| sample[i]));
            let first = spins.next();
            if spins.any(|s| Some(s) != first) {
                broken += u64::from(occurrences);
            }
            total += u64::from(occurrences);
        }
    }

    if total == 0 {
        0.0
    } else {
        broken as f64 / total as f64
    }
}
