//! Clique strategy for four-group topologies.

use crate::embedding::Chain;
use crate::error::{EmbedError, EmbedResult};
use crate::graph::HardwareGraph;
use crate::topology::TopologyKind;

use super::native::native_clique;
use super::CliqueStrategy;

/// Native clique construction directly over the tile grid.
///
/// The lattice is the hardware graph itself: every lattice coordinate is
/// one qubit, so lifting a chain is a plain index conversion.
#[derive(Debug, Clone, Copy, Default)]
pub struct FourGroupClique;

impl CliqueStrategy for FourGroupClique {
    fn name(&self) -> &'static str {
        "four_group"
    }

    fn canonical_chains(&self, graph: &HardwareGraph) -> EmbedResult<Vec<Chain>> {
        let TopologyKind::FourGroup(shape) = graph.kind() else {
            return Err(EmbedError::UnsupportedTopology(format!(
                "four-group strategy cannot embed into a {} graph",
                graph.kind().family()
            )));
        };
        let shape = *shape;

        Ok(native_clique(
            shape,
            |c| shape.contains(c) && graph.has_node(shape.linear(c)),
            |coords| Some(Chain::new(coords.iter().map(|&c| shape.linear(c)))),
            graph,
        ))
    }
}
