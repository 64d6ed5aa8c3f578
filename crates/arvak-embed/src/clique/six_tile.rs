//! Clique strategy for six-tile topologies.

use rustc_hash::FxHashSet;

use crate::embedding::Chain;
use crate::error::{EmbedError, EmbedResult};
use crate::fragment::{FragmentCoord, FragmentMapper};
use crate::graph::HardwareGraph;
use crate::topology::{FourGroupShape, TopologyKind};

use super::native::native_clique;
use super::CliqueStrategy;

/// Native clique construction over the fragment lattice.
///
/// Live qubits are cut into fragments, the four-group construction runs
/// on the `6m × 6m` lattice those fragments populate, and each resulting
/// fragment chain is stitched back into six-tile qubits.
#[derive(Debug, Clone, Copy, Default)]
pub struct SixTileClique;

impl CliqueStrategy for SixTileClique {
    fn name(&self) -> &'static str {
        "six_tile"
    }

    fn canonical_chains(&self, graph: &HardwareGraph) -> EmbedResult<Vec<Chain>> {
        let TopologyKind::SixTile(shape) = graph.kind() else {
            return Err(EmbedError::UnsupportedTopology(format!(
                "six-tile strategy cannot embed into a {} graph",
                graph.kind().family()
            )));
        };
        let shape = *shape;
        let mapper = FragmentMapper::new(shape.offsets);

        let coords: Vec<_> = graph
            .nodes()
            .iter()
            .map(|&q| shape.coord(q))
            .filter(|&c| shape.contains(c))
            .collect();
        let fragments: FxHashSet<FragmentCoord> = mapper.fragment(&coords).into_iter().collect();

        let lattice = FourGroupShape::new(shape.lattice_size(), shape.lattice_size(), 2)?;

        Ok(native_clique(
            lattice,
            |f| fragments.contains(&f),
            |chain| {
                let qubits: Vec<u32> = mapper
                    .unfragment(chain)
                    .into_iter()
                    .filter(|&c| shape.contains(c))
                    .map(|c| shape.linear(c))
                    .collect();
                qubits
                    .iter()
                    .all(|&q| graph.has_node(q))
                    .then(|| Chain::new(qubits))
            },
            graph,
        ))
    }
}
