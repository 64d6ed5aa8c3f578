//! Simulated annealing devices.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use arvak_anneal::{AnnealResult, BiasRange, QpuProperties};
use arvak_embed::{HardwareGraph, four_group_graph, six_tile_graph};

/// Qubit bias range of a simulated device.
pub const DEFAULT_H_RANGE: BiasRange = BiasRange {
    min: -2.0,
    max: 2.0,
};
/// Coupler bias range of a simulated device.
pub const DEFAULT_J_RANGE: BiasRange = BiasRange {
    min: -1.0,
    max: 1.0,
};
/// Extended coupler range, reachable by chain couplers.
pub const DEFAULT_EXTENDED_J_RANGE: BiasRange = BiasRange {
    min: -2.0,
    max: 1.0,
};
/// Limit on the sum of couplings at one qubit.
pub const DEFAULT_PER_QUBIT_COUPLING_RANGE: BiasRange = BiasRange {
    min: -9.0,
    max: 6.0,
};

/// One simulated device: a name, its declared properties, the working
/// graph they describe and whether it currently accepts work.
#[derive(Debug)]
pub struct SimDevice {
    name: String,
    properties: Arc<QpuProperties>,
    graph: Arc<HardwareGraph>,
    online: AtomicBool,
}

impl SimDevice {
    /// A device on `graph` with the default ranges.
    pub fn from_graph(name: impl Into<String>, graph: &HardwareGraph) -> Self {
        let properties = QpuProperties::from_graph(graph, DEFAULT_H_RANGE, DEFAULT_J_RANGE)
            .with_extended_j_range(DEFAULT_EXTENDED_J_RANGE)
            .with_per_qubit_coupling_range(DEFAULT_PER_QUBIT_COUPLING_RANGE);
        Self::assemble(name.into(), properties, graph.clone())
    }

    /// A device declaring `properties`; fails if they name no topology.
    pub fn with_properties(name: impl Into<String>, properties: QpuProperties) -> AnnealResult<Self> {
        let graph = properties.to_graph()?;
        Ok(Self::assemble(name.into(), properties, graph))
    }

    fn assemble(name: String, properties: QpuProperties, graph: HardwareGraph) -> Self {
        Self {
            name,
            properties: Arc::new(properties),
            graph: Arc::new(graph),
            online: AtomicBool::new(true),
        }
    }

    /// A complete four-group device, minus `dead` qubits.
    pub fn four_group(
        name: impl Into<String>,
        rows: u32,
        cols: u32,
        tile: u32,
        dead: impl IntoIterator<Item = u32>,
    ) -> AnnealResult<Self> {
        let graph = four_group_graph(rows, cols, tile)?.with_removed(dead)?;
        Ok(Self::from_graph(name, &graph))
    }

    /// A complete six-tile device, minus `dead` qubits.
    pub fn six_tile(
        name: impl Into<String>,
        size: u32,
        dead: impl IntoIterator<Item = u32>,
    ) -> AnnealResult<Self> {
        let graph = six_tile_graph(size)?.with_removed(dead)?;
        Ok(Self::from_graph(name, &graph))
    }

    /// Start the device offline.
    pub fn offline(self) -> Self {
        self.set_online(false);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn properties(&self) -> Arc<QpuProperties> {
        Arc::clone(&self.properties)
    }

    /// Working qubits and couplers, built once from the properties.
    pub fn graph(&self) -> Arc<HardwareGraph> {
        Arc::clone(&self.graph)
    }

    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }

    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }
}
