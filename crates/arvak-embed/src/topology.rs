//! Topology families, structural coordinates and graph generators.
//!
//! Two processor families are supported:
//!
//! - **Four-group**: a `rows × cols` grid of tiles; each tile holds `tile`
//!   vertical and `tile` horizontal qubits forming a complete bipartite
//!   graph. Vertical qubits couple to the tile below, horizontal qubits to
//!   the tile on the right.
//! - **Six-tile**: size `m`; each qubit `(u, w, k, z)` is a wire spanning
//!   six tiles of a finer four-group lattice (see [`crate::fragment`]).
//!   Qubits couple along their track (external), to their odd partner on
//!   the same track pair, and to every qubit of the other orientation
//!   they cross (internal).
//!
//! Linear qubit indices follow the usual conventions of both families, so
//! graphs reported by a backend as plain integer lists can be interpreted
//! with the shape alone.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{EmbedError, EmbedResult};
use crate::fragment::{FragmentMapper, FragmentOffsets, TRACKS};
use crate::graph::HardwareGraph;

/// Topology family and shape of a hardware graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
#[non_exhaustive]
pub enum TopologyKind {
    /// Tile grid of four-qubit groups.
    #[serde(alias = "chimera")]
    FourGroup(FourGroupShape),
    /// Denser six-tile family.
    #[serde(alias = "pegasus")]
    SixTile(SixTileShape),
    /// Arbitrary graph with no known structure.
    Custom,
}

impl TopologyKind {
    /// Short family name, for logs.
    pub fn family(&self) -> &'static str {
        match self {
            TopologyKind::FourGroup(_) => "four_group",
            TopologyKind::SixTile(_) => "six_tile",
            TopologyKind::Custom => "custom",
        }
    }
}

/// Coordinate `(row, col, u, k)` in a four-group grid.
///
/// `u = 0` is a vertical qubit, `u = 1` horizontal; `k` indexes the qubit
/// within its half of the tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FourGroupCoord {
    pub row: u32,
    pub col: u32,
    pub u: u32,
    pub k: u32,
}

impl FourGroupCoord {
    pub const fn new(row: u32, col: u32, u: u32, k: u32) -> Self {
        Self { row, col, u, k }
    }

    pub fn as_tuple(self) -> (u32, u32, u32, u32) {
        (self.row, self.col, self.u, self.k)
    }
}

impl From<(u32, u32, u32, u32)> for FourGroupCoord {
    fn from((row, col, u, k): (u32, u32, u32, u32)) -> Self {
        Self::new(row, col, u, k)
    }
}

/// Shape of a four-group grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FourGroupShape {
    pub rows: u32,
    pub cols: u32,
    /// Qubits per tile side.
    pub tile: u32,
}

impl FourGroupShape {
    pub fn new(rows: u32, cols: u32, tile: u32) -> EmbedResult<Self> {
        if rows == 0 || cols == 0 || tile == 0 {
            return Err(EmbedError::InvalidShape(format!(
                "four-group shape ({rows}, {cols}, {tile}) must be positive"
            )));
        }
        Ok(Self { rows, cols, tile })
    }

    /// Square grid with four qubits per tile side.
    pub fn square(size: u32) -> EmbedResult<Self> {
        Self::new(size, size, 4)
    }

    pub fn num_qubits(&self) -> u32 {
        self.rows * self.cols * 2 * self.tile
    }

    pub fn contains(&self, c: FourGroupCoord) -> bool {
        c.row < self.rows && c.col < self.cols && c.u < 2 && c.k < self.tile
    }

    /// Linear index `k + tile*(u + 2*(col + cols*row))`.
    pub fn linear(&self, c: FourGroupCoord) -> u32 {
        c.k + self.tile * (c.u + 2 * (c.col + self.cols * c.row))
    }

    pub fn coord(&self, q: u32) -> FourGroupCoord {
        let k = q % self.tile;
        let rest = q / self.tile;
        let u = rest % 2;
        let rest = rest / 2;
        FourGroupCoord::new(rest / self.cols, rest % self.cols, u, k)
    }
}

/// Coordinate `(u, w, k, z)` in a six-tile graph.
///
/// `u` is the orientation, `w` the tile group perpendicular to the qubit,
/// `k` the track within the group and `z` the position along the track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SixTileCoord {
    pub u: u32,
    pub w: u32,
    pub k: u32,
    pub z: u32,
}

impl SixTileCoord {
    pub const fn new(u: u32, w: u32, k: u32, z: u32) -> Self {
        Self { u, w, k, z }
    }
}

/// Shape of a six-tile graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SixTileShape {
    pub size: u32,
    #[serde(default)]
    pub offsets: FragmentOffsets,
}

impl SixTileShape {
    pub fn new(size: u32, offsets: FragmentOffsets) -> EmbedResult<Self> {
        if size < 2 {
            return Err(EmbedError::InvalidShape(format!(
                "six-tile size {size} must be at least 2"
            )));
        }
        offsets.validate()?;
        Ok(Self { size, offsets })
    }

    pub fn num_qubits(&self) -> u32 {
        24 * self.size * (self.size - 1)
    }

    /// Side of the fragment lattice.
    pub fn lattice_size(&self) -> u32 {
        6 * self.size
    }

    pub fn contains(&self, c: SixTileCoord) -> bool {
        c.u < 2 && c.w < self.size && (c.k as usize) < TRACKS && c.z + 1 < self.size
    }

    /// Linear index `z + (m-1)*(k + 12*(w + m*u))`.
    pub fn linear(&self, c: SixTileCoord) -> u32 {
        let m = self.size;
        c.z + (m - 1) * (c.k + 12 * (c.w + m * c.u))
    }

    pub fn coord(&self, q: u32) -> SixTileCoord {
        let m = self.size;
        let z = q % (m - 1);
        let rest = q / (m - 1);
        let k = rest % 12;
        let rest = rest / 12;
        SixTileCoord::new(rest / m, rest % m, k, z)
    }
}

/// Generate a complete four-group graph.
pub fn four_group_graph(rows: u32, cols: u32, tile: u32) -> EmbedResult<HardwareGraph> {
    let shape = FourGroupShape::new(rows, cols, tile)?;
    let at = |row, col, u, k| shape.linear(FourGroupCoord::new(row, col, u, k));

    let mut edges = Vec::new();
    for row in 0..rows {
        for col in 0..cols {
            for k in 0..tile {
                for kk in 0..tile {
                    edges.push((at(row, col, 0, k), at(row, col, 1, kk)));
                }
                if row + 1 < rows {
                    edges.push((at(row, col, 0, k), at(row + 1, col, 0, k)));
                }
                if col + 1 < cols {
                    edges.push((at(row, col, 1, k), at(row, col + 1, 1, k)));
                }
            }
        }
    }

    debug!(rows, cols, tile, edges = edges.len(), "Generated four-group graph");
    HardwareGraph::new(TopologyKind::FourGroup(shape), 0..shape.num_qubits(), edges)
}

/// Generate a complete six-tile graph with the default offsets.
pub fn six_tile_graph(size: u32) -> EmbedResult<HardwareGraph> {
    six_tile_graph_with_offsets(size, FragmentOffsets::default())
}

/// Generate a complete six-tile graph with custom offsets.
pub fn six_tile_graph_with_offsets(
    size: u32,
    offsets: FragmentOffsets,
) -> EmbedResult<HardwareGraph> {
    let shape = SixTileShape::new(size, offsets)?;
    let mapper = FragmentMapper::new(offsets);
    let mut edges = Vec::new();

    for q in 0..shape.num_qubits() {
        let c = shape.coord(q);

        // External coupler along the track.
        if c.z + 2 < size {
            edges.push((q, shape.linear(SixTileCoord { z: c.z + 1, ..c })));
        }
        // Odd coupler between paired tracks.
        if c.k % 2 == 0 {
            edges.push((q, shape.linear(SixTileCoord { k: c.k + 1, ..c })));
        }
        // Internal couplers: every horizontal qubit crossing a fragment
        // tile of this vertical qubit.
        if c.u == 0 {
            for fragment in mapper.fragment_one(c) {
                for r in 0..2 {
                    let crossing = mapper.unfragment_one((fragment.row, fragment.col, 1, r).into());
                    if let Some(other) = crossing.filter(|o| shape.contains(*o)) {
                        edges.push((q, shape.linear(other)));
                    }
                }
            }
        }
    }

    debug!(size, edges = edges.len(), "Generated six-tile graph");
    HardwareGraph::new(TopologyKind::SixTile(shape), 0..shape.num_qubits(), edges)
}
