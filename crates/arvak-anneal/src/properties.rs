//! Declared properties of an annealing device.
//!
//! Properties arrive as JSON in the shape devices publish them:
//!
//! ```json
//! {
//!   "h_range": [-2, 2],
//!   "j_range": [-1, 1],
//!   "extended_j_range": [-2, 1],
//!   "per_qubit_coupling_range": [-9, 6],
//!   "topology": {"type": "chimera", "shape": [4, 4, 4]},
//!   "qubits": [0, 1, 2],
//!   "couplers": [[0, 4], [1, 4]]
//! }
//! ```

use std::fmt;

use arvak_embed::{
    FourGroupShape, FragmentOffsets, HardwareGraph, SixTileShape, TopologyKind,
};
use serde::{Deserialize, Serialize};

use crate::error::{AnnealError, AnnealResult};

/// Relative tolerance used when checking values against a range.
const RANGE_TOLERANCE: f64 = 1e-9;

/// A closed interval `[min, max]` of allowed bias values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct BiasRange {
    pub min: f64,
    pub max: f64,
}

impl BiasRange {
    /// Create a range; it must contain zero.
    pub fn new(min: f64, max: f64) -> AnnealResult<Self> {
        let range = Self { min, max };
        range.validate()?;
        Ok(range)
    }

    /// Range accepting every finite value.
    pub const fn unbounded() -> Self {
        Self {
            min: f64::NEG_INFINITY,
            max: f64::INFINITY,
        }
    }

    /// Check `min <= 0 <= max`.
    pub fn validate(&self) -> AnnealResult<()> {
        if self.min.is_nan() || self.max.is_nan() || self.min > 0.0 || self.max < 0.0 {
            return Err(AnnealError::Configuration(format!(
                "range {self} must contain zero"
            )));
        }
        Ok(())
    }

    /// Whether `value` lies in the range, up to a small relative tolerance.
    pub fn contains(&self, value: f64) -> bool {
        let scale = self.min.abs().max(self.max.abs()).max(1.0);
        let tolerance = if scale.is_finite() {
            RANGE_TOLERANCE * scale
        } else {
            RANGE_TOLERANCE
        };
        value >= self.min - tolerance && value <= self.max + tolerance
    }

    /// How far `value` overshoots the bound on its side, as a ratio.
    ///
    /// Values inside the range give at most 1.0. A nonzero value on a
    /// side whose bound is zero gives infinity.
    pub fn overshoot(&self, value: f64) -> f64 {
        let bound = if value >= 0.0 { self.max } else { self.min };
        if value == 0.0 {
            0.0
        } else if bound == 0.0 {
            f64::INFINITY
        } else {
            value / bound
        }
    }
}

impl From<[f64; 2]> for BiasRange {
    fn from([min, max]: [f64; 2]) -> Self {
        Self { min, max }
    }
}

impl From<BiasRange> for [f64; 2] {
    fn from(range: BiasRange) -> Self {
        [range.min, range.max]
    }
}

impl fmt::Display for BiasRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.min, self.max)
    }
}

/// Topology family and shape as a device reports them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopologyDescriptor {
    /// Family name: `chimera`/`four_group` or `pegasus`/`six_tile`.
    #[serde(rename = "type")]
    pub kind: String,
    /// `[rows, cols, tile]`, `[size]` (square, tile 4) or `[m]`.
    pub shape: Vec<u32>,
    /// Fragment offsets of a six-tile device, when not the defaults.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offsets: Option<FragmentOffsets>,
}

impl TopologyDescriptor {
    pub fn four_group(rows: u32, cols: u32, tile: u32) -> Self {
        Self {
            kind: "chimera".into(),
            shape: vec![rows, cols, tile],
            offsets: None,
        }
    }

    pub fn six_tile(size: u32) -> Self {
        Self {
            kind: "pegasus".into(),
            shape: vec![size],
            offsets: None,
        }
    }

    /// Resolve into a structured topology kind.
    pub fn to_kind(&self) -> AnnealResult<TopologyKind> {
        match (self.kind.as_str(), self.shape.as_slice()) {
            ("chimera" | "four_group", &[rows, cols, tile]) => Ok(TopologyKind::FourGroup(
                FourGroupShape::new(rows, cols, tile)?,
            )),
            ("chimera" | "four_group", &[size]) => {
                Ok(TopologyKind::FourGroup(FourGroupShape::square(size)?))
            }
            ("pegasus" | "six_tile", &[size]) => Ok(TopologyKind::SixTile(SixTileShape::new(
                size,
                self.offsets.unwrap_or_default(),
            )?)),
            (kind, shape) => Err(AnnealError::Configuration(format!(
                "unsupported topology {kind} with shape {shape:?}"
            ))),
        }
    }
}

impl From<&TopologyKind> for TopologyDescriptor {
    fn from(kind: &TopologyKind) -> Self {
        match kind {
            TopologyKind::FourGroup(shape) => {
                Self::four_group(shape.rows, shape.cols, shape.tile)
            }
            TopologyKind::SixTile(shape) => Self {
                offsets: (shape.offsets != FragmentOffsets::default()).then_some(shape.offsets),
                ..Self::six_tile(shape.size)
            },
            _ => Self {
                kind: kind.family().into(),
                shape: Vec::new(),
                offsets: None,
            },
        }
    }
}

/// Properties a device declares: ranges, topology and working graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QpuProperties {
    /// Allowed linear biases.
    pub h_range: BiasRange,
    /// Allowed biases on ordinary couplers.
    pub j_range: BiasRange,
    /// Allowed biases on chain couplers; defaults to `j_range`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extended_j_range: Option<BiasRange>,
    /// Allowed signed sum of couplings at one qubit; unbounded when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub per_qubit_coupling_range: Option<BiasRange>,
    pub topology: TopologyDescriptor,
    /// Working qubits.
    pub qubits: Vec<u32>,
    /// Working couplers.
    pub couplers: Vec<(u32, u32)>,
}

impl QpuProperties {
    /// Describe a device running on `graph`.
    pub fn from_graph(graph: &HardwareGraph, h_range: BiasRange, j_range: BiasRange) -> Self {
        Self {
            h_range,
            j_range,
            extended_j_range: None,
            per_qubit_coupling_range: None,
            topology: TopologyDescriptor::from(graph.kind()),
            qubits: graph.nodes().to_vec(),
            couplers: graph.edges().to_vec(),
        }
    }

    pub fn with_extended_j_range(mut self, range: BiasRange) -> Self {
        self.extended_j_range = Some(range);
        self
    }

    pub fn with_per_qubit_coupling_range(mut self, range: BiasRange) -> Self {
        self.per_qubit_coupling_range = Some(range);
        self
    }

    /// Parse properties from JSON.
    pub fn from_json(json: &str) -> AnnealResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// The working graph, typed by the declared topology.
    pub fn to_graph(&self) -> AnnealResult<HardwareGraph> {
        let kind = self.topology.to_kind()?;
        Ok(HardwareGraph::new(
            kind,
            self.qubits.iter().copied(),
            self.couplers.iter().copied(),
        )?)
    }
}
