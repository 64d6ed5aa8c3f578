//! Six-tile to four-group fragment mapping.
//!
//! Every six-tile qubit is a long wire crossing six tiles of a finer
//! four-group lattice with two qubits per tile side (`6m × 6m` tiles for a
//! size-`m` graph). Splitting a qubit into those six pieces ("fragments")
//! makes the six-tile topology locally isomorphic to the four-group one,
//! so the four-group clique construction can be reused unchanged.
//!
//! ```text
//!   six-tile qubit (u=0, w, k, z)
//!        │
//!        ▼  fragment()
//!   (x0..x0+6, y, 0, k mod 2)     x0 = (12z + offset[k]) / 2
//!                                 y  = (12w + k) / 2
//!        │
//!        ▼  unfragment()
//!   (u, w, k, z)
//! ```
//!
//! Offsets are a construction parameter of the six-tile generator, so a
//! mapper is always built from the same [`FragmentOffsets`] as the graph.

use serde::{Deserialize, Serialize};

use crate::error::{EmbedError, EmbedResult};
use crate::topology::{FourGroupCoord, SixTileCoord};

/// A fragment is a coordinate in the fine four-group lattice.
pub type FragmentCoord = FourGroupCoord;

/// Number of fragments produced per six-tile qubit.
pub const FRAGMENTS_PER_QUBIT: u32 = 6;

/// Tracks per tile group; offset tables have one entry per track.
pub const TRACKS: usize = 12;

/// Default vertical offsets of the standard six-tile generator.
pub const DEFAULT_VERTICAL_OFFSETS: [u32; TRACKS] = [2, 2, 2, 2, 10, 10, 10, 10, 6, 6, 6, 6];

/// Default horizontal offsets of the standard six-tile generator.
pub const DEFAULT_HORIZONTAL_OFFSETS: [u32; TRACKS] = [6, 6, 6, 6, 2, 2, 2, 2, 10, 10, 10, 10];

/// Per-track qubit offsets of a six-tile topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FragmentOffsets {
    /// Offsets for vertical (`u = 0`) tracks.
    pub vertical: [u32; TRACKS],
    /// Offsets for horizontal (`u = 1`) tracks.
    pub horizontal: [u32; TRACKS],
}

impl FragmentOffsets {
    /// Create validated offset tables.
    ///
    /// Offsets must be even and below 12 so that fragments land on whole
    /// lattice tiles.
    pub fn new(vertical: [u32; TRACKS], horizontal: [u32; TRACKS]) -> EmbedResult<Self> {
        let offsets = Self {
            vertical,
            horizontal,
        };
        offsets.validate()?;
        Ok(offsets)
    }

    /// Check the even/below-12 constraint.
    pub fn validate(&self) -> EmbedResult<()> {
        for (name, table) in [("vertical", &self.vertical), ("horizontal", &self.horizontal)] {
            if let Some((k, off)) = table
                .iter()
                .enumerate()
                .find(|(_, off)| **off % 2 != 0 || **off >= 12)
            {
                return Err(EmbedError::InvalidOffsets(format!(
                    "{name} offset {off} at track {k} must be even and below 12"
                )));
            }
        }
        Ok(())
    }

    fn for_orientation(&self, u: u32) -> &[u32; TRACKS] {
        if u == 0 {
            &self.vertical
        } else {
            &self.horizontal
        }
    }
}

impl Default for FragmentOffsets {
    fn default() -> Self {
        Self {
            vertical: DEFAULT_VERTICAL_OFFSETS,
            horizontal: DEFAULT_HORIZONTAL_OFFSETS,
        }
    }
}

/// Maps six-tile coordinates to and from fragment coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FragmentMapper {
    offsets: FragmentOffsets,
}

impl FragmentMapper {
    pub fn new(offsets: FragmentOffsets) -> Self {
        Self { offsets }
    }

    pub fn offsets(&self) -> &FragmentOffsets {
        &self.offsets
    }

    /// Split each coordinate into its six fragments, in input order.
    ///
    /// The output is not deduplicated.
    pub fn fragment(&self, coords: &[SixTileCoord]) -> Vec<FragmentCoord> {
        let mut fragments = Vec::with_capacity(coords.len() * FRAGMENTS_PER_QUBIT as usize);
        for &coord in coords {
            fragments.extend(self.fragment_one(coord));
        }
        fragments
    }

    /// The six fragments of a single qubit.
    pub fn fragment_one(&self, coord: SixTileCoord) -> impl Iterator<Item = FragmentCoord> {
        let SixTileCoord { u, w, k, z } = coord;
        let offset = self.offsets.for_orientation(u)[k as usize % TRACKS];
        let x0 = (z * 12 + offset) / 2;
        let y = (w * 12 + k) / 2;
        let r = k % 2;

        (x0..x0 + FRAGMENTS_PER_QUBIT).map(move |x| {
            if u == 0 {
                FourGroupCoord::new(x, y, 0, r)
            } else {
                FourGroupCoord::new(y, x, 1, r)
            }
        })
    }

    /// Recover the qubit a fragment was cut from.
    ///
    /// Returns `None` when the fragment lies before the first qubit of
    /// its track, which no fragment of a real coordinate does.
    pub fn unfragment_one(&self, fragment: FragmentCoord) -> Option<SixTileCoord> {
        let FourGroupCoord { row, col, u, k: r } = fragment;
        let (along, across) = if u == 0 { (row, col) } else { (col, row) };

        let track = 2 * across + r;
        let w = track / 12;
        let k = track % 12;
        let offset = self.offsets.for_orientation(u)[k as usize];

        let shifted = (2 * along).checked_sub(offset)?;
        Some(SixTileCoord::new(u, w, k, shifted / 12))
    }

    /// Recover the distinct qubits behind `fragments`, first-seen order.
    ///
    /// Fragments that do not come from one coherent set of coordinates
    /// are mapped independently; no attempt is made to reconcile them.
    pub fn unfragment(&self, fragments: &[FragmentCoord]) -> Vec<SixTileCoord> {
        let mut coords: Vec<SixTileCoord> = Vec::new();
        for &fragment in fragments {
            if let Some(coord) = self.unfragment_one(fragment) {
                if !coords.contains(&coord) {
                    coords.push(coord);
                }
            }
        }
        coords
    }
}

impl Default for FragmentMapper {
    fn default() -> Self {
        Self::new(FragmentOffsets::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rustc_hash::FxHashSet;

    fn as_set(fragments: Vec<FragmentCoord>) -> FxHashSet<(u32, u32, u32, u32)> {
        fragments.into_iter().map(FourGroupCoord::as_tuple).collect()
    }

    #[test]
    fn test_fragment_empty() {
        let mapper = FragmentMapper::default();
        assert!(mapper.fragment(&[]).is_empty());
        assert!(mapper.unfragment(&[]).is_empty());
    }

    #[test]
    fn test_fragment_single_horizontal() {
        let mapper = FragmentMapper::default();
        let fragments = mapper.fragment(&[SixTileCoord::new(1, 0, 0, 0)]);

        let expected: FxHashSet<_> = (3..=8).map(|x| (0, x, 1, 0)).collect();
        assert_eq!(fragments.len(), 6);
        assert_eq!(as_set(fragments), expected);
    }

    #[test]
    fn test_fragment_single_vertical() {
        let mapper = FragmentMapper::default();
        let fragments = mapper.fragment(&[SixTileCoord::new(0, 1, 3, 1)]);

        let expected: FxHashSet<_> = (7..=12).map(|x| (x, 7, 0, 1)).collect();
        assert_eq!(as_set(fragments), expected);
    }

    #[test]
    fn test_fragment_list() {
        let mapper = FragmentMapper::default();
        let fragments = mapper.fragment(&[
            SixTileCoord::new(1, 5, 11, 4),
            SixTileCoord::new(0, 2, 2, 3),
        ]);

        let mut expected: FxHashSet<_> = (29..=34).map(|x| (35, x, 1, 1)).collect();
        expected.extend((19..=24).map(|x| (x, 13, 0, 0)));
        assert_eq!(fragments.len(), 12);
        assert_eq!(as_set(fragments), expected);
    }

    #[test]
    fn test_fragment_preserves_order() {
        let mapper = FragmentMapper::default();
        let a = SixTileCoord::new(0, 2, 2, 3);
        let b = SixTileCoord::new(1, 0, 0, 0);
        let fragments = mapper.fragment(&[a, b]);
        assert_eq!(mapper.unfragment(&fragments[..6]), vec![a]);
        assert_eq!(mapper.unfragment(&fragments[6..]), vec![b]);
    }

    #[test]
    fn test_unfragment_round_trip() {
        let mapper = FragmentMapper::default();
        let coord = SixTileCoord::new(1, 5, 11, 4);
        let fragments = mapper.fragment(&[coord]);

        // Any single fragment identifies the qubit.
        for fragment in &fragments {
            assert_eq!(mapper.unfragment_one(*fragment), Some(coord));
        }
        assert_eq!(mapper.unfragment(&fragments), vec![coord]);
    }

    #[test]
    fn test_unfragment_mixed_sources() {
        let mapper = FragmentMapper::default();
        let a = SixTileCoord::new(0, 1, 3, 1);
        let b = SixTileCoord::new(1, 0, 0, 0);
        let fragments = mapper.fragment(&[a, b, a]);
        assert_eq!(mapper.unfragment(&fragments), vec![a, b]);
    }

    #[test]
    fn test_unfragment_before_first_qubit() {
        let mapper = FragmentMapper::default();
        // Track 0 starts at lattice row 1 with the default offsets.
        assert_eq!(mapper.unfragment_one(FourGroupCoord::new(0, 0, 0, 0)), None);
    }

    #[test]
    fn test_custom_offsets() {
        let offsets = FragmentOffsets::new([0; TRACKS], [4; TRACKS]).unwrap();
        let mapper = FragmentMapper::new(offsets);
        let fragments = mapper.fragment(&[SixTileCoord::new(1, 0, 0, 0)]);
        let expected: FxHashSet<_> = (2..=7).map(|x| (0, x, 1, 0)).collect();
        assert_eq!(as_set(fragments), expected);
    }

    #[test]
    fn test_offsets_validation() {
        let mut odd = DEFAULT_VERTICAL_OFFSETS;
        odd[3] = 3;
        assert!(matches!(
            FragmentOffsets::new(odd, DEFAULT_HORIZONTAL_OFFSETS),
            Err(EmbedError::InvalidOffsets(_))
        ));

        let mut large = DEFAULT_HORIZONTAL_OFFSETS;
        large[0] = 12;
        assert!(FragmentOffsets::new(DEFAULT_VERTICAL_OFFSETS, large).is_err());
    }
}
