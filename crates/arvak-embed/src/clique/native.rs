//! Native clique construction on a four-group lattice.
//!
//! An `n`-group staircase gives group `i` a junction row `R_i` and a
//! junction column `C_i`. Rows are grown: `R_0` is free and every later
//! `R_i` extends the band of rows chosen so far by one, above or below.
//! Columns are peeled: the groups start from `n` adjacent columns and each
//! `C_i` is taken from the left or right end of what remains.
//!
//! Chain `(i, t)` owns track `t` of column `C_i` over the grown row band
//! (vertical arm) and track `t` of row `R_i` over the columns still left
//! before `C_i` was peeled (horizontal arm). For `i < j` the horizontal arm
//! of `i` covers `C_j` and the vertical arm of `j` covers `R_i`, so the two
//! chains meet in tile `(R_i, C_j)`, where the complete bipartite tile
//! couples them.
//!
//! ```text
//!   grow down and peel left     chain i: column i rows 0..=i,
//!   at every step, n = 4                 row i cols i..n
//!
//!   i=0  ┼───────
//!   i=1  │ ┼─────
//!   i=2  │ │ ┼───
//!   i=3  │ │ │ ┼─
//! ```
//!
//! Arms only reach the farthest junction they must cross, so a dead
//! qubit costs only the chains whose arms run through it. The best grow/peel
//! sequence for each `n` is found by dynamic programming over the row band
//! and the remaining column interval. Candidates are then lifted to
//! hardware qubits and kept greedily in canonical order, so dead couplers
//! only cost the chains that touch them.

use rustc_hash::FxHashSet;

use crate::embedding::Chain;
use crate::graph::HardwareGraph;
use crate::topology::{FourGroupCoord, FourGroupShape};

/// Prefix counts of present lattice qubits along every track.
struct Tracks {
    lattice: FourGroupShape,
    vertical: Vec<u32>,
    horizontal: Vec<u32>,
}

impl Tracks {
    fn new<P>(lattice: FourGroupShape, present: P) -> Self
    where
        P: Fn(FourGroupCoord) -> bool,
    {
        let FourGroupShape { rows, cols, tile } = lattice;
        let mut vertical = Vec::with_capacity((cols * tile * (rows + 1)) as usize);
        for col in 0..cols {
            for t in 0..tile {
                let mut seen = 0;
                vertical.push(seen);
                for row in 0..rows {
                    seen += u32::from(present(FourGroupCoord::new(row, col, 0, t)));
                    vertical.push(seen);
                }
            }
        }

        let mut horizontal = Vec::with_capacity((rows * tile * (cols + 1)) as usize);
        for row in 0..rows {
            for t in 0..tile {
                let mut seen = 0;
                horizontal.push(seen);
                for col in 0..cols {
                    seen += u32::from(present(FourGroupCoord::new(row, col, 1, t)));
                    horizontal.push(seen);
                }
            }
        }

        Self {
            lattice,
            vertical,
            horizontal,
        }
    }

    /// Whether both arms of chain `t` of `group` are fully present.
    fn clear(&self, group: &Group, t: u32) -> bool {
        let FourGroupShape { rows, cols, tile } = self.lattice;

        let base = ((group.col * tile + t) * (rows + 1)) as usize;
        let present = self.vertical[base + group.bottom as usize + 1] - self.vertical[base + group.top as usize];
        if present != group.bottom - group.top + 1 {
            return false;
        }

        let base = ((group.row * tile + t) * (cols + 1)) as usize;
        let present = self.horizontal[base + group.right as usize + 1] - self.horizontal[base + group.left as usize];
        present == group.right - group.left + 1
    }

    fn score(&self, group: &Group) -> u32 {
        (0..self.lattice.tile).filter(|&t| self.clear(group, t)).count() as u32
    }
}

/// One junction with the extent of its arms, bounds inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Group {
    row: u32,
    col: u32,
    top: u32,
    bottom: u32,
    left: u32,
    right: u32,
}

impl Group {
    /// Lattice coordinates of chain `t`: vertical arm, then horizontal.
    fn chain(&self, t: u32) -> Vec<FourGroupCoord> {
        (self.top..=self.bottom)
            .map(|r| FourGroupCoord::new(r, self.col, 0, t))
            .chain((self.left..=self.right).map(|c| FourGroupCoord::new(self.row, c, 1, t)))
            .collect()
    }
}

/// Best staircase of `n` groups.
#[derive(Debug)]
struct Plan {
    score: u32,
    groups: Vec<Group>,
}

/// Dynamic program over `(step, band top, remaining left)`.
///
/// After `i` steps the row band is `top..top + i` and the remaining
/// columns are `left..left + n - i`; `value` holds the best score the
/// steps `i..n` can still add from there.
struct Staircase<'a> {
    tracks: &'a Tracks,
    n: u32,
    value: Vec<Option<u32>>,
}

impl<'a> Staircase<'a> {
    fn new(tracks: &'a Tracks, n: u32) -> Self {
        let FourGroupShape { rows, cols, .. } = tracks.lattice;
        let mut staircase = Self {
            tracks,
            n,
            value: vec![None; (n * rows * cols) as usize],
        };

        for i in (1..n).rev() {
            for top in 0..=rows - i {
                for left in 0..=cols - (n - i) {
                    let best = staircase
                        .moves(i, top, left)
                        .filter_map(|(group, top, left)| {
                            staircase
                                .rest(i + 1, top, left)
                                .map(|rest| rest + tracks.score(&group))
                        })
                        .max();
                    let index = staircase.index(i, top, left);
                    staircase.value[index] = best;
                }
            }
        }

        staircase
    }

    fn index(&self, i: u32, top: u32, left: u32) -> usize {
        let FourGroupShape { rows, cols, .. } = self.tracks.lattice;
        ((i * rows + top) * cols + left) as usize
    }

    fn rest(&self, i: u32, top: u32, left: u32) -> Option<u32> {
        if i == self.n {
            Some(0)
        } else {
            self.value[self.index(i, top, left)]
        }
    }

    /// Step `i` from a band at `top` with columns starting at `left`.
    ///
    /// Yields the group placed and the next `(top, left)`. Growing down and
    /// peeling left come first, so ties resolve toward the triangle.
    fn moves(&self, i: u32, top: u32, left: u32) -> impl Iterator<Item = (Group, u32, u32)> {
        let rows = self.tracks.lattice.rows;
        let right = left + (self.n - i) - 1;
        let down = (top + i < rows).then_some((top + i, top));
        let up = top.checked_sub(1).map(|row| (row, row));

        [down, up].into_iter().flatten().flat_map(move |(row, top)| {
            [(left, left + 1), (right, left)].into_iter().map(move |(col, next)| {
                let group = Group {
                    row,
                    col,
                    top,
                    bottom: top + i,
                    left,
                    right,
                };
                (group, top, next)
            })
        })
    }

    /// Best starting junction and the groups that follow it.
    fn best(&self) -> Option<Plan> {
        let FourGroupShape { rows, cols, .. } = self.tracks.lattice;
        let n = self.n;

        let mut start: Option<(u32, Group, u32)> = None;
        for row in 0..rows {
            for left in 0..=cols - n {
                let right = left + n - 1;
                for (col, next) in [(left, left + 1), (right, left)] {
                    let group = Group {
                        row,
                        col,
                        top: row,
                        bottom: row,
                        left,
                        right,
                    };
                    let Some(rest) = self.rest(1, row, next) else {
                        continue;
                    };
                    let score = rest + self.tracks.score(&group);
                    if start.is_none_or(|(best, ..)| score > best) {
                        start = Some((score, group, next));
                    }
                }
            }
        }

        let (score, first, mut left) = start?;
        let mut top = first.row;
        let mut groups = vec![first];
        for i in 1..n {
            let want = self.rest(i, top, left)?;
            let (group, next_top, next_left) = self.moves(i, top, left).find(|(group, t, l)| {
                self.rest(i + 1, *t, *l)
                    .is_some_and(|rest| rest + self.tracks.score(group) == want)
            })?;
            groups.push(group);
            top = next_top;
            left = next_left;
        }

        Some(Plan { score, groups })
    }
}

/// Largest native clique over `lattice`, as hardware chains.
///
/// `present` reports whether a lattice qubit is usable; `lift` maps a
/// lattice chain to hardware qubits. Every returned chain is connected in
/// `graph`, disjoint from the others, and adjacent to all of them.
pub(crate) fn native_clique<P, L>(
    lattice: FourGroupShape,
    present: P,
    lift: L,
    graph: &HardwareGraph,
) -> Vec<Chain>
where
    P: Fn(FourGroupCoord) -> bool,
    L: Fn(&[FourGroupCoord]) -> Option<Chain>,
{
    let tracks = Tracks::new(lattice, present);
    let tile = lattice.tile as usize;
    let mut best: Vec<Chain> = Vec::new();

    for n in (1..=lattice.rows.min(lattice.cols)).rev() {
        if n as usize * tile <= best.len() {
            break;
        }
        let Some(plan) = Staircase::new(&tracks, n).best() else {
            continue;
        };
        if plan.score as usize <= best.len() {
            continue;
        }

        let candidates = plan.groups.iter().flat_map(|group| {
            (0..lattice.tile)
                .filter(|&t| tracks.clear(group, t))
                .map(|t| group.chain(t))
                .collect::<Vec<_>>()
        });
        let kept = keep_clique(candidates, &lift, graph);
        if kept.len() > best.len() {
            best = kept;
        }
    }

    best
}

/// Greedily keep candidates that extend the clique built so far.
fn keep_clique<I, L>(candidates: I, lift: &L, graph: &HardwareGraph) -> Vec<Chain>
where
    I: IntoIterator<Item = Vec<FourGroupCoord>>,
    L: Fn(&[FourGroupCoord]) -> Option<Chain>,
{
    let mut kept: Vec<Chain> = Vec::new();
    let mut used = FxHashSet::default();

    for coords in candidates {
        let Some(chain) = lift(&coords) else {
            continue;
        };
        if chain.iter().any(|q| used.contains(q)) || !chain.is_connected_in(graph) {
            continue;
        }
        if kept.iter().all(|other| chain.touches(other, graph)) {
            used.extend(chain.iter().copied());
            kept.push(chain);
        }
    }

    kept
}
