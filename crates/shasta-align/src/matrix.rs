//! Sparse alignment matrix construction, cell aggregation and accessibility
//! (spec §4.B steps 1-4).
use crate::options::Align4Options;
use fnv::{FnvHashMap, FnvHashSet};
use shasta_types::KmerId;

/// Rotates `(x, y)` into diagonal coordinates `(X, Y)` (spec §4.B
/// "Coordinate system").
fn to_xy_diagonal(x: u32, y: u32, nx: u32) -> (u32, u32) {
    let big_x = x + y;
    let big_y = y + (nx - 1 - x);
    (big_x, big_y)
}

/// Joint merge over the two KmerId-sorted marker lists; for every matching
/// KmerId, emits all `(x, y)` cross products with that KmerId (spec §4.B
/// step 1).
pub fn build_matches(
    sorted0: &[(KmerId, u32)],
    sorted1: &[(KmerId, u32)],
) -> Vec<(u32, u32)> {
    let mut matches = Vec::new();
    let (mut i, mut j) = (0usize, 0usize);
    while i < sorted0.len() && j < sorted1.len() {
        let (k0, _) = sorted0[i];
        let (k1, _) = sorted1[j];
        match k0.cmp(&k1) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                let i_end = {
                    let mut e = i;
                    while e < sorted0.len() && sorted0[e].0 == k0 {
                        e += 1;
                    }
                    e
                };
                let j_end = {
                    let mut e = j;
                    while e < sorted1.len() && sorted1[e].0 == k1 {
                        e += 1;
                    }
                    e
                };
                for &(_, x) in &sorted0[i..i_end] {
                    for &(_, y) in &sorted1[j..j_end] {
                        matches.push((x, y));
                    }
                }
                i = i_end;
                j = j_end;
            }
        }
    }
    matches
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellIndex {
    pub i_x: u32,
    pub i_y: u32,
}

/// A cell of size `(deltaX, deltaY)` in `(X,Y)` space, holding the matches
/// that fall inside it (spec §4.B "Sparse matrix").
#[derive(Debug, Clone, Default)]
pub struct Cell {
    pub entries: Vec<(u32, u32)>,
}

pub struct AlignmentMatrix {
    pub nx: u32,
    pub ny: u32,
    pub cells: FnvHashMap<CellIndex, Cell>,
}

impl AlignmentMatrix {
    pub fn build(
        sorted0: &[(KmerId, u32)],
        sorted1: &[(KmerId, u32)],
        nx: u32,
        ny: u32,
        opts: &Align4Options,
    ) -> Self {
        let matches = build_matches(sorted0, sorted1);
        let mut cells: FnvHashMap<CellIndex, Cell> = FnvHashMap::default();
        for (x, y) in matches {
            let (big_x, big_y) = to_xy_diagonal(x, y, nx);
            let index = CellIndex {
                i_x: big_x / opts.delta_x.max(1),
                i_y: big_y / opts.delta_y.max(1),
            };
            cells.entry(index).or_default().entries.push((x, y));
        }
        AlignmentMatrix { nx, ny, cells }
    }

    /// A cell is a *candidate* if it has enough entries and lies within
    /// `maxDistanceFromBoundary` of either triangle boundary of the valid
    /// `(x,y)` region (spec §4.B step 2). Returns, for each candidate, the
    /// side of the region it is near: `true` for the forward
    /// (top/left, x=0 or y=0) boundary, `false` for the backward
    /// (bottom/right, x=nx-1 or y=ny-1) boundary. A cell can be near both.
    pub fn candidates(&self, opts: &Align4Options) -> FnvHashMap<CellIndex, (bool, bool)> {
        let mut out = FnvHashMap::default();
        for (index, cell) in &self.cells {
            if (cell.entries.len() as u32) < opts.min_entry_count_per_cell {
                continue;
            }
            let mut near_forward = false;
            let mut near_backward = false;
            for &(x, y) in &cell.entries {
                if x <= opts.max_distance_from_boundary || y <= opts.max_distance_from_boundary {
                    near_forward = true;
                }
                if self.nx - 1 - x <= opts.max_distance_from_boundary
                    || self.ny - 1 - y <= opts.max_distance_from_boundary
                {
                    near_backward = true;
                }
            }
            if near_forward || near_backward {
                out.insert(*index, (near_forward, near_backward));
            }
        }
        out
    }

    /// BFS over the 4 grid-adjacent `(iX,iY)` neighbor directions, seeded
    /// from boundary candidates, to find forward/backward accessible cells;
    /// *active* cells are both (spec §4.B step 3).
    pub fn active_cells(&self, opts: &Align4Options) -> FnvHashSet<CellIndex> {
        let candidates = self.candidates(opts);
        let forward_seeds: Vec<CellIndex> = candidates
            .iter()
            .filter(|&(_, &(fwd, _))| fwd)
            .map(|(&idx, _)| idx)
            .collect();
        let backward_seeds: Vec<CellIndex> = candidates
            .iter()
            .filter(|&(_, &(_, bwd))| bwd)
            .map(|(&idx, _)| idx)
            .collect();

        let candidate_set: FnvHashSet<CellIndex> = candidates.keys().copied().collect();
        let forward_reachable = bfs_reachable(&candidate_set, &forward_seeds);
        let backward_reachable = bfs_reachable(&candidate_set, &backward_seeds);

        forward_reachable
            .intersection(&backward_reachable)
            .copied()
            .collect()
    }
}

fn bfs_reachable(
    candidates: &FnvHashSet<CellIndex>,
    seeds: &[CellIndex],
) -> FnvHashSet<CellIndex> {
    let mut visited: FnvHashSet<CellIndex> = FnvHashSet::default();
    let mut queue: std::collections::VecDeque<CellIndex> = std::collections::VecDeque::new();
    for &seed in seeds {
        if visited.insert(seed) {
            queue.push_back(seed);
        }
    }
    while let Some(current) = queue.pop_front() {
        for neighbor in grid_neighbors(current) {
            if candidates.contains(&neighbor) && visited.insert(neighbor) {
                queue.push_back(neighbor);
            }
        }
    }
    visited
}

fn grid_neighbors(index: CellIndex) -> [CellIndex; 4] {
    let mut out = [index; 4];
    out[0] = CellIndex {
        i_x: index.i_x + 1,
        i_y: index.i_y,
    };
    out[1] = CellIndex {
        i_x: index.i_x,
        i_y: index.i_y + 1,
    };
    out[2] = CellIndex {
        i_x: index.i_x.saturating_sub(1),
        i_y: index.i_y,
    };
    out[3] = CellIndex {
        i_x: index.i_x,
        i_y: index.i_y.saturating_sub(1),
    };
    out
}

/// Connected components of active cells, each defining a diagonal band
/// `[bandMin, bandMax]` in ordinal-difference space (spec §4.B step 4).
pub fn connected_components(
    matrix: &AlignmentMatrix,
    active: &FnvHashSet<CellIndex>,
) -> Vec<Vec<(u32, u32)>> {
    let mut remaining: FnvHashSet<CellIndex> = active.clone();
    let mut components = Vec::new();
    while let Some(&start) = remaining.iter().next() {
        let mut component_cells = Vec::new();
        let mut queue = std::collections::VecDeque::new();
        queue.push_back(start);
        remaining.remove(&start);
        while let Some(current) = queue.pop_front() {
            component_cells.push(current);
            for neighbor in grid_neighbors(current) {
                if remaining.remove(&neighbor) {
                    queue.push_back(neighbor);
                }
            }
        }
        let mut matches = Vec::new();
        for cell_index in component_cells {
            if let Some(cell) = matrix.cells.get(&cell_index) {
                matches.extend_from_slice(&cell.entries);
            }
        }
        if !matches.is_empty() {
            components.push(matches);
        }
    }
    components
}
