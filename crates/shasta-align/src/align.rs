//! Top-level Align4 entry point (spec §4.B).
use crate::dp::best_chain;
use crate::info::{Alignment, AlignmentInfo};
use crate::matrix::{connected_components, AlignmentMatrix};
use crate::options::Align4Options;
use shasta_types::KmerId;
use tracing::trace;

/// Computes a marker-level alignment between two reads represented as
/// KmerId sequences, returning `None` ("no alignment", spec §4.B "Failure
/// modes") when the matrix is empty or no chain survives the filters.
pub fn align(
    kmer_ids: [&[KmerId]; 2],
    sorted_markers: [&[(KmerId, u32)]; 2],
    opts: &Align4Options,
) -> Option<(Alignment, AlignmentInfo)> {
    let nx = kmer_ids[0].len() as u32;
    let ny = kmer_ids[1].len() as u32;
    if nx == 0 || ny == 0 {
        return None;
    }

    let matrix = AlignmentMatrix::build(sorted_markers[0], sorted_markers[1], nx, ny, opts);
    if matrix.cells.is_empty() {
        return None;
    }
    let active = matrix.active_cells(opts);
    if active.is_empty() {
        return None;
    }
    let components = connected_components(&matrix, &active);

    let mut best: Option<Alignment> = None;
    for component in &components {
        if let Some(chain) = best_chain(component, opts) {
            let better = match &best {
                None => true,
                Some(current) => chain.len() > current.len(),
            };
            if better {
                best = Some(chain);
            }
        }
    }

    let alignment = best?;
    let info = summarize(&alignment, nx, ny)?;
    if !passes_filters(&alignment, &info, nx, ny, opts) {
        trace!(nx, ny, markers = alignment.len(), "alignment rejected by filters");
        return None;
    }
    trace!(nx, ny, markers = alignment.len(), "alignment accepted");
    Some((alignment, info))
}

fn summarize(alignment: &Alignment, nx: u32, ny: u32) -> Option<AlignmentInfo> {
    if alignment.is_empty() {
        return None;
    }
    let first = *alignment.matches.first().unwrap();
    let last = *alignment.matches.last().unwrap();

    let mut max_skip = 0u32;
    let mut diagonals: Vec<i64> = Vec::with_capacity(alignment.len());
    for w in alignment.matches.windows(2) {
        let (x0, y0) = w[0];
        let (x1, y1) = w[1];
        let skip = (x1 - x0).max(y1 - y0).saturating_sub(1);
        max_skip = max_skip.max(skip);
    }
    for &(x, y) in &alignment.matches {
        diagonals.push(x as i64 - y as i64);
    }
    let min_diag = *diagonals.iter().min().unwrap();
    let max_diag = *diagonals.iter().max().unwrap();
    let max_drift = (max_diag - min_diag) as u32;

    let sum_offset: f64 = alignment
        .matches
        .iter()
        .map(|&(x, y)| y as f64 - x as f64)
        .sum();

    Some(AlignmentInfo {
        aligned_marker_count: alignment.len() as u32,
        ordinal_range0: (first.0, last.0),
        ordinal_range1: (first.1, last.1),
        max_skip,
        max_drift,
        left_trim0: first.0,
        right_trim0: nx - 1 - last.0,
        left_trim1: first.1,
        right_trim1: ny - 1 - last.1,
        estimated_ordinal_offset: sum_offset / alignment.len() as f64,
    })
}

fn passes_filters(
    alignment: &Alignment,
    info: &AlignmentInfo,
    nx: u32,
    ny: u32,
    opts: &Align4Options,
) -> bool {
    let aligned_fraction = alignment.len() as f64 / nx.min(ny) as f64;
    let band_width = {
        let diagonals: Vec<i64> = alignment
            .matches
            .iter()
            .map(|&(x, y)| x as i64 - y as i64)
            .collect();
        (diagonals.iter().max().unwrap() - diagonals.iter().min().unwrap()) as u32
    };
    alignment.len() as u32 >= opts.min_aligned_marker_count
        && aligned_fraction >= opts.min_aligned_fraction
        && info.max_skip <= opts.max_skip
        && info.max_drift <= opts.max_drift
        && info.left_trim0.max(info.right_trim0).max(info.left_trim1).max(info.right_trim1)
            <= opts.max_trim
        && band_width <= opts.max_band
}

/// Swaps the two reads' roles in a `(kmer_ids, sorted_markers)` pair, used
/// by the symmetry property test (spec §8 Align4 properties).
pub fn swap_inputs<'a>(
    kmer_ids: [&'a [KmerId]; 2],
    sorted_markers: [&'a [(KmerId, u32)]; 2],
) -> ([&'a [KmerId]; 2], [&'a [(KmerId, u32)]; 2]) {
    ([kmer_ids[1], kmer_ids[0]], [sorted_markers[1], sorted_markers[0]])
}
