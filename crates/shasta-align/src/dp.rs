//! Banded DP over a connected component's match points (spec §4.B step 5):
//! "standard affine-free alignment ... restricted to the band. The path of
//! matches defines an alignment."
use crate::options::Align4Options;
use crate::info::Alignment;

/// Chains compatible match points (strictly increasing in both `x` and `y`)
/// to maximize `matchScore * matches - |gapScore| * skipped_markers`,
/// bounded by `maxSkip` between consecutive chained matches. Returns the
/// best chain found in this component, or `None` if no chain of length >= 1
/// exists (never happens for a non-empty component, but kept `Option` for
/// symmetry with `align4::align`'s "no alignment" outcome).
pub fn best_chain(matches: &[(u32, u32)], opts: &Align4Options) -> Option<Alignment> {
    if matches.is_empty() {
        return None;
    }
    let mut sorted = matches.to_vec();
    sorted.sort_unstable();
    sorted.dedup();
    let n = sorted.len();

    let mut score = vec![0i64; n];
    let mut predecessor: Vec<Option<usize>> = vec![None; n];
    for i in 0..n {
        score[i] = opts.match_score;
        let (xi, yi) = sorted[i];
        for j in 0..i {
            let (xj, yj) = sorted[j];
            if xj >= xi || yj >= yi {
                continue;
            }
            let dx = xi - xj;
            let dy = yi - yj;
            let skip = dx.max(dy).saturating_sub(1);
            if skip > opts.max_skip {
                continue;
            }
            let candidate = score[j] + opts.match_score - (skip as i64) * opts.gap_score.abs();
            if candidate > score[i] {
                score[i] = candidate;
                predecessor[i] = Some(j);
            }
        }
    }

    let best_end = (0..n).max_by_key(|&i| score[i])?;
    let mut chain = Vec::new();
    let mut cursor = Some(best_end);
    while let Some(i) = cursor {
        chain.push(sorted[i]);
        cursor = predecessor[i];
    }
    chain.reverse();
    Some(Alignment { matches: chain })
}
