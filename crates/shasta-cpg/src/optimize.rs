//! Chain Optimizer & Assembler (spec §4.H): builds a small local DAG over a
//! Chain's positions, shortcuts around low-confidence backbone edges via a
//! bounded alternate-edge search, picks the dominator-tree segmentation's
//! widest-bottleneck path per segment, then hands the result to an external
//! `PathAssembler`.
use crate::types::{BubbleChain, Chain};
use fnv::{FnvHashMap, FnvHashSet};
use shasta_types::{MarkerGraph, PathAssembler};

/// `out_edges[u]` lists `(v, common)` for every edge `u -> v`, `u < v`.
fn build_local_graph<G: MarkerGraph>(
    chain: &Chain,
    marker_graph: &G,
    min_common: u64,
    k: usize,
) -> Vec<Vec<(usize, u64)>> {
    let n = chain.len();
    let mut backbone_common = vec![0u64; n - 1];
    for p in 0..n - 1 {
        backbone_common[p] = marker_graph.analyze_edge_pair(chain.edges[p], chain.edges[p + 1]).common;
    }

    let mut keep_backbone = vec![true; n - 1];
    let mut alternates: Vec<(usize, usize, u64)> = Vec::new();
    for p in 0..n - 1 {
        if backbone_common[p] >= min_common {
            continue;
        }
        let i = p + 1;
        let j0_lo = i.saturating_sub(k);
        let j1_hi = (i + k).min(n - 1);
        let mut added = false;
        for j0 in j0_lo..=i {
            for j1 in i..=j1_hi {
                if j0 >= j1 || (j0 == p && j1 == i) {
                    continue;
                }
                let common = marker_graph.analyze_edge_pair(chain.edges[j0], chain.edges[j1]).common;
                if common > backbone_common[p] {
                    alternates.push((j0, j1, common));
                    added = true;
                }
            }
        }
        if added {
            keep_backbone[p] = false;
        }
    }

    let mut out_edges: Vec<Vec<(usize, u64)>> = vec![Vec::new(); n];
    for p in 0..n - 1 {
        if keep_backbone[p] {
            out_edges[p].push((p + 1, backbone_common[p]));
        }
    }
    for (j0, j1, common) in alternates {
        out_edges[j0].push((j1, common));
    }
    out_edges
}

/// Dominators on a DAG whose edges all go from lower to higher position
/// (guaranteed by construction), computed in a single topological pass.
fn dominator_tree(out_edges: &[Vec<(usize, u64)>], n: usize) -> Vec<usize> {
    let mut preds: Vec<Vec<usize>> = vec![Vec::new(); n];
    for (u, edges) in out_edges.iter().enumerate() {
        for &(v, _) in edges {
            preds[v].push(u);
        }
    }

    let mut dom_sets: Vec<FnvHashSet<usize>> = vec![FnvHashSet::default(); n];
    dom_sets[0].insert(0);
    for v in 1..n {
        let mut set: Option<FnvHashSet<usize>> = None;
        for &u in &preds[v] {
            let mut candidate = dom_sets[u].clone();
            candidate.insert(u);
            set = Some(match set {
                None => candidate,
                Some(existing) => existing.intersection(&candidate).copied().collect(),
            });
        }
        let mut set = set.unwrap_or_default();
        set.insert(v);
        dom_sets[v] = set;
    }

    let mut idom = vec![0usize; n];
    for v in 1..n {
        idom[v] = dom_sets[v].iter().copied().filter(|&d| d != v).max().unwrap_or(0);
    }
    idom
}

/// Widest-bottleneck path from `source` to `sink` (ties broken by more
/// edges), computed by a single DP pass in position order since the local
/// graph is a DAG.
fn best_bottleneck_path(out_edges: &[Vec<(usize, u64)>], source: usize, sink: usize) -> Vec<usize> {
    let mut best_bottleneck: FnvHashMap<usize, u64> = FnvHashMap::default();
    let mut best_length: FnvHashMap<usize, usize> = FnvHashMap::default();
    let mut pred: FnvHashMap<usize, usize> = FnvHashMap::default();
    best_bottleneck.insert(source, u64::MAX);
    best_length.insert(source, 1);

    for v in source..=sink {
        let (Some(&bv), Some(&lv)) = (best_bottleneck.get(&v), best_length.get(&v)) else {
            continue;
        };
        for &(w, common) in &out_edges[v] {
            if w > sink {
                continue;
            }
            let candidate_bottleneck = bv.min(common);
            let candidate_length = lv + 1;
            let better = match best_bottleneck.get(&w) {
                None => true,
                Some(&existing) => {
                    candidate_bottleneck > existing
                        || (candidate_bottleneck == existing && candidate_length > best_length[&w])
                }
            };
            if better {
                best_bottleneck.insert(w, candidate_bottleneck);
                best_length.insert(w, candidate_length);
                pred.insert(w, v);
            }
        }
    }

    let mut path = vec![sink];
    let mut cur = sink;
    while cur != source {
        cur = pred[&cur];
        path.push(cur);
    }
    path.reverse();
    path
}

/// Optimizes a single Chain (spec §4.H). Chains shorter than 2 positions
/// pass through unchanged; a Chain is always exactly length 2 at minimum
/// (universal invariant 2), so this only ever matters for length-2 inputs,
/// which have no interior to shortcut.
pub fn optimize_chain<G: MarkerGraph>(chain: &Chain, marker_graph: &G, min_common: u64, k: usize) -> Chain {
    let n = chain.len();
    if n <= 2 {
        return chain.clone();
    }

    let out_edges = build_local_graph(chain, marker_graph, min_common, k);
    let idom = dominator_tree(&out_edges, n);

    let mut dom_path = vec![n - 1];
    let mut cur = n - 1;
    while cur != 0 {
        cur = idom[cur];
        dom_path.push(cur);
    }
    dom_path.reverse();

    let mut optimized_positions = vec![dom_path[0]];
    for window in dom_path.windows(2) {
        let (source, sink) = (window[0], window[1]);
        let segment_path = best_bottleneck_path(&out_edges, source, sink);
        optimized_positions.extend(segment_path.into_iter().skip(1));
    }

    Chain::new(optimized_positions.into_iter().map(|p| chain.edges[p]).collect())
}

/// Assembles consensus bases for `chain` via the external `PathAssembler`
/// collaborator, storing the result on the Chain (spec §4.H, final
/// paragraph).
pub fn assemble_chain<G: MarkerGraph, A: PathAssembler>(chain: &mut Chain, marker_graph: &G, assembler: &A) {
    let pair_infos: Vec<_> = chain
        .edges
        .windows(2)
        .map(|w| marker_graph.analyze_edge_pair(w[0], w[1]))
        .collect();
    chain.sequence = Some(assembler.assemble_path(&chain.edges, &pair_infos));
}

/// Optimizes and assembles every Chain of every Bubble in `bubble_chain`.
pub fn optimize_and_assemble_bubble_chain<G: MarkerGraph, A: PathAssembler>(
    bubble_chain: &mut BubbleChain,
    marker_graph: &G,
    assembler: &A,
    min_common: u64,
    k: usize,
) {
    for bubble in &mut bubble_chain.bubbles {
        for chain in bubble.chains_mut() {
            *chain = optimize_chain(chain, marker_graph, min_common, k);
            assemble_chain(chain, marker_graph, assembler);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use proptest::prelude::*;
    use shasta_types::collaborators::MarkerGraphEdgeRecord;
    use shasta_types::memory::{InMemoryMarkerGraph, PlaceholderPathAssembler};
    use shasta_types::{MarkerGraphEdgeId, MarkerGraphEdgePairInfo, MarkerGraphVertexId};

    fn chain_of(ids: &[u64]) -> Chain {
        Chain::new(ids.iter().map(|&i| MarkerGraphEdgeId(i)).collect())
    }

    fn dummy_mg(ids: &[u64]) -> InMemoryMarkerGraph {
        let mut mg = InMemoryMarkerGraph::new();
        for &id in ids {
            mg.add_edge(
                MarkerGraphEdgeId(id),
                MarkerGraphEdgeRecord {
                    source: MarkerGraphVertexId(0),
                    target: MarkerGraphVertexId(0),
                    coverage: 10,
                    marker_intervals: vec![],
                },
            );
        }
        mg
    }

    fn pair(mg: &mut InMemoryMarkerGraph, a: u64, b: u64, common: u64) {
        mg.set_pair_info(
            MarkerGraphEdgeId(a),
            MarkerGraphEdgeId(b),
            MarkerGraphEdgePairInfo { common, offset_in_bases: 100, corrected_jaccard: 1.0 },
        );
    }

    #[test]
    fn strong_backbone_is_left_unchanged() {
        let mut mg = dummy_mg(&[10, 11, 12, 13]);
        pair(&mut mg, 10, 11, 10);
        pair(&mut mg, 11, 12, 10);
        pair(&mut mg, 12, 13, 10);

        let chain = chain_of(&[10, 11, 12, 13]);
        let optimized = optimize_chain(&chain, &mg, 3, 1);
        assert_eq!(optimized.edges, chain.edges);
    }

    /// A weak backbone edge (B,C) is bypassed in favor of a stronger
    /// alternate (B,D), dropping C from the optimized Chain.
    #[test]
    fn weak_backbone_edge_is_bypassed_by_a_stronger_alternate() {
        let mut mg = dummy_mg(&[10, 11, 12, 13]);
        pair(&mut mg, 10, 11, 10);
        pair(&mut mg, 11, 12, 1);
        pair(&mut mg, 12, 13, 10);
        pair(&mut mg, 11, 13, 8);

        let chain = chain_of(&[10, 11, 12, 13]);
        let optimized = optimize_chain(&chain, &mg, 3, 1);
        assert_eq!(
            optimized.edges,
            vec![MarkerGraphEdgeId(10), MarkerGraphEdgeId(11), MarkerGraphEdgeId(13)]
        );
    }

    #[test]
    fn assemble_chain_stores_a_sequence() {
        let mg = dummy_mg(&[10, 11, 12]);
        let mut chain = chain_of(&[10, 11, 12]);
        assemble_chain(&mut chain, &mg, &PlaceholderPathAssembler);
        assert!(chain.sequence.is_some());
        assert_eq!(chain.sequence.unwrap().len(), chain.edges.len());
    }

    proptest! {
        /// At `min_common = 0`, `backbone_common[p] >= min_common` holds for
        /// every backbone position regardless of `common`, so no backbone
        /// edge is ever dropped and no alternate is ever added: `optimize_chain`
        /// must return the input chain's positions unchanged, whatever the
        /// pairwise `common` values are.
        #[test]
        fn optimize_is_identity_when_min_common_is_zero(
            (len, commons) in (2usize..12).prop_flat_map(|len| {
                (Just(len), proptest::collection::vec(0u64..1000, len - 1))
            })
        ) {
            let ids: Vec<u64> = (0..len as u64).collect();
            let mut mg = dummy_mg(&ids);
            for (i, &common) in commons.iter().enumerate() {
                pair(&mut mg, ids[i], ids[i + 1], common);
            }

            let chain = chain_of(&ids);
            let optimized = optimize_chain(&chain, &mg, 0, 1);
            prop_assert_eq!(optimized.edges, chain.edges);
        }
    }
}
