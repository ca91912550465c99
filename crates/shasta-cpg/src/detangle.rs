//! Detangler (spec §4.F): tangle matrices over "interior" marker-graph edge
//! ids, significance classification, and the detangle-vertex/edge/
//! short-superbubble/back-edge operators.
use crate::ops::{clone_and_truncate_at_beginning, clone_and_truncate_at_end, connect};
use crate::superbubble::Superbubble;
use crate::types::{CompressedPathGraph, CpgEdgeIndex, CpgVertexIndex};
use shasta_types::MarkerGraph;

/// Classification of a single tangle matrix entry against
/// `(detangleToleranceLow, detangleToleranceHigh)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Significance {
    Negligible,
    Ambiguous,
    Significant,
}

pub fn classify(value: u64, low: u64, high: u64) -> Significance {
    if value <= low {
        Significance::Negligible
    } else if value >= high {
        Significance::Significant
    } else {
        Significance::Ambiguous
    }
}

/// `matrix[i][j] = common(lastInterior(inEdges[i]), firstInterior(outEdges[j]))`.
/// Requires the last bubble of each in-edge and the first bubble of each
/// out-edge to already be haploid; callers split beforehand when needed.
pub fn tangle_matrix<G: MarkerGraph>(
    cpg: &CompressedPathGraph,
    marker_graph: &G,
    in_edges: &[CpgEdgeIndex],
    out_edges: &[CpgEdgeIndex],
    zero_for_complementary_pairs: bool,
) -> Vec<Vec<u64>> {
    let mut matrix = vec![vec![0u64; out_edges.len()]; in_edges.len()];
    for (i0, &in_edge) in in_edges.iter().enumerate() {
        let last_bubble = cpg.edges[in_edge.0].bubble_chain.bubbles.last().unwrap();
        let chain0 = &last_bubble.chains()[0];
        let id0 = chain0.last_interior();
        for (i1, &out_edge) in out_edges.iter().enumerate() {
            let first_bubble = &cpg.edges[out_edge.0].bubble_chain.bubbles[0];
            let chain1 = &first_bubble.chains()[0];
            let id1 = chain1.first_interior();

            let is_complementary =
                zero_for_complementary_pairs && marker_graph.reverse_complement_edge(id0) == Some(id1);
            matrix[i0][i1] = if is_complementary {
                0
            } else {
                marker_graph.analyze_edge_pair(id0, id1).common
            };
        }
    }
    matrix
}

struct Counts {
    significant: usize,
    ambiguous: usize,
    negligible: usize,
}

fn count_matrix(matrix: &[Vec<u64>], low: u64, high: u64) -> Counts {
    let mut counts = Counts {
        significant: 0,
        ambiguous: 0,
        negligible: 0,
    };
    for row in matrix {
        for &value in row {
            match classify(value, low, high) {
                Significance::Negligible => counts.negligible += 1,
                Significance::Ambiguous => counts.ambiguous += 1,
                Significance::Significant => counts.significant += 1,
            }
        }
    }
    counts
}

/// Every row and every column must contain at least one significant entry,
/// or detangling would break contiguity for the in-edge/out-edge it drops.
fn every_row_and_column_has_a_significant_entry(matrix: &[Vec<u64>], high: u64) -> bool {
    if matrix.is_empty() || matrix[0].is_empty() {
        return false;
    }
    for row in matrix {
        if !row.iter().any(|&v| v >= high) {
            return false;
        }
    }
    for j in 0..matrix[0].len() {
        if !matrix.iter().any(|row| row[j] >= high) {
            return false;
        }
    }
    true
}

/// Applies the shared significance gate (spec §4.F steps 3-4) and, if it
/// passes, truncates every in/out edge and connects the significant pairs.
/// Returns `true` if the detangle was performed.
fn apply_if_significant(
    cpg: &mut CompressedPathGraph,
    matrix: &[Vec<u64>],
    in_edges: &[CpgEdgeIndex],
    out_edges: &[CpgEdgeIndex],
    low: u64,
    high: u64,
) -> bool {
    let counts = count_matrix(matrix, low, high);
    if counts.ambiguous > 0 {
        return false;
    }
    if counts.negligible == 0 {
        return false;
    }
    if !every_row_and_column_has_a_significant_entry(matrix, high) {
        return false;
    }

    let in_vertices: Vec<CpgVertexIndex> = in_edges
        .iter()
        .map(|&e| clone_and_truncate_at_end(cpg, e).expect("last bubble checked haploid"))
        .collect();
    let out_vertices: Vec<CpgVertexIndex> = out_edges
        .iter()
        .map(|&e| clone_and_truncate_at_beginning(cpg, e).expect("first bubble checked haploid"))
        .collect();

    for (i0, &in_vertex) in in_vertices.iter().enumerate() {
        for (i1, &out_vertex) in out_vertices.iter().enumerate() {
            if matrix[i0][i1] >= high {
                connect(cpg, in_vertex, out_vertex);
            }
        }
    }

    for &e in in_edges {
        cpg.edges[e.0].removed = true;
    }
    for &e in out_edges {
        cpg.edges[e.0].removed = true;
    }
    true
}

fn haploid_ends(cpg: &CompressedPathGraph, in_edges: &[CpgEdgeIndex], out_edges: &[CpgEdgeIndex]) -> bool {
    in_edges
        .iter()
        .all(|&e| cpg.edges[e.0].bubble_chain.bubbles.last().unwrap().is_haploid())
        && out_edges
            .iter()
            .all(|&e| cpg.edges[e.0].bubble_chain.bubbles[0].is_haploid())
}

/// Detangle vertex `v` (spec §4.F "Detangle a vertex v"). Requires
/// in-degree >= 1, out-degree >= 1, and not both exactly 1.
pub fn detangle_vertex<G: MarkerGraph>(
    cpg: &mut CompressedPathGraph,
    marker_graph: &G,
    v: CpgVertexIndex,
    low: u64,
    high: u64,
) -> bool {
    let in_edges: Vec<CpgEdgeIndex> = cpg.live_in_edges(v).collect();
    let out_edges: Vec<CpgEdgeIndex> = cpg.live_out_edges(v).collect();

    if in_edges.is_empty() || out_edges.is_empty() {
        return false;
    }
    if in_edges.len() < 2 && out_edges.len() < 2 {
        return false;
    }
    if !haploid_ends(cpg, &in_edges, &out_edges) {
        return false;
    }

    let matrix = tangle_matrix(cpg, marker_graph, &in_edges, &out_edges, false);
    apply_if_significant(cpg, &matrix, &in_edges, &out_edges, low, high)
}

/// Detangle edge `e = u -> v` (spec §4.F "Detangle an edge"), applied to the
/// in-edges of `u` and out-edges of `v`, ignoring any back-edge `v -> u`.
/// Requires out-degree(u) = 1 and in-degree(v) = 1.
pub fn detangle_edge<G: MarkerGraph>(
    cpg: &mut CompressedPathGraph,
    marker_graph: &G,
    e: CpgEdgeIndex,
    low: u64,
    high: u64,
) -> bool {
    let u = cpg.edges[e.0].source;
    let v = cpg.edges[e.0].target;

    if cpg.out_degree(u) != 1 || cpg.in_degree(v) != 1 {
        return false;
    }

    let in_edges: Vec<CpgEdgeIndex> = cpg.live_in_edges(u).filter(|&ei| cpg.edges[ei.0].source != v).collect();
    let out_edges: Vec<CpgEdgeIndex> = cpg.live_out_edges(v).filter(|&ei| cpg.edges[ei.0].target != u).collect();

    if in_edges.is_empty() || out_edges.is_empty() {
        return false;
    }
    if in_edges.len() < 2 && out_edges.len() < 2 {
        return false;
    }
    if !haploid_ends(cpg, &in_edges, &out_edges) {
        return false;
    }

    let matrix = tangle_matrix(cpg, marker_graph, &in_edges, &out_edges, false);
    apply_if_significant(cpg, &matrix, &in_edges, &out_edges, low, high)
}

/// Detangle a short superbubble (spec §4.F): in-edges/out-edges are the
/// superbubble's external edges, the interior is discarded and reconnected
/// purely by `connect`.
pub fn detangle_short_superbubble<G: MarkerGraph>(
    cpg: &mut CompressedPathGraph,
    marker_graph: &G,
    superbubble: &Superbubble,
    low: u64,
    high: u64,
) -> bool {
    let in_edges = superbubble.external_in_edges(cpg);
    let out_edges = superbubble.external_out_edges(cpg);

    if in_edges.is_empty() || out_edges.is_empty() {
        return false;
    }
    if in_edges.len() < 2 && out_edges.len() < 2 {
        return false;
    }
    if !haploid_ends(cpg, &in_edges, &out_edges) {
        return false;
    }

    let matrix = tangle_matrix(cpg, marker_graph, &in_edges, &out_edges, true);
    if !apply_if_significant(cpg, &matrix, &in_edges, &out_edges, low, high) {
        return false;
    }
    for &v in &superbubble.vertices {
        cpg.out_adjacency[v.0].clear();
        cpg.in_adjacency[v.0].clear();
    }
    true
}

/// Back-edge detangling (spec §4.F): a single back-edge `v -> u` is folded
/// in as both an in-edge and an out-edge of the joined vertex set, then the
/// same significance tests apply. The `open questions` note in the spec's
/// Design Notes records that the original routine computed this matrix
/// without acting on it; here the significance tests are applied for
/// consistency with every other detangle operator.
pub fn detangle_back_edge<G: MarkerGraph>(
    cpg: &mut CompressedPathGraph,
    marker_graph: &G,
    back_edge: CpgEdgeIndex,
    u: CpgVertexIndex,
    v: CpgVertexIndex,
    low: u64,
    high: u64,
) -> bool {
    if cpg.edges[back_edge.0].source != v || cpg.edges[back_edge.0].target != u {
        return false;
    }

    let mut in_edges: Vec<CpgEdgeIndex> = cpg.live_in_edges(u).filter(|&ei| ei != back_edge).collect();
    let mut out_edges: Vec<CpgEdgeIndex> = cpg.live_out_edges(v).filter(|&ei| ei != back_edge).collect();
    in_edges.push(back_edge);
    out_edges.push(back_edge);

    if !haploid_ends(cpg, &in_edges, &out_edges) {
        return false;
    }

    let matrix = tangle_matrix(cpg, marker_graph, &in_edges, &out_edges, false);
    apply_if_significant(cpg, &matrix, &in_edges, &out_edges, low, high)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::types::{Bubble, BubbleChain, Chain};
    use proptest::prelude::*;
    use shasta_types::collaborators::MarkerGraphEdgeRecord;
    use shasta_types::memory::InMemoryMarkerGraph;
    use shasta_types::{MarkerGraphEdgeId, MarkerGraphEdgePairInfo, MarkerGraphVertexId};

    fn chain_of(ids: &[u64]) -> Chain {
        Chain::new(ids.iter().map(|&i| MarkerGraphEdgeId(i)).collect())
    }

    /// Scenario S6: a 2x2 tangle matrix `[[10,1],[1,10]]` with
    /// `low=2, high=6` should detangle cleanly into two connect edges.
    #[test]
    fn two_by_two_significant_tangle_detangles_vertex() {
        let mut mg = InMemoryMarkerGraph::new();
        // Interior ids used by the tangle matrix lookups.
        let in0_interior = MarkerGraphEdgeId(100);
        let in1_interior = MarkerGraphEdgeId(101);
        let out0_interior = MarkerGraphEdgeId(200);
        let out1_interior = MarkerGraphEdgeId(201);
        for id in [in0_interior, in1_interior, out0_interior, out1_interior] {
            mg.add_edge(
                id,
                MarkerGraphEdgeRecord {
                    source: MarkerGraphVertexId(0),
                    target: MarkerGraphVertexId(0),
                    coverage: 10,
                    marker_intervals: vec![],
                },
            );
        }
        mg.set_pair_info(in0_interior, out0_interior, MarkerGraphEdgePairInfo { common: 10, offset_in_bases: 0, corrected_jaccard: 1.0 });
        mg.set_pair_info(in0_interior, out1_interior, MarkerGraphEdgePairInfo { common: 1, offset_in_bases: 0, corrected_jaccard: 0.1 });
        mg.set_pair_info(in1_interior, out0_interior, MarkerGraphEdgePairInfo { common: 1, offset_in_bases: 0, corrected_jaccard: 0.1 });
        mg.set_pair_info(in1_interior, out1_interior, MarkerGraphEdgePairInfo { common: 10, offset_in_bases: 0, corrected_jaccard: 1.0 });

        let mut cpg = CompressedPathGraph::default();
        let v = cpg.new_vertex(MarkerGraphEdgeId(999));
        let src0 = cpg.new_vertex(MarkerGraphEdgeId(1));
        let src1 = cpg.new_vertex(MarkerGraphEdgeId(2));
        let dst0 = cpg.new_vertex(MarkerGraphEdgeId(3));
        let dst1 = cpg.new_vertex(MarkerGraphEdgeId(4));

        let in0 = cpg.add_edge(src0, v, BubbleChain::new(vec![Bubble::haploid(chain_of(&[1, 100, 999]))]), 0);
        let in1 = cpg.add_edge(src1, v, BubbleChain::new(vec![Bubble::haploid(chain_of(&[2, 101, 999]))]), 0);
        let out0 = cpg.add_edge(v, dst0, BubbleChain::new(vec![Bubble::haploid(chain_of(&[999, 200, 3]))]), 0);
        let out1 = cpg.add_edge(v, dst1, BubbleChain::new(vec![Bubble::haploid(chain_of(&[999, 201, 4]))]), 0);

        let detangled = detangle_vertex(&mut cpg, &mg, v, 2, 6);
        assert!(detangled);
        assert!(cpg.edges[in0.0].removed);
        assert!(cpg.edges[in1.0].removed);
        assert!(cpg.edges[out0.0].removed);
        assert!(cpg.edges[out1.0].removed);
        assert_eq!(cpg.out_degree(v), 0);
        assert_eq!(cpg.in_degree(v), 0);
    }

    #[test]
    fn ambiguous_matrix_is_a_no_op() {
        let mut mg = InMemoryMarkerGraph::new();
        let a0 = MarkerGraphEdgeId(100);
        let a1 = MarkerGraphEdgeId(101);
        let b = MarkerGraphEdgeId(200);
        for id in [a0, a1, b] {
            mg.add_edge(id, MarkerGraphEdgeRecord { source: MarkerGraphVertexId(0), target: MarkerGraphVertexId(0), coverage: 10, marker_intervals: vec![] });
        }
        mg.set_pair_info(a0, b, MarkerGraphEdgePairInfo { common: 10, offset_in_bases: 0, corrected_jaccard: 1.0 });
        mg.set_pair_info(a1, b, MarkerGraphEdgePairInfo { common: 4, offset_in_bases: 0, corrected_jaccard: 0.5 });

        let mut cpg = CompressedPathGraph::default();
        let v = cpg.new_vertex(MarkerGraphEdgeId(999));
        let src0 = cpg.new_vertex(MarkerGraphEdgeId(1));
        let src1 = cpg.new_vertex(MarkerGraphEdgeId(2));
        let dst = cpg.new_vertex(MarkerGraphEdgeId(3));
        cpg.add_edge(src0, v, BubbleChain::new(vec![Bubble::haploid(chain_of(&[1, 100, 999]))]), 0);
        cpg.add_edge(src1, v, BubbleChain::new(vec![Bubble::haploid(chain_of(&[2, 101, 999]))]), 0);
        cpg.add_edge(v, dst, BubbleChain::new(vec![Bubble::haploid(chain_of(&[999, 200, 3]))]), 0);

        assert!(!detangle_vertex(&mut cpg, &mg, v, 2, 6));
    }

    proptest! {
        /// A tangle matrix with every entry ambiguous (strictly between `low`
        /// and `high`) has no significant entry and, by construction, no
        /// negligible entry either; `apply_if_significant` gates on both
        /// (spec §4.F steps 3-4), so it must leave every in/out edge
        /// untouched regardless of matrix shape.
        #[test]
        fn ambiguous_only_matrix_is_always_a_no_op(
            rows in 1usize..4,
            cols in 1usize..4,
            values in proptest::collection::vec(3u64..6, 16),
        ) {
            let (low, high) = (2u64, 6u64);
            let mut matrix = vec![vec![0u64; cols]; rows];
            let mut values = values.into_iter().cycle();
            for row in matrix.iter_mut() {
                for cell in row.iter_mut() {
                    *cell = values.next().unwrap();
                }
            }

            let mut cpg = CompressedPathGraph::default();
            let v = cpg.new_vertex(MarkerGraphEdgeId(9999));
            let in_edges: Vec<CpgEdgeIndex> = (0..rows)
                .map(|r| {
                    let src = cpg.new_vertex(MarkerGraphEdgeId(1000 + r as u64));
                    cpg.add_edge(src, v, BubbleChain::new(vec![Bubble::haploid(chain_of(&[1000 + r as u64, 9999]))]), 0)
                })
                .collect();
            let out_edges: Vec<CpgEdgeIndex> = (0..cols)
                .map(|c| {
                    let dst = cpg.new_vertex(MarkerGraphEdgeId(2000 + c as u64));
                    cpg.add_edge(v, dst, BubbleChain::new(vec![Bubble::haploid(chain_of(&[9999, 2000 + c as u64]))]), 0)
                })
                .collect();

            let removed_before: Vec<bool> = cpg.edges.iter().map(|e| e.removed).collect();
            let detangled = apply_if_significant(&mut cpg, &matrix, &in_edges, &out_edges, low, high);
            prop_assert!(!detangled);
            let removed_after: Vec<bool> = cpg.edges.iter().map(|e| e.removed).collect();
            prop_assert_eq!(removed_before, removed_after);
        }
    }
}
