//! Structural edit primitives on a CompressedPathGraph (spec §4.E):
//! `cloneAndTruncateAt{End,Beginning}`, `splitBubbleChainAt{Beginning,End}`,
//! `connect`, `compress`. Used directly by edits below and by the detangler.
use crate::error::{CpgError, CpgResult};
use crate::types::{Bubble, BubbleChain, Chain, CompressedPathGraph, CpgEdgeIndex, CpgVertexIndex};
use fnv::FnvHashMap;
use tracing::trace;

/// Adds an edge whose BubbleChain is a single haploid Bubble with a
/// length-2 Chain `[id(u), id(v)]`.
pub fn connect(cpg: &mut CompressedPathGraph, u: CpgVertexIndex, v: CpgVertexIndex) -> CpgEdgeIndex {
    let chain = Chain::new(vec![
        cpg.vertices[u.0].marker_graph_edge_id,
        cpg.vertices[v.0].marker_graph_edge_id,
    ]);
    cpg.add_edge(u, v, BubbleChain::single_haploid(chain), 0)
}

/// Duplicates `e`, removing the last `MarkerGraphEdgeId` from the last
/// Chain of its BubbleChain. If the chain would fall below length 2, the
/// whole trailing Bubble is dropped instead. Returns the new dangling
/// target vertex, or the edge's own source vertex if nothing could be
/// removed (a length-2 single-bubble chain has no interior to shed).
pub fn clone_and_truncate_at_end(
    cpg: &mut CompressedPathGraph,
    e: CpgEdgeIndex,
) -> CpgResult<CpgVertexIndex> {
    let edge = cpg.edges[e.0].clone();
    let last_bubble = edge.bubble_chain.bubbles.last().expect("BubbleChain is never empty");
    if !last_bubble.is_haploid() {
        return Err(CpgError::NotHaploid(e));
    }

    let mut truncated = edge.bubble_chain.clone();
    let last = truncated.bubbles.len() - 1;
    let last_chain_len = truncated.bubbles[last].chains()[0].len();

    if truncated.bubbles.len() == 1 && last_chain_len == 2 {
        return Ok(edge.source);
    }
    if last_chain_len == 2 {
        truncated.bubbles.pop();
    } else if let Bubble::Haploid(chain) = &mut truncated.bubbles[last] {
        chain.edges.pop();
    }

    let new_target = cpg.new_vertex(truncated.last());
    cpg.add_edge(edge.source, new_target, truncated, edge.average_offset);
    Ok(new_target)
}

/// Symmetric to [`clone_and_truncate_at_end`]: removes the first
/// `MarkerGraphEdgeId` from the first Chain, returning the new dangling
/// source vertex (or the edge's target vertex if nothing could be removed).
pub fn clone_and_truncate_at_beginning(
    cpg: &mut CompressedPathGraph,
    e: CpgEdgeIndex,
) -> CpgResult<CpgVertexIndex> {
    let edge = cpg.edges[e.0].clone();
    let first_bubble = edge.bubble_chain.bubbles.first().expect("BubbleChain is never empty");
    if !first_bubble.is_haploid() {
        return Err(CpgError::NotHaploid(e));
    }

    let mut truncated = edge.bubble_chain.clone();
    let first_chain_len = truncated.bubbles[0].chains()[0].len();

    if truncated.bubbles.len() == 1 && first_chain_len == 2 {
        return Ok(edge.target);
    }
    if first_chain_len == 2 {
        truncated.bubbles.remove(0);
    } else if let Bubble::Haploid(chain) = &mut truncated.bubbles[0] {
        chain.edges.remove(0);
    }

    let new_source = cpg.new_vertex(truncated.first());
    cpg.add_edge(new_source, edge.target, truncated, edge.average_offset);
    Ok(new_source)
}

/// When the first Bubble of `e`'s BubbleChain is non-haploid, splits it so
/// each of its Chains becomes its own parallel edge, leaving the remainder
/// of the bubble chain (if any) as a single edge from a fresh intermediate
/// vertex. `e` is removed.
pub fn split_bubble_chain_at_beginning(cpg: &mut CompressedPathGraph, e: CpgEdgeIndex) {
    let edge = cpg.edges[e.0].clone();
    let first_bubble = edge.bubble_chain.bubbles[0].clone();
    if first_bubble.is_haploid() {
        return;
    }

    let source = edge.source;
    let target = edge.target;

    if edge.bubble_chain.bubbles.len() > 1 {
        let remainder = BubbleChain::new(edge.bubble_chain.bubbles[1..].to_vec());
        let intermediate = cpg.new_vertex(remainder.first());
        cpg.add_edge(intermediate, target, remainder, edge.average_offset);
        for chain in first_bubble.chains() {
            let single = BubbleChain::single_haploid(chain.clone());
            cpg.add_edge(source, intermediate, single, 0);
        }
    } else {
        for chain in first_bubble.chains() {
            let single = BubbleChain::single_haploid(chain.clone());
            cpg.add_edge(source, target, single, 0);
        }
    }

    cpg.edges[e.0].removed = true;
}

/// Symmetric to [`split_bubble_chain_at_beginning`] on the last Bubble.
pub fn split_bubble_chain_at_end(cpg: &mut CompressedPathGraph, e: CpgEdgeIndex) {
    let edge = cpg.edges[e.0].clone();
    let last_idx = edge.bubble_chain.bubbles.len() - 1;
    let last_bubble = edge.bubble_chain.bubbles[last_idx].clone();
    if last_bubble.is_haploid() {
        return;
    }

    let source = edge.source;
    let target = edge.target;

    if edge.bubble_chain.bubbles.len() > 1 {
        let remainder = BubbleChain::new(edge.bubble_chain.bubbles[..last_idx].to_vec());
        let intermediate = cpg.new_vertex(remainder.last());
        cpg.add_edge(source, intermediate, remainder, edge.average_offset);
        for chain in last_bubble.chains() {
            let single = BubbleChain::single_haploid(chain.clone());
            cpg.add_edge(intermediate, target, single, 0);
        }
    } else {
        for chain in last_bubble.chains() {
            let single = BubbleChain::single_haploid(chain.clone());
            cpg.add_edge(source, target, single, 0);
        }
    }

    cpg.edges[e.0].removed = true;
}

/// Repeats until a fixed point: merges parallel single-bubble edges between
/// the same `(u,v)` into a combined Bubble (ploidy adds), then collapses
/// linear chains of CPG edges into a single edge whose BubbleChain is the
/// concatenation (spec §4.E `compress`). Idempotent (spec §8).
pub fn compress(cpg: &mut CompressedPathGraph) {
    let mut passes = 0;
    loop {
        let merged = merge_parallel_edges(cpg);
        let collapsed = collapse_linear_chains(cpg);
        passes += 1;
        if !merged && !collapsed {
            break;
        }
    }
    trace!(passes, edges = cpg.edges.iter().filter(|e| !e.removed).count(), "compress reached fixed point");
}

fn merge_parallel_edges(cpg: &mut CompressedPathGraph) -> bool {
    let mut groups: FnvHashMap<(CpgVertexIndex, CpgVertexIndex), Vec<CpgEdgeIndex>> =
        FnvHashMap::default();
    for (i, edge) in cpg.edges.iter().enumerate() {
        if edge.removed {
            continue;
        }
        if edge.bubble_chain.bubbles.len() == 1 {
            groups
                .entry((edge.source, edge.target))
                .or_default()
                .push(CpgEdgeIndex(i));
        }
    }

    let mut changed = false;
    let mut keys: Vec<_> = groups.keys().copied().collect();
    keys.sort_by_key(|&(u, v)| (u.0, v.0));
    for key in keys {
        let indices = &groups[&key];
        if indices.len() < 2 {
            continue;
        }
        let mut chains = Vec::new();
        for &ei in indices {
            chains.extend(cpg.edges[ei.0].bubble_chain.bubbles[0].chains().iter().cloned());
        }
        let merged_bubble = Bubble::from_chains(chains);
        let merged_chain = BubbleChain::new(vec![merged_bubble]);
        cpg.add_edge(key.0, key.1, merged_chain, 0);
        for &ei in indices {
            cpg.edges[ei.0].removed = true;
        }
        changed = true;
    }
    changed
}

fn collapse_linear_chains(cpg: &mut CompressedPathGraph) -> bool {
    let n = cpg.vertices.len();
    let mut changed = false;
    for v in 0..n {
        let v = CpgVertexIndex(v);
        let out: Vec<_> = cpg.live_out_edges(v).collect();
        let in_: Vec<_> = cpg.live_in_edges(v).collect();
        if out.len() != 1 || in_.len() != 1 {
            continue;
        }
        let in_edge = in_[0];
        let out_edge = out[0];
        if in_edge == out_edge {
            continue; // self-loop; nothing to collapse.
        }
        if cpg.edges[in_edge.0].source == cpg.edges[out_edge.0].target {
            continue; // would create a trivial cycle edge; leave it alone.
        }

        let mut bubbles = cpg.edges[in_edge.0].bubble_chain.bubbles.clone();
        bubbles.extend(cpg.edges[out_edge.0].bubble_chain.bubbles.clone());
        let combined = BubbleChain::new(bubbles);
        let source = cpg.edges[in_edge.0].source;
        let target = cpg.edges[out_edge.0].target;
        let average_offset =
            cpg.edges[in_edge.0].average_offset + cpg.edges[out_edge.0].average_offset;
        cpg.add_edge(source, target, combined, average_offset);
        cpg.edges[in_edge.0].removed = true;
        cpg.edges[out_edge.0].removed = true;
        changed = true;
    }
    changed
}

#[cfg(test)]
mod test {
    use super::*;
    use proptest::prelude::*;
    use shasta_types::MarkerGraphEdgeId;

    fn chain_of(ids: &[u64]) -> Chain {
        Chain::new(ids.iter().map(|&i| MarkerGraphEdgeId(i)).collect())
    }

    #[test]
    fn connect_creates_length_two_haploid_chain() {
        let mut cpg = CompressedPathGraph::default();
        let u = cpg.new_vertex(MarkerGraphEdgeId(0));
        let v = cpg.new_vertex(MarkerGraphEdgeId(1));
        let e = connect(&mut cpg, u, v);
        let chain = cpg.edges[e.0].bubble_chain.bubbles[0].chains()[0].clone();
        assert_eq!(chain.edges, vec![MarkerGraphEdgeId(0), MarkerGraphEdgeId(1)]);
    }

    #[test]
    fn clone_and_truncate_at_end_shortens_long_chain() {
        let mut cpg = CompressedPathGraph::default();
        let u = cpg.new_vertex(MarkerGraphEdgeId(0));
        let v = cpg.new_vertex(MarkerGraphEdgeId(2));
        let chain = chain_of(&[0, 1, 2]);
        let e = cpg.add_edge(u, v, BubbleChain::single_haploid(chain), 0);
        let new_target = clone_and_truncate_at_end(&mut cpg, e).unwrap();
        assert_eq!(
            cpg.vertices[new_target.0].marker_graph_edge_id,
            MarkerGraphEdgeId(1)
        );
    }

    #[test]
    fn clone_and_truncate_at_end_on_minimal_chain_returns_source() {
        let mut cpg = CompressedPathGraph::default();
        let u = cpg.new_vertex(MarkerGraphEdgeId(0));
        let v = cpg.new_vertex(MarkerGraphEdgeId(1));
        let chain = chain_of(&[0, 1]);
        let e = cpg.add_edge(u, v, BubbleChain::single_haploid(chain), 0);
        let result = clone_and_truncate_at_end(&mut cpg, e).unwrap();
        assert_eq!(result, u);
    }

    #[test]
    fn split_bubble_chain_at_end_creates_parallel_edges() {
        let mut cpg = CompressedPathGraph::default();
        let u = cpg.new_vertex(MarkerGraphEdgeId(0));
        let v = cpg.new_vertex(MarkerGraphEdgeId(3));
        let bubble = Bubble::Polyploid(vec![chain_of(&[0, 1, 3]), chain_of(&[0, 2, 3])]);
        let e = cpg.add_edge(u, v, BubbleChain::new(vec![bubble]), 0);
        split_bubble_chain_at_end(&mut cpg, e);
        assert!(cpg.edges[e.0].removed);
        let live: Vec<_> = cpg.live_out_edges(u).collect();
        assert_eq!(live.len(), 2);
    }

    #[test]
    fn compress_merges_parallel_single_bubble_edges() {
        let mut cpg = CompressedPathGraph::default();
        let u = cpg.new_vertex(MarkerGraphEdgeId(0));
        let v = cpg.new_vertex(MarkerGraphEdgeId(3));
        cpg.add_edge(u, v, BubbleChain::single_haploid(chain_of(&[0, 1, 3])), 0);
        cpg.add_edge(u, v, BubbleChain::single_haploid(chain_of(&[0, 2, 3])), 0);
        compress(&mut cpg);
        let live: Vec<_> = cpg.live_out_edges(u).collect();
        assert_eq!(live.len(), 1);
        assert_eq!(cpg.edges[live[0].0].bubble_chain.bubbles[0].ploidy(), 2);
    }

    #[test]
    fn compress_collapses_linear_run_of_cpg_edges() {
        let mut cpg = CompressedPathGraph::default();
        let a = cpg.new_vertex(MarkerGraphEdgeId(0));
        let b = cpg.new_vertex(MarkerGraphEdgeId(1));
        let c = cpg.new_vertex(MarkerGraphEdgeId(2));
        cpg.add_edge(a, b, BubbleChain::single_haploid(chain_of(&[0, 1])), 0);
        cpg.add_edge(b, c, BubbleChain::single_haploid(chain_of(&[1, 2])), 0);
        compress(&mut cpg);
        let live: Vec<_> = cpg.live_out_edges(a).collect();
        assert_eq!(live.len(), 1);
        assert_eq!(
            cpg.edges[live[0].0].bubble_chain.bubbles[0].chains()[0].edges,
            vec![MarkerGraphEdgeId(0), MarkerGraphEdgeId(1), MarkerGraphEdgeId(2)]
        );
    }

    proptest! {
        /// `compress` reaches a fixed point (spec §8): once a chain of any
        /// length has been compressed down to its single CPG edge, running
        /// `compress` again must leave every live edge's BubbleChain alone.
        #[test]
        fn compress_is_idempotent(len in 2usize..15) {
            let mut cpg = CompressedPathGraph::default();
            let vertices: Vec<_> = (0..len)
                .map(|i| cpg.new_vertex(MarkerGraphEdgeId(i as u64)))
                .collect();
            for w in vertices.windows(2) {
                connect(&mut cpg, w[0], w[1]);
            }

            compress(&mut cpg);
            let before: Vec<BubbleChain> = cpg
                .edges
                .iter()
                .filter(|e| !e.removed)
                .map(|e| e.bubble_chain.clone())
                .collect();

            compress(&mut cpg);
            let after: Vec<BubbleChain> = cpg
                .edges
                .iter()
                .filter(|e| !e.removed)
                .map(|e| e.bubble_chain.clone())
                .collect();

            prop_assert_eq!(before, after);
        }
    }
}
