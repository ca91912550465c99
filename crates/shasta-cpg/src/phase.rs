//! Phaser (spec §4.G): builds a PhasingGraph over the diploid bubbles of a
//! BubbleChain, classifies edges, extracts PhasedComponents by iterated
//! spanning-tree phasing, and rewrites the BubbleChain from the result.
use crate::types::{Bubble, BubbleChain, Chain};
use fnv::{FnvHashMap, FnvHashSet};
use shasta_types::MarkerGraph;
use std::collections::VecDeque;

/// Sign of a PhasingGraph edge (spec §9 "Sum types in place of runtime flags").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    InPhase,
    OutOfPhase,
}

impl Phase {
    pub fn sign(self) -> i8 {
        match self {
            Phase::InPhase => 1,
            Phase::OutOfPhase => -1,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PhasingEdge {
    /// Index into `PhasingGraph::positions`, not a `positionInBubbleChain`.
    pub i: usize,
    pub j: usize,
    pub phase: Phase,
    pub min_concordant: u64,
    pub max_discordant: u64,
}

#[derive(Debug, Clone)]
pub struct PhasingGraph {
    /// `positionInBubbleChain` for each vertex, ascending.
    pub positions: Vec<usize>,
    pub edges: Vec<PhasingEdge>,
}

/// One contiguous phased span of a BubbleChain (spec §3 "PhasedComponent"):
/// entries sorted by position, signs defined only up to a global flip.
#[derive(Debug, Clone)]
pub struct PhasedComponent {
    pub entries: Vec<(usize, i8)>,
}

impl PhasedComponent {
    pub fn min_position(&self) -> usize {
        self.entries.first().expect("PhasedComponent is never empty").0
    }

    pub fn max_position(&self) -> usize {
        self.entries.last().expect("PhasedComponent is never empty").0
    }
}

/// Builds the PhasingGraph for a BubbleChain's diploid bubbles: an edge
/// between `(a,b)`, `a<b`, is classified by the 2x2 tangle matrix between
/// the last-interior ids of bubble `a`'s two chains and the first-interior
/// ids of bubble `b`'s two chains.
pub fn build_phasing_graph<G: MarkerGraph>(
    bubble_chain: &BubbleChain,
    marker_graph: &G,
    low: u64,
    high: u64,
) -> PhasingGraph {
    let positions: Vec<usize> = bubble_chain.diploid_positions().collect();
    let mut edges = Vec::new();

    for a in 0..positions.len() {
        for b in (a + 1)..positions.len() {
            let chains_a = bubble_chain.bubbles[positions[a]].chains();
            let chains_b = bubble_chain.bubbles[positions[b]].chains();
            let mut m = [[0u64; 2]; 2];
            for (x, chain_a) in chains_a.iter().enumerate() {
                for (y, chain_b) in chains_b.iter().enumerate() {
                    let id0 = chain_a.last_interior();
                    let id1 = chain_b.first_interior();
                    m[x][y] = marker_graph.analyze_edge_pair(id0, id1).common;
                }
            }

            if m[0][0] >= high && m[1][1] >= high && m[0][1] <= low && m[1][0] <= low {
                edges.push(PhasingEdge {
                    i: a,
                    j: b,
                    phase: Phase::InPhase,
                    min_concordant: m[0][0].min(m[1][1]),
                    max_discordant: m[0][1].max(m[1][0]),
                });
            } else if m[0][1] >= high && m[1][0] >= high && m[0][0] <= low && m[1][1] <= low {
                edges.push(PhasingEdge {
                    i: a,
                    j: b,
                    phase: Phase::OutOfPhase,
                    min_concordant: m[0][1].min(m[1][0]),
                    // The original `TangleMatrix::analyze` computed this as
                    // `max(m[0][0], m[0][0])`, a likely duplicate-index bug
                    // (spec §9 Open Questions); treated here as the true
                    // maximum over both diagonal (discordant) entries.
                    max_discordant: m[0][0].max(m[1][1]),
                });
            }
        }
    }

    PhasingGraph { positions, edges }
}

fn find(parent: &mut [usize], x: usize) -> usize {
    if parent[x] != x {
        let root = find(parent, parent[x]);
        parent[x] = root;
    }
    parent[x]
}

/// Iterated spanning-tree phasing (spec §4.G): repeatedly builds an optimal
/// spanning forest over surviving vertices, phases its largest component by
/// a tree BFS sign flip, extracts the position-order longest path as a
/// PhasedComponent, then removes every vertex whose position falls in that
/// component's span before repeating.
pub fn phase_bubble_chain(graph: &PhasingGraph) -> Vec<PhasedComponent> {
    let n = graph.positions.len();
    let mut alive = vec![true; n];
    let mut components = Vec::new();

    loop {
        let alive_edges: Vec<&PhasingEdge> =
            graph.edges.iter().filter(|e| alive[e.i] && alive[e.j]).collect();
        if alive_edges.is_empty() {
            break;
        }

        let mut sorted_edges = alive_edges.clone();
        sorted_edges.sort_by(|a, b| {
            a.max_discordant
                .cmp(&b.max_discordant)
                .then(b.min_concordant.cmp(&a.min_concordant))
        });

        let mut parent: Vec<usize> = (0..n).collect();
        let mut tree_edges = Vec::new();
        for &e in &sorted_edges {
            let ri = find(&mut parent, e.i);
            let rj = find(&mut parent, e.j);
            if ri != rj {
                parent[ri] = rj;
                tree_edges.push(e);
            }
        }

        let mut groups: FnvHashMap<usize, Vec<usize>> = FnvHashMap::default();
        for v in 0..n {
            if alive[v] {
                groups.entry(find(&mut parent, v)).or_default().push(v);
            }
        }
        let Some(best) = groups.values().max_by_key(|m| m.len()).cloned() else {
            break;
        };
        if best.len() < 2 {
            break;
        }
        let root = find(&mut parent, best[0]);

        let mut sign: FnvHashMap<usize, i8> = FnvHashMap::default();
        sign.insert(best[0], 1);
        let mut adjacency: FnvHashMap<usize, Vec<(usize, Phase)>> = FnvHashMap::default();
        for &e in &tree_edges {
            if find(&mut parent, e.i) == root {
                adjacency.entry(e.i).or_default().push((e.j, e.phase));
                adjacency.entry(e.j).or_default().push((e.i, e.phase));
            }
        }
        let mut queue = VecDeque::new();
        queue.push_back(best[0]);
        while let Some(v) = queue.pop_front() {
            let s = sign[&v];
            if let Some(neighbors) = adjacency.get(&v) {
                for &(u, phase) in neighbors {
                    if !sign.contains_key(&u) {
                        let flipped = if phase == Phase::InPhase { s } else { -s };
                        sign.insert(u, flipped);
                        queue.push_back(u);
                    }
                }
            }
        }

        let mut members_sorted = best.clone();
        members_sorted.sort_by_key(|&v| graph.positions[v]);
        let component_set: FnvHashSet<usize> = best.iter().copied().collect();
        let component_edges: Vec<&PhasingEdge> = graph
            .edges
            .iter()
            .filter(|e| component_set.contains(&e.i) && component_set.contains(&e.j))
            .collect();

        let mut dp: FnvHashMap<usize, usize> = members_sorted.iter().map(|&v| (v, 1)).collect();
        let mut pred: FnvHashMap<usize, Option<usize>> =
            members_sorted.iter().map(|&v| (v, None)).collect();
        for &v in &members_sorted {
            for &e in &component_edges {
                if e.j == v {
                    let candidate = dp[&e.i] + 1;
                    if candidate > dp[&v] {
                        dp.insert(v, candidate);
                        pred.insert(v, Some(e.i));
                    }
                }
            }
        }
        let end = *members_sorted.iter().max_by_key(|&&v| dp[&v]).unwrap();
        let mut path = Vec::new();
        let mut cur = Some(end);
        while let Some(v) = cur {
            path.push(v);
            cur = pred[&v];
        }
        path.reverse();

        let entries: Vec<(usize, i8)> = path.iter().map(|&v| (graph.positions[v], sign[&v])).collect();
        let min_pos = entries.first().unwrap().0;
        let max_pos = entries.last().unwrap().0;
        components.push(PhasedComponent { entries });

        for v in 0..n {
            if alive[v]
                && (component_set.contains(&v)
                    || (graph.positions[v] >= min_pos && graph.positions[v] <= max_pos))
            {
                alive[v] = false;
            }
        }
    }

    components
}

/// Rewrites a BubbleChain given its PhasedComponents (spec §4.G "Rewrite").
/// Haploid bubbles and long non-haploid bubbles (offset >= `long_bubble_threshold`)
/// outside any PhasedComponent are emitted verbatim; short non-haploid
/// unphased bubbles collapse to a haploid chain of their shared endpoints;
/// each PhasedComponent becomes one diploid Bubble whose two chains
/// concatenate the selected side's interior ids across its member bubbles.
pub fn rewrite<G: MarkerGraph>(
    bubble_chain: &BubbleChain,
    marker_graph: &G,
    phased_components: &[PhasedComponent],
    long_bubble_threshold: i64,
) -> BubbleChain {
    let n = bubble_chain.bubbles.len();
    let mut owner: Vec<Option<usize>> = vec![None; n];
    for (ci, pc) in phased_components.iter().enumerate() {
        for &(pos, _) in &pc.entries {
            owner[pos] = Some(ci);
        }
    }

    let mut output = Vec::new();
    let mut i = 0;
    while i < n {
        if let Some(ci) = owner[i] {
            let pc = &phased_components[ci];
            let source_id = bubble_chain.bubbles[pc.entries[0].0].first();
            let target_id = bubble_chain.bubbles[pc.entries.last().unwrap().0].last();
            let mut side0 = vec![source_id];
            let mut side1 = vec![source_id];
            for &(pos, sign) in &pc.entries {
                let chains = bubble_chain.bubbles[pos].chains();
                let (selected, other) = if sign >= 0 { (0, 1) } else { (1, 0) };
                let interior_len = chains[selected].len().saturating_sub(2);
                side0.extend(chains[selected].edges[1..1 + interior_len].iter().copied());
                side1.extend(chains[other].edges[1..1 + interior_len].iter().copied());
            }
            side0.push(target_id);
            side1.push(target_id);
            output.push(Bubble::Polyploid(vec![Chain::new(side0), Chain::new(side1)]));
            i = pc.entries.last().unwrap().0 + 1;
        } else {
            let bubble = bubble_chain.bubbles[i].clone();
            if bubble.is_haploid() {
                output.push(bubble);
            } else {
                let offset = marker_graph
                    .analyze_edge_pair(bubble.first(), bubble.last())
                    .offset_in_bases;
                if offset >= long_bubble_threshold {
                    output.push(bubble);
                } else {
                    output.push(Bubble::haploid(Chain::new(vec![bubble.first(), bubble.last()])));
                }
            }
            i += 1;
        }
    }

    BubbleChain::new(squeeze_consecutive_haploid_bubbles(output))
}

/// Merges runs of consecutive haploid Bubbles into one, concatenating their
/// Chains on the shared joining id (spec §4.G "After rewrite, call
/// `compress()`"; universal invariant 4, spec §8: "After `compress()`, no
/// two consecutive haploid Bubbles appear"). `rewrite` can produce such a
/// run when a short unphased non-haploid bubble collapses to haploid right
/// next to an already-haploid neighbor.
fn squeeze_consecutive_haploid_bubbles(bubbles: Vec<Bubble>) -> Vec<Bubble> {
    let mut squeezed: Vec<Bubble> = Vec::with_capacity(bubbles.len());
    for bubble in bubbles {
        match (squeezed.last_mut(), bubble) {
            (Some(Bubble::Haploid(prev)), Bubble::Haploid(next)) => {
                let mut merged_edges = prev.edges.clone();
                merged_edges.extend(next.edges[1..].iter().copied());
                *prev = Chain::new(merged_edges);
            }
            (_, bubble) => squeezed.push(bubble),
        }
    }
    squeezed
}

#[cfg(test)]
mod test {
    use super::*;
    use shasta_types::collaborators::MarkerGraphEdgeRecord;
    use shasta_types::memory::InMemoryMarkerGraph;
    use shasta_types::{MarkerGraphEdgeId, MarkerGraphEdgePairInfo, MarkerGraphVertexId};

    fn chain_of(ids: &[u64]) -> Chain {
        Chain::new(ids.iter().map(|&i| MarkerGraphEdgeId(i)).collect())
    }

    fn add_dummy(mg: &mut InMemoryMarkerGraph, id: MarkerGraphEdgeId) {
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

    /// Scenario S3: two co-phased SNPs, 1kb apart, spanned by the same reads.
    #[test]
    fn two_co_phased_bubbles_form_one_phased_component() {
        let mut mg = InMemoryMarkerGraph::new();
        let (a0, a1, b0, b1) = (
            MarkerGraphEdgeId(10),
            MarkerGraphEdgeId(11),
            MarkerGraphEdgeId(20),
            MarkerGraphEdgeId(21),
        );
        for id in [a0, a1, b0, b1] {
            add_dummy(&mut mg, id);
        }
        mg.set_pair_info(a0, b0, MarkerGraphEdgePairInfo { common: 20, offset_in_bases: 1000, corrected_jaccard: 1.0 });
        mg.set_pair_info(a1, b1, MarkerGraphEdgePairInfo { common: 20, offset_in_bases: 1000, corrected_jaccard: 1.0 });
        mg.set_pair_info(a0, b1, MarkerGraphEdgePairInfo { common: 0, offset_in_bases: 1000, corrected_jaccard: 0.0 });
        mg.set_pair_info(a1, b0, MarkerGraphEdgePairInfo { common: 0, offset_in_bases: 1000, corrected_jaccard: 0.0 });

        let bubble_a = Bubble::Polyploid(vec![chain_of(&[1, a0.0, 2]), chain_of(&[1, a1.0, 2])]);
        let bubble_b = Bubble::Polyploid(vec![chain_of(&[2, b0.0, 3]), chain_of(&[2, b1.0, 3])]);
        let chain = BubbleChain::new(vec![bubble_a, bubble_b]);

        let graph = build_phasing_graph(&chain, &mg, 2, 10);
        assert_eq!(graph.edges.len(), 1);
        assert_eq!(graph.edges[0].phase, Phase::InPhase);

        let components = phase_bubble_chain(&graph);
        assert_eq!(components.len(), 1);
        assert_eq!(components[0].entries.len(), 2);
        assert_eq!(components[0].min_position(), 0);
        assert_eq!(components[0].max_position(), 1);
    }

    #[test]
    fn phased_components_have_disjoint_spans() {
        let mut mg = InMemoryMarkerGraph::new();
        let ids: Vec<MarkerGraphEdgeId> = (0..6).map(|i| MarkerGraphEdgeId(100 + i)).collect();
        for &id in &ids {
            add_dummy(&mut mg, id);
        }
        // Three independent diploid bubbles, no inter-bubble support at all:
        // each one stays unphased (ambiguous matrices never clear the bar).
        let bubbles = vec![
            Bubble::Polyploid(vec![chain_of(&[1, ids[0].0, 2]), chain_of(&[1, ids[1].0, 2])]),
            Bubble::Polyploid(vec![chain_of(&[2, ids[2].0, 3]), chain_of(&[2, ids[3].0, 3])]),
            Bubble::Polyploid(vec![chain_of(&[3, ids[4].0, 4]), chain_of(&[3, ids[5].0, 4])]),
        ];
        let chain = BubbleChain::new(bubbles);
        let graph = build_phasing_graph(&chain, &mg, 2, 10);
        let components = phase_bubble_chain(&graph);
        for i in 0..components.len() {
            for j in (i + 1)..components.len() {
                let a = &components[i];
                let b = &components[j];
                assert!(a.max_position() < b.min_position() || b.max_position() < a.min_position());
            }
        }
    }

    /// A short unphased diploid bubble collapses to haploid between two
    /// already-haploid neighbors; `rewrite` must squeeze all three into one
    /// haploid Bubble rather than leave consecutive haploid Bubbles behind.
    #[test]
    fn rewrite_squeezes_consecutive_haploid_bubbles() {
        let mg = InMemoryMarkerGraph::new();
        let short_diploid = Bubble::Polyploid(vec![
            chain_of(&[2, 100, 3]),
            chain_of(&[2, 101, 3]),
        ]);
        let chain = BubbleChain::new(vec![
            Bubble::haploid(chain_of(&[1, 2])),
            short_diploid,
            Bubble::haploid(chain_of(&[3, 4])),
        ]);

        let rewritten = rewrite(&chain, &mg, &[], 1000);

        assert_eq!(rewritten.bubbles.len(), 1);
        assert!(rewritten.bubbles[0].is_haploid());
        assert_eq!(
            rewritten.bubbles[0].chains()[0].edges,
            vec![MarkerGraphEdgeId(1), MarkerGraphEdgeId(2), MarkerGraphEdgeId(3), MarkerGraphEdgeId(4)]
        );
    }
}
