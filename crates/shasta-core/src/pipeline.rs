//! Orchestration of the graph-based assembly pipeline (spec §4.F
//! "Iteration"): candidate generation, PathGraph1 construction, initial
//! CompressedPathGraph construction, the detangle/phase iteration
//! sequence, and chain optimization/assembly.
use crate::config::Config;
use shasta_cpg::{
    detangle_back_edge, detangle_edge, detangle_short_superbubble, detangle_vertex,
    optimize_and_assemble_bubble_chain, CompressedPathGraph, CpgEdgeIndex, CpgVertexIndex,
};
use shasta_graph::{candidate, path_graph1};
use shasta_types::{JourneyTable, MarkerGraph, PathAssembler};
use rayon::prelude::*;
use tracing::{debug, info};

/// Builds candidate pairs from journey adjacency and constrained forward
/// walk (spec §4.C), then the PathGraph1 over them (spec §4.D).
fn build_path_graph1<G: MarkerGraph>(
    journeys: &JourneyTable,
    marker_graph: &G,
    config: &Config,
) -> shasta_graph::PathGraph1 {
    let mut candidates =
        candidate::candidates_from_journey_adjacency(journeys, config.candidate.max_distance_in_journey);

    let primary = path_graph1::select_primary_edges(marker_graph, &config.path_graph1);
    candidates.extend(candidate::candidates_from_forward_walk(
        marker_graph,
        &primary,
        config.candidate.min_walk_coverage,
        config.candidate.max_hops,
    ));
    info!(pairs = candidates.len(), "candidate pairs generated");

    let mut graph = path_graph1::build(marker_graph, &candidates, &config.path_graph1);
    path_graph1::transitive_reduction(&mut graph, marker_graph, &config.path_graph1);
    path_graph1::remove_cross_edges(&mut graph, marker_graph, &config.path_graph1);
    if let Some(k) = config.path_graph1.knn_k {
        path_graph1::knn_thin(&mut graph, k);
    }
    info!(
        vertices = graph.vertices.len(),
        edges = graph.edges.len(),
        "PathGraph1 built"
    );
    graph
}

/// One sweep of `detangle_vertex` over every CPG vertex. Returns whether any
/// vertex changed.
fn detangle_vertex_pass<G: MarkerGraph>(cpg: &mut CompressedPathGraph, marker_graph: &G, low: u64, high: u64) -> bool {
    let mut changed = false;
    for i in 0..cpg.vertices.len() {
        if detangle_vertex(cpg, marker_graph, CpgVertexIndex(i), low, high) {
            changed = true;
        }
    }
    changed
}

/// One sweep of `detangle_edge` over every live CPG edge present at the
/// start of the sweep.
fn detangle_edge_pass<G: MarkerGraph>(cpg: &mut CompressedPathGraph, marker_graph: &G, low: u64, high: u64) -> bool {
    let mut changed = false;
    let n = cpg.edges.len();
    for i in 0..n {
        if cpg.edges[i].removed {
            continue;
        }
        if detangle_edge(cpg, marker_graph, CpgEdgeIndex(i), low, high) {
            changed = true;
        }
    }
    changed
}

/// Finds each live `v -> u` edge that closes a back-edge cycle against a
/// live `u -> v` edge and detangles it (spec §4.F "Back-edge detangling").
fn detangle_back_edge_pass<G: MarkerGraph>(cpg: &mut CompressedPathGraph, marker_graph: &G, low: u64, high: u64) -> bool {
    let mut changed = false;
    let n = cpg.edges.len();
    for i in 0..n {
        if cpg.edges[i].removed {
            continue;
        }
        let u = cpg.edges[i].source;
        let v = cpg.edges[i].target;
        let back = cpg.live_out_edges(v).find(|&ei| cpg.edges[ei.0].target == u && ei.0 != i);
        if let Some(back_edge) = back {
            if detangle_back_edge(cpg, marker_graph, back_edge, u, v, low, high) {
                changed = true;
            }
        }
    }
    changed
}

/// Runs `remove_short_superbubbles` for every `(maxOffset1, maxOffset2)`
/// scale in order (spec §4.F "short-superbubble removal at ... size
/// scales").
fn superbubble_removal_sweep<G: MarkerGraph>(cpg: &mut CompressedPathGraph, marker_graph: &G, scales: &[(i64, i64)]) {
    for &(max_offset1, max_offset2) in scales {
        let removed = shasta_cpg::remove_short_superbubbles(cpg, marker_graph, max_offset1, max_offset2);
        debug!(removed, max_offset1, max_offset2, "superbubble removal scale");
    }
}

/// Detangles every short superbubble found at `max_offset1` (spec §4.F
/// "short-superbubble detangle").
fn superbubble_detangle_sweep<G: MarkerGraph>(cpg: &mut CompressedPathGraph, marker_graph: &G, max_offset1: i64, low: u64, high: u64) {
    let superbubbles = shasta_cpg::find_superbubbles(cpg, max_offset1);
    for superbubble in &superbubbles {
        detangle_short_superbubble(cpg, marker_graph, superbubble, low, high);
    }
}

/// Phases every live CPG edge's BubbleChain (spec §4.G) and recompresses
/// (spec §4.G "After rewrite, call `compress()`").
fn phase_pass<G: MarkerGraph>(cpg: &mut CompressedPathGraph, marker_graph: &G, config: &Config) {
    for edge in cpg.edges.iter_mut() {
        if edge.removed {
            continue;
        }
        let graph = shasta_cpg::build_phasing_graph(
            &edge.bubble_chain,
            marker_graph,
            config.cpg.phasing_threshold_low,
            config.cpg.phasing_threshold_high,
        );
        let components = shasta_cpg::phase_bubble_chain(&graph);
        edge.bubble_chain = shasta_cpg::rewrite(
            &edge.bubble_chain,
            marker_graph,
            &components,
            config.cpg.long_bubble_threshold,
        );
    }
    shasta_cpg::compress(cpg);
}

/// Reassigns `CpgEdgeId`s to every live edge by ascending source vertex
/// index, then edge slot index, for deterministic final output (spec §5
/// "Ordering guarantees", §9 "renumbered once before final output"). Called
/// once, after per-component CPGs have been merged, since per-component ids
/// assigned during construction are only unique within their own component.
fn renumber_edges(cpg: &mut CompressedPathGraph) {
    let mut live: Vec<usize> = (0..cpg.edges.len()).filter(|&i| !cpg.edges[i].removed).collect();
    live.sort_by_key(|&i| (cpg.edges[i].source.0, i));
    for (new_id, i) in live.into_iter().enumerate() {
        cpg.edges[i].id = shasta_cpg::CpgEdgeId(new_id as u64);
    }
}

/// Optimizes and assembles every live edge's BubbleChain (spec §4.H), one
/// CPG at a time. Each edge's chain is independent, so this is sharded
/// across the shared `rayon` pool (spec §5 "per component work uses
/// par_iter").
fn optimize_and_assemble<G: MarkerGraph, A: PathAssembler>(
    cpg: &mut CompressedPathGraph,
    marker_graph: &G,
    assembler: &A,
    config: &Config,
) {
    let live_edges: Vec<usize> = (0..cpg.edges.len()).filter(|&i| !cpg.edges[i].removed).collect();
    let mut bubble_chains: Vec<shasta_cpg::BubbleChain> = live_edges
        .iter()
        .map(|&i| std::mem::replace(&mut cpg.edges[i].bubble_chain, shasta_cpg::BubbleChain::default()))
        .collect();
    bubble_chains.par_iter_mut().for_each(|bubble_chain| {
        optimize_and_assemble_bubble_chain(
            bubble_chain,
            marker_graph,
            assembler,
            config.cpg.optimize_chains_min_common,
            config.cpg.optimize_chains_k,
        );
    });
    for (i, bubble_chain) in live_edges.into_iter().zip(bubble_chains) {
        cpg.edges[i].bubble_chain = bubble_chain;
    }
}

/// Runs the full detangle/phase iteration sequence (spec §4.F
/// "Iteration") over a freshly constructed CompressedPathGraph, in place.
fn iterate<G: MarkerGraph>(cpg: &mut CompressedPathGraph, marker_graph: &G, config: &Config) {
    let low = config.cpg.detangle_tolerance_low;
    let high = config.cpg.detangle_tolerance_high;
    let scales = &config.cpg.superbubble_removal_max_offsets;

    shasta_cpg::compress(cpg);

    if scales.len() >= 4 {
        superbubble_removal_sweep(cpg, marker_graph, &scales[0..4]);
    } else {
        superbubble_removal_sweep(cpg, marker_graph, scales);
    }

    for round in 0..config.iteration.max_detangle_rounds {
        let mut changed = detangle_vertex_pass(cpg, marker_graph, low, high);
        changed |= detangle_edge_pass(cpg, marker_graph, low, high);
        changed |= detangle_edge_pass(cpg, marker_graph, low, high);
        changed |= detangle_back_edge_pass(cpg, marker_graph, low, high);
        changed |= detangle_vertex_pass(cpg, marker_graph, low, high);
        shasta_cpg::compress(cpg);
        debug!(round, changed, "detangle round");
        if !changed {
            break;
        }
    }

    phase_pass(cpg, marker_graph, config);

    if scales.len() >= 4 {
        superbubble_detangle_sweep(cpg, marker_graph, scales[2].0, low, high);
        superbubble_detangle_sweep(cpg, marker_graph, scales[3].0, low, high);
    }
    shasta_cpg::compress(cpg);

    let long_scale = scales.last().copied().unwrap_or((30_000, 100_000));
    for round in 0..config.iteration.max_phase_alternation_rounds {
        phase_pass(cpg, marker_graph, config);
        let removed = shasta_cpg::remove_short_superbubbles(cpg, marker_graph, long_scale.0, long_scale.1);
        debug!(round, removed, "phase/long-superbubble alternation");
        if removed == 0 {
            break;
        }
    }
    phase_pass(cpg, marker_graph, config);
}

/// Runs the whole pipeline: candidate generation through chain
/// optimization and assembly. Returns the finished CompressedPathGraph,
/// ready for `shasta_io` output.
///
/// PathGraph1 is split into connected components, dropping any below
/// `minComponentSize` (spec §4.D step 3); each surviving component yields
/// an independent CompressedPathGraph that is built, iterated and
/// assembled without touching any other component's state, so the whole
/// per-component pipeline runs on the shared `rayon` pool (spec §3/§5
/// "Each PathGraph1 connected component yields an independent CPG ...
/// mutated in parallel"). Components are merged back in the fixed order
/// `split_into_components` produces before the single final edge-id
/// renumbering pass, keeping output deterministic.
pub fn run<G: MarkerGraph, A: PathAssembler>(
    journeys: &JourneyTable,
    marker_graph: &G,
    assembler: &A,
    config: &Config,
) -> CompressedPathGraph {
    let path_graph = build_path_graph1(journeys, marker_graph, config);
    let components = path_graph.split_into_components(config.path_graph1.min_component_size);
    info!(
        components = components.len(),
        min_component_size = config.path_graph1.min_component_size,
        "PathGraph1 split into components"
    );

    let component_cpgs: Vec<CompressedPathGraph> = components
        .par_iter()
        .map(|component| {
            let mut cpg = shasta_cpg::build(component);
            iterate(&mut cpg, marker_graph, config);
            optimize_and_assemble(&mut cpg, marker_graph, assembler, config);
            cpg
        })
        .collect();

    let mut cpg = CompressedPathGraph::merge_components(component_cpgs);
    renumber_edges(&mut cpg);

    info!(edges = cpg.edges.iter().filter(|e| !e.removed).count(), "pipeline complete");
    cpg
}

#[cfg(test)]
mod test {
    use super::*;
    use shasta_types::collaborators::MarkerGraphEdgeRecord;
    use shasta_types::memory::{InMemoryMarkerGraph, PlaceholderPathAssembler};
    use shasta_types::{MarkerGraphEdgeId, MarkerGraphEdgePairInfo, MarkerGraphVertexId, OrientedReadId, ReadId, Strand};

    #[test]
    fn empty_marker_graph_produces_empty_assembly() {
        let marker_graph = InMemoryMarkerGraph::new();
        let journeys = JourneyTable::build(&marker_graph);
        let assembler = PlaceholderPathAssembler;
        let cpg = run(&journeys, &marker_graph, &assembler, &Config::default());
        assert!(cpg.edges.is_empty());
    }

    /// Two haplotype paths through a diamond (e1->e3 and e2->e4), each
    /// branching at a shared vertex, give `select_primary_edges` a branch
    /// point on both ends so all four edges become PathGraph1 vertices.
    #[test]
    fn diamond_marker_graph_assembles_two_chains() {
        let mut mg = InMemoryMarkerGraph::new();
        let e1 = MarkerGraphEdgeId(1);
        let e2 = MarkerGraphEdgeId(2);
        let e3 = MarkerGraphEdgeId(3);
        let e4 = MarkerGraphEdgeId(4);
        let v0 = MarkerGraphVertexId(0);
        let v1 = MarkerGraphVertexId(1);
        let v2 = MarkerGraphVertexId(2);
        let v3 = MarkerGraphVertexId(3);

        let reads_a: Vec<OrientedReadId> = (0..6)
            .map(|i| OrientedReadId::new(ReadId(i), Strand::Forward))
            .collect();
        let reads_b: Vec<OrientedReadId> = (6..12)
            .map(|i| OrientedReadId::new(ReadId(i), Strand::Forward))
            .collect();

        let interval_a_start: Vec<_> = reads_a.iter().map(|&r| (r, (0u32, 1u32))).collect();
        let interval_a_end: Vec<_> = reads_a.iter().map(|&r| (r, (1u32, 2u32))).collect();
        let interval_b_start: Vec<_> = reads_b.iter().map(|&r| (r, (0u32, 1u32))).collect();
        let interval_b_end: Vec<_> = reads_b.iter().map(|&r| (r, (1u32, 2u32))).collect();

        mg.add_edge(e1, MarkerGraphEdgeRecord { source: v0, target: v1, coverage: 6, marker_intervals: interval_a_start.clone() });
        mg.add_edge(e2, MarkerGraphEdgeRecord { source: v0, target: v2, coverage: 6, marker_intervals: interval_b_start.clone() });
        mg.add_edge(e3, MarkerGraphEdgeRecord { source: v1, target: v3, coverage: 6, marker_intervals: interval_a_end.clone() });
        mg.add_edge(e4, MarkerGraphEdgeRecord { source: v2, target: v3, coverage: 6, marker_intervals: interval_b_end.clone() });

        mg.set_pair_info(e1, e3, MarkerGraphEdgePairInfo { common: 6, offset_in_bases: 1000, corrected_jaccard: 0.9 });
        mg.set_pair_info(e2, e4, MarkerGraphEdgePairInfo { common: 6, offset_in_bases: 1000, corrected_jaccard: 0.9 });

        let journeys = JourneyTable::build(&mg);
        let assembler = PlaceholderPathAssembler;
        // Each haplotype is its own 2-vertex connected component; the
        // default minComponentSize (4) would drop both.
        let config = Config {
            path_graph1: shasta_graph::PathGraph1Options {
                min_component_size: 2,
                ..Config::default().path_graph1
            },
            ..Config::default()
        };
        let cpg = run(&journeys, &mg, &assembler, &config);

        assert!(cpg.check_invariants().is_ok());
        let live: Vec<_> = cpg.edges.iter().filter(|e| !e.removed).collect();
        assert_eq!(live.len(), 2);
        for edge in live {
            for bubble in &edge.bubble_chain.bubbles {
                for chain in bubble.chains() {
                    assert!(chain.sequence.is_some());
                }
            }
        }
    }

    /// Same diamond marker graph as above, but `minComponentSize` is left
    /// large enough that both 2-vertex components get dropped before any
    /// CPG is built at all.
    #[test]
    fn components_below_min_size_are_dropped_entirely() {
        let mut mg = InMemoryMarkerGraph::new();
        let e1 = MarkerGraphEdgeId(1);
        let e2 = MarkerGraphEdgeId(2);
        let e3 = MarkerGraphEdgeId(3);
        let e4 = MarkerGraphEdgeId(4);
        let v0 = MarkerGraphVertexId(0);
        let v1 = MarkerGraphVertexId(1);
        let v2 = MarkerGraphVertexId(2);
        let v3 = MarkerGraphVertexId(3);

        let reads_a: Vec<OrientedReadId> = (0..6)
            .map(|i| OrientedReadId::new(ReadId(i), Strand::Forward))
            .collect();
        let reads_b: Vec<OrientedReadId> = (6..12)
            .map(|i| OrientedReadId::new(ReadId(i), Strand::Forward))
            .collect();

        let interval_a_start: Vec<_> = reads_a.iter().map(|&r| (r, (0u32, 1u32))).collect();
        let interval_a_end: Vec<_> = reads_a.iter().map(|&r| (r, (1u32, 2u32))).collect();
        let interval_b_start: Vec<_> = reads_b.iter().map(|&r| (r, (0u32, 1u32))).collect();
        let interval_b_end: Vec<_> = reads_b.iter().map(|&r| (r, (1u32, 2u32))).collect();

        mg.add_edge(e1, MarkerGraphEdgeRecord { source: v0, target: v1, coverage: 6, marker_intervals: interval_a_start });
        mg.add_edge(e2, MarkerGraphEdgeRecord { source: v0, target: v2, coverage: 6, marker_intervals: interval_b_start });
        mg.add_edge(e3, MarkerGraphEdgeRecord { source: v1, target: v3, coverage: 6, marker_intervals: interval_a_end });
        mg.add_edge(e4, MarkerGraphEdgeRecord { source: v2, target: v3, coverage: 6, marker_intervals: interval_b_end });

        mg.set_pair_info(e1, e3, MarkerGraphEdgePairInfo { common: 6, offset_in_bases: 1000, corrected_jaccard: 0.9 });
        mg.set_pair_info(e2, e4, MarkerGraphEdgePairInfo { common: 6, offset_in_bases: 1000, corrected_jaccard: 0.9 });

        let journeys = JourneyTable::build(&mg);
        let assembler = PlaceholderPathAssembler;
        let cpg = run(&journeys, &mg, &assembler, &Config::default());

        assert!(cpg.edges.is_empty());
    }
}
