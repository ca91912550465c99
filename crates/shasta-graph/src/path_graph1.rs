//! Component D — PathGraph1: directed graph over primary marker-graph edges
//! (spec §4.D, §3 "PathGraph1 vertex"/"PathGraph1 edge").
use crate::candidate::CandidatePair;
use crate::options::PathGraph1Options;
use fnv::{FnvHashMap, FnvHashSet};
use shasta_types::{MarkerGraph, MarkerGraphEdgeId, MarkerGraphEdgePairInfo};
use std::collections::VecDeque;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VertexIndex(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EdgeIndex(pub usize);

#[derive(Debug, Clone, Copy)]
pub struct Vertex {
    pub marker_graph_edge_id: MarkerGraphEdgeId,
    pub component: usize,
}

#[derive(Debug, Clone)]
pub struct Edge {
    pub source: VertexIndex,
    pub target: VertexIndex,
    pub info: MarkerGraphEdgePairInfo,
    /// Set by `transitive_reduction`: `false` means an equivalent indirect
    /// path exists and this edge should be filtered out of downstream
    /// passes (spec §4.D step 4 — the edge is *marked*, never removed).
    pub is_transitive_reduction_survivor: bool,
    pub removed: bool,
}

/// Directed multigraph over primary marker-graph edges, with an index-based
/// representation (spec §9 Design Notes) to keep structural edits cheap and
/// avoid reference-counted cycles.
#[derive(Debug, Clone, Default)]
pub struct PathGraph1 {
    pub vertices: Vec<Vertex>,
    pub edges: Vec<Edge>,
    pub out_adjacency: Vec<Vec<EdgeIndex>>,
    pub in_adjacency: Vec<Vec<EdgeIndex>>,
    vertex_by_edge_id: FnvHashMap<MarkerGraphEdgeId, VertexIndex>,
}

impl PathGraph1 {
    pub fn vertex_for_edge_id(&self, edge_id: MarkerGraphEdgeId) -> Option<VertexIndex> {
        self.vertex_by_edge_id.get(&edge_id).copied()
    }

    pub fn out_degree(&self, v: VertexIndex) -> usize {
        self.out_adjacency[v.0]
            .iter()
            .filter(|&&ei| !self.edges[ei.0].removed)
            .count()
    }

    pub fn in_degree(&self, v: VertexIndex) -> usize {
        self.in_adjacency[v.0]
            .iter()
            .filter(|&&ei| !self.edges[ei.0].removed)
            .count()
    }

    pub fn live_out_edges(&self, v: VertexIndex) -> impl Iterator<Item = EdgeIndex> + '_ {
        self.out_adjacency[v.0]
            .iter()
            .copied()
            .filter(move |&ei| !self.edges[ei.0].removed)
    }

    pub fn live_in_edges(&self, v: VertexIndex) -> impl Iterator<Item = EdgeIndex> + '_ {
        self.in_adjacency[v.0]
            .iter()
            .copied()
            .filter(move |&ei| !self.edges[ei.0].removed)
    }

    /// Counts vertices per `component` label, sorted by decreasing size
    /// (ties broken by ascending component id for determinism).
    pub fn component_sizes(&self) -> Vec<(usize, usize)> {
        let mut sizes: FnvHashMap<usize, usize> = FnvHashMap::default();
        for v in &self.vertices {
            *sizes.entry(v.component).or_insert(0) += 1;
        }
        let mut sizes: Vec<(usize, usize)> = sizes.into_iter().collect();
        sizes.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        sizes
    }

    /// Splits the graph into one independent `PathGraph1` per connected
    /// component, dropping components smaller than `min_component_size`
    /// (spec §4.D step 3: "Keep components of size >= `minComponentSize`
    /// ... remaining processing is per-component"). Components are
    /// extracted in `component_sizes` order (decreasing size, ties by
    /// ascending component id) so that downstream parallel per-component
    /// processing can merge results back in a fixed, deterministic order.
    pub fn split_into_components(&self, min_component_size: usize) -> Vec<PathGraph1> {
        self.component_sizes()
            .into_iter()
            .filter(|&(_, size)| size >= min_component_size)
            .map(|(component_id, _)| self.extract_component(component_id))
            .collect()
    }

    fn extract_component(&self, component_id: usize) -> PathGraph1 {
        let mut graph = PathGraph1::default();
        let mut old_to_new: FnvHashMap<usize, VertexIndex> = FnvHashMap::default();
        for (old_index, v) in self.vertices.iter().enumerate() {
            if v.component != component_id {
                continue;
            }
            let new_index = VertexIndex(graph.vertices.len());
            old_to_new.insert(old_index, new_index);
            graph.vertices.push(Vertex {
                marker_graph_edge_id: v.marker_graph_edge_id,
                component: 0,
            });
            graph.out_adjacency.push(Vec::new());
            graph.in_adjacency.push(Vec::new());
            graph
                .vertex_by_edge_id
                .insert(v.marker_graph_edge_id, new_index);
        }
        for e in &self.edges {
            if e.removed {
                continue;
            }
            let (Some(&source), Some(&target)) =
                (old_to_new.get(&e.source.0), old_to_new.get(&e.target.0))
            else {
                continue;
            };
            let new_index = EdgeIndex(graph.edges.len());
            graph.edges.push(Edge {
                source,
                target,
                info: e.info,
                is_transitive_reduction_survivor: e.is_transitive_reduction_survivor,
                removed: false,
            });
            graph.out_adjacency[source.0].push(new_index);
            graph.in_adjacency[target.0].push(new_index);
        }
        graph
    }
}

/// An edge is primary (spec §3 "PathGraph1 vertex" invariant) iff:
/// - its coverage lies in `[minPrimaryCoverage, maxPrimaryCoverage]`,
/// - it carries no duplicate oriented reads,
/// - its source and target marker-graph vertices carry no duplicate
///   oriented reads,
/// - it is a branch edge: at least one incident marker-graph vertex has
///   more than one primary outgoing/incoming edge.
pub fn select_primary_edges<G: MarkerGraph>(
    marker_graph: &G,
    opts: &PathGraph1Options,
) -> FnvHashSet<MarkerGraphEdgeId> {
    let coverage_ok: Vec<MarkerGraphEdgeId> = marker_graph
        .all_edge_ids()
        .into_iter()
        .filter(|&edge_id| {
            let coverage = marker_graph.edge_coverage(edge_id);
            if coverage < opts.min_primary_coverage || coverage > opts.max_primary_coverage {
                return false;
            }
            if marker_graph.edge_has_duplicate_oriented_read_ids(edge_id) {
                return false;
            }
            let Some(record) = marker_graph.edge(edge_id) else {
                return false;
            };
            !marker_graph.vertex_has_duplicate_oriented_read_ids(record.source)
                && !marker_graph.vertex_has_duplicate_oriented_read_ids(record.target)
        })
        .collect();

    let coverage_ok_set: FnvHashSet<MarkerGraphEdgeId> = coverage_ok.iter().copied().collect();

    let mut out_degree: FnvHashMap<_, usize> = FnvHashMap::default();
    let mut in_degree: FnvHashMap<_, usize> = FnvHashMap::default();
    for &edge_id in &coverage_ok {
        let record = marker_graph.edge(edge_id).unwrap();
        *out_degree.entry(record.source).or_insert(0) += 1;
        *in_degree.entry(record.target).or_insert(0) += 1;
    }

    coverage_ok_set
        .into_iter()
        .filter(|&edge_id| {
            let record = marker_graph.edge(edge_id).unwrap();
            out_degree.get(&record.source).copied().unwrap_or(0) > 1
                || in_degree.get(&record.target).copied().unwrap_or(0) > 1
        })
        .collect()
}

/// Builds PathGraph1 from a marker graph and a set of candidate pairs (spec
/// §4.D steps 1-3): selects primary-edge vertices, creates edges for
/// candidate pairs whose `MarkerGraphEdgePairInfo` clears the coverage and
/// corrected-Jaccard thresholds, then labels connected components (largest
/// first).
pub fn build<G: MarkerGraph>(
    marker_graph: &G,
    candidates: &FnvHashSet<CandidatePair>,
    opts: &PathGraph1Options,
) -> PathGraph1 {
    let primary = select_primary_edges(marker_graph, opts);
    let mut ordered_primary: Vec<MarkerGraphEdgeId> = primary.iter().copied().collect();
    ordered_primary.sort();

    let mut vertex_by_edge_id = FnvHashMap::default();
    let mut vertices = Vec::with_capacity(ordered_primary.len());
    for (i, &edge_id) in ordered_primary.iter().enumerate() {
        vertex_by_edge_id.insert(edge_id, VertexIndex(i));
        vertices.push(Vertex {
            marker_graph_edge_id: edge_id,
            component: usize::MAX,
        });
    }

    let mut edges = Vec::new();
    let mut sorted_candidates: Vec<&CandidatePair> = candidates.iter().collect();
    sorted_candidates.sort_by_key(|p| (p.u, p.v));
    for pair in sorted_candidates {
        let (Some(&u), Some(&v)) = (
            vertex_by_edge_id.get(&pair.u),
            vertex_by_edge_id.get(&pair.v),
        ) else {
            continue;
        };
        let info = marker_graph.analyze_edge_pair(pair.u, pair.v);
        if info.common >= opts.min_edge_coverage && info.corrected_jaccard >= opts.min_corrected_jaccard
        {
            edges.push(Edge {
                source: u,
                target: v,
                info,
                is_transitive_reduction_survivor: true,
                removed: false,
            });
        }
    }

    let mut out_adjacency = vec![Vec::new(); vertices.len()];
    let mut in_adjacency = vec![Vec::new(); vertices.len()];
    for (i, edge) in edges.iter().enumerate() {
        out_adjacency[edge.source.0].push(EdgeIndex(i));
        in_adjacency[edge.target.0].push(EdgeIndex(i));
    }

    let mut graph = PathGraph1 {
        vertices,
        edges,
        out_adjacency,
        in_adjacency,
        vertex_by_edge_id,
    };
    label_connected_components(&mut graph);
    debug!(
        vertices = graph.vertices.len(),
        edges = graph.edges.len(),
        "PathGraph1 constructed"
    );
    graph
}

fn label_connected_components(graph: &mut PathGraph1) {
    let n = graph.vertices.len();
    let mut component_of = vec![usize::MAX; n];
    let mut next_component = 0usize;
    for start in 0..n {
        if component_of[start] != usize::MAX {
            continue;
        }
        let mut queue = VecDeque::new();
        queue.push_back(start);
        component_of[start] = next_component;
        while let Some(v) = queue.pop_front() {
            for &ei in &graph.out_adjacency[v] {
                let w = graph.edges[ei.0].target.0;
                if component_of[w] == usize::MAX {
                    component_of[w] = next_component;
                    queue.push_back(w);
                }
            }
            for &ei in &graph.in_adjacency[v] {
                let w = graph.edges[ei.0].source.0;
                if component_of[w] == usize::MAX {
                    component_of[w] = next_component;
                    queue.push_back(w);
                }
            }
        }
        next_component += 1;
    }
    for (v, c) in graph.vertices.iter_mut().zip(component_of) {
        v.component = c;
    }
}

/// Local transitive reduction (spec §4.D step 4): for each edge `u -> v`,
/// marks it as a non-transitive-reduction-survivor if an alternative `u ->
/// ... -> v` path exists whose total base offset is within
/// `transitiveReductionDistance` of the direct offset and whose
/// intermediate vertex coverages are all `<=
/// transitiveReductionMaxCoverage`.
pub fn transitive_reduction<G: MarkerGraph>(
    graph: &mut PathGraph1,
    marker_graph: &G,
    opts: &PathGraph1Options,
) {
    let direct_targets: Vec<(usize, VertexIndex, VertexIndex, i64)> = graph
        .edges
        .iter()
        .enumerate()
        .filter(|(_, e)| !e.removed)
        .map(|(i, e)| (i, e.source, e.target, e.info.offset_in_bases))
        .collect();

    for (edge_idx, source, target, direct_offset) in direct_targets {
        let mut found = false;
        // Bounded DFS over alternate paths from `source`, skipping the
        // direct edge itself.
        let mut stack: Vec<(VertexIndex, i64)> = graph
            .out_adjacency[source.0]
            .iter()
            .filter(|&&ei| ei.0 != edge_idx && !graph.edges[ei.0].removed)
            .map(|&ei| (graph.edges[ei.0].target, graph.edges[ei.0].info.offset_in_bases))
            .collect();
        let mut visited = FnvHashSet::default();
        while let Some((current, accumulated_offset)) = stack.pop() {
            if current == target {
                if (accumulated_offset - direct_offset).abs()
                    <= opts.transitive_reduction_distance
                {
                    found = true;
                    break;
                }
                continue;
            }
            if !visited.insert(current) {
                continue;
            }
            let coverage = marker_graph.edge_coverage(graph.vertices[current.0].marker_graph_edge_id);
            if coverage > opts.transitive_reduction_max_coverage {
                continue;
            }
            for &ei in &graph.out_adjacency[current.0] {
                if graph.edges[ei.0].removed {
                    continue;
                }
                stack.push((
                    graph.edges[ei.0].target,
                    accumulated_offset + graph.edges[ei.0].info.offset_in_bases,
                ));
            }
        }
        graph.edges[edge_idx].is_transitive_reduction_survivor = !found;
    }
}

/// Cross-edge removal (spec §4.D step 5): an edge `u -> v` is a cross edge
/// if every in-edge of `u` and out-edge of `v` has high coverage, the edge
/// itself has low coverage, and its base offset is large.
pub fn remove_cross_edges<G: MarkerGraph>(
    graph: &mut PathGraph1,
    marker_graph: &G,
    opts: &PathGraph1Options,
) {
    let candidates: Vec<usize> = graph
        .edges
        .iter()
        .enumerate()
        .filter(|(_, e)| !e.removed)
        .filter(|(_, e)| {
            e.info.common <= opts.cross_edges_low_coverage_threshold
                && e.info.offset_in_bases >= opts.cross_edges_min_offset
        })
        .map(|(i, _)| i)
        .collect();

    for edge_idx in candidates {
        let source = graph.edges[edge_idx].source;
        let target = graph.edges[edge_idx].target;
        let in_edges_high_coverage = graph
            .live_in_edges(source)
            .filter(|&ei| ei.0 != edge_idx)
            .all(|ei| graph.edges[ei.0].info.common >= opts.cross_edges_high_coverage_threshold);
        let out_edges_high_coverage = graph
            .live_out_edges(target)
            .filter(|&ei| ei.0 != edge_idx)
            .all(|ei| graph.edges[ei.0].info.common >= opts.cross_edges_high_coverage_threshold);
        let has_other_in = graph.live_in_edges(source).any(|ei| ei.0 != edge_idx);
        let has_other_out = graph.live_out_edges(target).any(|ei| ei.0 != edge_idx);
        if has_other_in && has_other_out && in_edges_high_coverage && out_edges_high_coverage {
            graph.edges[edge_idx].removed = true;
        }
    }
}

/// k-NN thinning (spec §4.D "k-NN thinning"): for each vertex, keep only
/// the top `k` outgoing and incoming edges by corrected Jaccard.
pub fn knn_thin(graph: &mut PathGraph1, k: usize) {
    for v in 0..graph.vertices.len() {
        thin_edge_set(graph, &graph.out_adjacency[v].clone(), k);
        thin_edge_set(graph, &graph.in_adjacency[v].clone(), k);
    }
}

fn thin_edge_set(graph: &mut PathGraph1, edge_indices: &[EdgeIndex], k: usize) {
    let mut live: Vec<EdgeIndex> = edge_indices
        .iter()
        .copied()
        .filter(|&ei| !graph.edges[ei.0].removed)
        .collect();
    if live.len() <= k {
        return;
    }
    live.sort_by(|&a, &b| {
        graph.edges[b.0]
            .info
            .corrected_jaccard
            .partial_cmp(&graph.edges[a.0].info.corrected_jaccard)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    for &ei in &live[k..] {
        graph.edges[ei.0].removed = true;
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use shasta_types::collaborators::MarkerGraphEdgeRecord;
    use shasta_types::memory::InMemoryMarkerGraph;
    use shasta_types::MarkerGraphVertexId;

    fn chain_graph(n: u64) -> InMemoryMarkerGraph {
        let mut mg = InMemoryMarkerGraph::new();
        for i in 0..n {
            mg.add_edge(
                MarkerGraphEdgeId(i),
                MarkerGraphEdgeRecord {
                    source: MarkerGraphVertexId(i),
                    target: MarkerGraphVertexId(i + 1),
                    coverage: 10,
                    marker_intervals: vec![],
                },
            );
        }
        mg
    }

    #[test]
    fn branch_edges_required_for_primary_selection() {
        // A pure 1-in-1-out chain has no branch edges: none qualify as primary.
        let mg = chain_graph(5);
        let opts = PathGraph1Options {
            min_primary_coverage: 1,
            max_primary_coverage: 100,
            ..PathGraph1Options::default()
        };
        let primary = select_primary_edges(&mg, &opts);
        assert!(primary.is_empty());
    }

    #[test]
    fn branch_vertex_makes_both_branches_primary() {
        let mut mg = InMemoryMarkerGraph::new();
        let v0 = MarkerGraphVertexId(0);
        let v1 = MarkerGraphVertexId(1);
        let v2 = MarkerGraphVertexId(2);
        mg.add_edge(
            MarkerGraphEdgeId(0),
            MarkerGraphEdgeRecord {
                source: v0,
                target: v1,
                coverage: 10,
                marker_intervals: vec![],
            },
        );
        mg.add_edge(
            MarkerGraphEdgeId(1),
            MarkerGraphEdgeRecord {
                source: v0,
                target: v2,
                coverage: 10,
                marker_intervals: vec![],
            },
        );
        let opts = PathGraph1Options {
            min_primary_coverage: 1,
            max_primary_coverage: 100,
            ..PathGraph1Options::default()
        };
        let primary = select_primary_edges(&mg, &opts);
        assert_eq!(primary.len(), 2);
    }

    #[test]
    fn build_labels_connected_components() {
        let mut mg = InMemoryMarkerGraph::new();
        // Two disjoint branch structures, each contributing 2 primary edges.
        for base in [0u64, 100u64] {
            mg.add_edge(
                MarkerGraphEdgeId(base),
                MarkerGraphEdgeRecord {
                    source: MarkerGraphVertexId(base),
                    target: MarkerGraphVertexId(base + 1),
                    coverage: 10,
                    marker_intervals: vec![],
                },
            );
            mg.add_edge(
                MarkerGraphEdgeId(base + 1),
                MarkerGraphEdgeRecord {
                    source: MarkerGraphVertexId(base),
                    target: MarkerGraphVertexId(base + 2),
                    coverage: 10,
                    marker_intervals: vec![],
                },
            );
        }
        let opts = PathGraph1Options {
            min_primary_coverage: 1,
            max_primary_coverage: 100,
            ..PathGraph1Options::default()
        };
        let candidates = FnvHashSet::default();
        let graph = build(&mg, &candidates, &opts);
        assert_eq!(graph.vertices.len(), 4);
        let components: FnvHashSet<usize> = graph.vertices.iter().map(|v| v.component).collect();
        assert_eq!(components.len(), 2);
    }

    #[test]
    fn split_into_components_isolates_each_component_and_drops_small_ones() {
        let mut mg = InMemoryMarkerGraph::new();
        for base in [0u64, 100u64] {
            mg.add_edge(
                MarkerGraphEdgeId(base),
                MarkerGraphEdgeRecord {
                    source: MarkerGraphVertexId(base),
                    target: MarkerGraphVertexId(base + 1),
                    coverage: 10,
                    marker_intervals: vec![],
                },
            );
            mg.add_edge(
                MarkerGraphEdgeId(base + 1),
                MarkerGraphEdgeRecord {
                    source: MarkerGraphVertexId(base),
                    target: MarkerGraphVertexId(base + 2),
                    coverage: 10,
                    marker_intervals: vec![],
                },
            );
        }
        let opts = PathGraph1Options {
            min_primary_coverage: 1,
            max_primary_coverage: 100,
            ..PathGraph1Options::default()
        };
        let candidates = FnvHashSet::default();
        let graph = build(&mg, &candidates, &opts);

        let components = graph.split_into_components(2);
        assert_eq!(components.len(), 2);
        for component in &components {
            assert_eq!(component.vertices.len(), 2);
            assert!(component.vertices.iter().all(|v| v.component == 0));
            for edge in &component.edges {
                assert!(edge.source.0 < component.vertices.len());
                assert!(edge.target.0 < component.vertices.len());
            }
        }

        assert!(graph.split_into_components(3).is_empty());
    }
}
