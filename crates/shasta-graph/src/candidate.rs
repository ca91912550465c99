//! Component C — candidate generator (spec §4.C).
use fnv::FnvHashSet;
use rayon::prelude::*;
use shasta_align::{align, Align4Options};
use shasta_types::{JourneyTable, KmerId, MarkerGraph, MarkerGraphEdgeId};
use std::collections::VecDeque;
use std::sync::Mutex;

/// An ordered candidate pair `(u, v)` of primary marker-graph edges with
/// co-occurrence support.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CandidatePair {
    pub u: MarkerGraphEdgeId,
    pub v: MarkerGraphEdgeId,
}

/// Generates candidate pairs from journey adjacency within
/// `max_distance_in_journey` steps (spec §4.C condition (i)).
pub fn candidates_from_journey_adjacency(
    journeys: &JourneyTable,
    max_distance_in_journey: usize,
) -> FnvHashSet<CandidatePair> {
    let mut pairs = FnvHashSet::default();
    for oriented_read_id in journeys.oriented_read_ids() {
        let journey = journeys
            .journey(oriented_read_id)
            .expect("oriented_read_ids only yields reads with a journey");
        let edges = journey.as_slice();
        for i in 0..edges.len() {
            let max_j = (i + max_distance_in_journey + 1).min(edges.len());
            for j in (i + 1)..max_j {
                if edges[i] != edges[j] {
                    pairs.insert(CandidatePair {
                        u: edges[i],
                        v: edges[j],
                    });
                }
            }
        }
    }
    pairs
}

/// Generates candidate pairs by a constrained forward walk on the marker
/// graph: from each primary edge `u`, BFS forward through
/// marker-graph edges (bounded by `max_hops`, gated on coverage) and emit
/// `(u, v)` for the first primary edge `v` reached on each path (spec §4.C
/// condition (ii)).
pub fn candidates_from_forward_walk<G: MarkerGraph>(
    marker_graph: &G,
    primary_edges: &FnvHashSet<MarkerGraphEdgeId>,
    min_walk_coverage: u64,
    max_hops: usize,
) -> FnvHashSet<CandidatePair> {
    // Each primary edge's forward walk is independent (spec §5 "Alignment
    // candidate enumeration ... sharded by candidate pair"); sharded over
    // `primary_edges`, merged under a single lock like `JourneyTable::build`.
    let ordered: Vec<MarkerGraphEdgeId> = primary_edges.iter().copied().collect();
    let pairs: Mutex<FnvHashSet<CandidatePair>> = Mutex::new(FnvHashSet::default());

    ordered.par_iter().for_each(|&u| {
        let Some(record) = marker_graph.edge(u) else {
            return;
        };
        let mut visited = FnvHashSet::default();
        let mut queue: VecDeque<(MarkerGraphEdgeId, usize)> = VecDeque::new();
        let mut local = FnvHashSet::default();
        for &next in marker_graph.edges_by_source(record.target) {
            queue.push_back((next, 1));
        }
        while let Some((edge_id, depth)) = queue.pop_front() {
            if depth > max_hops || !visited.insert(edge_id) {
                continue;
            }
            if marker_graph.edge_coverage(edge_id) < min_walk_coverage {
                continue;
            }
            if primary_edges.contains(&edge_id) {
                if edge_id != u {
                    local.insert(CandidatePair { u, v: edge_id });
                }
                continue;
            }
            if let Some(next_record) = marker_graph.edge(edge_id) {
                for &next in marker_graph.edges_by_source(next_record.target) {
                    queue.push_back((next, depth + 1));
                }
            }
        }
        if !local.is_empty() {
            pairs.lock().unwrap().extend(local);
        }
    });
    pairs.into_inner().unwrap()
}

/// Generates candidate pairs by running Align4 over pairs of journeys that
/// share at least one marker-graph edge, treating each journey's
/// `MarkerGraphEdgeId` sequence as a marker sequence (spec's control-flow
/// note that the candidate generator is fed by Align4, "A -> (C <- B)").
/// Consecutive entries of the resulting alignment chain become candidate
/// pairs, giving a second, alignment-based source of support beyond raw
/// journey adjacency.
pub fn candidates_from_journey_alignment(
    journeys: &JourneyTable,
    read_a: shasta_types::OrientedReadId,
    read_b: shasta_types::OrientedReadId,
    opts: &Align4Options,
) -> FnvHashSet<CandidatePair> {
    let mut pairs = FnvHashSet::default();
    let (Some(journey_a), Some(journey_b)) = (journeys.journey(read_a), journeys.journey(read_b))
    else {
        return pairs;
    };
    let kmer_ids_a: Vec<KmerId> = journey_a
        .as_slice()
        .iter()
        .map(|e| KmerId(e.0))
        .collect();
    let kmer_ids_b: Vec<KmerId> = journey_b
        .as_slice()
        .iter()
        .map(|e| KmerId(e.0))
        .collect();
    let sorted_a = shasta_types::marker::sort_markers_by_kmer_id(
        &kmer_ids_a
            .iter()
            .enumerate()
            .map(|(i, &k)| shasta_types::Marker::new(k, i as u32, 0))
            .collect::<Vec<_>>(),
    );
    let sorted_b = shasta_types::marker::sort_markers_by_kmer_id(
        &kmer_ids_b
            .iter()
            .enumerate()
            .map(|(i, &k)| shasta_types::Marker::new(k, i as u32, 0))
            .collect::<Vec<_>>(),
    );
    let Some((alignment, _info)) = align(
        [&kmer_ids_a, &kmer_ids_b],
        [&sorted_a, &sorted_b],
        opts,
    ) else {
        return pairs;
    };
    for window in alignment.matches.windows(2) {
        let (x0, _) = window[0];
        let (x1, _) = window[1];
        let u = journey_a.as_slice()[x0 as usize];
        let v = journey_a.as_slice()[x1 as usize];
        if u != v {
            pairs.insert(CandidatePair { u, v });
        }
    }
    pairs
}

#[cfg(test)]
mod test {
    use super::*;
    use shasta_types::collaborators::MarkerGraphEdgeRecord;
    use shasta_types::memory::InMemoryMarkerGraph;
    use shasta_types::{MarkerGraphVertexId, ReadId, Strand};

    #[test]
    fn journey_adjacency_respects_distance_bound() {
        let read = shasta_types::OrientedReadId::new(ReadId(0), Strand::Forward);
        let mut mg = InMemoryMarkerGraph::new();
        let edges: Vec<MarkerGraphEdgeId> = (0..5).map(MarkerGraphEdgeId).collect();
        for (i, &e) in edges.iter().enumerate() {
            mg.add_edge(
                e,
                MarkerGraphEdgeRecord {
                    source: MarkerGraphVertexId(i as u64),
                    target: MarkerGraphVertexId(i as u64 + 1),
                    coverage: 10,
                    marker_intervals: vec![(read, (i as u32, i as u32 + 1))],
                },
            );
        }
        let journeys = JourneyTable::build(&mg);
        let pairs = candidates_from_journey_adjacency(&journeys, 1);
        assert!(pairs.contains(&CandidatePair {
            u: edges[0],
            v: edges[1]
        }));
        assert!(!pairs.contains(&CandidatePair {
            u: edges[0],
            v: edges[2]
        }));
    }
}
