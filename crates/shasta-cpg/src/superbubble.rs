//! Superbubbles (spec §3 "Superbubble", §4.E "Superbubble removal"): maximal
//! sets of CPG vertices connected through short-offset edges, with a single
//! entrance and exit collapsible into one connecting edge.
use crate::ops::connect;
use crate::types::{CompressedPathGraph, CpgEdgeIndex, CpgVertexIndex};
use fnv::FnvHashSet;
use shasta_types::MarkerGraph;
use std::collections::VecDeque;

pub struct Superbubble {
    pub vertices: FnvHashSet<CpgVertexIndex>,
}

impl Superbubble {
    pub fn contains(&self, v: CpgVertexIndex) -> bool {
        self.vertices.contains(&v)
    }

    pub fn external_in_edges(&self, cpg: &CompressedPathGraph) -> Vec<CpgEdgeIndex> {
        let mut result = Vec::new();
        for &v in &self.vertices {
            for e in cpg.live_in_edges(v) {
                if !self.contains(cpg.edges[e.0].source) {
                    result.push(e);
                }
            }
        }
        result
    }

    pub fn external_out_edges(&self, cpg: &CompressedPathGraph) -> Vec<CpgEdgeIndex> {
        let mut result = Vec::new();
        for &v in &self.vertices {
            for e in cpg.live_out_edges(v) {
                if !self.contains(cpg.edges[e.0].target) {
                    result.push(e);
                }
            }
        }
        result
    }

    /// Superbubble vertices with at least one in-edge from outside.
    pub fn entrances(&self, cpg: &CompressedPathGraph) -> Vec<CpgVertexIndex> {
        self.vertices
            .iter()
            .copied()
            .filter(|&v| cpg.live_in_edges(v).any(|e| !self.contains(cpg.edges[e.0].source)))
            .collect()
    }

    /// Superbubble vertices with at least one out-edge to outside.
    pub fn exits(&self, cpg: &CompressedPathGraph) -> Vec<CpgVertexIndex> {
        self.vertices
            .iter()
            .copied()
            .filter(|&v| cpg.live_out_edges(v).any(|e| !self.contains(cpg.edges[e.0].target)))
            .collect()
    }
}

/// Connected components, in the undirected sense, of CPG vertices joined by
/// a live edge whose BubbleChain average offset is <= `max_offset1`.
/// Components of size 1 are not superbubbles.
pub fn find_superbubbles(cpg: &CompressedPathGraph, max_offset1: i64) -> Vec<Superbubble> {
    let n = cpg.vertices.len();
    let mut visited = vec![false; n];
    let mut undirected_neighbors: Vec<Vec<usize>> = vec![Vec::new(); n];
    for edge in &cpg.edges {
        if edge.removed || edge.average_offset > max_offset1 {
            continue;
        }
        undirected_neighbors[edge.source.0].push(edge.target.0);
        undirected_neighbors[edge.target.0].push(edge.source.0);
    }

    let mut superbubbles = Vec::new();
    for start in 0..n {
        if visited[start] {
            continue;
        }
        let mut component = Vec::new();
        let mut queue = VecDeque::new();
        visited[start] = true;
        queue.push_back(start);
        while let Some(v) = queue.pop_front() {
            component.push(v);
            for &next in &undirected_neighbors[v] {
                if !visited[next] {
                    visited[next] = true;
                    queue.push_back(next);
                }
            }
        }
        if component.len() > 1 {
            superbubbles.push(Superbubble {
                vertices: component.into_iter().map(CpgVertexIndex).collect(),
            });
        }
    }
    superbubbles
}

/// Removes every superbubble with exactly one entrance and one exit whose
/// estimated entrance-to-exit offset is <= `max_offset2` and has positive
/// common-read count, replacing its interior with a single connecting edge.
/// Returns the number of superbubbles removed.
pub fn remove_short_superbubbles<G: MarkerGraph>(
    cpg: &mut CompressedPathGraph,
    marker_graph: &G,
    max_offset1: i64,
    max_offset2: i64,
) -> usize {
    let superbubbles = find_superbubbles(cpg, max_offset1);
    let mut removed_count = 0;

    for superbubble in &superbubbles {
        let entrances = superbubble.entrances(cpg);
        let exits = superbubble.exits(cpg);
        if entrances.len() != 1 || exits.len() != 1 {
            continue;
        }
        let entrance = entrances[0];
        let exit = exits[0];
        if entrance == exit {
            continue;
        }

        let entrance_id = cpg.vertices[entrance.0].marker_graph_edge_id;
        let exit_id = cpg.vertices[exit.0].marker_graph_edge_id;
        let info = marker_graph.analyze_edge_pair(entrance_id, exit_id);
        if info.common == 0 || info.offset_in_bases > max_offset2 {
            continue;
        }

        for &v in &superbubble.vertices {
            if v != entrance && v != exit {
                for e in cpg.out_adjacency[v.0].clone() {
                    cpg.edges[e.0].removed = true;
                }
                for e in cpg.in_adjacency[v.0].clone() {
                    cpg.edges[e.0].removed = true;
                }
            }
        }
        for e in cpg.live_out_edges(entrance).collect::<Vec<_>>() {
            if cpg.edges[e.0].target == exit {
                cpg.edges[e.0].removed = true;
            }
        }
        for e in cpg.live_out_edges(exit).collect::<Vec<_>>() {
            if cpg.edges[e.0].target == entrance {
                cpg.edges[e.0].removed = true;
            }
        }

        connect(cpg, entrance, exit);
        removed_count += 1;
    }

    removed_count
}
