//! Initial CompressedPathGraph construction from PathGraph1 (spec §4.E
//! "Initial construction").
use crate::types::{BubbleChain, Chain, CompressedPathGraph, CpgVertexIndex};
use shasta_graph::{PathGraph1, VertexIndex};
use shasta_types::MarkerGraphEdgeId;

/// Finds maximal linear runs of vertices (in-degree = out-degree = 1)
/// restricted to transitive-reduction-surviving, non-removed edges, and
/// turns each into a CPG edge whose BubbleChain is a single haploid Bubble
/// containing a single Chain (the concatenated `MarkerGraphEdgeId`
/// sequence of the run, including both endpoints). CPG vertices are
/// created on demand for the endpoints.
pub fn build(path_graph: &PathGraph1) -> CompressedPathGraph {
    let mut cpg = CompressedPathGraph::default();
    let live = |e: &shasta_graph::Edge| !e.removed && e.is_transitive_reduction_survivor;

    let out_degree = |v: VertexIndex| {
        path_graph.out_adjacency[v.0]
            .iter()
            .filter(|&&ei| live(&path_graph.edges[ei.0]))
            .count()
    };
    let in_degree = |v: VertexIndex| {
        path_graph.in_adjacency[v.0]
            .iter()
            .filter(|&&ei| live(&path_graph.edges[ei.0]))
            .count()
    };
    let single_out = |v: VertexIndex| {
        path_graph.out_adjacency[v.0]
            .iter()
            .copied()
            .find(|&ei| live(&path_graph.edges[ei.0]))
    };

    let n = path_graph.vertices.len();
    let mut visited = vec![false; n];

    // Pass 1: chains starting at a vertex that is not itself mid-chain
    // (in-degree != 1), walking forward while the next vertex still has
    // in-degree 1, out-degree 1.
    for start in 0..n {
        if visited[start] || out_degree(VertexIndex(start)) == 0 {
            continue;
        }
        if in_degree(VertexIndex(start)) == 1 && out_degree(VertexIndex(start)) == 1 {
            continue; // pure interior vertex, picked up by its run's start.
        }
        let mut run = vec![path_graph.vertices[start].marker_graph_edge_id];
        let mut current = VertexIndex(start);
        visited[start] = true;
        while out_degree(current) == 1 {
            let Some(ei) = single_out(current) else {
                break;
            };
            let next = path_graph.edges[ei.0].target;
            if visited[next.0] {
                break;
            }
            run.push(path_graph.vertices[next.0].marker_graph_edge_id);
            visited[next.0] = true;
            let continues = in_degree(next) == 1 && out_degree(next) == 1;
            current = next;
            if !continues {
                break;
            }
        }
        emit_run(&mut cpg, &run);
    }

    // Pass 2: remaining unvisited vertices form pure cycles (in=out=1
    // everywhere); break each arbitrarily at its lowest-index vertex.
    for start in 0..n {
        if visited[start] {
            continue;
        }
        let mut run = vec![path_graph.vertices[start].marker_graph_edge_id];
        let mut current = VertexIndex(start);
        visited[start] = true;
        loop {
            let Some(ei) = single_out(current) else {
                break;
            };
            let next = path_graph.edges[ei.0].target;
            run.push(path_graph.vertices[next.0].marker_graph_edge_id);
            if next.0 == start || visited[next.0] {
                break;
            }
            visited[next.0] = true;
            current = next;
        }
        if run.len() >= 2 {
            emit_run(&mut cpg, &run);
        }
    }

    cpg
}

fn emit_run(cpg: &mut CompressedPathGraph, run: &[MarkerGraphEdgeId]) {
    if run.len() < 2 {
        return;
    }
    let source_id = *run.first().unwrap();
    let target_id = *run.last().unwrap();
    let source = find_or_create_vertex(cpg, source_id);
    let target = find_or_create_vertex(cpg, target_id);
    let chain = Chain::new(run.to_vec());
    let bubble_chain = BubbleChain::single_haploid(chain);
    cpg.add_edge(source, target, bubble_chain, 0);
}

/// Two different linear runs sharing an endpoint land on the same CPG
/// vertex at construction time; cloning a vertex only happens later,
/// during detangling.
fn find_or_create_vertex(
    cpg: &mut CompressedPathGraph,
    marker_graph_edge_id: MarkerGraphEdgeId,
) -> CpgVertexIndex {
    if let Some(&existing) = cpg
        .vertices_for_marker_graph_edge_id(marker_graph_edge_id)
        .first()
    {
        existing
    } else {
        cpg.new_vertex(marker_graph_edge_id)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use shasta_graph::{Edge, PathGraph1};
    use shasta_types::MarkerGraphEdgePairInfo;

    /// A 3-vertex linear PathGraph1 (A -> B -> C) should compress into a
    /// single CPG edge whose Chain is the full concatenated run.
    fn linear_path_graph() -> PathGraph1 {
        let mut path_graph = PathGraph1::default();
        for i in 0..3u64 {
            path_graph.vertices.push(shasta_graph::Vertex {
                marker_graph_edge_id: MarkerGraphEdgeId(i),
                component: 0,
            });
        }
        path_graph.edges.push(Edge {
            source: shasta_graph::VertexIndex(0),
            target: shasta_graph::VertexIndex(1),
            info: MarkerGraphEdgePairInfo {
                common: 10,
                offset_in_bases: 100,
                corrected_jaccard: 0.9,
            },
            is_transitive_reduction_survivor: true,
            removed: false,
        });
        path_graph.edges.push(Edge {
            source: shasta_graph::VertexIndex(1),
            target: shasta_graph::VertexIndex(2),
            info: MarkerGraphEdgePairInfo {
                common: 10,
                offset_in_bases: 100,
                corrected_jaccard: 0.9,
            },
            is_transitive_reduction_survivor: true,
            removed: false,
        });
        path_graph.out_adjacency = vec![
            vec![shasta_graph::EdgeIndex(0)],
            vec![shasta_graph::EdgeIndex(1)],
            vec![],
        ];
        path_graph.in_adjacency = vec![
            vec![],
            vec![shasta_graph::EdgeIndex(0)],
            vec![shasta_graph::EdgeIndex(1)],
        ];
        path_graph
    }

    #[test]
    fn linear_run_becomes_one_cpg_edge() {
        let path_graph = linear_path_graph();
        let cpg = build(&path_graph);
        assert_eq!(cpg.edges.len(), 1);
        let chain = cpg.edges[0].bubble_chain.bubbles[0].chains()[0].clone();
        assert_eq!(chain.edges, vec![
            MarkerGraphEdgeId(0),
            MarkerGraphEdgeId(1),
            MarkerGraphEdgeId(2)
        ]);
        assert_eq!(cpg.vertices.len(), 2);
    }
}
