//! External collaborator contracts (spec §6): read-only views the core
//! consumes but never owns or mutates. Production deployments back these
//! traits with memory-mapped marker-graph storage; the core only depends on
//! the trait surface, never on a concrete representation.
use crate::ids::{KmerId, MarkerGraphEdgeId, MarkerGraphVertexId, OrientedReadId, ReadId};
use crate::marker::Marker;
use serde::{Deserialize, Serialize};

/// Value object returned by [`MarkerGraph::analyze_edge_pair`] (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarkerGraphEdgePairInfo {
    /// Count of oriented reads visiting both edges in order.
    pub common: u64,
    /// Estimated signed base distance from the first edge to the second.
    pub offset_in_bases: i64,
    /// Jaccard-like similarity over the two edges' read sets, corrected for
    /// coverage; in `[0, 1]`.
    pub corrected_jaccard: f64,
}

impl MarkerGraphEdgePairInfo {
    pub fn zero() -> Self {
        MarkerGraphEdgePairInfo {
            common: 0,
            offset_in_bases: 0,
            corrected_jaccard: 0.0,
        }
    }
}

/// One marker-graph edge's record, as exposed by the `edges[edgeId]`
/// contract in spec §6.
#[derive(Debug, Clone)]
pub struct MarkerGraphEdgeRecord {
    pub source: MarkerGraphVertexId,
    pub target: MarkerGraphVertexId,
    pub coverage: u64,
    /// `(OrientedReadId, ordinal_pair)` marker intervals traversing this edge.
    pub marker_intervals: Vec<(OrientedReadId, (u32, u32))>,
}

/// Read-only view of the precomputed marker graph (spec §6, "Consumed from
/// the marker-graph collaborator"). The core never constructs or mutates a
/// marker graph; it only queries one through this trait.
pub trait MarkerGraph: Sync {
    fn edge(&self, edge_id: MarkerGraphEdgeId) -> Option<&MarkerGraphEdgeRecord>;
    fn edges_by_source(&self, vertex_id: MarkerGraphVertexId) -> &[MarkerGraphEdgeId];
    fn edges_by_target(&self, vertex_id: MarkerGraphVertexId) -> &[MarkerGraphEdgeId];
    fn reverse_complement_edge(&self, edge_id: MarkerGraphEdgeId) -> Option<MarkerGraphEdgeId>;
    fn analyze_edge_pair(
        &self,
        edge0: MarkerGraphEdgeId,
        edge1: MarkerGraphEdgeId,
    ) -> MarkerGraphEdgePairInfo;
    fn edge_has_duplicate_oriented_read_ids(&self, edge_id: MarkerGraphEdgeId) -> bool;
    fn vertex_has_duplicate_oriented_read_ids(&self, vertex_id: MarkerGraphVertexId) -> bool;
    fn edge_coverage(&self, edge_id: MarkerGraphEdgeId) -> u64 {
        self.edge(edge_id).map(|e| e.coverage).unwrap_or(0)
    }
    /// All edge ids known to the marker graph, in ascending order. Not part
    /// of the original narrow contract but required to enumerate a vertex
    /// set for PathGraph1 construction (spec §4.D step 1).
    fn all_edge_ids(&self) -> Vec<MarkerGraphEdgeId>;
}

/// Read-only view of the input reads (spec §6, "Consumed from the read
/// collaborator"). Only needed for consensus assembly, not for graph logic.
pub trait ReadStore: Sync {
    fn base_sequence(&self, read_id: ReadId) -> Option<&[u8]>;
    fn markers(&self, oriented_read_id: OrientedReadId) -> Option<&[Marker]>;
    fn sorted_markers(&self, oriented_read_id: OrientedReadId) -> Vec<(KmerId, u32)> {
        self.markers(oriented_read_id)
            .map(|m| crate::marker::sort_markers_by_kmer_id(m))
            .unwrap_or_default()
    }
}

/// External assembler-path collaborator (spec §6): turns an ordered run of
/// marker-graph edges into consensus bases.
pub trait PathAssembler: Sync {
    fn assemble_path(
        &self,
        chain_edges: &[MarkerGraphEdgeId],
        pair_infos: &[MarkerGraphEdgePairInfo],
    ) -> Vec<u8>;
}
