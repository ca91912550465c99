//! In-memory reference implementations of the external collaborator traits
//! (spec §6 EXPANSION). Used by tests and by `shasta-core` when no external
//! backend is configured, the same role the teacher's `HashGraph` plays as
//! an in-memory stand-in for a production handle graph.
use crate::collaborators::{
    MarkerGraph, MarkerGraphEdgePairInfo, MarkerGraphEdgeRecord, PathAssembler, ReadStore,
};
use crate::ids::{MarkerGraphEdgeId, MarkerGraphVertexId, OrientedReadId, ReadId};
use crate::marker::Marker;
use fnv::{FnvHashMap, FnvHashSet};

#[derive(Debug, Default, Clone)]
pub struct InMemoryMarkerGraph {
    edges: FnvHashMap<MarkerGraphEdgeId, MarkerGraphEdgeRecord>,
    edges_by_source: FnvHashMap<MarkerGraphVertexId, Vec<MarkerGraphEdgeId>>,
    edges_by_target: FnvHashMap<MarkerGraphVertexId, Vec<MarkerGraphEdgeId>>,
    reverse_complement: FnvHashMap<MarkerGraphEdgeId, MarkerGraphEdgeId>,
    duplicate_edges: FnvHashSet<MarkerGraphEdgeId>,
    duplicate_vertices: FnvHashSet<MarkerGraphVertexId>,
    /// Precomputed pairwise analysis results; pairs not present default to
    /// `MarkerGraphEdgePairInfo::zero()`.
    pair_infos: FnvHashMap<(MarkerGraphEdgeId, MarkerGraphEdgeId), MarkerGraphEdgePairInfo>,
}

impl InMemoryMarkerGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_edge(&mut self, edge_id: MarkerGraphEdgeId, record: MarkerGraphEdgeRecord) {
        self.edges_by_source
            .entry(record.source)
            .or_default()
            .push(edge_id);
        self.edges_by_target
            .entry(record.target)
            .or_default()
            .push(edge_id);
        self.edges.insert(edge_id, record);
    }

    pub fn set_reverse_complement(&mut self, a: MarkerGraphEdgeId, b: MarkerGraphEdgeId) {
        self.reverse_complement.insert(a, b);
        self.reverse_complement.insert(b, a);
    }

    pub fn mark_duplicate_edge(&mut self, edge_id: MarkerGraphEdgeId) {
        self.duplicate_edges.insert(edge_id);
    }

    pub fn mark_duplicate_vertex(&mut self, vertex_id: MarkerGraphVertexId) {
        self.duplicate_vertices.insert(vertex_id);
    }

    pub fn set_pair_info(
        &mut self,
        edge0: MarkerGraphEdgeId,
        edge1: MarkerGraphEdgeId,
        info: MarkerGraphEdgePairInfo,
    ) {
        self.pair_infos.insert((edge0, edge1), info);
    }
}

static EMPTY_EDGES: [MarkerGraphEdgeId; 0] = [];

impl MarkerGraph for InMemoryMarkerGraph {
    fn edge(&self, edge_id: MarkerGraphEdgeId) -> Option<&MarkerGraphEdgeRecord> {
        self.edges.get(&edge_id)
    }

    fn edges_by_source(&self, vertex_id: MarkerGraphVertexId) -> &[MarkerGraphEdgeId] {
        self.edges_by_source
            .get(&vertex_id)
            .map(|v| v.as_slice())
            .unwrap_or(&EMPTY_EDGES)
    }

    fn edges_by_target(&self, vertex_id: MarkerGraphVertexId) -> &[MarkerGraphEdgeId] {
        self.edges_by_target
            .get(&vertex_id)
            .map(|v| v.as_slice())
            .unwrap_or(&EMPTY_EDGES)
    }

    fn reverse_complement_edge(&self, edge_id: MarkerGraphEdgeId) -> Option<MarkerGraphEdgeId> {
        self.reverse_complement.get(&edge_id).copied()
    }

    fn analyze_edge_pair(
        &self,
        edge0: MarkerGraphEdgeId,
        edge1: MarkerGraphEdgeId,
    ) -> MarkerGraphEdgePairInfo {
        self.pair_infos
            .get(&(edge0, edge1))
            .copied()
            .unwrap_or_else(MarkerGraphEdgePairInfo::zero)
    }

    fn edge_has_duplicate_oriented_read_ids(&self, edge_id: MarkerGraphEdgeId) -> bool {
        self.duplicate_edges.contains(&edge_id)
    }

    fn vertex_has_duplicate_oriented_read_ids(&self, vertex_id: MarkerGraphVertexId) -> bool {
        self.duplicate_vertices.contains(&vertex_id)
    }

    fn all_edge_ids(&self) -> Vec<MarkerGraphEdgeId> {
        let mut ids: Vec<MarkerGraphEdgeId> = self.edges.keys().copied().collect();
        ids.sort();
        ids
    }
}

#[derive(Debug, Default, Clone)]
pub struct InMemoryReadStore {
    sequences: FnvHashMap<ReadId, Vec<u8>>,
    markers: FnvHashMap<OrientedReadId, Vec<Marker>>,
}

impl InMemoryReadStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_read(&mut self, read_id: ReadId, sequence: Vec<u8>) {
        self.sequences.insert(read_id, sequence);
    }

    pub fn add_markers(&mut self, oriented_read_id: OrientedReadId, markers: Vec<Marker>) {
        self.markers.insert(oriented_read_id, markers);
    }
}

impl ReadStore for InMemoryReadStore {
    fn base_sequence(&self, read_id: ReadId) -> Option<&[u8]> {
        self.sequences.get(&read_id).map(|v| v.as_slice())
    }

    fn markers(&self, oriented_read_id: OrientedReadId) -> Option<&[Marker]> {
        self.markers.get(&oriented_read_id).map(|v| v.as_slice())
    }
}

/// Naive consensus: majority vote per aligned column is overkill for a
/// reference implementation, so this stand-in simply concatenates a
/// placeholder base per marker-graph edge; real deployments wire in an
/// actual multiple-sequence-alignment based assembler.
pub struct PlaceholderPathAssembler;

impl PathAssembler for PlaceholderPathAssembler {
    fn assemble_path(
        &self,
        chain_edges: &[MarkerGraphEdgeId],
        _pair_infos: &[MarkerGraphEdgePairInfo],
    ) -> Vec<u8> {
        // One placeholder base per edge keeps consensus length proportional
        // to chain length without needing real sequence data in tests.
        vec![b'N'; chain_edges.len().max(1)]
    }
}
