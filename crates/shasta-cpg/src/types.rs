//! Core data model: Chain, Bubble, BubbleChain, and the CompressedPathGraph
//! vertex/edge (spec §3).
use fnv::FnvHashMap;
use shasta_types::MarkerGraphEdgeId;

/// An ordered list of `MarkerGraphEdgeId`s, length >= 2 (spec §3 "Chain",
/// universal invariant 2). First and last are anchors shared with sibling
/// chains of the same bubble.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chain {
    pub edges: Vec<MarkerGraphEdgeId>,
    /// Consensus base sequence, associated lazily (spec §3 "Chain").
    pub sequence: Option<Vec<u8>>,
}

impl Chain {
    pub fn new(edges: Vec<MarkerGraphEdgeId>) -> Self {
        debug_assert!(edges.len() >= 2, "a Chain must hold at least 2 edges");
        Chain {
            edges,
            sequence: None,
        }
    }

    pub fn first(&self) -> MarkerGraphEdgeId {
        *self.edges.first().expect("Chain is never empty")
    }

    pub fn last(&self) -> MarkerGraphEdgeId {
        *self.edges.last().expect("Chain is never empty")
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    /// The "interior" ends used by tangle-matrix computation (spec §4.F):
    /// the second-to-last edge from the end, the second edge from the
    /// beginning, to avoid double-counting the shared junction edge.
    pub fn last_interior(&self) -> MarkerGraphEdgeId {
        self.edges[self.edges.len().saturating_sub(2)]
    }

    pub fn first_interior(&self) -> MarkerGraphEdgeId {
        self.edges[1.min(self.edges.len() - 1)]
    }
}

/// A nonempty list of Chains sharing first and last `MarkerGraphEdgeId`
/// (spec §3 "Bubble"). Ploidy encoded structurally rather than via a
/// `ploidy()` flag check (spec §9 Design Notes, "Sum types in place of
/// runtime flags").
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Bubble {
    Haploid(Chain),
    Polyploid(Vec<Chain>),
}

impl Bubble {
    pub fn haploid(chain: Chain) -> Self {
        Bubble::Haploid(chain)
    }

    /// Builds a bubble from an arbitrary nonempty vector of chains,
    /// collapsing to `Haploid` when there is exactly one.
    pub fn from_chains(mut chains: Vec<Chain>) -> Self {
        debug_assert!(!chains.is_empty(), "a Bubble must hold at least one Chain");
        if chains.len() == 1 {
            Bubble::Haploid(chains.pop().unwrap())
        } else {
            Bubble::Polyploid(chains)
        }
    }

    pub fn chains(&self) -> &[Chain] {
        match self {
            Bubble::Haploid(chain) => std::slice::from_ref(chain),
            Bubble::Polyploid(chains) => chains,
        }
    }

    pub fn chains_mut(&mut self) -> &mut [Chain] {
        match self {
            Bubble::Haploid(chain) => std::slice::from_mut(chain),
            Bubble::Polyploid(chains) => chains,
        }
    }

    pub fn ploidy(&self) -> usize {
        self.chains().len()
    }

    pub fn is_haploid(&self) -> bool {
        matches!(self, Bubble::Haploid(_))
    }

    pub fn is_diploid(&self) -> bool {
        self.ploidy() == 2
    }

    pub fn first(&self) -> MarkerGraphEdgeId {
        self.chains()[0].first()
    }

    pub fn last(&self) -> MarkerGraphEdgeId {
        self.chains()[0].last()
    }
}

/// A nonempty sequence of Bubbles where adjacent bubbles share the joining
/// `MarkerGraphEdgeId` (spec §3 "BubbleChain", universal invariant 1).
/// *Compression invariant* (universal invariant 4): no two consecutive
/// haploid bubbles.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BubbleChain {
    pub bubbles: Vec<Bubble>,
}

impl BubbleChain {
    pub fn new(bubbles: Vec<Bubble>) -> Self {
        debug_assert!(!bubbles.is_empty(), "a BubbleChain must hold at least one Bubble");
        BubbleChain { bubbles }
    }

    pub fn single_haploid(chain: Chain) -> Self {
        BubbleChain {
            bubbles: vec![Bubble::Haploid(chain)],
        }
    }

    pub fn first(&self) -> MarkerGraphEdgeId {
        self.bubbles.first().expect("BubbleChain is never empty").first()
    }

    pub fn last(&self) -> MarkerGraphEdgeId {
        self.bubbles.last().expect("BubbleChain is never empty").last()
    }

    pub fn len(&self) -> usize {
        self.bubbles.len()
    }

    /// Checks universal invariant 1: adjacent bubbles share the joining id.
    pub fn check_adjacency_invariant(&self) -> bool {
        self.bubbles
            .windows(2)
            .all(|w| w[0].last() == w[1].first())
    }

    /// Average base offset across the chain, estimated from
    /// `MarkerGraphEdgePairInfo` at construction time is not stored on the
    /// type itself; callers combine this with per-edge offsets held
    /// alongside (see `CpgEdge::average_offset`).
    pub fn diploid_positions(&self) -> impl Iterator<Item = usize> + '_ {
        self.bubbles
            .iter()
            .enumerate()
            .filter(|(_, b)| b.is_diploid())
            .map(|(i, _)| i)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CpgVertexIndex(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CpgEdgeIndex(pub usize);

/// Stable 64-bit id, separate from the `CpgEdgeIndex` slot index, assigned
/// from a monotonic per-component counter (spec §3 "CPG edge ids are
/// unique"; §9 "Stable ids ... survive compaction").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CpgEdgeId(pub u64);

#[derive(Debug, Clone)]
pub struct CpgVertex {
    pub marker_graph_edge_id: MarkerGraphEdgeId,
}

#[derive(Debug, Clone)]
pub struct CpgEdge {
    pub id: CpgEdgeId,
    pub source: CpgVertexIndex,
    pub target: CpgVertexIndex,
    pub bubble_chain: BubbleChain,
    /// Average estimated base offset across the bubble chain's Chains, used
    /// by superbubble detection (spec §3 "Superbubble").
    pub average_offset: i64,
    pub removed: bool,
}

/// Index-based directed multigraph (spec §9 Design Notes): cheap
/// `connect`/`cloneAndTruncate*`/`compress`, no reference-counted cycles.
#[derive(Debug, Clone, Default)]
pub struct CompressedPathGraph {
    pub vertices: Vec<CpgVertex>,
    pub edges: Vec<CpgEdge>,
    pub out_adjacency: Vec<Vec<CpgEdgeIndex>>,
    pub in_adjacency: Vec<Vec<CpgEdgeIndex>>,
    next_edge_id: u64,
    vertex_by_marker_graph_edge_id: FnvHashMap<MarkerGraphEdgeId, Vec<CpgVertexIndex>>,
}

impl CompressedPathGraph {
    pub fn fresh_edge_id(&mut self) -> CpgEdgeId {
        let id = CpgEdgeId(self.next_edge_id);
        self.next_edge_id += 1;
        id
    }

    /// Creates a vertex on demand for a given `MarkerGraphEdgeId` (spec
    /// §4.E "CPG vertices are created on demand for endpoints"). Multiple
    /// CPG vertices may carry the same id after cloning, so this always
    /// creates a fresh vertex rather than deduplicating.
    pub fn new_vertex(&mut self, marker_graph_edge_id: MarkerGraphEdgeId) -> CpgVertexIndex {
        let index = CpgVertexIndex(self.vertices.len());
        self.vertices.push(CpgVertex {
            marker_graph_edge_id,
        });
        self.out_adjacency.push(Vec::new());
        self.in_adjacency.push(Vec::new());
        self.vertex_by_marker_graph_edge_id
            .entry(marker_graph_edge_id)
            .or_default()
            .push(index);
        index
    }

    pub fn vertices_for_marker_graph_edge_id(
        &self,
        marker_graph_edge_id: MarkerGraphEdgeId,
    ) -> &[CpgVertexIndex] {
        self.vertex_by_marker_graph_edge_id
            .get(&marker_graph_edge_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn add_edge(
        &mut self,
        source: CpgVertexIndex,
        target: CpgVertexIndex,
        bubble_chain: BubbleChain,
        average_offset: i64,
    ) -> CpgEdgeIndex {
        let id = self.fresh_edge_id();
        let index = CpgEdgeIndex(self.edges.len());
        self.edges.push(CpgEdge {
            id,
            source,
            target,
            bubble_chain,
            average_offset,
            removed: false,
        });
        self.out_adjacency[source.0].push(index);
        self.in_adjacency[target.0].push(index);
        index
    }

    /// Concatenates independently built per-component graphs into one,
    /// remapping vertex/edge indices and assigning each edge a fresh
    /// `CpgEdgeId` from a single shared counter (spec §4.D step 3 "Each
    /// PathGraph1 connected component yields an independent CPG"). Callers
    /// that need a specific final edge-id ordering (spec §9 "renumbered
    /// once before final output") should renumber after merging; the ids
    /// assigned here only need to be unique, not final.
    pub fn merge_components(components: Vec<CompressedPathGraph>) -> CompressedPathGraph {
        let mut merged = CompressedPathGraph::default();
        for component in components {
            let vertex_offset = merged.vertices.len();
            for vertex in component.vertices {
                merged.vertices.push(vertex);
                merged.out_adjacency.push(Vec::new());
                merged.in_adjacency.push(Vec::new());
            }
            for (marker_graph_edge_id, vertices) in component.vertex_by_marker_graph_edge_id {
                merged
                    .vertex_by_marker_graph_edge_id
                    .entry(marker_graph_edge_id)
                    .or_default()
                    .extend(vertices.into_iter().map(|v| CpgVertexIndex(v.0 + vertex_offset)));
            }
            for edge in component.edges {
                let id = merged.fresh_edge_id();
                let index = CpgEdgeIndex(merged.edges.len());
                let source = CpgVertexIndex(edge.source.0 + vertex_offset);
                let target = CpgVertexIndex(edge.target.0 + vertex_offset);
                merged.edges.push(CpgEdge {
                    id,
                    source,
                    target,
                    bubble_chain: edge.bubble_chain,
                    average_offset: edge.average_offset,
                    removed: edge.removed,
                });
                merged.out_adjacency[source.0].push(index);
                merged.in_adjacency[target.0].push(index);
            }
        }
        merged
    }

    pub fn out_degree(&self, v: CpgVertexIndex) -> usize {
        self.live_out_edges(v).count()
    }

    pub fn in_degree(&self, v: CpgVertexIndex) -> usize {
        self.live_in_edges(v).count()
    }

    pub fn live_out_edges(&self, v: CpgVertexIndex) -> impl Iterator<Item = CpgEdgeIndex> + '_ {
        self.out_adjacency[v.0]
            .iter()
            .copied()
            .filter(move |&ei| !self.edges[ei.0].removed)
    }

    pub fn live_in_edges(&self, v: CpgVertexIndex) -> impl Iterator<Item = CpgEdgeIndex> + '_ {
        self.in_adjacency[v.0]
            .iter()
            .copied()
            .filter(move |&ei| !self.edges[ei.0].removed)
    }

    /// Checks universal invariants 1, 2, 3, 4, 5, 6 (spec §8) across the
    /// whole graph; used by tests and, at debug time, after structural
    /// edits.
    pub fn check_invariants(&self) -> Result<(), String> {
        let mut seen_ids = fnv::FnvHashSet::default();
        for edge in &self.edges {
            if edge.removed {
                continue;
            }
            if !seen_ids.insert(edge.id) {
                return Err(format!("duplicate CPG edge id {:?}", edge.id));
            }
            if !edge.bubble_chain.check_adjacency_invariant() {
                return Err("adjacent bubbles do not share a joining id".into());
            }
            if edge
                .bubble_chain
                .bubbles
                .windows(2)
                .any(|w| w[0].is_haploid() && w[1].is_haploid())
            {
                return Err("two consecutive haploid bubbles found, compress() was not called".into());
            }
            for bubble in &edge.bubble_chain.bubbles {
                let first = bubble.first();
                let last = bubble.last();
                for chain in bubble.chains() {
                    if chain.len() < 2 {
                        return Err("Chain shorter than 2".into());
                    }
                    if chain.first() != first || chain.last() != last {
                        return Err("Chains in a Bubble disagree on endpoints".into());
                    }
                }
            }
            if edge.bubble_chain.first() != self.vertices[edge.source.0].marker_graph_edge_id {
                return Err("BubbleChain first id does not match source vertex".into());
            }
            if edge.bubble_chain.last() != self.vertices[edge.target.0].marker_graph_edge_id {
                return Err("BubbleChain last id does not match target vertex".into());
            }
            for w in edge.bubble_chain.bubbles.windows(2) {
                if w[0].last() != w[1].first() {
                    return Err("consecutive bubbles do not share a joining id".into());
                }
            }
        }
        Ok(())
    }
}
