//! CompressedPathGraph: bubble chains, structural edits, superbubble
//! removal, detangling, phasing and chain assembly (spec §3, §4.E-§4.H).
pub mod construct;
pub mod detangle;
pub mod error;
pub mod ops;
pub mod optimize;
pub mod options;
pub mod phase;
pub mod superbubble;
pub mod types;

pub use construct::build;
pub use detangle::{
    classify, detangle_back_edge, detangle_edge, detangle_short_superbubble, detangle_vertex,
    tangle_matrix, Significance,
};
pub use error::{CpgError, CpgResult};
pub use ops::{
    clone_and_truncate_at_beginning, clone_and_truncate_at_end, compress, connect,
    split_bubble_chain_at_beginning, split_bubble_chain_at_end,
};
pub use optimize::{assemble_chain, optimize_and_assemble_bubble_chain, optimize_chain};
pub use options::CpgOptions;
pub use phase::{build_phasing_graph, phase_bubble_chain, rewrite, Phase, PhasedComponent, PhasingEdge, PhasingGraph};
pub use superbubble::{find_superbubbles, remove_short_superbubbles, Superbubble};
pub use types::{
    Bubble, BubbleChain, Chain, CompressedPathGraph, CpgEdge, CpgEdgeId, CpgEdgeIndex, CpgVertex,
    CpgVertexIndex,
};
