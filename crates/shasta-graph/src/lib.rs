//! Components C and D: candidate generation over read journeys, and
//! PathGraph1, the directed graph over primary marker-graph edges built
//! from those candidates (spec §4.C, §4.D).

pub mod candidate;
pub mod options;
pub mod path_graph1;

pub use candidate::{
    candidates_from_forward_walk, candidates_from_journey_adjacency,
    candidates_from_journey_alignment, CandidatePair,
};
pub use options::PathGraph1Options;
pub use path_graph1::{
    build, knn_thin, remove_cross_edges, select_primary_edges, transitive_reduction, Edge,
    EdgeIndex, PathGraph1, Vertex, VertexIndex,
};
