//! Core identifiers, the marker & journey model, and the external
//! collaborator contracts consumed by the rest of the assembly pipeline
//! (spec §3, §4.A, §6).

pub mod collaborators;
pub mod error;
pub mod ids;
pub mod journey;
pub mod marker;
pub mod memory;

pub use collaborators::{MarkerGraph, MarkerGraphEdgePairInfo, MarkerGraphEdgeRecord, PathAssembler, ReadStore};
pub use error::{ShastaError, ShastaResult};
pub use ids::{KmerId, MarkerGraphEdgeId, MarkerGraphVertexId, Ordinal, OrientedReadId, ReadId, Strand};
pub use journey::{Journey, JourneyEntry, JourneyTable};
pub use marker::Marker;
