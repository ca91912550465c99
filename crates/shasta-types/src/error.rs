//! Error type shared by the marker/journey model.
use std::{error, fmt};

pub type ShastaResult<T> = Result<T, ShastaError>;

#[derive(Debug)]
pub enum ShastaError {
    UnknownOrientedRead(crate::ids::OrientedReadId),
    UnknownMarkerGraphEdge(crate::ids::MarkerGraphEdgeId),
    UnknownMarkerGraphVertex(crate::ids::MarkerGraphVertexId),
    Invariant(String),
}

impl fmt::Display for ShastaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use ShastaError as E;
        match self {
            E::UnknownOrientedRead(id) => write!(f, "oriented read {:?} has no journey", id),
            E::UnknownMarkerGraphEdge(id) => write!(f, "marker graph edge {:?} does not exist", id),
            E::UnknownMarkerGraphVertex(id) => {
                write!(f, "marker graph vertex {:?} does not exist", id)
            }
            E::Invariant(msg) => write!(f, "invariant violation: {}", msg),
        }
    }
}

impl error::Error for ShastaError {}

/// Panics with a diagnostic. Invariant violations are programmer errors
/// (see spec §7) and must not be recovered from, unlike the `ShastaError`
/// variants returned for conditions a caller can legitimately hit.
#[macro_export]
macro_rules! bail_invariant {
    ($($arg:tt)*) => {
        panic!("shasta invariant violation: {}", format!($($arg)*))
    };
}
