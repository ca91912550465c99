//! Error type for fallible structural operations on a CompressedPathGraph.
use std::{error, fmt};

pub type CpgResult<T> = Result<T, CpgError>;

#[derive(Debug)]
pub enum CpgError {
    UnknownVertex(crate::types::CpgVertexIndex),
    UnknownEdge(crate::types::CpgEdgeIndex),
    NotHaploid(crate::types::CpgEdgeIndex),
}

impl fmt::Display for CpgError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use CpgError as E;
        match self {
            E::UnknownVertex(v) => write!(f, "CPG vertex {:?} does not exist", v),
            E::UnknownEdge(e) => write!(f, "CPG edge {:?} does not exist", e),
            E::NotHaploid(e) => write!(f, "CPG edge {:?} has a non-haploid bubble where haploid was required", e),
        }
    }
}

impl error::Error for CpgError {}
