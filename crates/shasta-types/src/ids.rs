//! Primary identifiers (spec §3 "Primary identifiers").
//!
//! All of these are zero-cost newtypes over a primitive integer, following
//! the `NodeId` newtype used by the marker-graph's handle-graph counterpart
//! (`handlegraph2::handle::NodeId` in the teacher repo's `graphoperation.rs`).
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque 32-bit index of an input read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct ReadId(pub u32);

impl fmt::Display for ReadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Strand of a read: `Forward` reads it as stored, `Reverse` reads its
/// reverse complement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Strand {
    Forward = 0,
    Reverse = 1,
}

impl Strand {
    pub fn opposite(self) -> Strand {
        match self {
            Strand::Forward => Strand::Reverse,
            Strand::Reverse => Strand::Forward,
        }
    }

    fn bit(self) -> u32 {
        match self {
            Strand::Forward => 0,
            Strand::Reverse => 1,
        }
    }
}

/// `(ReadId, strand)` packed into a single `u32`, strand in bit 0 (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct OrientedReadId(u32);

impl OrientedReadId {
    pub fn new(read_id: ReadId, strand: Strand) -> Self {
        OrientedReadId((read_id.0 << 1) | strand.bit())
    }

    pub fn read_id(self) -> ReadId {
        ReadId(self.0 >> 1)
    }

    pub fn strand(self) -> Strand {
        if self.0 & 1 == 0 {
            Strand::Forward
        } else {
            Strand::Reverse
        }
    }

    pub fn reverse_complement(self) -> Self {
        OrientedReadId::new(self.read_id(), self.strand().opposite())
    }

    pub fn as_u32(self) -> u32 {
        self.0
    }

    pub fn from_u32(value: u32) -> Self {
        OrientedReadId(value)
    }
}

impl fmt::Display for OrientedReadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = match self.strand() {
            Strand::Forward => '+',
            Strand::Reverse => '-',
        };
        write!(f, "{}{}", self.read_id(), sign)
    }
}

/// Opaque integer identifying a marker k-mer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct KmerId(pub u64);

/// 64-bit index of a vertex in the external marker graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct MarkerGraphVertexId(pub u64);

impl fmt::Display for MarkerGraphVertexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// 64-bit index of an edge in the external marker graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct MarkerGraphEdgeId(pub u64);

impl fmt::Display for MarkerGraphEdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e{}", self.0)
    }
}

/// 32-bit index of a marker within an oriented read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Ordinal(pub u32);

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn oriented_read_id_packs_strand_in_bit_zero() {
        let a = OrientedReadId::new(ReadId(7), Strand::Forward);
        let b = OrientedReadId::new(ReadId(7), Strand::Reverse);
        assert_eq!(a.read_id(), ReadId(7));
        assert_eq!(b.read_id(), ReadId(7));
        assert_eq!(a.strand(), Strand::Forward);
        assert_eq!(b.strand(), Strand::Reverse);
        assert_eq!(a.as_u32() & 1, 0);
        assert_eq!(b.as_u32() & 1, 1);
    }

    #[test]
    fn reverse_complement_flips_strand_keeps_read() {
        let a = OrientedReadId::new(ReadId(3), Strand::Forward);
        let rc = a.reverse_complement();
        assert_eq!(rc.read_id(), a.read_id());
        assert_eq!(rc.strand(), Strand::Reverse);
        assert_eq!(rc.reverse_complement(), a);
    }
}
