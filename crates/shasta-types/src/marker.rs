//! A single marker occurrence (spec §3 "Marker").
use crate::ids::{KmerId, Ordinal};
use serde::{Deserialize, Serialize};

/// `(KmerId, ordinal, position_in_bases)` for one occurrence of a marker in
/// an oriented read. Read-only: markers are produced by the external marker
/// extraction collaborator and never mutated by the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Marker {
    pub kmer_id: KmerId,
    pub ordinal: Ordinal,
    pub position_in_bases: u32,
}

impl Marker {
    pub fn new(kmer_id: KmerId, ordinal: u32, position_in_bases: u32) -> Self {
        Marker {
            kmer_id,
            ordinal: Ordinal(ordinal),
            position_in_bases,
        }
    }
}

/// Stable sort of a read's markers keyed only on `KmerId`, ties keeping
/// original ordinal order (spec §4.A). Used when the caller has not already
/// supplied a KmerId-sorted view.
pub fn sort_markers_by_kmer_id(markers: &[Marker]) -> Vec<(KmerId, u32)> {
    let mut sorted: Vec<(KmerId, u32)> = markers.iter().map(|m| (m.kmer_id, m.ordinal.0)).collect();
    sorted.sort_by_key(|&(kmer_id, _)| kmer_id);
    sorted
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn sort_is_stable_on_ties() {
        let markers = vec![
            Marker::new(KmerId(5), 0, 0),
            Marker::new(KmerId(1), 1, 10),
            Marker::new(KmerId(5), 2, 20),
            Marker::new(KmerId(1), 3, 30),
        ];
        let sorted = sort_markers_by_kmer_id(&markers);
        assert_eq!(
            sorted,
            vec![(KmerId(1), 1), (KmerId(1), 3), (KmerId(5), 0), (KmerId(5), 2)]
        );
    }
}
