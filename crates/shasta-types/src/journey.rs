//! Component A — marker & journey model (spec §4.A).
//!
//! A *journey* is, for a given oriented read, the ordered sequence of
//! marker-graph edges whose source vertex the read visits. Journeys are
//! built once and are immutable afterward.
use crate::collaborators::MarkerGraph;
use crate::ids::{MarkerGraphEdgeId, OrientedReadId};
use fnv::FnvHashMap;
use rayon::prelude::*;
use std::sync::Mutex;

/// One read's ordered sequence of marker-graph edge visits.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Journey(pub Vec<MarkerGraphEdgeId>);

impl Journey {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[MarkerGraphEdgeId] {
        &self.0
    }
}

/// A single `(OrientedReadId, positionInJourney)` entry recording that a
/// read traverses a primary edge at a given journey position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JourneyEntry {
    pub oriented_read_id: OrientedReadId,
    pub position_in_journey: u32,
}

/// All journeys for a set of oriented reads, plus the per-edge index of
/// journey entries traversing it (spec §4.A "Derived once").
pub struct JourneyTable {
    journeys: FnvHashMap<OrientedReadId, Journey>,
    entries_by_edge: FnvHashMap<MarkerGraphEdgeId, Vec<JourneyEntry>>,
}

impl JourneyTable {
    pub fn journey(&self, oriented_read_id: OrientedReadId) -> Option<&Journey> {
        self.journeys.get(&oriented_read_id)
    }

    pub fn entries_for_edge(&self, edge_id: MarkerGraphEdgeId) -> &[JourneyEntry] {
        self.entries_by_edge
            .get(&edge_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn oriented_read_ids(&self) -> impl Iterator<Item = OrientedReadId> + '_ {
        self.journeys.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.journeys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.journeys.is_empty()
    }

    /// Builds journeys for every oriented read whose marker intervals are
    /// recorded on at least one marker-graph edge, sharded by
    /// `OrientedReadId` batches (spec §5 "Journey construction").
    ///
    /// Marker graph edges only record which oriented reads traverse them
    /// and at which ordinal; the journey for a read is the edges it
    /// traverses, ordered by the ordinal at which the read enters each
    /// edge's source vertex.
    pub fn build<G: MarkerGraph>(marker_graph: &G) -> JourneyTable {
        let edge_ids = marker_graph.all_edge_ids();

        // Thread-local accumulation into per-read (ordinal, edge) pairs,
        // merged afterward under a single lock (spec §5 "Parallel phases").
        let per_read: Mutex<FnvHashMap<OrientedReadId, Vec<(u32, MarkerGraphEdgeId)>>> =
            Mutex::new(FnvHashMap::default());

        edge_ids.par_iter().for_each(|&edge_id| {
            let Some(record) = marker_graph.edge(edge_id) else {
                return;
            };
            let mut local: FnvHashMap<OrientedReadId, Vec<(u32, MarkerGraphEdgeId)>> =
                FnvHashMap::default();
            for &(oriented_read_id, (start_ordinal, _end_ordinal)) in &record.marker_intervals {
                local
                    .entry(oriented_read_id)
                    .or_default()
                    .push((start_ordinal, edge_id));
            }
            let mut guard = per_read.lock().unwrap();
            for (read, mut entries) in local {
                guard.entry(read).or_default().append(&mut entries);
            }
        });

        let per_read = per_read.into_inner().unwrap();
        let mut journeys = FnvHashMap::default();
        let mut entries_by_edge: FnvHashMap<MarkerGraphEdgeId, Vec<JourneyEntry>> =
            FnvHashMap::default();

        // Stable sort keyed only on intrinsic ordinal (spec §5 determinism).
        let mut reads: Vec<OrientedReadId> = per_read.keys().copied().collect();
        reads.sort();
        for oriented_read_id in reads {
            let mut entries = per_read[&oriented_read_id].clone();
            entries.sort_by_key(|&(ordinal, _)| ordinal);
            let edge_sequence: Vec<MarkerGraphEdgeId> =
                entries.iter().map(|&(_, edge_id)| edge_id).collect();
            for (position, &edge_id) in edge_sequence.iter().enumerate() {
                entries_by_edge
                    .entry(edge_id)
                    .or_default()
                    .push(JourneyEntry {
                        oriented_read_id,
                        position_in_journey: position as u32,
                    });
            }
            journeys.insert(oriented_read_id, Journey(edge_sequence));
        }

        tracing::debug!(reads = journeys.len(), edges = entries_by_edge.len(), "journeys built");
        JourneyTable {
            journeys,
            entries_by_edge,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::collaborators::MarkerGraphEdgeRecord;
    use crate::ids::{MarkerGraphVertexId, ReadId, Strand};
    use crate::memory::InMemoryMarkerGraph;

    #[test]
    fn journey_orders_edges_by_ordinal_not_insertion() {
        let read = OrientedReadId::new(ReadId(0), Strand::Forward);
        let mut mg = InMemoryMarkerGraph::new();
        let e0 = MarkerGraphEdgeId(0);
        let e1 = MarkerGraphEdgeId(1);
        // Insert e1 first with an earlier ordinal to check sort order.
        mg.add_edge(
            e1,
            MarkerGraphEdgeRecord {
                source: MarkerGraphVertexId(1),
                target: MarkerGraphVertexId(2),
                coverage: 10,
                marker_intervals: vec![(read, (5, 6))],
            },
        );
        mg.add_edge(
            e0,
            MarkerGraphEdgeRecord {
                source: MarkerGraphVertexId(0),
                target: MarkerGraphVertexId(1),
                coverage: 10,
                marker_intervals: vec![(read, (2, 3))],
            },
        );

        let table = JourneyTable::build(&mg);
        let journey = table.journey(read).expect("journey for read");
        assert_eq!(journey.as_slice(), &[e0, e1]);
        assert_eq!(table.entries_for_edge(e0)[0].position_in_journey, 0);
        assert_eq!(table.entries_for_edge(e1)[0].position_in_journey, 1);
    }
}
