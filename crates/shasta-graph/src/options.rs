//! PathGraph1 construction tunables (spec §6 configuration table).
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathGraph1Options {
    pub min_primary_coverage: u64,
    pub max_primary_coverage: u64,
    pub min_edge_coverage: u64,
    pub min_corrected_jaccard: f64,
    pub min_component_size: usize,
    pub transitive_reduction_distance: i64,
    pub transitive_reduction_max_coverage: u64,
    pub cross_edges_low_coverage_threshold: u64,
    pub cross_edges_high_coverage_threshold: u64,
    pub cross_edges_min_offset: i64,
    /// `Some(k)` keeps only the top `k` outgoing/incoming edges per vertex
    /// by corrected Jaccard (spec §4.D "k-NN thinning"); `None` disables it.
    pub knn_k: Option<usize>,
}

impl Default for PathGraph1Options {
    fn default() -> Self {
        PathGraph1Options {
            min_primary_coverage: 6,
            max_primary_coverage: 120,
            min_edge_coverage: 3,
            min_corrected_jaccard: 0.7,
            min_component_size: 4,
            transitive_reduction_distance: 1000,
            transitive_reduction_max_coverage: 1000,
            cross_edges_low_coverage_threshold: 3,
            cross_edges_high_coverage_threshold: 15,
            cross_edges_min_offset: 1000,
            knn_k: None,
        }
    }
}
