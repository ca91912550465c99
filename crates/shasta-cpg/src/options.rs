//! CompressedPathGraph tunables (spec §6 configuration table): detangling,
//! superbubble removal, phasing and chain-optimization thresholds.
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CpgOptions {
    pub detangle_tolerance_low: u64,
    pub detangle_tolerance_high: u64,
    /// `(maxOffset1, maxOffset2)` pairs applied in order (spec §4.E
    /// "Superbubble removal").
    pub superbubble_removal_max_offsets: Vec<(i64, i64)>,
    pub phasing_threshold_low: u64,
    pub phasing_threshold_high: u64,
    pub long_bubble_threshold: i64,
    pub optimize_chains_min_common: u64,
    pub optimize_chains_k: usize,
}

impl Default for CpgOptions {
    fn default() -> Self {
        CpgOptions {
            detangle_tolerance_low: 2,
            detangle_tolerance_high: 6,
            superbubble_removal_max_offsets: vec![(1000, 3000), (3000, 10000), (10000, 30000), (30000, 100000)],
            phasing_threshold_low: 2,
            phasing_threshold_high: 6,
            long_bubble_threshold: 1000,
            optimize_chains_min_common: 3,
            optimize_chains_k: 4,
        }
    }
}
