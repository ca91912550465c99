//! Align4 tunables (spec §6 "Align4 options").
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Align4Options {
    pub delta_x: u32,
    pub delta_y: u32,
    pub min_entry_count_per_cell: u32,
    pub max_distance_from_boundary: u32,
    pub min_aligned_marker_count: u32,
    pub min_aligned_fraction: f64,
    pub max_skip: u32,
    pub max_drift: u32,
    pub max_trim: u32,
    pub max_band: u32,
    pub match_score: i64,
    pub mismatch_score: i64,
    pub gap_score: i64,
}

impl Default for Align4Options {
    fn default() -> Self {
        Align4Options {
            delta_x: 10,
            delta_y: 10,
            min_entry_count_per_cell: 1,
            max_distance_from_boundary: 50,
            min_aligned_marker_count: 5,
            min_aligned_fraction: 0.5,
            max_skip: 30,
            max_drift: 30,
            max_trim: 30,
            max_band: 1000,
            match_score: 1,
            mismatch_score: -1,
            gap_score: -1,
        }
    }
}
