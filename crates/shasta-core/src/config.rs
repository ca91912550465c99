//! Aggregate configuration for the assembly pipeline (spec §6
//! "Configuration"). Each stage keeps its own tunables struct; `Config`
//! collects them so a single TOML document can drive a run.
use serde::{Deserialize, Serialize};
use shasta_align::Align4Options;
use shasta_cpg::CpgOptions;
use shasta_graph::PathGraph1Options;

/// Candidate generator tunables (spec §4.C).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CandidateOptions {
    pub max_distance_in_journey: usize,
    pub min_walk_coverage: u64,
    pub max_hops: usize,
}

impl Default for CandidateOptions {
    fn default() -> Self {
        CandidateOptions {
            max_distance_in_journey: 4,
            min_walk_coverage: 6,
            max_hops: 6,
        }
    }
}

/// Iterated-detangling pass count (spec §4.F "Iteration"): the vertex and
/// edge detangle sweeps repeat until a pass makes no change or this many
/// rounds have run, whichever comes first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IterationOptions {
    pub max_detangle_rounds: usize,
    pub max_phase_alternation_rounds: usize,
}

impl Default for IterationOptions {
    fn default() -> Self {
        IterationOptions {
            max_detangle_rounds: 10,
            max_phase_alternation_rounds: 4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub candidate: CandidateOptions,
    pub align4: Align4Options,
    pub path_graph1: PathGraph1Options,
    pub cpg: CpgOptions,
    pub iteration: IterationOptions,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            candidate: CandidateOptions::default(),
            align4: Align4Options::default(),
            path_graph1: PathGraph1Options::default(),
            cpg: CpgOptions::default(),
            iteration: IterationOptions::default(),
        }
    }
}

impl Config {
    pub fn from_toml_str(text: &str) -> Result<Config, crate::error::ShastaCoreError> {
        toml::from_str(text).map_err(crate::error::ShastaCoreError::Config)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn partial_override_keeps_other_defaults() {
        let config = Config::from_toml_str(
            "[cpg]\nlong_bubble_threshold = 2000\n",
        )
        .unwrap();
        assert_eq!(config.cpg.long_bubble_threshold, 2000);
        assert_eq!(config.cpg.detangle_tolerance_low, CpgOptions::default().detangle_tolerance_low);
    }
}
