//! Configuration, logging and pipeline orchestration tying the marker-pair
//! alignment, path-graph and compressed-path-graph stages together into a
//! single run (spec §5, §6).
pub mod config;
pub mod error;
pub mod logging;
pub mod pipeline;

pub use config::{CandidateOptions, Config, IterationOptions};
pub use error::{CoreResult, ShastaCoreError};
pub use pipeline::run;
