//! GFA 1.0, FASTA and CSV debug artifact output for an assembled
//! CompressedPathGraph (spec §6 "Produced outputs").
pub mod csv;
pub mod error;
pub mod fasta;
pub mod gfa;
pub mod segments;

pub use csv::{write_bubble_chains_csv, write_bubbles_csv, write_chain_details_csv, write_chains_csv};
pub use error::{IoResult, ShastaIoError};
pub use fasta::write_fasta;
pub use gfa::write_gfa;
