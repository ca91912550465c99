//! Align4 — sparse diagonal-band marker-level pairwise alignment (spec §4.B).

pub mod align;
pub mod dp;
pub mod info;
pub mod matrix;
pub mod options;

pub use align::{align, swap_inputs};
pub use info::{Alignment, AlignmentInfo};
pub use options::Align4Options;
