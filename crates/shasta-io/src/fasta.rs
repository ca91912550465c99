//! FASTA writer (spec §6 "Produced outputs"): one record per Chain, using
//! the Chain's assembled consensus or, if never assembled, an `N`-run of
//! its length as a placeholder.
use crate::error::IoResult;
use crate::segments::segments;
use shasta_cpg::CompressedPathGraph;
use std::io::Write;

pub fn write_fasta<W: Write>(cpg: &CompressedPathGraph, writer: &mut W) -> IoResult<()> {
    let segment_list = segments(cpg);
    for segment in &segment_list {
        writeln!(writer, ">{}", segment.name())?;
        match &segment.chain.sequence {
            Some(bytes) => writer.write_all(bytes)?,
            None => writer.write_all(&vec![b'N'; segment.chain.len()])?,
        }
        writeln!(writer)?;
    }
    tracing::info!(records = segment_list.len(), "wrote FASTA output");
    Ok(())
}
