//! GFA 1.0 writer (spec §6 "Produced outputs", GLOSSARY "GFA 1.0"): `H`
//! header, one `S` per Chain, `L` links with a zero-overlap CIGAR between
//! adjacent Chains and across CPG vertices.
use crate::error::IoResult;
use crate::segments::{links, segments};
use shasta_cpg::CompressedPathGraph;
use std::io::Write;

pub fn write_gfa<W: Write>(cpg: &CompressedPathGraph, writer: &mut W) -> IoResult<()> {
    writeln!(writer, "H\tVN:Z:1.0")?;

    let segment_list = segments(cpg);
    for segment in &segment_list {
        let (sequence, length) = match &segment.chain.sequence {
            Some(bytes) => (String::from_utf8_lossy(bytes).into_owned(), bytes.len()),
            None => ("*".to_string(), 0),
        };
        writeln!(writer, "S\t{}\t{}\tLN:i:{}", segment.name(), sequence, length)?;
    }

    let link_list = links(cpg);
    for (from, to) in &link_list {
        writeln!(writer, "L\t{}\t+\t{}\t+\t0M", from, to)?;
    }

    tracing::info!(segments = segment_list.len(), links = link_list.len(), "wrote GFA output");
    Ok(())
}
