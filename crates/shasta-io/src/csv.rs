//! CSV debug artifacts (SPEC_FULL.md §6 EXPANSION): per-BubbleChain,
//! per-Bubble, per-Chain and per-edge-within-chain breakdowns, one file
//! each. A BubbleChain lives 1:1 with the live CPG edge that owns it, so
//! `BubbleChainId` and `EdgeId` share the same value.
use crate::error::IoResult;
use shasta_cpg::CompressedPathGraph;
use std::io::Write;

pub fn write_bubble_chains_csv<W: Write>(cpg: &CompressedPathGraph, writer: &mut W) -> IoResult<()> {
    writeln!(writer, "BubbleChainId,EdgeId,SourceVertexId,TargetVertexId,BubbleCount")?;
    for (ei, edge) in cpg.edges.iter().enumerate() {
        if edge.removed {
            continue;
        }
        writeln!(
            writer,
            "{},{},{},{},{}",
            ei,
            ei,
            edge.source.0,
            edge.target.0,
            edge.bubble_chain.bubbles.len()
        )?;
    }
    Ok(())
}

pub fn write_bubbles_csv<W: Write>(cpg: &CompressedPathGraph, writer: &mut W) -> IoResult<()> {
    writeln!(writer, "BubbleChainId,PositionInChain,Ploidy,IsDiploid")?;
    for (ei, edge) in cpg.edges.iter().enumerate() {
        if edge.removed {
            continue;
        }
        for (pos, bubble) in edge.bubble_chain.bubbles.iter().enumerate() {
            writeln!(writer, "{},{},{},{}", ei, pos, bubble.ploidy(), bubble.is_diploid())?;
        }
    }
    Ok(())
}

pub fn write_chains_csv<W: Write>(cpg: &CompressedPathGraph, writer: &mut W) -> IoResult<()> {
    writeln!(writer, "BubbleChainId,PositionInChain,ChainIndexInBubble,Length,HasSequence")?;
    for (ei, edge) in cpg.edges.iter().enumerate() {
        if edge.removed {
            continue;
        }
        for (pos, bubble) in edge.bubble_chain.bubbles.iter().enumerate() {
            for (ci, chain) in bubble.chains().iter().enumerate() {
                writeln!(writer, "{},{},{},{},{}", ei, pos, ci, chain.len(), chain.sequence.is_some())?;
            }
        }
    }
    Ok(())
}

pub fn write_chain_details_csv<W: Write>(cpg: &CompressedPathGraph, writer: &mut W) -> IoResult<()> {
    writeln!(writer, "BubbleChainId,PositionInChain,ChainIndexInBubble,OrdinalInChain,MarkerGraphEdgeId")?;
    for (ei, edge) in cpg.edges.iter().enumerate() {
        if edge.removed {
            continue;
        }
        for (pos, bubble) in edge.bubble_chain.bubbles.iter().enumerate() {
            for (ci, chain) in bubble.chains().iter().enumerate() {
                for (ordinal, edge_id) in chain.edges.iter().enumerate() {
                    writeln!(writer, "{},{},{},{},{}", ei, pos, ci, ordinal, edge_id.0)?;
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use shasta_cpg::{BubbleChain, Chain};
    use shasta_types::MarkerGraphEdgeId;

    fn small_cpg() -> CompressedPathGraph {
        let mut cpg = CompressedPathGraph::default();
        let a = cpg.new_vertex(MarkerGraphEdgeId(0));
        let b = cpg.new_vertex(MarkerGraphEdgeId(2));
        let chain = Chain::new(vec![MarkerGraphEdgeId(0), MarkerGraphEdgeId(1), MarkerGraphEdgeId(2)]);
        cpg.add_edge(a, b, BubbleChain::single_haploid(chain), 0);
        cpg
    }

    #[test]
    fn bubble_chains_csv_has_one_row_per_edge() {
        let cpg = small_cpg();
        let mut out = Vec::new();
        write_bubble_chains_csv(&cpg, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().count(), 2);
        assert_eq!(text.lines().nth(1).unwrap(), "0,0,0,1,1");
    }

    #[test]
    fn chain_details_csv_has_one_row_per_marker_graph_edge() {
        let cpg = small_cpg();
        let mut out = Vec::new();
        write_chain_details_csv(&cpg, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().count(), 4);
    }
}
