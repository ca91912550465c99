//! Minimal driver binary exercising the pipeline end to end (spec §6).
//! Marker-graph construction is an external collaborator's job (spec §1
//! Non-goals); with no backend wired in, this driver runs the pipeline
//! over the empty in-memory reference implementations, which is enough to
//! validate configuration loading and artifact writing.
use shasta_core::{error::ShastaCoreError, Config};
use shasta_types::memory::{InMemoryMarkerGraph, PlaceholderPathAssembler};
use shasta_types::JourneyTable;
use std::fs;
use std::path::PathBuf;

fn usage() -> ! {
    eprintln!("usage: shasta-core [--config <path.toml>] [--out <prefix>]");
    std::process::exit(2);
}

fn parse_args() -> (Option<PathBuf>, PathBuf) {
    let mut config_path = None;
    let mut out_prefix = PathBuf::from("assembly");
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => config_path = Some(PathBuf::from(args.next().unwrap_or_else(|| usage()))),
            "--out" => out_prefix = PathBuf::from(args.next().unwrap_or_else(|| usage())),
            "-h" | "--help" => usage(),
            other => {
                eprintln!("unrecognized argument: {other}");
                usage()
            }
        }
    }
    (config_path, out_prefix)
}

fn run() -> Result<(), ShastaCoreError> {
    shasta_core::logging::init();

    let (config_path, out_prefix) = parse_args();
    let config = match config_path {
        Some(path) => {
            let text = fs::read_to_string(path)?;
            Config::from_toml_str(&text)?
        }
        None => Config::default(),
    };

    let marker_graph = InMemoryMarkerGraph::new();
    let journeys = JourneyTable::build(&marker_graph);
    let assembler = PlaceholderPathAssembler;

    let cpg = shasta_core::pipeline::run(&journeys, &marker_graph, &assembler, &config);

    let gfa_path = out_prefix.with_extension("gfa");
    let fasta_path = out_prefix.with_extension("fasta");
    let mut gfa_file = fs::File::create(&gfa_path)?;
    shasta_io::write_gfa(&cpg, &mut gfa_file)?;
    let mut fasta_file = fs::File::create(&fasta_path)?;
    shasta_io::write_fasta(&cpg, &mut fasta_file)?;

    tracing::info!(gfa = %gfa_path.display(), fasta = %fasta_path.display(), "artifacts written");
    Ok(())
}

fn main() {
    if let Err(error) = run() {
        eprintln!("shasta-core: {error}");
        std::process::exit(1);
    }
}
