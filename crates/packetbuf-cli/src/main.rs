//! Scripted-scenario driver for `packetbuf-core`: reads a JSON scenario
//! file describing a packet sequence and per-packet stream/drop decisions,
//! runs it against a real [`packetbuf_core::PacketBuffer`], and prints a
//! per-cycle trace plus a summary of what egressed.

use std::path::PathBuf;

use clap::Parser;
use packetbuf_cli::{RunReport, Scenario, ScenarioError};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Parser)]
#[command(about = "Drive packetbuf-core through a scripted scenario")]
struct Args {
    /// Path to a scenario JSON file (see packetbuf-cli's crate docs for the
    /// format: flit_capacity, packet_capacity, packets, actions).
    scenario: PathBuf,

    /// Print every cycle's outputs, not just the final summary.
    #[arg(long)]
    trace: bool,
}

#[derive(Debug, Error)]
enum CliError {
    #[error("failed to read scenario file {path}: {source}")]
    Read { path: PathBuf, #[source] source: std::io::Error },
    #[error("failed to parse scenario file {path}: {source}")]
    Parse { path: PathBuf, #[source] source: serde_json::Error },
    #[error(transparent)]
    Scenario(#[from] ScenarioError),
}

fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let report = run(&args)?;
    print_summary(&args, &report);
    Ok(())
}

fn run(args: &Args) -> Result<RunReport, CliError> {
    let raw = std::fs::read_to_string(&args.scenario)
        .map_err(|source| CliError::Read { path: args.scenario.clone(), source })?;
    let scenario: Scenario = serde_json::from_str(&raw)
        .map_err(|source| CliError::Parse { path: args.scenario.clone(), source })?;

    info!(
        packets = scenario.packets.len(),
        flit_capacity = scenario.flit_capacity,
        packet_capacity = scenario.packet_capacity,
        "running scenario"
    );
    Ok(packetbuf_cli::run_scenario(&scenario)?)
}

fn print_summary(args: &Args, report: &RunReport) {
    if args.trace {
        for entry in &report.trace {
            let out = entry.outputs;
            println!(
                "cycle {:>4}: out_flit_valid={:<5} packet_ready={:<5} control_ready={:<5} n_flits={:<4} n_packets={}",
                entry.cycle, out.out_flit_valid, out.packet_ready, out.control_ready, out.n_flits, out.n_packets
            );
        }
    }
    println!("finished in {} cycles, {} flits egressed", report.cycles, report.egress_flits.len());
}
