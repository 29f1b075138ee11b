//! Scenario harness for `packetbuf-core`: describes a sequence of packets
//! and per-packet stream/drop decisions in a small JSON format, then drives
//! a [`PacketBuffer`] through it one cycle at a time, continuously (one
//! flit of ingress per cycle, no gaps), issuing each decision as soon as the
//! core can possibly accept it.

use packetbuf_core::{ConfigError, Header, Inputs, PacketBuffer};
use serde::Deserialize;
use thiserror::Error;

/// One packet to ingest: its header fields plus how many data flits follow.
/// Data flit payloads are synthesized, not read from the file.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PacketSpec {
    pub to_addr: u8,
    pub from_addr: u8,
    pub length: u8,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Stream,
    Drop,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    #[serde(default = "default_flit_capacity")]
    pub flit_capacity: usize,
    #[serde(default = "default_packet_capacity")]
    pub packet_capacity: usize,
    pub packets: Vec<PacketSpec>,
    pub actions: Vec<Action>,
}

fn default_flit_capacity() -> usize {
    256
}

fn default_packet_capacity() -> usize {
    64
}

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("scenario has {packets} packets but {actions} actions; they must match one-to-one")]
    ActionCountMismatch { packets: usize, actions: usize },
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// One line of the trace: the cycle number and the core's outputs after it.
#[derive(Debug, Clone, Copy)]
pub struct TraceEntry {
    pub cycle: usize,
    pub outputs: packetbuf_core::Outputs,
}

#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub cycles: usize,
    pub egress_flits: Vec<u64>,
    pub trace: Vec<TraceEntry>,
}

/// Builds the flat, back-to-back ingress flit stream for `packets`: each
/// packet's header followed by `length - 1` synthesized data flits encoding
/// the packet's position and flit index so a trace reader can tell them
/// apart at a glance.
fn build_ingress(packets: &[PacketSpec]) -> Vec<u64> {
    let mut flits = Vec::new();
    for (packet_index, spec) in packets.iter().enumerate() {
        flits.push(Header::encode(spec.to_addr, spec.from_addr, spec.length));
        for flit_index in 1..spec.length {
            flits.push(((packet_index as u64) << 16) | flit_index as u64);
        }
    }
    flits
}

pub fn run_scenario(scenario: &Scenario) -> Result<RunReport, ScenarioError> {
    if scenario.packets.len() != scenario.actions.len() {
        return Err(ScenarioError::ActionCountMismatch {
            packets: scenario.packets.len(),
            actions: scenario.actions.len(),
        });
    }

    let mut buffer = PacketBuffer::new(scenario.flit_capacity, scenario.packet_capacity)?;
    let mut ingress: Vec<u64> = build_ingress(&scenario.packets).into_iter().rev().collect();
    let total_flits = ingress.len();

    let mut report = RunReport::default();
    let mut action_index = 0usize;
    let mut prev_control_ready = false;

    loop {
        let mut inputs = Inputs::default();
        if let Some(flit) = ingress.pop() {
            inputs.in_flit = flit;
            inputs.in_flit_valid = true;
        }

        if prev_control_ready && action_index < scenario.actions.len() {
            inputs.control_valid = true;
            match scenario.actions[action_index] {
                Action::Stream => inputs.stream = true,
                Action::Drop => inputs.drop = true,
            }
            action_index += 1;
        }

        let outputs = buffer.tick(inputs);
        prev_control_ready = outputs.control_ready;
        report.cycles += 1;

        if outputs.out_flit_valid {
            report.egress_flits.push(outputs.out_flit);
        }
        report.trace.push(TraceEntry { cycle: report.cycles, outputs });

        let drained = ingress.is_empty() && action_index == scenario.actions.len();
        if drained && outputs.n_flits == 0 && outputs.n_packets == 0 {
            break;
        }

        packetbuf_utils::safe_assert!(
            report.cycles <= total_flits + scenario.actions.len() + 1,
            "scenario did not converge within the expected cycle budget"
        );
    }

    Ok(report)
}
