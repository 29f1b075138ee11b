//! Egress Reader: the `Idle`/`Streaming` state machine that emits a
//! streamed packet's flits one per tick, in order, starting with the header.

use crate::{flit::Flit, length_queue::LengthQueue, store::FlitStore};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum ReaderState {
    #[default]
    Idle,
    Streaming {
        remaining: u8,
    },
}

/// Drives streaming egress. Owns no buffer state itself; each tick it either
/// emits the flit currently at the store's head or does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct EgressReader {
    state: ReaderState,
}

impl EgressReader {
    pub fn new() -> Self {
        Self { state: ReaderState::Idle }
    }

    pub fn reset(&mut self) {
        self.state = ReaderState::Idle;
    }

    #[inline]
    pub fn is_idle(&self) -> bool {
        matches!(self.state, ReaderState::Idle)
    }

    /// Transitions out of `Idle`. The caller is responsible for having
    /// verified `control_ready` was high and a `stream` command was accepted.
    /// The first flit does not emit until the following tick.
    pub fn begin_stream(&mut self, packet_length: u8) {
        packetbuf_utils::safe_assert!(self.is_idle(), "stream begun while already streaming");
        self.state = ReaderState::Streaming { remaining: packet_length };
    }

    /// If currently streaming, emits the flit at the store's head, advances
    /// the head cursor, and retires the packet from the length queue on its
    /// final flit. Returns `None` if idle, or if streaming has caught up
    /// with ingress and the next flit of the packet has not arrived yet (the
    /// command contract only requires the header to be latched, not the
    /// whole packet, so this stalls rather than underruns the store).
    pub fn tick(&mut self, store: &mut FlitStore, lengths: &mut LengthQueue) -> Option<Flit> {
        let ReaderState::Streaming { remaining } = &mut self.state else {
            return None;
        };

        let flit = store.peek_head()?;
        store.advance_head();
        *remaining -= 1;

        if *remaining == 0 {
            lengths.pop_front();
            self.state = ReaderState::Idle;
        }

        Some(flit)
    }
}
