//! Control FSM: publishes the head packet's metadata, accepts a
//! one-cycle `stream`/`drop` command, and drives the drop-retirement
//! sub-sequence (the stream sub-sequence lives in [`crate::reader`]).

use crate::{length_queue::LengthQueue, store::FlitStore};

/// Drives drop retirement: counts down `packet_length` ticks, advancing the
/// store head once per tick with no emitted flit, mirroring the reader's
/// `Streaming` counter but silent.
#[derive(Debug, Clone, Copy, Default)]
pub struct ControlFsm {
    dropping: Option<u8>,
}

impl ControlFsm {
    pub fn new() -> Self {
        Self { dropping: None }
    }

    pub fn reset(&mut self) {
        self.dropping = None;
    }

    #[inline]
    pub fn is_dropping(&self) -> bool {
        self.dropping.is_some()
    }

    /// Transitions into the drop-retirement sequence. The first cycle of
    /// retirement happens on the following tick, symmetric to
    /// `EgressReader::begin_stream`.
    pub fn begin_drop(&mut self, packet_length: u8) {
        packetbuf_utils::safe_assert!(!self.is_dropping(), "drop begun while already dropping");
        self.dropping = Some(packet_length);
    }

    /// If a drop is in progress, advances the store head by one flit without
    /// emitting anything. Retires the packet from the length queue on its
    /// final flit. No-op if not currently dropping, or if the next flit of
    /// the packet being dropped has not arrived yet (mirrors the reader's
    /// stall behavior: the command contract only requires the header to be
    /// latched, not the whole packet).
    pub fn tick(&mut self, store: &mut FlitStore, lengths: &mut LengthQueue) {
        let Some(remaining) = self.dropping.as_mut() else {
            return;
        };

        if !store.advance_head() {
            return;
        }
        *remaining -= 1;

        if *remaining == 0 {
            lengths.pop_front();
            self.dropping = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flit::Header;

    #[test]
    fn drops_without_emitting_and_retires() {
        let mut store = FlitStore::new(8);
        let mut lengths = LengthQueue::new(8);
        store.push(Header::encode(78, 34, 3));
        store.push(0xAA);
        store.push(0xBB);
        lengths.push_back(3);

        let mut control = ControlFsm::new();
        control.begin_drop(3);

        control.tick(&mut store, &mut lengths);
        assert!(control.is_dropping());
        assert_eq!(store.n_flits(), 2);

        control.tick(&mut store, &mut lengths);
        assert_eq!(store.n_flits(), 1);

        control.tick(&mut store, &mut lengths);
        assert!(!control.is_dropping());
        assert_eq!(store.n_flits(), 0);
        assert_eq!(lengths.len(), 0);
    }

    #[test]
    fn idle_tick_is_a_no_op() {
        let mut store = FlitStore::new(8);
        let mut lengths = LengthQueue::new(8);
        let mut control = ControlFsm::new();
        control.tick(&mut store, &mut lengths);
        assert_eq!(store.n_flits(), 0);
    }
}
