//! Ingress Writer: admits one flit per tick into the store, tracking
//! how many flits remain in the packet currently being written so it knows
//! when the next accepted flit is a header.

use crate::{flit::Header, length_queue::LengthQueue, store::FlitStore};

/// Local per-tick state of the Ingress Writer: how many more flits belong to
/// the packet currently being received before the next one starts a header.
#[derive(Debug, Clone, Copy, Default)]
pub struct IngressWriter {
    flits_remaining: u8,
}

impl IngressWriter {
    pub fn new() -> Self {
        Self { flits_remaining: 0 }
    }

    pub fn reset(&mut self) {
        self.flits_remaining = 0;
    }

    /// Admits `flit` into `store` if `valid` and capacity allows. Returns
    /// whether the flit was accepted; a `false` return with `valid` set
    /// means back-pressure engaged and the writer held all state.
    pub fn tick(
        &mut self,
        flit: u64,
        valid: bool,
        store: &mut FlitStore,
        lengths: &mut LengthQueue,
    ) -> bool {
        if !valid {
            return false;
        }

        let starts_header = self.flits_remaining == 0;
        if store.is_full() || (starts_header && lengths.is_full()) {
            return false;
        }

        let accepted = store.push(flit);
        debug_assert!(accepted, "capacity was checked above");

        if starts_header {
            let header = Header::decode(flit);
            let length = header.packet_length();
            let enqueued = lengths.push_back(length);
            debug_assert!(enqueued, "capacity was checked above");
            self.flits_remaining = length - 1;
        } else {
            self.flits_remaining -= 1;
        }

        true
    }
}
