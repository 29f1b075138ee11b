//! `PacketBuffer`: the synchronous top-level block composing the Ingress
//! Writer, the bounded store, the Egress Reader and the Control FSM behind a
//! single `tick(Inputs) -> Outputs` entry point.

use tracing::debug;

use crate::{
    control::ControlFsm,
    error::ConfigError,
    flit::{Flit, Header},
    length_queue::LengthQueue,
    reader::EgressReader,
    store::FlitStore,
    writer::IngressWriter,
};

/// Everything the external collaborators drive on a given tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Inputs {
    pub in_flit: Flit,
    pub in_flit_valid: bool,
    pub control_valid: bool,
    pub stream: bool,
    pub drop: bool,
}

/// Everything the core publishes after a given tick has committed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Outputs {
    pub out_flit: Flit,
    pub out_flit_valid: bool,
    pub packet_ready: bool,
    pub control_ready: bool,
    /// Back-pressure signal: exposed since a software caller has nothing
    /// else to poll before pushing the next flit.
    pub in_ready: bool,
    pub header: Flit,
    pub to_addr: u8,
    pub from_addr: u8,
    pub packet_length: u8,
    pub n_packets: usize,
    pub n_flits: usize,
}

/// The NoC ingress packet buffer core.
#[derive(Debug, Clone)]
pub struct PacketBuffer {
    store: FlitStore,
    lengths: LengthQueue,
    writer: IngressWriter,
    reader: EgressReader,
    control: ControlFsm,
}

impl PacketBuffer {
    /// `flit_capacity` is `C`, the flit store's capacity; `packet_capacity`
    /// is `P`, the packet-length queue's capacity. Neither need be a power
    /// of two (rounded up internally); both must be non-zero.
    pub fn new(flit_capacity: usize, packet_capacity: usize) -> Result<Self, ConfigError> {
        if flit_capacity == 0 {
            return Err(ConfigError::ZeroFlitCapacity);
        }
        if packet_capacity == 0 {
            return Err(ConfigError::ZeroPacketCapacity);
        }
        Ok(Self {
            store: FlitStore::new(flit_capacity),
            lengths: LengthQueue::new(packet_capacity),
            writer: IngressWriter::new(),
            reader: EgressReader::new(),
            control: ControlFsm::new(),
        })
    }

    /// `C`, the flit store's actual (power-of-two-rounded) capacity.
    pub fn flit_capacity(&self) -> usize {
        self.store.capacity()
    }

    /// `P`, the packet-length queue's actual (power-of-two-rounded) capacity.
    pub fn packet_capacity(&self) -> usize {
        self.lengths.capacity()
    }

    /// Synchronous reset: clears both cursors, both counters, the
    /// packet-length queue, and every sub-component's local state. Safe to
    /// call mid-packet on either side.
    pub fn reset(&mut self) {
        self.store.reset();
        self.lengths.clear();
        self.writer.reset();
        self.reader.reset();
        self.control.reset();
    }

    fn mid_retirement(&self) -> bool {
        !self.reader.is_idle() || self.control.is_dropping()
    }

    /// Advances the core by exactly one clock cycle: retires one flit of an
    /// in-progress stream or drop, admits one ingress flit, then samples a
    /// control command against the resulting state. All updates commit
    /// atomically before this call returns.
    pub fn tick(&mut self, inputs: Inputs) -> Outputs {
        // Snapshot whether a stream or drop was already in flight *before*
        // this cycle's retirement step runs. That step can itself retire a
        // packet's last flit and flip both sub-FSMs back to idle, but
        // packet_ready/control_ready must stay low for the whole cycle that
        // retirement was in flight, including its last one — otherwise a
        // command sampled this same tick would coincide with the
        // out_flit_valid of that same retiring flit.
        let was_retiring = self.mid_retirement();

        // Continue whichever retirement (if any) is in flight, using the
        // state left over from the previous tick.
        let (out_flit, out_flit_valid) =
            match self.reader.tick(&mut self.store, &mut self.lengths) {
                Some(flit) => (flit, true),
                None => {
                    self.control.tick(&mut self.store, &mut self.lengths);
                    (0, false)
                }
            };

        // Ingress runs independently of the retirement above; both cursors
        // may advance in the same cycle.
        let accepted =
            self.writer.tick(inputs.in_flit, inputs.in_flit_valid, &mut self.store, &mut self.lengths);
        if inputs.in_flit_valid && !accepted {
            debug!(n_flits = self.store.n_flits(), "ingress flit refused: buffer at capacity");
        }

        // Sample a control command against the state as it stood *before*
        // this tick's retirement step, not after: readiness can only rise
        // starting the cycle following a retirement's last flit.
        let ready = !was_retiring && !self.lengths.is_empty();
        if inputs.control_valid {
            if ready {
                match (inputs.stream, inputs.drop) {
                    (true, false) => {
                        let length = self
                            .lengths
                            .front()
                            .expect("control_ready implies a queued packet length");
                        self.reader.begin_stream(length);
                    }
                    (false, true) => {
                        let length = self
                            .lengths
                            .front()
                            .expect("control_ready implies a queued packet length");
                        self.control.begin_drop(length);
                    }
                    _ => debug!(
                        stream = inputs.stream,
                        drop = inputs.drop,
                        "spurious control command ignored"
                    ),
                }
            } else {
                debug!("control command ignored: control_ready is low");
            }
        }

        // A command accepted above immediately sets mid_retirement() true
        // (begin_stream/begin_drop only flip state), so re-checking it here
        // is what makes control_ready drop the same cycle a command lands.
        let ready = ready && !self.mid_retirement();

        let header = Header::decode(self.store.peek_head().unwrap_or(0));

        Outputs {
            out_flit,
            out_flit_valid,
            packet_ready: ready,
            control_ready: ready,
            in_ready: !self.store.is_full(),
            header: header.raw(),
            to_addr: header.to_addr(),
            from_addr: header.from_addr(),
            packet_length: header.packet_length(),
            n_packets: self.lengths.len(),
            n_flits: self.store.n_flits(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ingress(flit: Flit) -> Inputs {
        Inputs { in_flit: flit, in_flit_valid: true, ..Default::default() }
    }

    fn idle() -> Inputs {
        Inputs::default()
    }

    fn stream() -> Inputs {
        Inputs { control_valid: true, stream: true, ..Default::default() }
    }

    fn drop() -> Inputs {
        Inputs { control_valid: true, drop: true, ..Default::default() }
    }

    #[test]
    fn rejects_zero_capacities() {
        assert!(matches!(PacketBuffer::new(0, 4), Err(ConfigError::ZeroFlitCapacity)));
        assert!(matches!(PacketBuffer::new(4, 0), Err(ConfigError::ZeroPacketCapacity)));
    }

    #[test]
    fn single_packet_streams_in_arrival_order() {
        let mut buf = PacketBuffer::new(256, 64).unwrap();
        let header = Header::encode(23, 5, 3);

        let out = buf.tick(ingress(header));
        assert_eq!(out.n_flits, 1);
        assert!(out.packet_ready);
        assert_eq!(out.n_packets, 1);

        let out = buf.tick(ingress(0xD1));
        assert_eq!(out.n_flits, 2);

        let out = buf.tick(ingress(0xD2));
        assert_eq!(out.n_flits, 3);

        let out = buf.tick(idle());
        assert_eq!(out.n_flits, 3);

        let out = buf.tick(stream());
        assert!(!out.control_ready);

        let out = buf.tick(idle());
        assert!(out.out_flit_valid);
        assert_eq!(out.out_flit, header);

        let out = buf.tick(idle());
        assert_eq!(out.out_flit, 0xD1);

        let out = buf.tick(idle());
        assert_eq!(out.out_flit, 0xD2);
        assert_eq!(out.n_flits, 0);
        assert_eq!(out.n_packets, 0);
        assert!(!out.packet_ready);
    }

    #[test]
    fn drop_retires_without_emitting() {
        let mut buf = PacketBuffer::new(256, 64).unwrap();
        buf.tick(ingress(Header::encode(78, 34, 2)));
        buf.tick(ingress(0xEE));

        buf.tick(drop());
        let out = buf.tick(idle());
        assert!(!out.out_flit_valid);
        assert_eq!(out.n_flits, 1);
        let out = buf.tick(idle());
        assert!(!out.out_flit_valid);
        assert_eq!(out.n_flits, 0);
        assert_eq!(out.n_packets, 0);
    }

    #[test]
    fn reset_mid_packet_clears_everything() {
        let mut buf = PacketBuffer::new(256, 64).unwrap();
        buf.tick(ingress(Header::encode(1, 2, 4)));
        buf.tick(ingress(0xAA));
        buf.reset();

        let out = buf.tick(idle());
        assert_eq!(out.n_flits, 0);
        assert_eq!(out.n_packets, 0);
        assert!(!out.packet_ready);
    }

    #[test]
    fn simultaneous_stream_and_drop_is_ignored() {
        let mut buf = PacketBuffer::new(256, 64).unwrap();
        buf.tick(ingress(Header::encode(1, 2, 1)));

        let out = buf.tick(Inputs { control_valid: true, stream: true, drop: true, ..Default::default() });
        assert!(out.packet_ready);
        assert!(out.control_ready);
    }

    #[test]
    fn back_pressure_refuses_ingress_when_full() {
        let mut buf = PacketBuffer::new(1, 4).unwrap();
        let out = buf.tick(ingress(Header::encode(1, 2, 2)));
        assert!(!out.in_ready);

        let out = buf.tick(ingress(0xAA));
        assert_eq!(out.n_flits, 1);
        assert!(!out.in_ready);
    }
}
