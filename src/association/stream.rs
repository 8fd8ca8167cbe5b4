/// Per-stream sequence counters for both directions of an association.
///
/// Stream ids index directly into the tables; each counter wraps
/// independently at 2^16. Table sizes are fixed at the negotiated stream
/// counts when the association is created.
#[derive(Debug)]
pub(crate) struct SsnMap {
    outbound: Vec<u16>,
    inbound: Vec<u16>,
}

impl SsnMap {
    pub(crate) fn new(outbound_streams: u16, inbound_streams: u16) -> Self {
        SsnMap {
            outbound: vec![0; outbound_streams as usize],
            inbound: vec![0; inbound_streams as usize],
        }
    }

    pub(crate) fn outbound_streams(&self) -> u16 {
        self.outbound.len() as u16
    }

    pub(crate) fn inbound_streams(&self) -> u16 {
        self.inbound.len() as u16
    }

    /// Allocate the next SSN on an outbound stream.
    ///
    /// `stream_id` must be below the negotiated outbound stream count;
    /// that bound is the caller's contract, not re-checked here.
    pub(crate) fn next_ssn(&mut self, stream_id: u16) -> u16 {
        let ssn = self.outbound[stream_id as usize];
        self.outbound[stream_id as usize] = ssn.wrapping_add(1);
        ssn
    }

    /// SSN the peer is expected to send next on an inbound stream.
    pub(crate) fn peer_ssn(&self, stream_id: u16) -> u16 {
        self.inbound[stream_id as usize]
    }

    /// Record in-order delivery of one message on an inbound stream,
    /// returning the SSN that was consumed.
    pub(crate) fn advance_peer_ssn(&mut self, stream_id: u16) -> u16 {
        let ssn = self.inbound[stream_id as usize];
        self.inbound[stream_id as usize] = ssn.wrapping_add(1);
        ssn
    }

    /// Zero every counter in both directions. Used when the peer restarts
    /// the association.
    pub(crate) fn reset(&mut self) {
        for ssn in self.outbound.iter_mut() {
            *ssn = 0;
        }
        for ssn in self.inbound.iter_mut() {
            *ssn = 0;
        }
    }
}
