use crate::chunk::OutboundChunk;
use crate::transport::Transport;

use std::collections::VecDeque;

/// Chunks waiting to be packed into outbound packets.
///
/// Packet building proper is external; this queue exposes the
/// transport-aware accounting the builder needs, consulting the target
/// path's congestion window and PMTU.
#[derive(Debug, Default)]
pub struct OutboundQueue {
    pending: VecDeque<OutboundChunk>,
    n_bytes: usize,
}

impl OutboundQueue {
    pub(crate) fn new() -> Self {
        OutboundQueue::default()
    }

    pub fn push(&mut self, chunk: OutboundChunk) {
        self.n_bytes += chunk.user_data.len();
        self.pending.push_back(chunk);
    }

    /// Pop as many whole chunks as the transport will accept right now.
    ///
    /// The burst is bounded by the path's open congestion window; a single
    /// chunk is always released when the queue is non-empty and the window
    /// has any room at all, so a retransmission can never deadlock behind
    /// its own flight.
    pub fn next_burst(&mut self, transport: &Transport) -> Vec<OutboundChunk> {
        let mut budget = transport.window_available();
        let mut burst = Vec::new();

        while let Some(front) = self.pending.front() {
            let size = front.wire_size();
            if !burst.is_empty() && size > budget {
                break;
            }
            if burst.is_empty() && budget == 0 {
                break;
            }
            budget = budget.saturating_sub(size);
            let chunk = self.pending.pop_front().expect("front was Some");
            self.n_bytes -= chunk.user_data.len();
            burst.push(chunk);
        }
        burst
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn n_bytes(&self) -> usize {
        self.n_bytes
    }

    /// Drop everything still pending. Called when the association is torn
    /// down.
    pub(crate) fn teardown(&mut self) {
        self.pending.clear();
        self.n_bytes = 0;
    }
}
