use crate::address::TransportAddr;

use std::fmt;

/// Protocol-level identifier for an association: the local verification tag.
///
/// Mainly useful for identifying this association's packets on the wire
/// with tools like Wireshark.
pub type AssociationId = u32;

/// Events sent from an `Association` to its owning `Endpoint`.
#[derive(Debug)]
pub struct EndpointEvent(pub(crate) EndpointEventInner);

impl EndpointEvent {
    /// Construct an event indicating that an `Association` will no longer
    /// emit events.
    pub fn drained() -> Self {
        Self(EndpointEventInner::Drained)
    }

    /// Determine whether this is the last event an `Association` will emit.
    ///
    /// Useful for determining when association-related bookkeeping can be
    /// freed.
    pub fn is_drained(&self) -> bool {
        self.0 == EndpointEventInner::Drained
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) enum EndpointEventInner {
    /// The association's last reference is gone; reclaim its slot.
    Drained,
}

/// Direction of a transport reachability change fed into
/// `Association::control_transport`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TransportCmd {
    Up,
    Down,
}

/// Reachability of a peer address as reported to the upper layer.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PeerAddressState {
    Available,
    Unreachable,
}

impl fmt::Display for PeerAddressState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match *self {
            PeerAddressState::Available => "Available",
            PeerAddressState::Unreachable => "Unreachable",
        };
        write!(f, "{}", s)
    }
}

/// Notification queued for the upper layer whenever a peer address changes
/// reachability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerAddressChange {
    pub addr: TransportAddr,
    pub state: PeerAddressState,
    /// Protocol error cause carried with the notification, 0 when none.
    pub error: u32,
}
