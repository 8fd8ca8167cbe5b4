//! Association and transport state management for the SCTP protocol
//!
//! [SCTP](https://en.wikipedia.org/wiki/Stream_Control_Transmission_Protocol), defined in RFC 4960,
//! connects two endpoints that may each be reachable at several IP addresses. This crate contains
//! a fully deterministic implementation of the association layer of that protocol: transport
//! registration and path selection across a multi-homed peer, TSN and per-stream SSN allocation,
//! reference-counted association lifetime, and the timer and queue bookkeeping that surrounds
//! them. It contains no networking code and never reads the system clock; every time-sensitive
//! operation takes its `Instant` from the caller.
//!
//! The packet codec, the state-machine rules that react to individual chunk types, and the socket
//! API are external collaborators reached through narrow seams: chunks arrive through an
//! association's input queue and are drained through a [`ChunkDispatcher`], outbound chunks wait
//! in an [`OutboundQueue`] that consults per-path congestion state, and lifecycle events flow back
//! to the owning [`Endpoint`] for slot reclamation.

#![warn(rust_2018_idioms)]
#![allow(dead_code)]

mod address;
pub use crate::address::{Scope, TransportAddr};

mod association;
pub use crate::association::{
    Association, AssociationState, AssociationStats, ChunkDispatcher, HandshakeInfo, Timeout,
    Timer,
};

mod chunk;
pub use crate::chunk::{
    ChunkType, InboundChunk, OutboundChunk, CT_ABORT, CT_COOKIE_ACK, CT_COOKIE_ECHO, CT_ERROR,
    CT_HEARTBEAT, CT_HEARTBEAT_ACK, CT_INIT, CT_INIT_ACK, CT_PAYLOAD_DATA, CT_SACK, CT_SHUTDOWN,
    CT_SHUTDOWN_ACK, CT_SHUTDOWN_COMPLETE,
};

mod config;
pub use crate::config::{EndpointConfig, SocketConfig};

mod endpoint;
pub use crate::endpoint::{AssociationHandle, Endpoint};

mod error;
pub use crate::error::{Error, Result};

mod queue;
pub use crate::queue::{InboundQueue, OutboundQueue};

mod shared;
pub use crate::shared::{
    AssociationId, EndpointEvent, PeerAddressChange, PeerAddressState, TransportCmd,
};

mod transport;
pub use crate::transport::{CwndLowerReason, InflightChunk, Transport, TransportState};

mod tsn_map;
pub use crate::tsn_map::Gap;

mod util;
pub use crate::util::{RandomVerificationTagGenerator, VerificationTagGenerator};
