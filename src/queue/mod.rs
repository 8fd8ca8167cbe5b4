pub(crate) mod inbound_queue;
pub(crate) mod outbound_queue;

pub use self::inbound_queue::InboundQueue;
pub use self::outbound_queue::OutboundQueue;
