use crate::address::TransportAddr;
use crate::config::DATA_CHUNK_HEADER_SIZE;

use bytes::Bytes;
use std::fmt;

/// ChunkType wraps the SCTP chunk type field.
///
/// This field identifies the kind of information carried in the chunk
/// value. The codec that parses and serializes chunk TLVs lives upstream;
/// the association only needs the type to route dispatch decisions.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct ChunkType(pub u8);

pub const CT_PAYLOAD_DATA: ChunkType = ChunkType(0);
pub const CT_INIT: ChunkType = ChunkType(1);
pub const CT_INIT_ACK: ChunkType = ChunkType(2);
pub const CT_SACK: ChunkType = ChunkType(3);
pub const CT_HEARTBEAT: ChunkType = ChunkType(4);
pub const CT_HEARTBEAT_ACK: ChunkType = ChunkType(5);
pub const CT_ABORT: ChunkType = ChunkType(6);
pub const CT_SHUTDOWN: ChunkType = ChunkType(7);
pub const CT_SHUTDOWN_ACK: ChunkType = ChunkType(8);
pub const CT_ERROR: ChunkType = ChunkType(9);
pub const CT_COOKIE_ECHO: ChunkType = ChunkType(10);
pub const CT_COOKIE_ACK: ChunkType = ChunkType(11);
pub const CT_SHUTDOWN_COMPLETE: ChunkType = ChunkType(14);

impl ChunkType {
    /// Whether chunks of this type carry user data (and thus a TSN).
    pub fn is_data(&self) -> bool {
        *self == CT_PAYLOAD_DATA
    }
}

impl fmt::Display for ChunkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let others = format!("Unknown ChunkType: {}", self.0);
        let s = match *self {
            CT_PAYLOAD_DATA => "DATA",
            CT_INIT => "INIT",
            CT_INIT_ACK => "INIT-ACK",
            CT_SACK => "SACK",
            CT_HEARTBEAT => "HEARTBEAT",
            CT_HEARTBEAT_ACK => "HEARTBEAT-ACK",
            CT_ABORT => "ABORT",
            CT_SHUTDOWN => "SHUTDOWN",
            CT_SHUTDOWN_ACK => "SHUTDOWN-ACK",
            CT_ERROR => "ERROR",
            CT_COOKIE_ECHO => "COOKIE-ECHO",
            CT_COOKIE_ACK => "COOKIE-ACK",
            CT_SHUTDOWN_COMPLETE => "SHUTDOWN-COMPLETE",
            _ => others.as_str(),
        };
        write!(f, "{}", s)
    }
}

/// A chunk handed to an association by the input queue.
///
/// TLV parsing happened upstream; this is only what path bookkeeping and
/// state-machine dispatch need to see.
#[derive(Debug, Clone)]
pub struct InboundChunk {
    pub chunk_type: ChunkType,
    /// Peer address the enclosing packet arrived from.
    pub source: TransportAddr,
    /// TSN, for data-bearing chunks.
    pub tsn: Option<u32>,
    pub user_data: Bytes,
}

impl InboundChunk {
    pub fn is_data(&self) -> bool {
        self.chunk_type.is_data()
    }
}

/// A chunk queued for transmission, before packet building.
#[derive(Debug, Clone)]
pub struct OutboundChunk {
    pub chunk_type: ChunkType,
    pub tsn: Option<u32>,
    pub stream_id: u16,
    pub ssn: u16,
    pub user_data: Bytes,
}

impl OutboundChunk {
    /// Size this chunk will occupy on the wire, header included.
    pub(crate) fn wire_size(&self) -> u32 {
        DATA_CHUNK_HEADER_SIZE + self.user_data.len() as u32
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_chunk_type_string() {
        let tests = vec![
            (CT_PAYLOAD_DATA, "DATA"),
            (CT_INIT, "INIT"),
            (CT_SACK, "SACK"),
            (CT_HEARTBEAT, "HEARTBEAT"),
            (CT_SHUTDOWN, "SHUTDOWN"),
            (CT_SHUTDOWN_COMPLETE, "SHUTDOWN-COMPLETE"),
            (ChunkType(255), "Unknown ChunkType: 255"),
        ];

        for (ct, expected) in tests {
            assert_eq!(
                ct.to_string(),
                expected,
                "failed to stringify chunkType {}, expected {}",
                ct,
                expected
            );
        }
    }

    #[test]
    fn test_only_payload_data_is_data() {
        assert!(CT_PAYLOAD_DATA.is_data());
        assert!(!CT_SACK.is_data());
        assert!(!CT_HEARTBEAT.is_data());
    }
}
