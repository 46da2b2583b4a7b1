//! Handshake packet
//!
//! The first packet of every connection. Hosts peek at it to learn the
//! client's protocol version before a pipeline exists.

use crate::codecs::{read_string, read_varint, write_string, write_varint, CodecResult, WireType};
use bridge_core::{CodecError, ProtocolVersion};
use bytes::{Bytes, BytesMut};

pub const INTENT_STATUS: i32 = 1;
pub const INTENT_LOGIN: i32 = 2;
pub const INTENT_TRANSFER: i32 = 3;

/// Maximum length of the server address field
pub const MAX_ADDRESS_LEN: usize = 255;

/// # Packet Format
/// - VarInt: protocol version
/// - String(255): server address
/// - UnsignedShort: server port
/// - VarInt: next state intent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Handshake {
    pub protocol_version: ProtocolVersion,
    pub server_address: String,
    pub server_port: u16,
    pub intent: i32,
}

impl WireType for Handshake {
    fn read(buf: &mut Bytes) -> CodecResult<Self> {
        Ok(Self {
            protocol_version: ProtocolVersion::new(read_varint(buf)?),
            server_address: read_string(buf, MAX_ADDRESS_LEN)?,
            server_port: u16::read(buf)?,
            intent: read_varint(buf)?,
        })
    }

    fn write(&self, buf: &mut BytesMut) {
        write_varint(buf, self.protocol_version.id());
        write_string(buf, &self.server_address);
        self.server_port.write(buf);
        write_varint(buf, self.intent);
    }
}

impl Handshake {
    /// Decode the handshake from a raw payload (id included)
    ///
    /// # Errors
    /// `Malformed` if the payload is not packet id 0
    pub fn peek(payload: &[u8]) -> CodecResult<Self> {
        let mut buf = Bytes::copy_from_slice(payload);
        let id = read_varint(&mut buf)?;
        if id != 0 {
            return Err(CodecError::malformed(
                "Handshake",
                format!("expected packet id 0, got {}", id),
            ));
        }
        Self::read(&mut buf)
    }

    /// Encode as a full payload with packet id 0
    pub fn to_payload(&self) -> Bytes {
        let mut buf = BytesMut::new();
        write_varint(&mut buf, 0);
        self.write(&mut buf);
        buf.freeze()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_peek_version() {
        let handshake = Handshake {
            protocol_version: ProtocolVersion::V1_20_2,
            server_address: "localhost".into(),
            server_port: 25565,
            intent: INTENT_LOGIN,
        };
        let payload = handshake.to_payload();
        assert_eq!(payload[0], 0x00);
        assert_eq!(Handshake::peek(&payload).unwrap(), handshake);
    }

    #[test]
    fn test_peek_wrong_id() {
        assert!(Handshake::peek(&[0x01, 0x00]).is_err());
    }

    #[test]
    fn test_address_limit() {
        let handshake = Handshake {
            protocol_version: ProtocolVersion::V1_21,
            server_address: "a".repeat(300),
            server_port: 1,
            intent: INTENT_STATUS,
        };
        assert!(Handshake::peek(&handshake.to_payload()).is_err());
    }
}
