//! Property tests for the wire codecs
//!
//! Decoders are fed arbitrary input and must return an error instead of
//! panicking or allocating without bound.

use bridge_protocol::codecs::{decode, decode_varint, encode, varint_len, VarInt, VarLong};
use bridge_protocol::{OptionalTag, PacketWrapper, Tag};
use bytes::Bytes;
use proptest::prelude::*;

proptest! {
    /// Property: VarInt encodes to its computed length and decodes back
    #[test]
    fn varint_roundtrips(value in any::<i32>()) {
        let encoded = encode(&VarInt(value));
        prop_assert_eq!(encoded.len(), varint_len(value));
        let (decoded, consumed) = decode_varint(&encoded).unwrap();
        prop_assert_eq!(decoded, value);
        prop_assert_eq!(consumed, encoded.len());
    }

    /// Property: VarLong never exceeds ten bytes
    #[test]
    fn varlong_roundtrips(value in any::<i64>()) {
        let encoded = encode(&VarLong(value));
        prop_assert!(encoded.len() <= 10);
        prop_assert_eq!(decode::<VarLong>(&encoded).unwrap().0, VarLong(value));
    }

    /// Property: strings below the limit survive encoding
    #[test]
    fn string_roundtrips(value in "\\PC{0,64}") {
        let encoded = encode(&value);
        let (decoded, consumed) = decode::<String>(&encoded).unwrap();
        prop_assert_eq!(decoded, value);
        prop_assert_eq!(consumed, encoded.len());
    }

    /// Property: arbitrary bytes don't crash the tag decoder
    #[test]
    fn arbitrary_bytes_dont_crash_tags(
        random_bytes in prop::collection::vec(any::<u8>(), 0..512),
    ) {
        let _ = decode::<OptionalTag>(&random_bytes);
        let _ = decode::<Tag>(&random_bytes);
    }

    /// Property: arbitrary bytes don't crash typed reads
    #[test]
    fn arbitrary_bytes_dont_crash_reads(
        random_bytes in prop::collection::vec(any::<u8>(), 0..512),
    ) {
        let _ = decode::<Vec<String>>(&random_bytes);
        let _ = decode::<Option<Vec<VarInt>>>(&random_bytes);
    }

    /// Property: a packet nobody touches is forwarded byte for byte
    #[test]
    fn untouched_packet_is_identity(
        id in 0i32..0x80,
        body in prop::collection::vec(any::<u8>(), 0..256),
    ) {
        let mut raw = encode(&VarInt(id));
        raw.extend_from_slice(&body);
        let raw = raw.freeze();
        let wrapper = PacketWrapper::decode(raw.clone()).unwrap();
        prop_assert_eq!(wrapper.into_bytes(), raw);
    }
}

#[test]
fn test_empty_input_is_truncated() {
    let err = decode::<VarInt>(&[]).unwrap_err();
    assert!(err.is_truncated());
    assert!(PacketWrapper::decode(Bytes::new()).is_err());
}
