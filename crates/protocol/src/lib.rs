//! # Bridge Protocol Library
//!
//! Wire-level building blocks of the translation engine.
//!
//! ## Layers
//!
//! ### 1. Codecs ([`codecs`], [`tag`], [`holder`])
//! Typed decode/encode of protocol values: VarInt/VarLong, length-prefixed
//! strings and arrays, optionals, fixed-width primitives, binary tags and
//! registry holders. Under-reads and malformed input are distinct errors.
//!
//! ### 2. Packet identity ([`packet_kinds`], [`registry`], [`versions`])
//! Version-independent packet kinds and, per release, the tables mapping
//! them to numeric ids in every connection state and direction.
//!
//! ### 3. Packet wrapper ([`wrapper`])
//! The mutable view of one packet that remappers read from and write to.
//!
//! ## Usage Example
//!
//! ```rust
//! use bridge_protocol::codecs::{decode, encode, VarInt};
//!
//! let bytes = encode(&VarInt(300));
//! assert_eq!(&bytes[..], &[0xAC, 0x02]);
//! assert_eq!(decode::<VarInt>(&bytes).unwrap(), (VarInt(300), 2));
//! ```

pub mod armor_trim;
pub mod codecs;
pub mod component;
pub mod handshake;
pub mod holder;
pub mod packet_kinds;
pub mod registry;
pub mod tag;
pub mod versions;
pub mod wrapper;

pub use armor_trim::ArmorTrimPattern;
pub use codecs::{ByteArray, CodecResult, RemainingBytes, VarInt, VarLong, WireType};
pub use component::JsonComponent;
pub use handshake::Handshake;
pub use holder::{Holder, RegistryId};
pub use packet_kinds::PacketKind;
pub use registry::PacketRegistry;
pub use tag::{Compound, OptionalTag, Tag};
pub use wrapper::{EmitOrder, Emitted, PacketWrapper};
