//! Packet tables of every supported release
//!
//! Handshake and status never changed across the supported range, so they
//! are shared here and added to every registry.

pub mod v1_20_2;
pub mod v1_20_3;
pub mod v1_20_5;
pub mod v1_21;

use crate::packet_kinds::PacketKind;
use crate::registry::{PacketRegistry, RegistryBuilder};
use bridge_core::{ConnectionState, Direction, ProtocolVersion, Result};

pub const HANDSHAKE_SERVERBOUND: &[PacketKind] = &[PacketKind::CLIENT_INTENTION];

pub const STATUS_CLIENTBOUND: &[PacketKind] =
    &[PacketKind::STATUS_RESPONSE, PacketKind::PONG_RESPONSE];

pub const STATUS_SERVERBOUND: &[PacketKind] =
    &[PacketKind::STATUS_REQUEST, PacketKind::PING_REQUEST];

/// Versions with built-in tables, oldest first
pub const SUPPORTED: &[ProtocolVersion] = &[
    ProtocolVersion::V1_20_2,
    ProtocolVersion::V1_20_3,
    ProtocolVersion::V1_20_5,
    ProtocolVersion::V1_21,
];

fn common(version: ProtocolVersion) -> RegistryBuilder {
    PacketRegistry::builder(version)
        .table(ConnectionState::Handshake, Direction::Clientbound, &[])
        .table(ConnectionState::Handshake, Direction::Serverbound, HANDSHAKE_SERVERBOUND)
        .table(ConnectionState::Status, Direction::Clientbound, STATUS_CLIENTBOUND)
        .table(ConnectionState::Status, Direction::Serverbound, STATUS_SERVERBOUND)
}

/// Build the registry for `version`, `None` if there are no tables for it
pub fn registry_for(version: ProtocolVersion) -> Result<Option<PacketRegistry>> {
    let registry = match version {
        ProtocolVersion::V1_20_2 => v1_20_2::registry()?,
        ProtocolVersion::V1_20_3 => v1_20_3::registry()?,
        ProtocolVersion::V1_20_5 => v1_20_5::registry()?,
        ProtocolVersion::V1_21 => v1_21::registry()?,
        _ => return Ok(None),
    };
    Ok(Some(registry))
}
