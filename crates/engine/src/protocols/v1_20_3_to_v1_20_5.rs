//! Servers on 1.20.3, clients on 1.20.5
//!
//! - login success announces strict error handling
//! - transfers do not exist for the server, so they log in normally
//! - registry data arrives as one packet per registry
//! - cookies and known packs come from the client only and are dropped

use bridge_core::{BridgeError, ConnectionState, Direction, Result};
use bridge_protocol::codecs::CodecResult;
use bridge_protocol::handshake::{INTENT_LOGIN, INTENT_TRANSFER};
use bridge_protocol::{
    PacketKind, PacketRegistry, PacketWrapper, RemainingBytes, Tag, VarInt, WireType,
};
use bytes::{Bytes, BytesMut};
use std::sync::Arc;

use crate::protocol::Protocol;
use crate::session::Session;

/// One entry of a 1.20.5 registry data packet
///
/// # Format
/// - String: entry id
/// - Optional tag: entry data, absent when the client knows it already
#[derive(Debug, Clone, PartialEq)]
pub struct RegistryEntry {
    pub id: String,
    pub data: Option<Tag>,
}

impl WireType for RegistryEntry {
    fn read(buf: &mut Bytes) -> CodecResult<Self> {
        Ok(Self {
            id: String::read(buf)?,
            data: Option::<Tag>::read(buf)?,
        })
    }

    fn write(&self, buf: &mut BytesMut) {
        self.id.write(buf);
        self.data.write(buf);
    }
}

pub fn protocol(server: Arc<PacketRegistry>, client: Arc<PacketRegistry>) -> Result<Protocol> {
    use ConnectionState::{Configuration, Handshake, Login, Play};
    use Direction::Serverbound;

    Protocol::builder("1.20.3->1.20.5", server, client)
        .clientbound(Login, PacketKind::GAME_PROFILE, |wrapper, _| {
            wrapper.passthrough_all();
            wrapper.passthrough::<RemainingBytes>()?;
            wrapper.write(true); // strict error handling
            Ok(())
        })
        .clientbound(Configuration, PacketKind::REGISTRY_DATA, split_registry_data)
        .serverbound(Handshake, PacketKind::CLIENT_INTENTION, |wrapper, _| {
            wrapper.passthrough::<VarInt>()?;
            wrapper.passthrough::<String>()?;
            wrapper.passthrough::<u16>()?;
            let intent: VarInt = wrapper.read()?;
            if intent.0 == INTENT_TRANSFER {
                wrapper.write(VarInt(INTENT_LOGIN));
            } else {
                wrapper.write(intent);
            }
            Ok(())
        })
        .cancel(Login, Serverbound, PacketKind::COOKIE_RESPONSE)
        .cancel(Configuration, Serverbound, PacketKind::COOKIE_RESPONSE)
        .cancel(Configuration, Serverbound, PacketKind::SELECT_KNOWN_PACKS)
        .cancel(Play, Serverbound, PacketKind::COOKIE_RESPONSE)
        .build()
}

/// # Packet Format (1.20.3)
/// - Tag: compound of registries, each `{type, value: [{name, id, element}]}`
fn split_registry_data(wrapper: &mut PacketWrapper, _: &mut Session) -> Result<()> {
    let root: Tag = wrapper.read()?;
    let root = root
        .as_compound()
        .ok_or_else(|| BridgeError::Remap("registry data is not a compound".into()))?;

    for (registry, value) in root.iter() {
        let entries = registry_entries(registry, value)?;

        let mut packet = PacketWrapper::create(PacketKind::REGISTRY_DATA);
        packet.write(registry.to_owned());
        packet.write(
            entries
                .into_iter()
                .map(|(id, data)| RegistryEntry { id, data })
                .collect::<Vec<_>>(),
        );
        wrapper.send_before(packet);
    }

    tracing::trace!("Split registry data into {} packets", root.len());
    wrapper.cancel();
    Ok(())
}

/// Entries of one registry ordered by numeric id
fn registry_entries(registry: &str, value: &Tag) -> Result<Vec<(String, Option<Tag>)>> {
    let invalid = |what: &str| BridgeError::Remap(format!("registry {}: {}", registry, what));

    let entries = match value.as_compound().and_then(|registry| registry.get("value")) {
        Some(Tag::List(_, entries)) => entries,
        _ => return Err(invalid("missing value list")),
    };

    let mut ordered = Vec::with_capacity(entries.len());
    for (position, entry) in entries.iter().enumerate() {
        let entry = entry.as_compound().ok_or_else(|| invalid("entry is not a compound"))?;
        let name = entry
            .get("name")
            .and_then(Tag::as_str)
            .ok_or_else(|| invalid("entry without name"))?;
        let id = entry
            .get("id")
            .and_then(Tag::as_i64)
            .unwrap_or(position as i64);
        ordered.push((id, name.to_owned(), entry.get("element").cloned()));
    }
    ordered.sort_by_key(|(id, _, _)| *id);

    Ok(ordered
        .into_iter()
        .map(|(_, name, element)| (name, element))
        .collect())
}
