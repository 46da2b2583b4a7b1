//! Servers on 1.20.2, clients on 1.20.3
//!
//! - text components switch from JSON strings to tags
//! - resource packs gain an id; packs from older servers get one derived
//!   from their URL, and the client's answer loses it again
//! - removing a score becomes its own packet

use bridge_core::{ConnectionState, Direction, Result};
use bridge_protocol::{PacketKind, PacketRegistry, PacketWrapper, Tag, VarInt};
use std::sync::Arc;
use uuid::Uuid;

use super::text::{self, Conversion};
use crate::protocol::{Mapped, Protocol};
use crate::session::Session;

pub fn protocol(server: Arc<PacketRegistry>, client: Arc<PacketRegistry>) -> Result<Protocol> {
    use ConnectionState::{Configuration, Play};
    use Direction::Clientbound;

    let builder = Protocol::builder("1.20.2->1.20.3", server, client);
    text::register_components(builder, Conversion::JsonToTag)
        .register_remap(
            Configuration,
            Clientbound,
            PacketKind::RESOURCE_PACK,
            Mapped::Kind(PacketKind::RESOURCE_PACK_PUSH),
            push_resource_pack,
        )
        .register_remap(
            Play,
            Clientbound,
            PacketKind::RESOURCE_PACK,
            Mapped::Kind(PacketKind::RESOURCE_PACK_PUSH),
            push_resource_pack,
        )
        .serverbound(Configuration, PacketKind::RESOURCE_PACK, resource_pack_status)
        .serverbound(Play, PacketKind::RESOURCE_PACK_STATUS, resource_pack_status)
        .clientbound(Play, PacketKind::SCOREBOARD_OBJECTIVE, |wrapper, _| {
            wrapper.passthrough::<String>()?;
            let mode: i8 = wrapper.passthrough()?;
            if mode == 0 || mode == 2 {
                Conversion::JsonToTag.component(wrapper)?;
                wrapper.passthrough::<VarInt>()?; // render type
                wrapper.write(false); // no number format
            }
            Ok(())
        })
        .clientbound(Play, PacketKind::UPDATE_SCORE, update_score)
        .build()
}

/// # Packet Format (1.20.2)
/// - String: URL
/// - String: SHA-1 hash
/// - Boolean: forced
/// - Optional JSON component: prompt
fn push_resource_pack(wrapper: &mut PacketWrapper, _: &mut Session) -> Result<()> {
    let url: String = wrapper.read()?;
    let hash: String = wrapper.read()?;
    let forced: bool = wrapper.read()?;

    wrapper.write(text::resource_pack_id(&url));
    wrapper.write(url);
    wrapper.write(hash);
    wrapper.write(forced);
    Conversion::JsonToTag.optional_component(wrapper)
}

/// 1.20.3 answers name the pack and know more results than 1.20.2 servers
fn resource_pack_status(wrapper: &mut PacketWrapper, _: &mut Session) -> Result<()> {
    wrapper.read::<Uuid>()?;
    let result: VarInt = wrapper.read()?;
    match result.0 {
        // downloaded: the older server only hears about the final result
        4 => wrapper.cancel(),
        // invalid url, failed reload, discarded
        5..=7 => wrapper.write(VarInt(2)),
        _ => wrapper.write(result),
    }
    Ok(())
}

/// # Packet Format (1.20.2)
/// - String: entity
/// - VarInt: action, 0 update, 1 remove
/// - String: objective, empty for all objectives on remove
/// - VarInt: value, only on update
fn update_score(wrapper: &mut PacketWrapper, _: &mut Session) -> Result<()> {
    let entity: String = wrapper.read()?;
    let action: VarInt = wrapper.read()?;
    let objective: String = wrapper.read()?;

    if action.0 == 1 {
        let mut reset = PacketWrapper::create(PacketKind::RESET_SCORE);
        reset.write(entity);
        reset.write((!objective.is_empty()).then_some(objective));
        wrapper.send_before(reset);
        wrapper.cancel();
        return Ok(());
    }

    let value: VarInt = wrapper.read()?;
    wrapper.write(entity);
    wrapper.write(objective);
    wrapper.write(value);
    wrapper.write(None::<Tag>); // display name
    wrapper.write(false); // number format
    Ok(())
}
