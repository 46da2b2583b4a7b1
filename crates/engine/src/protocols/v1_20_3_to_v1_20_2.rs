//! Servers on 1.20.3, clients on 1.20.2
//!
//! The inverse of the forward step. 1.20.2 clients answer resource packs
//! without naming them, so the ids of pushed packs are remembered per
//! connection and handed back in push order.

use bridge_core::{ConnectionState, Direction, Result};
use bridge_protocol::{PacketKind, PacketRegistry, PacketWrapper, Tag, VarInt};
use std::collections::VecDeque;
use std::sync::Arc;
use uuid::Uuid;

use super::text::{self, Conversion};
use crate::protocol::{Mapped, Protocol};
use crate::session::Session;

/// Resource packs pushed to the client and not yet answered for good
#[derive(Debug, Default)]
pub struct ResourcePackTracker {
    pending: VecDeque<Uuid>,
}

impl ResourcePackTracker {
    pub fn push(&mut self, id: Uuid) {
        self.pending.push_back(id);
    }

    pub fn remove(&mut self, id: Uuid) {
        self.pending.retain(|pending| *pending != id);
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Id the answer with `result` refers to
    ///
    /// Loaded, declined and failed are final and retire the pack. Unknown
    /// packs answer with the nil id.
    pub fn answer(&mut self, result: i32) -> Uuid {
        let terminal = matches!(result, 0..=2);
        let id = if terminal {
            self.pending.pop_front()
        } else {
            self.pending.front().copied()
        };
        id.unwrap_or_else(Uuid::nil)
    }
}

pub fn protocol(server: Arc<PacketRegistry>, client: Arc<PacketRegistry>) -> Result<Protocol> {
    use ConnectionState::{Configuration, Play};
    use Direction::Clientbound;

    let builder = Protocol::builder("1.20.3->1.20.2", server, client);
    text::register_components(builder, Conversion::TagToJson)
        .register_remap(
            Configuration,
            Clientbound,
            PacketKind::RESOURCE_PACK_PUSH,
            Mapped::Kind(PacketKind::RESOURCE_PACK),
            push_resource_pack,
        )
        .register_remap(
            Play,
            Clientbound,
            PacketKind::RESOURCE_PACK_PUSH,
            Mapped::Kind(PacketKind::RESOURCE_PACK),
            push_resource_pack,
        )
        .register_remap(
            Configuration,
            Clientbound,
            PacketKind::RESOURCE_PACK_POP,
            Mapped::Removed,
            pop_resource_pack,
        )
        .register_remap(
            Play,
            Clientbound,
            PacketKind::RESOURCE_PACK_POP,
            Mapped::Removed,
            pop_resource_pack,
        )
        .serverbound(Configuration, PacketKind::RESOURCE_PACK, resource_pack_status)
        .serverbound(Play, PacketKind::RESOURCE_PACK_STATUS, resource_pack_status)
        .cancel(Play, Clientbound, PacketKind::TICKING_STATE)
        .cancel(Play, Clientbound, PacketKind::TICKING_STEP)
        .clientbound(Play, PacketKind::SCOREBOARD_OBJECTIVE, |wrapper, _| {
            wrapper.passthrough::<String>()?;
            let mode: i8 = wrapper.passthrough()?;
            if mode == 0 || mode == 2 {
                Conversion::TagToJson.component(wrapper)?;
                wrapper.passthrough::<VarInt>()?; // render type
                text::skip_number_format(wrapper)?;
            }
            Ok(())
        })
        .clientbound(Play, PacketKind::UPDATE_SCORE, |wrapper, _| {
            let entity: String = wrapper.read()?;
            let objective: String = wrapper.read()?;
            let value: VarInt = wrapper.read()?;
            wrapper.read::<Option<Tag>>()?; // display name
            text::skip_number_format(wrapper)?;

            wrapper.write(entity);
            wrapper.write(VarInt(0));
            wrapper.write(objective);
            wrapper.write(value);
            Ok(())
        })
        .register_remap(
            Play,
            Clientbound,
            PacketKind::RESET_SCORE,
            Mapped::Kind(PacketKind::UPDATE_SCORE),
            |wrapper, _| {
                let entity: String = wrapper.read()?;
                let objective: Option<String> = wrapper.read()?;
                wrapper.write(entity);
                wrapper.write(VarInt(1));
                wrapper.write(objective.unwrap_or_default());
                Ok(())
            },
        )
        .build()
}

/// # Packet Format (1.20.3)
/// - UUID: pack id
/// - String: URL
/// - String: SHA-1 hash
/// - Boolean: forced
/// - Optional tag component: prompt
fn push_resource_pack(wrapper: &mut PacketWrapper, session: &mut Session) -> Result<()> {
    let id: Uuid = wrapper.read()?;
    session.get_or_default::<ResourcePackTracker>()?.push(id);

    wrapper.passthrough::<String>()?;
    wrapper.passthrough::<String>()?;
    wrapper.passthrough::<bool>()?;
    Conversion::TagToJson.optional_component(wrapper)
}

/// Older clients cannot unload packs; only the bookkeeping changes
fn pop_resource_pack(wrapper: &mut PacketWrapper, session: &mut Session) -> Result<()> {
    let id: Option<Uuid> = wrapper.read()?;
    let tracker = session.get_or_default::<ResourcePackTracker>()?;
    match id {
        Some(id) => tracker.remove(id),
        None => tracker.clear(),
    }
    Ok(())
}

fn resource_pack_status(wrapper: &mut PacketWrapper, session: &mut Session) -> Result<()> {
    let result: VarInt = wrapper.read()?;
    let id = session.get_or_default::<ResourcePackTracker>()?.answer(result.0);
    wrapper.write(id);
    wrapper.write(result);
    Ok(())
}
