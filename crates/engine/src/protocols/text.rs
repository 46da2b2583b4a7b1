//! Text component rewrites shared by the 1.20.2 / 1.20.3 steps
//!
//! Both directions touch the same fields of the same packets; only the
//! conversion differs.

use bridge_core::{BridgeError, ConnectionState, Result};
use bridge_protocol::{JsonComponent, PacketKind, PacketWrapper, Tag, VarInt};
use uuid::Uuid;

use crate::protocol::ProtocolBuilder;
use crate::session::Session;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Conversion {
    JsonToTag,
    TagToJson,
}

impl Conversion {
    /// Rewrite the next field, a text component
    pub(crate) fn component(self, wrapper: &mut PacketWrapper) -> Result<()> {
        match self {
            Conversion::JsonToTag => {
                let json: JsonComponent = wrapper.read()?;
                wrapper.write(json.to_tag()?);
            }
            Conversion::TagToJson => {
                let tag: Tag = wrapper.read()?;
                wrapper.write(JsonComponent::from_tag(&tag)?);
            }
        }
        Ok(())
    }

    /// Rewrite the next field, an optional text component
    pub(crate) fn optional_component(self, wrapper: &mut PacketWrapper) -> Result<()> {
        match self {
            Conversion::JsonToTag => {
                let json: Option<JsonComponent> = wrapper.read()?;
                wrapper.write(json.map(|json| json.to_tag()).transpose()?);
            }
            Conversion::TagToJson => {
                let tag: Option<Tag> = wrapper.read()?;
                wrapper.write(tag.map(|tag| JsonComponent::from_tag(&tag)).transpose()?);
            }
        }
        Ok(())
    }
}

/// Register rewrites for every packet whose only change is its text components
pub(crate) fn register_components(builder: ProtocolBuilder, conversion: Conversion) -> ProtocolBuilder {
    use ConnectionState::{Configuration, Play};

    let single = move |wrapper: &mut PacketWrapper, _: &mut Session| conversion.component(wrapper);

    builder
        .clientbound(Configuration, PacketKind::DISCONNECT, single)
        .clientbound(Play, PacketKind::DISCONNECT, single)
        // overlay flag follows untouched
        .clientbound(Play, PacketKind::SYSTEM_CHAT, single)
        .clientbound(Play, PacketKind::ACTIONBAR, single)
        .clientbound(Play, PacketKind::TITLE_TEXT, single)
        .clientbound(Play, PacketKind::TITLE_SUBTITLE, single)
        // icon and secure chat flag follow untouched
        .clientbound(Play, PacketKind::SERVER_DATA, single)
        .clientbound(Play, PacketKind::TAB_LIST, move |wrapper, _| {
            conversion.component(wrapper)?;
            conversion.component(wrapper)
        })
        .clientbound(Play, PacketKind::OPEN_WINDOW, move |wrapper, _| {
            wrapper.passthrough::<VarInt>()?; // container id
            wrapper.passthrough::<VarInt>()?; // container type
            conversion.component(wrapper)
        })
        .clientbound(Play, PacketKind::COMBAT_KILL, move |wrapper, _| {
            wrapper.passthrough::<VarInt>()?; // player id
            conversion.component(wrapper)
        })
        .clientbound(Play, PacketKind::DISGUISED_CHAT, move |wrapper, _| {
            conversion.component(wrapper)?;
            wrapper.passthrough::<VarInt>()?; // chat type
            conversion.component(wrapper)?;
            conversion.optional_component(wrapper)
        })
        .clientbound(Play, PacketKind::BOSS_BAR, move |wrapper, _| {
            wrapper.passthrough::<Uuid>()?;
            let action: VarInt = wrapper.passthrough()?;
            // add and update title carry a title
            if action.0 == 0 || action.0 == 3 {
                conversion.component(wrapper)?;
            }
            Ok(())
        })
        .clientbound(Play, PacketKind::TEAMS, move |wrapper, _| {
            wrapper.passthrough::<String>()?;
            let mode: i8 = wrapper.passthrough()?;
            // create and update carry the team info
            if mode == 0 || mode == 2 {
                conversion.component(wrapper)?;
                wrapper.passthrough::<i8>()?; // friendly flags
                wrapper.passthrough::<String>()?; // name tag visibility
                wrapper.passthrough::<String>()?; // collision rule
                wrapper.passthrough::<VarInt>()?; // color
                conversion.component(wrapper)?;
                conversion.component(wrapper)?;
            }
            Ok(())
        })
}

/// Skip a 1.20.3 scoreboard number format
///
/// # Format
/// - Boolean: present
/// - VarInt: format type, 0 blank, 1 styled, 2 fixed
/// - Tag: style (styled) or component (fixed)
pub(crate) fn skip_number_format(wrapper: &mut PacketWrapper) -> Result<()> {
    if wrapper.read::<bool>()? {
        let format: VarInt = wrapper.read()?;
        match format.0 {
            0 => {}
            1 | 2 => {
                wrapper.read::<Tag>()?;
            }
            other => {
                return Err(BridgeError::Remap(format!(
                    "unknown number format {}",
                    other
                )))
            }
        }
    }
    Ok(())
}

/// Id the newer protocol uses for a pack identified only by its URL
pub(crate) fn resource_pack_id(url: &str) -> Uuid {
    Uuid::new_v3(&Uuid::NAMESPACE_URL, url.as_bytes())
}
