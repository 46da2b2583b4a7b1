//! Base protocol
//!
//! Identity step on the server's own version that sits at the server end of
//! every pipeline: first for clientbound packets, last for serverbound ones.
//! It owns the connection state machine, so transitions take effect once a
//! serverbound packet has passed every version step, and it tells the server
//! its own version in the handshake.

use bridge_core::{BridgeError, ConnectionState, Result};
use bridge_protocol::handshake::{INTENT_LOGIN, INTENT_STATUS, INTENT_TRANSFER};
use bridge_protocol::{PacketKind, PacketRegistry, VarInt};
use std::sync::Arc;

use crate::protocol::Protocol;

pub fn protocol(registry: Arc<PacketRegistry>) -> Result<Protocol> {
    let server_version = registry.version();

    Protocol::builder(format!("base {}", server_version), Arc::clone(&registry), registry)
        .serverbound(
            ConnectionState::Handshake,
            PacketKind::CLIENT_INTENTION,
            move |wrapper, session| {
                wrapper.read::<VarInt>()?;
                wrapper.write(VarInt(server_version.id()));
                wrapper.passthrough::<String>()?;
                wrapper.passthrough::<u16>()?;
                let intent: VarInt = wrapper.passthrough()?;

                let next = match intent.0 {
                    INTENT_STATUS => ConnectionState::Status,
                    INTENT_LOGIN | INTENT_TRANSFER => ConnectionState::Login,
                    other => {
                        return Err(BridgeError::Remap(format!("unknown handshake intent {}", other)))
                    }
                };
                session.set_state(next);
                Ok(())
            },
        )
        .serverbound(
            ConnectionState::Login,
            PacketKind::LOGIN_ACKNOWLEDGED,
            |_, session| {
                session.set_state(ConnectionState::Configuration);
                Ok(())
            },
        )
        .serverbound(
            ConnectionState::Configuration,
            PacketKind::FINISH_CONFIGURATION,
            |_, session| {
                session.set_state(ConnectionState::Play);
                Ok(())
            },
        )
        .serverbound(
            ConnectionState::Play,
            PacketKind::CONFIGURATION_ACKNOWLEDGED,
            |_, session| {
                session.set_state(ConnectionState::Configuration);
                Ok(())
            },
        )
        .build()
}
