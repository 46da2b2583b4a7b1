//! Servers on 1.20.5, clients on 1.21
//!
//! Packets keep their layout across this step; only ids move, which the
//! registries already cover.

use bridge_core::Result;
use bridge_protocol::PacketRegistry;
use std::sync::Arc;

use crate::protocol::Protocol;

pub fn protocol(server: Arc<PacketRegistry>, client: Arc<PacketRegistry>) -> Result<Protocol> {
    Protocol::builder("1.20.5->1.21", server, client).build()
}
