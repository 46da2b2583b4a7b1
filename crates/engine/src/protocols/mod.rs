//! Version steps
//!
//! Each module builds one [`Protocol`] from the registries of the two
//! versions it connects. [`STEPS`] lists every step the engine ships with.

mod text;
pub mod v1_20_2_to_v1_20_3;
pub mod v1_20_3_to_v1_20_2;
pub mod v1_20_3_to_v1_20_5;
pub mod v1_20_5_to_v1_21;

use bridge_core::{BridgeError, ProtocolVersion, Result};
use bridge_protocol::PacketRegistry;
use std::collections::HashMap;
use std::sync::Arc;

use crate::graph::ProtocolGraph;
use crate::protocol::Protocol;

/// Builds a step from the server-side and client-side registries
pub type StepFactory = fn(Arc<PacketRegistry>, Arc<PacketRegistry>) -> Result<Protocol>;

/// (server version, client version, factory), in registration order
pub const STEPS: &[(ProtocolVersion, ProtocolVersion, StepFactory)] = &[
    (ProtocolVersion::V1_20_2, ProtocolVersion::V1_20_3, v1_20_2_to_v1_20_3::protocol),
    (ProtocolVersion::V1_20_3, ProtocolVersion::V1_20_2, v1_20_3_to_v1_20_2::protocol),
    (ProtocolVersion::V1_20_3, ProtocolVersion::V1_20_5, v1_20_3_to_v1_20_5::protocol),
    (ProtocolVersion::V1_20_5, ProtocolVersion::V1_21, v1_20_5_to_v1_21::protocol),
];

/// Build every step in [`STEPS`] and add it to `graph`
///
/// # Errors
/// `Registry` if a step names a version without tables, or a step fails
/// its own validation
pub fn register_all(
    graph: &mut ProtocolGraph,
    registries: &HashMap<ProtocolVersion, Arc<PacketRegistry>>,
) -> Result<()> {
    let lookup = |version: ProtocolVersion| {
        registries
            .get(&version)
            .cloned()
            .ok_or_else(|| BridgeError::Registry(format!("no packet tables for {}", version)))
    };

    for &(server, client, factory) in STEPS {
        let protocol = factory(lookup(server)?, lookup(client)?)?;
        graph.register_edge(server, client, Arc::new(protocol))?;
    }
    Ok(())
}
