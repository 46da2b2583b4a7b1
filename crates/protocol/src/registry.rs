//! Packet identity registry
//!
//! Maps numeric packet ids to kinds and back for one protocol version. Built
//! once from static tables, where a kind's position in its table is its wire
//! id, and never modified afterwards.

use crate::packet_kinds::PacketKind;
use bridge_core::{BridgeError, ConnectionState, Direction, ProtocolVersion, Result};
use std::collections::HashMap;

#[derive(Debug, Default)]
struct Table {
    kinds: Vec<PacketKind>,
    ids: HashMap<PacketKind, i32>,
}

#[derive(Debug)]
pub struct PacketRegistry {
    version: ProtocolVersion,
    tables: HashMap<(ConnectionState, Direction), Table>,
}

impl PacketRegistry {
    pub fn builder(version: ProtocolVersion) -> RegistryBuilder {
        RegistryBuilder {
            version,
            tables: Vec::new(),
        }
    }

    pub fn version(&self) -> ProtocolVersion {
        self.version
    }

    /// Wire id of `kind`
    ///
    /// # Errors
    /// `UnknownPacketKind` if the kind does not exist for this state and direction
    pub fn id_for(&self, state: ConnectionState, direction: Direction, kind: PacketKind) -> Result<i32> {
        self.tables
            .get(&(state, direction))
            .and_then(|table| table.ids.get(&kind).copied())
            .ok_or_else(|| BridgeError::UnknownPacketKind {
                version: self.version,
                state,
                direction,
                kind: kind.name().to_owned(),
            })
    }

    /// Kind registered under wire id `id`
    ///
    /// # Errors
    /// `UnknownPacketId` if nothing is registered under the id
    pub fn kind_for(&self, state: ConnectionState, direction: Direction, id: i32) -> Result<PacketKind> {
        let unknown = || BridgeError::UnknownPacketId {
            version: self.version,
            state,
            direction,
            id,
        };
        let table = self.tables.get(&(state, direction)).ok_or_else(unknown)?;
        usize::try_from(id)
            .ok()
            .and_then(|index| table.kinds.get(index).copied())
            .ok_or_else(unknown)
    }

    pub fn contains(&self, state: ConnectionState, direction: Direction, kind: PacketKind) -> bool {
        self.tables
            .get(&(state, direction))
            .is_some_and(|table| table.ids.contains_key(&kind))
    }

    /// Kinds in wire id order
    pub fn kinds(&self, state: ConnectionState, direction: Direction) -> &[PacketKind] {
        self.tables
            .get(&(state, direction))
            .map(|table| table.kinds.as_slice())
            .unwrap_or(&[])
    }
}

pub struct RegistryBuilder {
    version: ProtocolVersion,
    tables: Vec<(ConnectionState, Direction, Vec<PacketKind>)>,
}

impl RegistryBuilder {
    pub fn table(mut self, state: ConnectionState, direction: Direction, kinds: &[PacketKind]) -> Self {
        self.tables.push((state, direction, kinds.to_vec()));
        self
    }

    /// # Errors
    /// `Registry` if a kind appears twice in one table or a table is given twice
    pub fn build(self) -> Result<PacketRegistry> {
        let mut tables = HashMap::new();
        for (state, direction, kinds) in self.tables {
            let mut ids = HashMap::with_capacity(kinds.len());
            for (id, kind) in kinds.iter().enumerate() {
                if ids.insert(*kind, id as i32).is_some() {
                    return Err(BridgeError::Registry(format!(
                        "{}: duplicate {} in {} {}",
                        self.version, kind, state, direction
                    )));
                }
            }
            if tables.insert((state, direction), Table { kinds, ids }).is_some() {
                return Err(BridgeError::Registry(format!(
                    "{}: {} {} table given twice",
                    self.version, state, direction
                )));
            }
        }

        tracing::debug!("Built packet registry for {}", self.version);
        Ok(PacketRegistry {
            version: self.version,
            tables,
        })
    }
}
