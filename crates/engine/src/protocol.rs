//! # Protocol Step
//!
//! One protocol translates between two adjacent versions: the version the
//! server side of the step speaks and the version its client side speaks.
//! Clientbound packets enter in the server-side layout and leave in the
//! client-side layout; serverbound packets go the other way.
//!
//! # Remapping
//!
//! Each (state, direction, kind) may carry a rule naming the kind the packet
//! becomes and optionally a remapper that rewrites its fields. Kinds without
//! a rule pass through untouched apart from their numeric id, which is
//! looked up again in the output registry.
//!
//! # Validation
//!
//! Building a protocol checks that every kind the input side can produce has
//! somewhere to go: either a rule, or the same kind on the output side.
//! Gaps are registration errors rather than runtime surprises.

use bridge_core::{BridgeError, ConnectionState, Direction, ProtocolVersion, Result};
use bridge_protocol::{Emitted, PacketKind, PacketRegistry, PacketWrapper};
use bytes::Bytes;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::session::Session;

/// Type for remapper functions
///
/// # Purpose
/// Reads a packet's fields in the input layout and writes them in the output
/// layout. May consult or update the session, cancel the packet, or emit
/// extra packets.
///
/// # Thread Safety
/// Remappers are shared by every connection using the protocol and must not
/// hold per-connection state of their own; that belongs in the [`Session`].
pub type Remapper = Arc<dyn Fn(&mut PacketWrapper, &mut Session) -> Result<()> + Send + Sync>;

/// What an input kind becomes on the output side
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mapped {
    Kind(PacketKind),
    /// The packet does not exist on the output side and is cancelled
    Removed,
}

/// Result of running one protocol step over a packet
#[derive(Debug)]
pub enum Signal {
    Continue,
    Cancel,
    Emit {
        packets: Vec<Emitted>,
        cancel_original: bool,
    },
}

struct Rule {
    mapped: Mapped,
    remapper: Option<Remapper>,
}

pub struct Protocol {
    name: String,
    server_registry: Arc<PacketRegistry>,
    client_registry: Arc<PacketRegistry>,
    rules: HashMap<(ConnectionState, Direction, PacketKind), Rule>,
}

impl fmt::Debug for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Protocol")
            .field("name", &self.name)
            .field("rules", &self.rules.len())
            .finish()
    }
}

impl Protocol {
    /// Start building a protocol
    ///
    /// # Arguments
    /// * `name` - Label used in logs and error context
    /// * `server_registry` - Packet ids on the server side of the step
    /// * `client_registry` - Packet ids on the client side of the step
    pub fn builder(
        name: impl Into<String>,
        server_registry: Arc<PacketRegistry>,
        client_registry: Arc<PacketRegistry>,
    ) -> ProtocolBuilder {
        ProtocolBuilder {
            name: name.into(),
            server_registry,
            client_registry,
            rules: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn server_version(&self) -> ProtocolVersion {
        self.server_registry.version()
    }

    pub fn client_version(&self) -> ProtocolVersion {
        self.client_registry.version()
    }

    /// Registries a packet travelling in `direction` is read from and written to
    fn registries(&self, direction: Direction) -> (&PacketRegistry, &PacketRegistry) {
        match direction {
            Direction::Clientbound => (&self.server_registry, &self.client_registry),
            Direction::Serverbound => (&self.client_registry, &self.server_registry),
        }
    }

    /// Output-side registry for `direction`
    pub fn output_registry(&self, direction: Direction) -> &PacketRegistry {
        self.registries(direction).1
    }

    /// Run this step over one packet
    ///
    /// # Arguments
    /// * `wrapper` - Packet in the input layout; left in the output layout
    /// * `direction` - Travel direction of the packet
    /// * `session` - Connection state and storages
    ///
    /// # Returns
    /// What the pipeline should do next with the packet
    ///
    /// # Errors
    /// - `UnknownPacketId` if the id has no kind in the current state
    /// - `Translation` wrapping any remapper failure
    pub fn apply(
        &self,
        wrapper: &mut PacketWrapper,
        direction: Direction,
        session: &mut Session,
    ) -> Result<Signal> {
        let state = session.state();
        let (input, output) = self.registries(direction);
        let kind = input.kind_for(state, direction, wrapper.id())?;
        wrapper.set_kind(kind);

        let rule = self.rules.get(&(state, direction, kind));
        let mapped = rule.map(|rule| rule.mapped).unwrap_or(Mapped::Kind(kind));

        if let Some(remapper) = rule.and_then(|rule| rule.remapper.as_ref()) {
            tracing::trace!("{}: remapping {} {} {}", self.name, state, direction, kind);
            remapper(wrapper, session).map_err(|e| self.context(e, state, direction, kind))?;
        }

        match mapped {
            Mapped::Removed => wrapper.cancel(),
            Mapped::Kind(target) if !wrapper.is_cancelled() => {
                // ids resolve in the state the packet was sent in, even if
                // the remapper just switched the session to another one
                let id = output
                    .id_for(state, direction, target)
                    .map_err(|e| self.context(e, state, direction, kind))?;
                wrapper.set_id(id);
                wrapper.set_kind(target);
            }
            Mapped::Kind(_) => {}
        }
        wrapper.reset_reader();

        let packets = wrapper.take_emitted();
        let signal = if !packets.is_empty() {
            Signal::Emit {
                packets,
                cancel_original: wrapper.is_cancelled(),
            }
        } else if wrapper.is_cancelled() {
            Signal::Cancel
        } else {
            Signal::Continue
        };
        Ok(signal)
    }

    /// Encode a packet emitted by this step's remapper in the output layout
    ///
    /// Packets created with a kind get their id from the output registry in
    /// `state`; packets built from a raw id keep it.
    pub fn encode_emitted(
        &self,
        mut packet: PacketWrapper,
        direction: Direction,
        state: ConnectionState,
    ) -> Result<Bytes> {
        if let Some(kind) = packet.kind() {
            let id = self
                .output_registry(direction)
                .id_for(state, direction, kind)
                .map_err(|e| self.context(e, state, direction, kind))?;
            packet.set_id(id);
        }
        Ok(packet.into_bytes())
    }

    fn context(
        &self,
        source: BridgeError,
        state: ConnectionState,
        direction: Direction,
        kind: PacketKind,
    ) -> BridgeError {
        BridgeError::Translation {
            step: self.name.clone(),
            state,
            direction,
            packet: kind.name().to_owned(),
            source: Box::new(source),
        }
    }

    /// Check that every input kind has an output
    fn validate(&self) -> Result<()> {
        for state in ConnectionState::ALL {
            for direction in Direction::ALL {
                let (input, output) = self.registries(direction);
                for kind in input.kinds(state, direction) {
                    let target = match self.rules.get(&(state, direction, *kind)) {
                        Some(rule) => rule.mapped,
                        None => Mapped::Kind(*kind),
                    };
                    if let Mapped::Kind(target) = target {
                        if !output.contains(state, direction, target) {
                            return Err(BridgeError::Registry(format!(
                                "{}: {} {} {} maps to {}, which does not exist in {}",
                                self.name,
                                state,
                                direction,
                                kind,
                                target,
                                output.version()
                            )));
                        }
                    }
                }
            }
        }

        for (state, direction, kind) in self.rules.keys() {
            let (input, _) = self.registries(*direction);
            if !input.contains(*state, *direction, *kind) {
                return Err(BridgeError::Registry(format!(
                    "{}: rule for {} {} {}, which does not exist in {}",
                    self.name,
                    state,
                    direction,
                    kind,
                    input.version()
                )));
            }
        }
        Ok(())
    }
}

/// Collects remap rules; errors surface from [`ProtocolBuilder::build`]
pub struct ProtocolBuilder {
    name: String,
    server_registry: Arc<PacketRegistry>,
    client_registry: Arc<PacketRegistry>,
    rules: Vec<((ConnectionState, Direction, PacketKind), Rule)>,
}

impl ProtocolBuilder {
    /// Register how an input kind is translated
    ///
    /// # Arguments
    /// * `state` - Connection state the rule applies in
    /// * `direction` - Travel direction the rule applies to
    /// * `unmapped` - Kind on the input side
    /// * `mapped` - Kind on the output side, or [`Mapped::Removed`]
    /// * `remapper` - Field rewrite run before the id is remapped
    pub fn register_remap<F>(
        self,
        state: ConnectionState,
        direction: Direction,
        unmapped: PacketKind,
        mapped: Mapped,
        remapper: F,
    ) -> Self
    where
        F: Fn(&mut PacketWrapper, &mut Session) -> Result<()> + Send + Sync + 'static,
    {
        self.push(state, direction, unmapped, mapped, Some(Arc::new(remapper)))
    }

    /// Rewrite a clientbound packet that keeps its kind
    pub fn clientbound<F>(self, state: ConnectionState, kind: PacketKind, remapper: F) -> Self
    where
        F: Fn(&mut PacketWrapper, &mut Session) -> Result<()> + Send + Sync + 'static,
    {
        self.register_remap(state, Direction::Clientbound, kind, Mapped::Kind(kind), remapper)
    }

    /// Rewrite a serverbound packet that keeps its kind
    pub fn serverbound<F>(self, state: ConnectionState, kind: PacketKind, remapper: F) -> Self
    where
        F: Fn(&mut PacketWrapper, &mut Session) -> Result<()> + Send + Sync + 'static,
    {
        self.register_remap(state, Direction::Serverbound, kind, Mapped::Kind(kind), remapper)
    }

    /// Rename a kind without touching its fields
    pub fn remap_kind(
        self,
        state: ConnectionState,
        direction: Direction,
        unmapped: PacketKind,
        mapped: PacketKind,
    ) -> Self {
        self.push(state, direction, unmapped, Mapped::Kind(mapped), None)
    }

    /// Drop a kind that has no counterpart on the output side
    pub fn cancel(self, state: ConnectionState, direction: Direction, kind: PacketKind) -> Self {
        self.push(state, direction, kind, Mapped::Removed, None)
    }

    fn push(
        mut self,
        state: ConnectionState,
        direction: Direction,
        unmapped: PacketKind,
        mapped: Mapped,
        remapper: Option<Remapper>,
    ) -> Self {
        self.rules
            .push(((state, direction, unmapped), Rule { mapped, remapper }));
        self
    }

    /// Freeze the rule set
    ///
    /// # Errors
    /// `Registry` if a kind has two rules, a rule names a kind that does not
    /// exist, or an input kind has no output
    pub fn build(self) -> Result<Protocol> {
        let mut rules = HashMap::with_capacity(self.rules.len());
        for (key, rule) in self.rules {
            if rules.insert(key, rule).is_some() {
                let (state, direction, kind) = key;
                return Err(BridgeError::Registry(format!(
                    "{}: {} {} {} registered twice",
                    self.name, state, direction, kind
                )));
            }
        }

        let protocol = Protocol {
            name: self.name,
            server_registry: self.server_registry,
            client_registry: self.client_registry,
            rules,
        };
        protocol.validate()?;

        tracing::debug!(
            "Registered protocol {} with {} remap rules",
            protocol.name,
            protocol.rules.len()
        );
        Ok(protocol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_protocol::VarInt;

    const PLAY: ConnectionState = ConnectionState::Play;
    const CB: Direction = Direction::Clientbound;

    fn registry(version: i32, kinds: &[PacketKind]) -> Arc<PacketRegistry> {
        Arc::new(
            PacketRegistry::builder(ProtocolVersion::new(version))
                .table(PLAY, CB, kinds)
                .build()
                .unwrap(),
        )
    }

    fn session() -> Session {
        let mut session = Session::new(ProtocolVersion::new(2), ProtocolVersion::new(1));
        session.set_state(PLAY);
        session
    }

    #[test]
    fn test_unregistered_kind_remaps_id_only() {
        let server = registry(1, &[PacketKind::KEEP_ALIVE, PacketKind::DISCONNECT]);
        let client = registry(2, &[PacketKind::DISCONNECT, PacketKind::KEEP_ALIVE]);
        let protocol = Protocol::builder("1->2", server, client).build().unwrap();

        let mut wrapper = PacketWrapper::decode(Bytes::from_static(&[0x00, 0xAB])).unwrap();
        let signal = protocol.apply(&mut wrapper, CB, &mut session()).unwrap();
        assert!(matches!(signal, Signal::Continue));
        assert_eq!(&wrapper.into_bytes()[..], &[0x01, 0xAB]);
    }

    #[test]
    fn test_missing_output_kind_fails_validation() {
        let server = registry(1, &[PacketKind::KEEP_ALIVE, PacketKind::RESOURCE_PACK]);
        let client = registry(2, &[PacketKind::KEEP_ALIVE]);
        let err = Protocol::builder("1->2", server, client).build().unwrap_err();
        assert!(matches!(err, BridgeError::Registry(_)));
    }

    #[test]
    fn test_duplicate_rule() {
        let server = registry(1, &[PacketKind::KEEP_ALIVE]);
        let client = registry(2, &[PacketKind::KEEP_ALIVE]);
        let err = Protocol::builder("1->2", server, client)
            .cancel(PLAY, CB, PacketKind::KEEP_ALIVE)
            .cancel(PLAY, CB, PacketKind::KEEP_ALIVE)
            .build()
            .unwrap_err();
        assert!(matches!(err, BridgeError::Registry(_)));
    }

    #[test]
    fn test_removed_kind_cancels() {
        let server = registry(1, &[PacketKind::KEEP_ALIVE, PacketKind::RESOURCE_PACK]);
        let client = registry(2, &[PacketKind::KEEP_ALIVE]);
        let protocol = Protocol::builder("1->2", server, client)
            .cancel(PLAY, CB, PacketKind::RESOURCE_PACK)
            .build()
            .unwrap();

        let mut wrapper = PacketWrapper::decode(Bytes::from_static(&[0x01])).unwrap();
        let signal = protocol.apply(&mut wrapper, CB, &mut session()).unwrap();
        assert!(matches!(signal, Signal::Cancel));
    }

    #[test]
    fn test_remapper_error_carries_context() {
        let server = registry(1, &[PacketKind::KEEP_ALIVE]);
        let client = registry(2, &[PacketKind::KEEP_ALIVE]);
        let protocol = Protocol::builder("1->2", server, client)
            .clientbound(PLAY, PacketKind::KEEP_ALIVE, |wrapper, _| {
                wrapper.read::<VarInt>()?;
                Ok(())
            })
            .build()
            .unwrap();

        let mut wrapper = PacketWrapper::decode(Bytes::from_static(&[0x00])).unwrap();
        let err = protocol.apply(&mut wrapper, CB, &mut session()).unwrap_err();
        match &err {
            BridgeError::Translation { step, packet, .. } => {
                assert_eq!(step, "1->2");
                assert_eq!(packet, "keep_alive");
            }
            other => panic!("expected translation error, got {:?}", other),
        }
        assert!(matches!(err.root_cause(), BridgeError::Codec(_)));
    }

    #[test]
    fn test_unknown_id_is_fatal() {
        let server = registry(1, &[PacketKind::KEEP_ALIVE]);
        let client = registry(2, &[PacketKind::KEEP_ALIVE]);
        let protocol = Protocol::builder("1->2", server, client).build().unwrap();

        let mut wrapper = PacketWrapper::decode(Bytes::from_static(&[0x05])).unwrap();
        let err = protocol.apply(&mut wrapper, CB, &mut session()).unwrap_err();
        assert!(matches!(err, BridgeError::UnknownPacketId { id: 5, .. }));
        assert!(err.is_fatal());
    }
}
