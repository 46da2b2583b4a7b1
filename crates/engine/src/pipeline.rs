//! # Protocol Pipeline
//!
//! Chains protocol steps between one client and one server. Clientbound
//! packets run through the steps from the server end to the client end,
//! serverbound packets in exactly the reverse order.
//!
//! # Emitted packets
//!
//! A packet emitted by step *i* is already in step *i*'s output layout, so it
//! only runs through the steps after *i*. Packets emitted "before" are fully
//! translated ahead of the original; packets emitted "after" follow it.
//!
//! # Thread Safety
//!
//! A pipeline belongs to one connection and is driven by one task at a time.
//! The protocols it holds are shared, read-only.

use bridge_core::{BridgeError, ConnectionState, Direction, ProtocolVersion, Result};
use bridge_protocol::{EmitOrder, PacketWrapper};
use bytes::Bytes;
use std::sync::Arc;

use crate::protocol::{Protocol, Signal};
use crate::session::Session;

/// What became of one inbound packet
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Exactly one packet to deliver
    Forward(Bytes),
    /// Nothing to deliver
    Cancelled,
    /// Several packets to deliver, in order
    Multiple(Vec<Bytes>),
}

impl Outcome {
    fn from_packets(mut packets: Vec<Bytes>) -> Self {
        match packets.len() {
            0 => Outcome::Cancelled,
            1 => match packets.pop() {
                Some(packet) => Outcome::Forward(packet),
                None => Outcome::Cancelled,
            },
            _ => Outcome::Multiple(packets),
        }
    }

    /// Delivered packets in order
    pub fn into_packets(self) -> Vec<Bytes> {
        match self {
            Outcome::Forward(packet) => vec![packet],
            Outcome::Cancelled => Vec::new(),
            Outcome::Multiple(packets) => packets,
        }
    }
}

#[derive(Debug)]
pub struct Pipeline {
    /// Ordered from the server end to the client end
    protocols: Vec<Arc<Protocol>>,
    session: Session,
    suppress_warnings: bool,
}

impl Pipeline {
    /// Create a pipeline
    ///
    /// # Arguments
    /// * `protocols` - Steps ordered from the server end to the client end
    /// * `session` - Fresh per-connection state
    pub fn new(protocols: Vec<Arc<Protocol>>, session: Session) -> Self {
        Self {
            protocols,
            session,
            suppress_warnings: false,
        }
    }

    /// Log remapper failures at debug level instead of warn
    pub fn set_suppress_warnings(&mut self, suppress: bool) {
        self.suppress_warnings = suppress;
    }

    pub fn protocols(&self) -> &[Arc<Protocol>] {
        &self.protocols
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    pub fn state(&self) -> ConnectionState {
        self.session.state()
    }

    pub fn client_version(&self) -> ProtocolVersion {
        self.session.client_version()
    }

    pub fn server_version(&self) -> ProtocolVersion {
        self.session.server_version()
    }

    /// Translate a packet from the server for the client
    ///
    /// # Arguments
    /// * `raw` - VarInt packet id followed by the body, in the server's layout
    ///
    /// # Errors
    /// Any error is fatal for the connection: the byte streams can no longer
    /// be trusted to line up.
    pub fn process_clientbound(&mut self, raw: Bytes) -> Result<Outcome> {
        let steps: Vec<usize> = (0..self.protocols.len()).collect();
        self.process(raw, Direction::Clientbound, &steps)
    }

    /// Translate a packet from the client for the server
    pub fn process_serverbound(&mut self, raw: Bytes) -> Result<Outcome> {
        let steps: Vec<usize> = (0..self.protocols.len()).rev().collect();
        self.process(raw, Direction::Serverbound, &steps)
    }

    fn process(&mut self, raw: Bytes, direction: Direction, steps: &[usize]) -> Result<Outcome> {
        let mut delivered = Vec::new();
        match self.traverse(raw, direction, steps, &mut delivered) {
            Ok(()) => Ok(Outcome::from_packets(delivered)),
            Err(e) => {
                self.report(&e, direction);
                Err(e)
            }
        }
    }

    fn traverse(
        &mut self,
        raw: Bytes,
        direction: Direction,
        steps: &[usize],
        delivered: &mut Vec<Bytes>,
    ) -> Result<()> {
        let mut wrapper = PacketWrapper::decode(raw)?;
        let mut deferred: Vec<(Bytes, usize)> = Vec::new();
        let mut forward = true;

        for (position, &index) in steps.iter().enumerate() {
            let protocol = Arc::clone(&self.protocols[index]);
            match protocol.apply(&mut wrapper, direction, &mut self.session)? {
                Signal::Continue => {}
                Signal::Cancel => {
                    tracing::trace!("{} cancelled {} packet", protocol.name(), direction);
                    forward = false;
                    break;
                }
                Signal::Emit {
                    packets,
                    cancel_original,
                } => {
                    // emitted packets see the state left behind by the remapper
                    let state = self.session.state();
                    for emitted in packets {
                        let bytes = protocol.encode_emitted(emitted.packet, direction, state)?;
                        match emitted.order {
                            EmitOrder::Before => {
                                self.traverse(bytes, direction, &steps[position + 1..], delivered)?
                            }
                            EmitOrder::After => deferred.push((bytes, position + 1)),
                        }
                    }
                    if cancel_original {
                        forward = false;
                        break;
                    }
                }
            }
        }

        if forward {
            delivered.push(wrapper.into_bytes());
        }
        for (bytes, next) in deferred {
            self.traverse(bytes, direction, &steps[next..], delivered)?;
        }
        Ok(())
    }

    fn report(&self, error: &BridgeError, direction: Direction) {
        if self.suppress_warnings {
            tracing::debug!(
                "Translation failed ({} -> {}, {}): {}",
                self.server_version(),
                self.client_version(),
                direction,
                error
            );
        } else {
            tracing::warn!(
                "Translation failed ({} -> {}, {}): {}",
                self.server_version(),
                self.client_version(),
                direction,
                error
            );
        }
    }
}
