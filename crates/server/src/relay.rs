//! One translated connection, fed from a text stream
//!
//! Each input line carries one packet payload (VarInt id and body, no
//! length prefix) in base64, tagged with the side that sent it:
//!
//! ```text
//! c2s AAHNBQlsb2NhbGhvc3Rj3QI=
//! s2c IQ==
//! ```
//!
//! The first client packet must be the handshake; it decides the pipeline.

use anyhow::{anyhow, bail, Context};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bridge_config::BridgeConfig;
use bridge_core::{BridgeError, Direction, ProtocolVersion};
use bridge_engine::{PacketTracker, Pipeline, ProtocolManager, TrackerSettings, Verdict};
use bridge_protocol::Handshake;
use bytes::Bytes;
use std::time::Instant;

/// What the relay wants delivered
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
    ToServer(Bytes),
    ToClient(Bytes),
    /// Close the connection with this reason
    Disconnect(String),
}

impl Line {
    pub fn render(&self) -> String {
        match self {
            Line::ToServer(bytes) => format!("to-server {}", STANDARD.encode(bytes)),
            Line::ToClient(bytes) => format!("to-client {}", STANDARD.encode(bytes)),
            Line::Disconnect(reason) => format!("disconnect {}", reason),
        }
    }
}

/// Split an input line into the sending side and the payload
pub fn parse_line(line: &str) -> anyhow::Result<(Direction, Bytes)> {
    let (side, payload) = line
        .trim()
        .split_once(' ')
        .ok_or_else(|| anyhow!("expected '<c2s|s2c> <base64>', got {:?}", line))?;
    let direction = match side {
        "c2s" => Direction::Serverbound,
        "s2c" => Direction::Clientbound,
        other => bail!("unknown side {:?}", other),
    };
    let payload = STANDARD
        .decode(payload.trim())
        .context("payload is not valid base64")?;
    Ok((direction, Bytes::from(payload)))
}

pub struct Relay<'a> {
    manager: &'a ProtocolManager,
    server_version: ProtocolVersion,
    blocked_msg: String,
    pipeline: Option<Pipeline>,
    tracker: PacketTracker,
}

impl<'a> Relay<'a> {
    pub fn new(manager: &'a ProtocolManager, config: &BridgeConfig) -> Self {
        Self {
            manager,
            server_version: config.server_version,
            blocked_msg: config.blocked_disconnect_msg.clone(),
            pipeline: None,
            tracker: PacketTracker::new(TrackerSettings::from_config(config)),
        }
    }

    pub fn client_version(&self) -> Option<ProtocolVersion> {
        self.pipeline.as_ref().map(Pipeline::client_version)
    }

    /// Translate one packet
    ///
    /// # Errors
    /// Any error ends the connection
    pub fn handle(&mut self, direction: Direction, raw: Bytes, now: Instant) -> anyhow::Result<Vec<Line>> {
        if direction == Direction::Serverbound {
            match self.tracker.record(now) {
                Verdict::Ok => {}
                Verdict::Warn { pps, warnings } => {
                    tracing::warn!("Client is sending {} packets per second (warning {})", pps, warnings);
                }
                Verdict::Kick(reason) => return Ok(vec![Line::Disconnect(reason)]),
            }
        }

        if self.pipeline.is_none() {
            if direction == Direction::Clientbound {
                bail!("server sent a packet before the client's handshake");
            }
            match self.open(&raw)? {
                Some(pipeline) => self.pipeline = Some(pipeline),
                None => return Ok(vec![Line::Disconnect(self.blocked_msg.clone())]),
            }
        }
        let Some(pipeline) = self.pipeline.as_mut() else {
            bail!("no pipeline for this connection");
        };

        let lines = match direction {
            Direction::Serverbound => pipeline
                .process_serverbound(raw)?
                .into_packets()
                .into_iter()
                .map(Line::ToServer)
                .collect(),
            Direction::Clientbound => pipeline
                .process_clientbound(raw)?
                .into_packets()
                .into_iter()
                .map(Line::ToClient)
                .collect(),
        };
        Ok(lines)
    }

    /// Pipeline for the client named in the handshake, `None` if its version is blocked
    fn open(&self, raw: &[u8]) -> anyhow::Result<Option<Pipeline>> {
        let handshake = Handshake::peek(raw).context("first client packet is not a handshake")?;
        match self.manager.create_pipeline(handshake.protocol_version, self.server_version) {
            Ok(pipeline) => {
                tracing::info!(
                    "Client on {} connecting to {}:{}",
                    handshake.protocol_version,
                    handshake.server_address,
                    handshake.server_port
                );
                Ok(Some(pipeline))
            }
            Err(BridgeError::BlockedVersion(version)) => {
                tracing::info!("Refused blocked client version {}", version);
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_config::BlockedVersions;
    use bridge_protocol::handshake::INTENT_LOGIN;

    fn handshake(version: ProtocolVersion) -> Bytes {
        Handshake {
            protocol_version: version,
            server_address: "localhost".into(),
            server_port: 25565,
            intent: INTENT_LOGIN,
        }
        .to_payload()
    }

    #[test]
    fn test_parse_line() {
        let (direction, payload) = parse_line("c2s AAE=").unwrap();
        assert_eq!(direction, Direction::Serverbound);
        assert_eq!(&payload[..], &[0x00, 0x01]);

        assert!(parse_line("c2s").is_err());
        assert!(parse_line("x2y AAE=").is_err());
        assert!(parse_line("s2c !!").is_err());
    }

    #[test]
    fn test_handshake_opens_pipeline() {
        let manager = ProtocolManager::new().unwrap();
        let config = BridgeConfig::default();
        let mut relay = Relay::new(&manager, &config);

        let lines = relay
            .handle(Direction::Serverbound, handshake(ProtocolVersion::V1_20_3), Instant::now())
            .unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(relay.client_version(), Some(ProtocolVersion::V1_20_3));

        let Line::ToServer(bytes) = &lines[0] else {
            panic!("expected a packet for the server");
        };
        let forwarded = Handshake::peek(bytes).unwrap();
        assert_eq!(forwarded.protocol_version, ProtocolVersion::V1_20_2);
    }

    #[test]
    fn test_blocked_client_is_disconnected() {
        let mut config = BridgeConfig::default();
        config.blocked_versions = BlockedVersions::parse("1.21").unwrap();
        let manager = ProtocolManager::from_config(&config).unwrap();
        let mut relay = Relay::new(&manager, &config);

        let lines = relay
            .handle(Direction::Serverbound, handshake(ProtocolVersion::V1_21), Instant::now())
            .unwrap();
        assert_eq!(lines, vec![Line::Disconnect(config.blocked_disconnect_msg.clone())]);
        assert_eq!(relay.client_version(), None);
    }

    #[test]
    fn test_server_cannot_speak_first() {
        let manager = ProtocolManager::new().unwrap();
        let config = BridgeConfig::default();
        let mut relay = Relay::new(&manager, &config);
        assert!(relay
            .handle(Direction::Clientbound, Bytes::from_static(&[0x00]), Instant::now())
            .is_err());
    }

    #[test]
    fn test_flood_kicks() {
        let manager = ProtocolManager::new().unwrap();
        let mut config = BridgeConfig::default();
        config.max_pps = 1;
        let mut relay = Relay::new(&manager, &config);
        let now = Instant::now();

        relay
            .handle(Direction::Serverbound, handshake(ProtocolVersion::V1_20_2), now)
            .unwrap();
        let lines = relay
            .handle(Direction::Serverbound, Bytes::from_static(&[0x00]), now)
            .unwrap();
        assert!(matches!(&lines[..], [Line::Disconnect(_)]));
    }
}
