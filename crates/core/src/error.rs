//! Core error types for the translation engine

use crate::{ConnectionState, Direction, ProtocolVersion};

/// Failure while decoding a single wire value
///
/// Running out of bytes and reading bytes that make no sense are kept apart:
/// the first usually means the framing layer handed over a short packet, the
/// second means the two ends disagree about the format.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// The buffer was exhausted before the value was complete
    #[error("Truncated {what}: needed {needed} bytes, {remaining} remaining")]
    Truncated {
        what: &'static str,
        needed: usize,
        remaining: usize,
    },

    /// Tag, discriminator, length or content out of range
    #[error("Malformed {what}: {reason}")]
    Malformed { what: &'static str, reason: String },
}

impl CodecError {
    #[inline]
    pub fn truncated(what: &'static str, needed: usize, remaining: usize) -> Self {
        Self::Truncated {
            what,
            needed,
            remaining,
        }
    }

    #[inline]
    pub fn malformed(what: &'static str, reason: impl Into<String>) -> Self {
        Self::Malformed {
            what,
            reason: reason.into(),
        }
    }

    /// True when the failure was an under-read
    pub fn is_truncated(&self) -> bool {
        matches!(self, Self::Truncated { .. })
    }
}

#[derive(thiserror::Error, Debug)]
pub enum BridgeError {
    #[error("Framing error: {0}")]
    Codec(#[from] CodecError),

    #[error("Unknown packet id {id:#04x} for {version} {state} {direction}")]
    UnknownPacketId {
        version: ProtocolVersion,
        state: ConnectionState,
        direction: Direction,
        id: i32,
    },

    #[error("Unknown packet kind {kind} for {version} {state} {direction}")]
    UnknownPacketKind {
        version: ProtocolVersion,
        state: ConnectionState,
        direction: Direction,
        kind: String,
    },

    /// A step of the pipeline failed; carries where it happened
    #[error("Translation failed in {step} ({state} {direction} {packet}): {source}")]
    Translation {
        step: String,
        state: ConnectionState,
        direction: Direction,
        packet: String,
        source: Box<BridgeError>,
    },

    #[error("Remap error: {0}")]
    Remap(String),

    #[error("No translation path from {from} to {to}")]
    NoPath {
        from: ProtocolVersion,
        to: ProtocolVersion,
    },

    #[error("Registry error: {0}")]
    Registry(String),

    #[error("Configuration error: {0}")]
    Config(String),

    /// The client's version is refused by configuration
    #[error("Protocol version {0} is blocked")]
    BlockedVersion(ProtocolVersion),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BridgeError {
    /// Whether the connection's translation has to be torn down
    ///
    /// Per-packet failures leave the byte stream desynchronized, so every one
    /// of them is fatal. Setup failures are reported once and never reach a
    /// live pipeline.
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::Codec(_)
            | Self::UnknownPacketId { .. }
            | Self::UnknownPacketKind { .. }
            | Self::Translation { .. }
            | Self::Remap(_) => true,
            Self::NoPath { .. }
            | Self::Registry(_)
            | Self::Config(_)
            | Self::BlockedVersion(_)
            | Self::Io(_) => false,
        }
    }

    /// Innermost error, skipping translation context layers
    pub fn root_cause(&self) -> &BridgeError {
        match self {
            Self::Translation { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_classification() {
        let err = BridgeError::from(CodecError::truncated("VarInt", 1, 0));
        assert!(err.is_fatal());

        let err = BridgeError::NoPath {
            from: ProtocolVersion::V1_20_2,
            to: ProtocolVersion::V1_21,
        };
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_root_cause_unwraps_context() {
        let inner = BridgeError::UnknownPacketId {
            version: ProtocolVersion::V1_20_3,
            state: ConnectionState::Play,
            direction: Direction::Clientbound,
            id: 0x7f,
        };
        let err = BridgeError::Translation {
            step: "1.20.3 -> 1.20.5".into(),
            state: ConnectionState::Play,
            direction: Direction::Clientbound,
            packet: "id 0x7f".into(),
            source: Box::new(inner),
        };

        assert!(matches!(err.root_cause(), BridgeError::UnknownPacketId { id: 0x7f, .. }));
        assert!(err.to_string().contains("1.20.3 -> 1.20.5"));
    }
}
