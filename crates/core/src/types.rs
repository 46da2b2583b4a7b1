//! Core type definitions

use serde::{Deserialize, Serialize};
use std::fmt;

/// Phase of a connection
///
/// The vocabulary is shared by every protocol version. A packet kind only has
/// meaning inside one state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ConnectionState {
    Handshake,
    Status,
    Login,
    Configuration,
    Play,
}

impl ConnectionState {
    pub const ALL: [ConnectionState; 5] = [
        Self::Handshake,
        Self::Status,
        Self::Login,
        Self::Configuration,
        Self::Play,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Handshake => "handshake",
            Self::Status => "status",
            Self::Login => "login",
            Self::Configuration => "configuration",
            Self::Play => "play",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which way a packet travels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Server to client
    Clientbound,
    /// Client to server
    Serverbound,
}

impl Direction {
    pub const ALL: [Direction; 2] = [Self::Clientbound, Self::Serverbound];

    pub fn opposite(self) -> Self {
        match self {
            Self::Clientbound => Self::Serverbound,
            Self::Serverbound => Self::Clientbound,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Clientbound => "clientbound",
            Self::Serverbound => "serverbound",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
