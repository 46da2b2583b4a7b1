//! # Bridge Engine
//!
//! Translates packets between a server on one protocol version and a client
//! on another.
//!
//! ## Pieces
//!
//! - [`Protocol`]: one step between two adjacent versions, a table of
//!   per-packet rules built with [`ProtocolBuilder`]
//! - [`ProtocolGraph`]: every registered step, with cached shortest paths
//! - [`Pipeline`]: the steps for one connection plus its [`Session`]
//! - [`ProtocolManager`]: loads the built-in versions and hands out pipelines
//! - [`PacketTracker`]: per-connection packet rate limiting
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use bridge_core::ProtocolVersion;
//! use bridge_engine::ProtocolManager;
//! use bytes::Bytes;
//!
//! # fn main() -> bridge_core::Result<()> {
//! let manager = ProtocolManager::new()?;
//! let mut pipeline = manager.create_pipeline(ProtocolVersion::V1_20_3, ProtocolVersion::V1_20_2)?;
//! let outcome = pipeline.process_serverbound(Bytes::from_static(&[0x00]))?;
//! # let _ = outcome;
//! # Ok(())
//! # }
//! ```

pub mod base;
pub mod graph;
pub mod manager;
pub mod pipeline;
pub mod protocol;
pub mod protocols;
pub mod session;
pub mod tracker;

pub use graph::ProtocolGraph;
pub use manager::ProtocolManager;
pub use pipeline::{Outcome, Pipeline};
pub use protocol::{Mapped, Protocol, ProtocolBuilder, Remapper, Signal};
pub use session::Session;
pub use tracker::{PacketTracker, TrackerSettings, Verdict};
