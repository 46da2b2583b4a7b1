//! # Protocol Manager
//!
//! Owns everything shared between connections: the packet tables of each
//! supported version, the protocol graph and one base protocol per server
//! version. Connections ask it for a [`Pipeline`] once their handshake names
//! the client's version.

use bridge_config::{BlockedVersions, BridgeConfig};
use bridge_core::{BridgeError, ProtocolVersion, Result};
use bridge_protocol::{versions, PacketRegistry};
use std::collections::HashMap;
use std::sync::Arc;

use crate::graph::ProtocolGraph;
use crate::pipeline::Pipeline;
use crate::protocol::Protocol;
use crate::session::Session;
use crate::{base, protocols};

pub struct ProtocolManager {
    registries: HashMap<ProtocolVersion, Arc<PacketRegistry>>,
    graph: ProtocolGraph,
    bases: HashMap<ProtocolVersion, Arc<Protocol>>,
    blocked: BlockedVersions,
    suppress_warnings: bool,
}

impl ProtocolManager {
    /// Load every built-in version and step
    ///
    /// # Errors
    /// `Registry` if the built-in tables or steps are inconsistent
    pub fn new() -> Result<Self> {
        let mut registries = HashMap::new();
        let mut bases = HashMap::new();
        for &version in versions::SUPPORTED {
            let registry = versions::registry_for(version)?.ok_or_else(|| {
                BridgeError::Registry(format!("no packet tables for {}", version))
            })?;
            let registry = Arc::new(registry);
            bases.insert(version, Arc::new(base::protocol(Arc::clone(&registry))?));
            registries.insert(version, registry);
        }

        let mut graph = ProtocolGraph::new();
        protocols::register_all(&mut graph, &registries)?;

        tracing::info!(
            "Loaded {} versions and {} version steps",
            registries.len(),
            protocols::STEPS.len()
        );

        Ok(Self {
            registries,
            graph,
            bases,
            blocked: BlockedVersions::default(),
            suppress_warnings: false,
        })
    }

    /// [`ProtocolManager::new`] with the configured blocked versions and
    /// warning behavior
    pub fn from_config(config: &BridgeConfig) -> Result<Self> {
        let mut manager = Self::new()?;
        manager.blocked = config.blocked_versions.clone();
        manager.suppress_warnings = config.suppress_conversion_warnings;
        Ok(manager)
    }

    /// Versions with packet tables, oldest first
    pub fn supported_versions(&self) -> Vec<ProtocolVersion> {
        let mut versions: Vec<_> = self.registries.keys().copied().collect();
        versions.sort();
        versions
    }

    /// Whether a client on `client` can reach a server on `server`
    pub fn is_supported(&self, client: ProtocolVersion, server: ProtocolVersion) -> bool {
        self.bases.contains_key(&server)
            && self.registries.contains_key(&client)
            && !self.blocked.contains(client)
            && self.graph.resolve_path(server, client).is_ok()
    }

    pub fn registry(&self, version: ProtocolVersion) -> Option<&Arc<PacketRegistry>> {
        self.registries.get(&version)
    }

    pub fn graph(&self) -> &ProtocolGraph {
        &self.graph
    }

    /// Build the pipeline for one connection
    ///
    /// The base protocol of the server's version comes first, followed by
    /// the version steps from the server towards the client.
    ///
    /// # Errors
    /// - `BlockedVersion` if the configuration refuses the client's version
    /// - `Registry` if the server's version has no tables
    /// - `NoPath` if the versions are not connected
    pub fn create_pipeline(&self, client: ProtocolVersion, server: ProtocolVersion) -> Result<Pipeline> {
        if self.blocked.contains(client) {
            return Err(BridgeError::BlockedVersion(client));
        }

        let base = self
            .bases
            .get(&server)
            .ok_or_else(|| BridgeError::Registry(format!("no packet tables for {}", server)))?;

        let mut path = vec![Arc::clone(base)];
        path.extend(self.graph.resolve_path(server, client)?);

        tracing::debug!(
            "Pipeline for client {} on server {}: {}",
            client,
            server,
            path.iter().map(|protocol| protocol.name()).collect::<Vec<_>>().join(", ")
        );

        let mut pipeline = Pipeline::new(path, Session::new(client, server));
        pipeline.set_suppress_warnings(self.suppress_warnings);
        Ok(pipeline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_config::VersionRule;

    #[test]
    fn test_builtin_steps_load() {
        let manager = ProtocolManager::new().unwrap();
        assert_eq!(manager.supported_versions(), versions::SUPPORTED.to_vec());
        assert!(manager.is_supported(ProtocolVersion::V1_20_3, ProtocolVersion::V1_20_2));
        assert!(manager.is_supported(ProtocolVersion::V1_21, ProtocolVersion::V1_20_2));
        // steps only lead from 1.20.3 servers down to 1.20.2
        assert!(!manager.is_supported(ProtocolVersion::V1_20_2, ProtocolVersion::V1_21));
    }

    #[test]
    fn test_pipeline_starts_with_base() {
        let manager = ProtocolManager::new().unwrap();
        let pipeline = manager
            .create_pipeline(ProtocolVersion::V1_21, ProtocolVersion::V1_20_2)
            .unwrap();
        let names: Vec<&str> = pipeline.protocols().iter().map(|p| p.name()).collect();
        assert_eq!(
            names,
            vec!["base 1.20.2 (764)", "1.20.2->1.20.3", "1.20.3->1.20.5", "1.20.5->1.21"]
        );
    }

    #[test]
    fn test_blocked_version() {
        let mut config = BridgeConfig::default();
        config.blocked_versions = BlockedVersions::parse("<1.20.5").unwrap();
        let manager = ProtocolManager::from_config(&config).unwrap();

        let err = manager
            .create_pipeline(ProtocolVersion::V1_20_3, ProtocolVersion::V1_20_2)
            .err()
            .unwrap();
        assert!(matches!(err, BridgeError::BlockedVersion(v) if v == ProtocolVersion::V1_20_3));
        assert!(manager
            .create_pipeline(ProtocolVersion::V1_20_5, ProtocolVersion::V1_20_2)
            .is_ok());
        assert_eq!(config.blocked_versions.rules()[0], VersionRule::Below(ProtocolVersion::V1_20_5));
    }
}
