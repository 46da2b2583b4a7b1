//! # Protocol Graph
//!
//! Versions are nodes and protocol steps are directed edges from the version
//! a server speaks to the version a client speaks. A path from the server's
//! version to the client's version is the ordered list of steps a
//! clientbound packet runs through.
//!
//! # Path selection
//!
//! Breadth-first search finds the path with the fewest steps. Among equally
//! short paths, edges registered earlier win, so the result never depends on
//! hash ordering.
//!
//! # Caching
//!
//! The graph is filled once at startup and read-only afterwards. Resolved
//! paths are cached per version pair and shared by every connection asking
//! for the same pair.

use bridge_core::{BridgeError, ProtocolVersion, Result};
use dashmap::DashMap;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use crate::protocol::Protocol;

struct Edge {
    to: ProtocolVersion,
    protocol: Arc<Protocol>,
}

type Path = Arc<[Arc<Protocol>]>;

#[derive(Default)]
pub struct ProtocolGraph {
    edges: Vec<Edge>,
    /// Outgoing edge indices per version, in registration order
    outgoing: HashMap<ProtocolVersion, Vec<usize>>,
    cache: DashMap<(ProtocolVersion, ProtocolVersion), Path>,
}

impl ProtocolGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a step translating servers on `from` for clients on `to`
    ///
    /// # Errors
    /// `Registry` if the protocol's versions disagree with the edge or the
    /// edge already exists
    pub fn register_edge(
        &mut self,
        from: ProtocolVersion,
        to: ProtocolVersion,
        protocol: Arc<Protocol>,
    ) -> Result<()> {
        if protocol.server_version() != from || protocol.client_version() != to {
            return Err(BridgeError::Registry(format!(
                "protocol {} registered as edge {} -> {}",
                protocol.name(),
                from,
                to
            )));
        }

        let outgoing = self.outgoing.entry(from).or_default();
        if outgoing.iter().any(|&index| self.edges[index].to == to) {
            return Err(BridgeError::Registry(format!(
                "edge {} -> {} registered twice",
                from, to
            )));
        }
        outgoing.push(self.edges.len());
        self.edges.push(Edge { to, protocol });
        self.cache.clear();

        tracing::debug!("Registered edge {} -> {}", from, to);
        Ok(())
    }

    /// Every version that appears on either end of an edge
    pub fn versions(&self) -> Vec<ProtocolVersion> {
        let mut versions: Vec<ProtocolVersion> = self
            .outgoing
            .keys()
            .copied()
            .chain(self.edges.iter().map(|edge| edge.to))
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        versions.sort();
        versions
    }

    /// Steps from a server on `from` to a client on `to`, server end first
    ///
    /// Equal versions resolve to an empty path.
    ///
    /// # Errors
    /// `NoPath` if the versions are not connected
    pub fn resolve_path(&self, from: ProtocolVersion, to: ProtocolVersion) -> Result<Vec<Arc<Protocol>>> {
        if let Some(path) = self.cache.get(&(from, to)) {
            return Ok(path.to_vec());
        }

        let path = self.search(from, to).ok_or(BridgeError::NoPath { from, to })?;
        tracing::debug!("Resolved path {} -> {} in {} steps", from, to, path.len());

        let path: Path = path.into();
        self.cache.insert((from, to), Arc::clone(&path));
        Ok(path.to_vec())
    }

    fn search(&self, from: ProtocolVersion, to: ProtocolVersion) -> Option<Vec<Arc<Protocol>>> {
        if from == to {
            return Some(Vec::new());
        }

        // edge index used to first reach each version
        let mut reached_by: HashMap<ProtocolVersion, usize> = HashMap::new();
        let mut visited: HashSet<ProtocolVersion> = HashSet::from([from]);
        let mut queue = VecDeque::from([from]);

        while let Some(version) = queue.pop_front() {
            let Some(outgoing) = self.outgoing.get(&version) else {
                continue;
            };
            for &index in outgoing {
                let next = self.edges[index].to;
                if !visited.insert(next) {
                    continue;
                }
                reached_by.insert(next, index);
                if next == to {
                    return Some(self.walk_back(from, to, &reached_by));
                }
                queue.push_back(next);
            }
        }
        None
    }

    fn walk_back(
        &self,
        from: ProtocolVersion,
        to: ProtocolVersion,
        reached_by: &HashMap<ProtocolVersion, usize>,
    ) -> Vec<Arc<Protocol>> {
        let mut path = Vec::new();
        let mut current = to;
        while current != from {
            let Some(&index) = reached_by.get(&current) else {
                break;
            };
            let edge = &self.edges[index];
            path.push(Arc::clone(&edge.protocol));
            current = edge.protocol.server_version();
        }
        path.reverse();
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_core::{ConnectionState, Direction};
    use bridge_protocol::{PacketKind, PacketRegistry};

    fn registry(version: i32) -> Arc<PacketRegistry> {
        Arc::new(
            PacketRegistry::builder(ProtocolVersion::new(version))
                .table(
                    ConnectionState::Play,
                    Direction::Clientbound,
                    &[PacketKind::KEEP_ALIVE],
                )
                .build()
                .unwrap(),
        )
    }

    fn step(from: i32, to: i32) -> Arc<Protocol> {
        Arc::new(
            Protocol::builder(format!("{}->{}", from, to), registry(from), registry(to))
                .build()
                .unwrap(),
        )
    }

    fn add(graph: &mut ProtocolGraph, from: i32, to: i32) {
        graph
            .register_edge(ProtocolVersion::new(from), ProtocolVersion::new(to), step(from, to))
            .unwrap();
    }

    fn names(path: &[Arc<Protocol>]) -> Vec<&str> {
        path.iter().map(|p| p.name()).collect()
    }

    #[test]
    fn test_chain_in_order() {
        let mut graph = ProtocolGraph::new();
        add(&mut graph, 2, 3);
        add(&mut graph, 1, 2);

        let path = graph
            .resolve_path(ProtocolVersion::new(1), ProtocolVersion::new(3))
            .unwrap();
        assert_eq!(names(&path), vec!["1->2", "2->3"]);
    }

    #[test]
    fn test_fewest_hops_then_registration_order() {
        let mut graph = ProtocolGraph::new();
        add(&mut graph, 1, 2);
        add(&mut graph, 1, 5);
        add(&mut graph, 2, 4);
        add(&mut graph, 5, 4);
        add(&mut graph, 4, 3);
        add(&mut graph, 1, 3);

        let path = graph
            .resolve_path(ProtocolVersion::new(1), ProtocolVersion::new(3))
            .unwrap();
        assert_eq!(names(&path), vec!["1->3"]);

        let path = graph
            .resolve_path(ProtocolVersion::new(1), ProtocolVersion::new(4))
            .unwrap();
        assert_eq!(names(&path), vec!["1->2", "2->4"]);
    }

    #[test]
    fn test_no_path() {
        let mut graph = ProtocolGraph::new();
        add(&mut graph, 1, 2);

        let err = graph
            .resolve_path(ProtocolVersion::new(2), ProtocolVersion::new(1))
            .unwrap_err();
        assert!(matches!(err, BridgeError::NoPath { .. }));
    }

    #[test]
    fn test_same_version_is_empty() {
        let graph = ProtocolGraph::new();
        let path = graph
            .resolve_path(ProtocolVersion::new(7), ProtocolVersion::new(7))
            .unwrap();
        assert!(path.is_empty());
    }

    #[test]
    fn test_cached_path_is_shared() {
        let mut graph = ProtocolGraph::new();
        add(&mut graph, 1, 2);
        add(&mut graph, 2, 3);

        let first = graph
            .resolve_path(ProtocolVersion::new(1), ProtocolVersion::new(3))
            .unwrap();
        let second = graph
            .resolve_path(ProtocolVersion::new(1), ProtocolVersion::new(3))
            .unwrap();
        assert!(first.iter().zip(&second).all(|(a, b)| Arc::ptr_eq(a, b)));
    }

    #[test]
    fn test_mismatched_edge_rejected() {
        let mut graph = ProtocolGraph::new();
        let err = graph
            .register_edge(ProtocolVersion::new(2), ProtocolVersion::new(3), step(1, 2))
            .unwrap_err();
        assert!(matches!(err, BridgeError::Registry(_)));
    }
}
