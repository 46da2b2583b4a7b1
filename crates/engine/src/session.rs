//! Per-connection translation state
//!
//! # Purpose
//! Everything a remapper may need to remember between packets of one
//! connection: the current connection state and arbitrary typed storages
//! (pushed resource pack ids, registry contents, ...).
//!
//! # Ownership
//! A session is owned by exactly one pipeline and lent to remappers as
//! `&mut Session` for the duration of a single call. There is no interior
//! mutability and no sharing between connections.

use bridge_core::{BridgeError, ConnectionState, ProtocolVersion, Result};
use std::any::{Any, TypeId};
use std::collections::HashMap;

#[derive(Debug)]
pub struct Session {
    state: ConnectionState,
    client_version: ProtocolVersion,
    server_version: ProtocolVersion,
    storages: HashMap<TypeId, Box<dyn Any + Send>>,
}

impl Session {
    pub fn new(client_version: ProtocolVersion, server_version: ProtocolVersion) -> Self {
        Self {
            state: ConnectionState::Handshake,
            client_version,
            server_version,
            storages: HashMap::new(),
        }
    }

    #[inline]
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Switch connection state
    ///
    /// Takes effect for every protocol step that runs after the caller,
    /// including the remaining steps of the current packet.
    pub fn set_state(&mut self, state: ConnectionState) {
        if self.state != state {
            tracing::debug!("Connection state {} -> {}", self.state, state);
            self.state = state;
        }
    }

    pub fn client_version(&self) -> ProtocolVersion {
        self.client_version
    }

    pub fn server_version(&self) -> ProtocolVersion {
        self.server_version
    }

    pub fn get<T: Any + Send>(&self) -> Option<&T> {
        self.storages
            .get(&TypeId::of::<T>())
            .and_then(|storage| storage.downcast_ref::<T>())
    }

    pub fn get_mut<T: Any + Send>(&mut self) -> Option<&mut T> {
        self.storages
            .get_mut(&TypeId::of::<T>())
            .and_then(|storage| storage.downcast_mut::<T>())
    }

    /// Store a value, returning the one it replaced
    pub fn put<T: Any + Send>(&mut self, value: T) -> Option<T> {
        self.storages
            .insert(TypeId::of::<T>(), Box::new(value))
            .and_then(|old| old.downcast::<T>().ok())
            .map(|old| *old)
    }

    pub fn remove<T: Any + Send>(&mut self) -> Option<T> {
        self.storages
            .remove(&TypeId::of::<T>())
            .and_then(|old| old.downcast::<T>().ok())
            .map(|old| *old)
    }

    /// Storage of type `T`, inserting `T::default()` first if absent
    ///
    /// # Errors
    /// `Remap` if the slot holds a value of another type
    pub fn get_or_default<T: Any + Send + Default>(&mut self) -> Result<&mut T> {
        self.storages
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Box::new(T::default()))
            .downcast_mut::<T>()
            .ok_or_else(|| {
                BridgeError::Remap(format!(
                    "session storage for {} holds another type",
                    std::any::type_name::<T>()
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, PartialEq)]
    struct Counter(u32);

    #[test]
    fn test_starts_in_handshake() {
        let session = Session::new(ProtocolVersion::V1_21, ProtocolVersion::V1_20_2);
        assert_eq!(session.state(), ConnectionState::Handshake);
        assert_eq!(session.client_version(), ProtocolVersion::V1_21);
    }

    #[test]
    fn test_typed_storage() {
        let mut session = Session::new(ProtocolVersion::V1_21, ProtocolVersion::V1_20_2);
        assert!(session.get::<Counter>().is_none());

        session.get_or_default::<Counter>().unwrap().0 += 2;
        assert_eq!(session.get::<Counter>(), Some(&Counter(2)));
        session.get_or_default::<Counter>().unwrap().0 += 1;
        assert_eq!(session.get::<Counter>(), Some(&Counter(3)));
        session.put(Counter(2));

        assert_eq!(session.put(Counter(5)), Some(Counter(2)));
        assert_eq!(session.remove::<Counter>(), Some(Counter(5)));
        assert!(session.get_mut::<Counter>().is_none());
    }
}
