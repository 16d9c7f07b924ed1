// src/core/state/registry.rs

//! The authoritative mapping from connection handle to connection state.
//!
//! Every mutation and every multi-step read-then-write sequence runs under one
//! coarse lock, so concurrent accepts, send/receive completions, and the
//! liveness sweeper never observe a torn state. In particular, handle
//! assignment must be atomic with insertion: the `max + 1` rule scans the keys
//! that are registered at that instant.

use super::client::{ClientId, ClientInfo};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Default)]
pub struct ClientRegistry {
    clients: Mutex<HashMap<ClientId, Arc<ClientInfo>>>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assigns the next handle and inserts the state built for it, atomically.
    ///
    /// The handle is `max(registered handles) + 1`, or 0 for an empty registry.
    /// Because removal shrinks the key set, a freed low handle is never handed
    /// out again while any higher handle remains registered.
    pub fn insert_with(&self, build: impl FnOnce(ClientId) -> ClientInfo) -> Arc<ClientInfo> {
        let mut clients = self.clients.lock();
        let next = clients
            .keys()
            .map(|id| id.as_u32())
            .max()
            .map_or(0, |max| max + 1);
        let id = ClientId::new(next);
        let info = Arc::new(build(id));
        clients.insert(id, info.clone());
        info
    }

    pub fn get(&self, id: ClientId) -> Option<Arc<ClientInfo>> {
        self.clients.lock().get(&id).cloned()
    }

    /// Removes the entry for `id`, returning it if it was present. Removing an
    /// absent handle is a no-op, never an error, so teardown paths that race
    /// each other stay idempotent.
    pub fn remove(&self, id: ClientId) -> Option<Arc<ClientInfo>> {
        self.clients.lock().remove(&id)
    }

    /// True if the handle is registered and its socket probe shows no pending
    /// close. Absent handles and probe failures both report `false`.
    pub fn is_alive(&self, id: ClientId) -> bool {
        self.get(id).is_some_and(|client| client.is_open())
    }

    pub fn len(&self) -> usize {
        self.clients.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.lock().is_empty()
    }

    /// A point-in-time copy of all entries, ordered by handle, for iteration
    /// without holding the registry lock during unrelated work.
    pub fn snapshot(&self) -> Vec<Arc<ClientInfo>> {
        let mut entries: Vec<_> = self.clients.lock().values().cloned().collect();
        entries.sort_by_key(|client| client.id);
        entries
    }

    /// Linear scan for a client whose dispatcher-assigned XUID matches.
    /// An unset identity (XUID 0) never matches.
    pub fn find_by_xuid(&self, xuid: u64) -> Option<ClientId> {
        if xuid == 0 {
            return None;
        }
        self.snapshot()
            .into_iter()
            .find(|client| client.identity().xuid == xuid)
            .map(|client| client.id)
    }

    /// Linear scan for a client whose dispatcher-assigned display name matches.
    pub fn find_by_username(&self, name: &str) -> Option<ClientId> {
        self.snapshot()
            .into_iter()
            .find(|client| client.identity().username.as_deref() == Some(name))
            .map(|client| client.id)
    }
}
