// src/connection/guard.rs

//! Defines `ConnectionGuard`, an RAII guard for connection resource management.

use crate::core::state::{ClientId, ServerState};
use std::sync::Arc;
use tracing::warn;

/// An RAII backstop ensuring the registry never leaks an entry when a session
/// task exits abnormally.
///
/// On the normal path the session performs a full async teardown itself and
/// disarms the guard first. If the task unwinds instead, `Drop` still removes
/// the entry and marks it closed; the sockets are released with the task.
pub struct ConnectionGuard {
    state: Arc<ServerState>,
    id: ClientId,
    armed: bool,
}

impl ConnectionGuard {
    pub(crate) fn new(state: Arc<ServerState>, id: ClientId) -> Self {
        Self {
            state,
            id,
            armed: true,
        }
    }

    /// Disarms the guard; the caller takes over cleanup.
    pub(crate) fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        if let Some(client) = self.state.registry.remove(self.id) {
            client.mark_closed();
            client.kill();
            warn!(
                "client {} ({}) cleaned up after abnormal session exit",
                self.id, client.addr
            );
        }
    }
}
