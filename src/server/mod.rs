// src/server/mod.rs

//! The process-wide façade composing the listener, the registry, and the
//! liveness sweeper.

use crate::config::Config;
use crate::core::dispatch::FrameDispatcher;
use crate::core::state::{ClientId, Identity, ServerState};
use crate::core::tasks::sweeper::LivenessSweeper;
use anyhow::Result;
use bytes::Bytes;
use parking_lot::Mutex;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

mod listener;

/// An owned server instance.
///
/// Construct one per process (or per test) and pass payloads through it; there
/// are no process-wide globals. Dropping the handle does not stop the spawned
/// tasks; call [`Server::shutdown`] for an orderly stop.
pub struct Server {
    state: Arc<ServerState>,
    background: Mutex<Vec<JoinHandle<()>>>,
}

impl Server {
    /// Seeds node identity from configuration and starts the liveness sweeper.
    ///
    /// Must be called from within a Tokio runtime. The registry starts empty;
    /// nothing is accepted until [`Server::start_listening`].
    pub fn init(config: Config, dispatcher: Arc<dyn FrameDispatcher>) -> Result<Self> {
        config.validate()?;
        let state = ServerState::new(config, dispatcher);
        info!(
            "node initialized (node_id {}, anonymous {}, should_connect {})",
            state.node.node_id, state.node.anonymous, state.node.should_connect
        );

        let sweeper = LivenessSweeper::new(state.clone());
        let sweeper_handle = tokio::spawn(sweeper.run(state.shutdown_tx.subscribe()));

        Ok(Self {
            state,
            background: Mutex::new(vec![sweeper_handle]),
        })
    }

    /// Binds the configured address and spawns the accept loop.
    ///
    /// Returns the bound address (useful when the configured port is 0 and the
    /// OS picks one). Bind failures are fatal and surfaced to the caller.
    pub fn start_listening(&self) -> Result<SocketAddr> {
        let listener = listener::bind(&self.state)?;
        let addr = listener.local_addr()?;
        let handle = tokio::spawn(listener::run(self.state.clone(), listener));
        self.background.lock().push(handle);
        Ok(addr)
    }

    /// Sends one framed payload to a client, best-effort. Unknown or dead
    /// handles are silently dropped.
    pub async fn send(&self, id: ClientId, payload: Bytes) {
        self.state.send(id, payload).await;
    }

    /// Records the application-supplied identity for a connection, making it
    /// reachable through the identity lookups. Returns false for an
    /// unregistered handle.
    pub fn set_identity(&self, id: ClientId, identity: Identity) -> bool {
        match self.state.registry.get(id) {
            Some(client) => {
                client.set_identity(identity);
                true
            }
            None => false,
        }
    }

    pub fn find_by_xuid(&self, xuid: u64) -> Option<ClientId> {
        self.state.registry.find_by_xuid(xuid)
    }

    pub fn find_by_username(&self, name: &str) -> Option<ClientId> {
        self.state.registry.find_by_username(name)
    }

    pub fn is_alive(&self, id: ClientId) -> bool {
        self.state.registry.is_alive(id)
    }

    /// Tears a connection down. Idempotent; returns whether this call removed
    /// the handle.
    pub async fn remove(&self, id: ClientId) -> bool {
        self.state.teardown(id).await
    }

    pub fn connection_count(&self) -> usize {
        self.state.registry.len()
    }

    /// The shared state, for dispatchers and tests that need direct access.
    pub fn state(&self) -> &Arc<ServerState> {
        &self.state
    }

    /// Signals every task to stop, waits for them, and tears down whatever
    /// connections remain registered.
    pub async fn shutdown(self) {
        info!("shutting down, sending signal to all tasks");
        if self.state.shutdown_tx.send(()).is_err() {
            warn!("no tasks were listening for the shutdown signal");
        }

        for handle in self.background.into_inner() {
            let _ = handle.await;
        }

        for client in self.state.registry.snapshot() {
            self.state.teardown(client.id).await;
        }
        info!("server shutdown complete");
    }
}
