// src/core/state/core.rs

//! Defines the central `ServerState` struct, holding all shared server-wide state.

use super::client::ClientId;
use super::registry::ClientRegistry;
use super::stats::StatsState;
use crate::config::Config;
use crate::core::FrameLinkError;
use crate::core::dispatch::FrameDispatcher;
use crate::core::protocol::Frame;
use bytes::Bytes;
use futures::SinkExt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// Bound on the graceful socket shutdown performed during teardown. Teardown
/// is best-effort; it must never block a completion path indefinitely.
const CLOSE_TIMEOUT: Duration = Duration::from_secs(1);

/// This node's identity on the wider network, seeded from configuration.
/// Connecting out to other nodes is not handled here; these fields exist so
/// the dispatcher can read them.
#[derive(Debug, Clone, Copy)]
pub struct NodeInfo {
    pub node_id: u64,
    pub should_connect: bool,
    pub anonymous: bool,
}

/// The central struct holding all shared, server-wide state.
/// This struct is wrapped in an `Arc` and passed to the listener, every
/// session task, the liveness sweeper, and the public API surface, providing a
/// single source of truth instead of process-wide globals.
pub struct ServerState {
    /// The server's runtime configuration, immutable after init.
    pub config: Config,
    pub node: NodeInfo,
    /// The registry of active client connections, keyed by handle.
    pub registry: ClientRegistry,
    pub stats: StatsState,
    /// Interprets decoded frames; invoked once per frame, in arrival order.
    pub dispatcher: Arc<dyn FrameDispatcher>,
    /// Broadcasts process shutdown to the listener and all session tasks.
    pub shutdown_tx: broadcast::Sender<()>,
}

impl ServerState {
    pub fn new(config: Config, dispatcher: Arc<dyn FrameDispatcher>) -> Arc<Self> {
        let (shutdown_tx, _) = broadcast::channel(1);
        let node = NodeInfo {
            node_id: config.node_id,
            should_connect: config.should_connect,
            anonymous: config.anonymous,
        };
        Arc::new(Self {
            config,
            node,
            registry: ClientRegistry::new(),
            stats: StatsState::new(),
            dispatcher,
            shutdown_tx,
        })
    }

    /// Sends one framed payload to a client, best-effort.
    ///
    /// A handle that is absent or whose socket probe fails is silently removed;
    /// no error reaches the caller. A transport error during the write tears
    /// the connection down the same way a receive error would. Any other write
    /// failure is logged and the connection is kept.
    pub async fn send(&self, id: ClientId, payload: Bytes) {
        let Some(client) = self.registry.get(id) else {
            debug!("send to unregistered client {id} ignored");
            return;
        };
        if !client.is_open() {
            self.teardown(id).await;
            return;
        }

        let result = {
            let mut sink = client.sink.lock().await;
            let mut kill_rx = client.kill_subscriber();
            // Teardown marks the entry closed before it signals kill, so a
            // teardown that won the lock race since the probe above is
            // visible here.
            if !client.is_open() {
                debug!("client {id}: send skipped, teardown in progress");
                return;
            }
            // A peer that stops reading can park this write on backpressure
            // while the sink lock is held; the kill signal aborts it so
            // teardown's bounded close is never stuck behind it.
            tokio::select! {
                result = sink.send(Frame::new(payload)) => Some(result),
                _ = kill_rx.recv() => None,
            }
        };
        match result {
            None => debug!("client {id}: in-flight send aborted by teardown"),
            Some(Ok(())) => self.stats.increment_frames_sent(),
            Some(Err(FrameLinkError::Io(e))) => {
                warn!("client {id}: send failed: {e}");
                self.teardown(id).await;
            }
            Some(Err(e)) => {
                // Only transport-level failures are fatal to the session.
                warn!("client {id}: send failed: {e}");
            }
        }
    }

    /// Releases a connection's resources and removes its handle.
    ///
    /// Safe to invoke repeatedly for the same handle: the receive path, the
    /// send path, the sweeper, and the public API can all race here, and only
    /// the call that wins the removal does the socket work. Returns whether
    /// this call performed the removal.
    pub async fn teardown(&self, id: ClientId) -> bool {
        let Some(client) = self.registry.remove(id) else {
            return false;
        };

        client.mark_closed();
        client.kill();

        // Graceful shutdown of the write half, bounded and best-effort. The
        // bound covers acquiring the sink lock as well: a send parked on
        // backpressure aborts on the kill signal sent above, but even a lock
        // that never frees must not stall teardown past the timeout.
        // Failures here are logged, never re-thrown. The read half (and its
        // buffer) is released when the session task exits.
        let close = tokio::time::timeout(CLOSE_TIMEOUT, async {
            client.sink.lock().await.close().await
        })
        .await;
        match close {
            Ok(Ok(())) => {}
            Ok(Err(e)) => debug!("client {id}: error during socket shutdown: {e}"),
            Err(_) => warn!("client {id}: socket shutdown timed out"),
        }
        debug!("client {id} ({}) removed from registry", client.addr);
        true
    }
}
