// src/core/state/client.rs

//! Contains state definitions related to client connections.

use crate::core::protocol::FrameCodec;
use std::fmt;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::sync::{Mutex, broadcast};
use tokio_util::codec::FramedWrite;

/// The encoding half of a client socket, parked behind an async mutex so the
/// send path and teardown can share it.
pub type FrameSink = FramedWrite<OwnedWriteHalf, FrameCodec>;

/// An opaque, process-unique identifier for a registered connection.
///
/// Handles are assigned as `max(registered handles) + 1` at accept time and are
/// never reused while the connection they name is registered. They are not
/// persisted across restarts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClientId(u32);

impl ClientId {
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Application-supplied attributes, filled in by the dispatcher after its
/// handshake. Absent (zero / empty) until then.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Identity {
    pub xuid: u64,
    pub username: Option<String>,
}

/// The per-connection state held in the registry.
///
/// The session task exclusively owns the read half of the socket; the write
/// half lives here so sends and receives are independent directions that may
/// be in flight simultaneously.
#[derive(Debug)]
pub struct ClientInfo {
    pub id: ClientId,
    pub addr: SocketAddr,
    pub created: Instant,
    /// Updated on every successfully decoded frame; drives idle eviction.
    last_activity: parking_lot::Mutex<Instant>,
    identity: parking_lot::Mutex<Identity>,
    /// Set once the session task observes an orderly close or a transport
    /// error, and by teardown. A set flag means the liveness probe fails.
    closed: AtomicBool,
    /// Signals the session task to stop reading and exit.
    kill_tx: broadcast::Sender<()>,
    pub(crate) sink: Mutex<FrameSink>,
}

impl ClientInfo {
    pub fn new(
        id: ClientId,
        addr: SocketAddr,
        sink: FrameSink,
        kill_tx: broadcast::Sender<()>,
    ) -> Self {
        let now = Instant::now();
        Self {
            id,
            addr,
            created: now,
            last_activity: parking_lot::Mutex::new(now),
            identity: parking_lot::Mutex::new(Identity::default()),
            closed: AtomicBool::new(false),
            kill_tx,
            sink: Mutex::new(sink),
        }
    }

    /// Records activity on the connection, resetting its idle clock.
    pub fn touch(&self) {
        *self.last_activity.lock() = Instant::now();
    }

    /// Time since the last completed receive (or since accept, if the peer has
    /// never sent anything).
    pub fn idle_for(&self) -> Duration {
        self.last_activity.lock().elapsed()
    }

    /// The liveness probe result. Probes never fail: any transport problem is
    /// recorded as "not open" rather than surfaced to the caller.
    pub fn is_open(&self) -> bool {
        !self.closed.load(Ordering::Acquire)
    }

    pub(crate) fn mark_closed(&self) {
        self.closed.store(true, Ordering::Release);
    }

    /// Asks the session task to stop. Best-effort: the task may already be
    /// gone, in which case there is no receiver and nothing to do.
    pub(crate) fn kill(&self) {
        let _ = self.kill_tx.send(());
    }

    /// A fresh receiver for the kill signal, for aborting in-flight writes.
    pub(crate) fn kill_subscriber(&self) -> broadcast::Receiver<()> {
        self.kill_tx.subscribe()
    }

    pub fn identity(&self) -> Identity {
        self.identity.lock().clone()
    }

    pub fn set_identity(&self, identity: Identity) {
        *self.identity.lock() = identity;
    }
}
