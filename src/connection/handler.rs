// src/connection/handler.rs

//! Defines the `ConnectionHandler` which manages the full lifecycle of a
//! client connection.

use super::guard::ConnectionGuard;
use crate::core::FrameLinkError;
use crate::core::protocol::FrameCodec;
use crate::core::state::{ClientInfo, ServerState};
use futures::StreamExt;
use std::io::ErrorKind;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::tcp::OwnedReadHalf;
use tokio::sync::broadcast;
use tokio_util::codec::FramedRead;
use tracing::{debug, warn};

/// Manages the receive direction of a client connection.
///
/// Each accepted connection runs one of these as an independently scheduled
/// task that loops read -> decode -> dispatch until it observes a close, a
/// transport error, a dispatcher error, or a shutdown signal. The write half
/// lives in the registry entry, so sends proceed independently.
pub struct ConnectionHandler {
    reader: FramedRead<OwnedReadHalf, FrameCodec>,
    addr: SocketAddr,
    state: Arc<ServerState>,
    client: Arc<ClientInfo>,
    kill_rx: broadcast::Receiver<()>,
    global_shutdown_rx: broadcast::Receiver<()>,
}

impl ConnectionHandler {
    pub fn new(
        read_half: OwnedReadHalf,
        addr: SocketAddr,
        state: Arc<ServerState>,
        client: Arc<ClientInfo>,
        kill_rx: broadcast::Receiver<()>,
        global_shutdown_rx: broadcast::Receiver<()>,
    ) -> Self {
        let codec = FrameCodec::new(state.config.max_frame_len);
        Self {
            reader: FramedRead::new(read_half, codec),
            addr,
            state,
            client,
            kill_rx,
            global_shutdown_rx,
        }
    }

    /// The main event loop for the connection.
    ///
    /// Frames decoded from this connection's byte stream are dispatched in
    /// strict arrival order, one at a time: the dispatcher returns before the
    /// next frame in the same batch is pulled from the decoder.
    pub async fn run(&mut self) {
        let id = self.client.id;
        let mut guard = ConnectionGuard::new(self.state.clone(), id);

        loop {
            tokio::select! {
                // Prioritize shutdown signals over pending frames.
                biased;
                _ = self.global_shutdown_rx.recv() => {
                    debug!("client {id}: session received global shutdown signal");
                    break;
                }
                _ = self.kill_rx.recv() => {
                    debug!("client {id}: session received kill signal");
                    break;
                }
                result = self.reader.next() => {
                    match result {
                        Some(Ok(frame)) => {
                            self.client.touch();
                            self.state.stats.increment_frames_dispatched();
                            if let Err(e) = self
                                .state
                                .dispatcher
                                .handle_frame(&self.state, id, frame.payload)
                                .await
                            {
                                warn!("client {id}: dispatcher error: {e}");
                                break;
                            }
                        }
                        Some(Err(e)) => {
                            if is_normal_disconnect(&e) {
                                debug!("connection from {} closed by peer: {e}", self.addr);
                            } else {
                                warn!("client {id}: connection error: {e}");
                            }
                            self.client.mark_closed();
                            break;
                        }
                        None => {
                            debug!("connection from {} closed by peer", self.addr);
                            self.client.mark_closed();
                            break;
                        }
                    }
                }
            }
        }

        // Normal exit: hand cleanup to the shared idempotent teardown, which
        // may already have run if a concurrent path won the removal.
        guard.disarm();
        drop(guard);
        self.state.teardown(id).await;
    }
}

/// Distinguishes an ordinary peer disconnect from an unexpected transport
/// failure, for logging purposes only; both end the session.
fn is_normal_disconnect(err: &FrameLinkError) -> bool {
    match err {
        FrameLinkError::Io(e) => matches!(
            e.kind(),
            ErrorKind::ConnectionReset | ErrorKind::BrokenPipe | ErrorKind::UnexpectedEof
        ),
        _ => false,
    }
}
