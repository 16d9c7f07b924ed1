// src/server/listener.rs

//! Binds the listening socket and runs the accept loop.

use crate::connection::ConnectionHandler;
use crate::core::protocol::FrameCodec;
use crate::core::state::{ClientInfo, ServerState};
use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpSocket, TcpStream};
use tokio::sync::broadcast;
use tokio::task::JoinSet;
use tokio_util::codec::FramedWrite;
use tracing::{debug, error, info, warn};

/// Binds and listens on the configured address.
///
/// Goes through `TcpSocket` so the configured backlog is honored. A bind or
/// listen failure (port in use, permission denied) is fatal startup: it is
/// surfaced to the caller and never retried here.
pub(super) fn bind(state: &Arc<ServerState>) -> Result<TcpListener> {
    let config = &state.config;
    let addr: SocketAddr = format!("{}:{}", config.host, config.listen_port)
        .parse()
        .with_context(|| format!("invalid listen address '{}:{}'", config.host, config.listen_port))?;

    let socket = if addr.is_ipv4() {
        TcpSocket::new_v4()
    } else {
        TcpSocket::new_v6()
    }
    .context("failed to create listening socket")?;
    socket.set_reuseaddr(true)?;
    socket
        .bind(addr)
        .with_context(|| format!("failed to bind {addr}"))?;
    let listener = socket
        .listen(config.backlog)
        .with_context(|| format!("failed to listen on {addr}"))?;

    info!("listening on {}", listener.local_addr()?);
    Ok(listener)
}

/// The accept loop. Each accepted connection is registered (assigning its
/// handle) and handed to a freshly spawned session task; the loop then
/// immediately waits for the next connection, so per-connection setup never
/// blocks accept throughput. Accept failures are logged and do not stop the
/// loop.
pub(super) async fn run(state: Arc<ServerState>, listener: TcpListener) {
    let mut sessions = JoinSet::new();
    let mut shutdown_rx = state.shutdown_tx.subscribe();

    loop {
        tokio::select! {
            biased;
            _ = shutdown_rx.recv() => {
                info!("listener shutting down");
                break;
            }
            result = listener.accept() => {
                match result {
                    Ok((socket, addr)) => accept_client(&state, &mut sessions, socket, addr),
                    Err(e) => error!("failed to accept connection: {e}"),
                }
            }
            Some(result) = sessions.join_next() => {
                if let Err(e) = result
                    && e.is_panic()
                {
                    error!("a client session panicked: {e:?}");
                }
            }
        }
    }

    // Sessions observe the same shutdown broadcast; give them a bounded
    // window to tear down before aborting what is left.
    if tokio::time::timeout(Duration::from_secs(5), async {
        while sessions.join_next().await.is_some() {}
    })
    .await
    .is_err()
    {
        warn!("timed out waiting for client sessions to finish, aborting the rest");
        sessions.shutdown().await;
    }
    info!("all client sessions closed");
}

fn accept_client(
    state: &Arc<ServerState>,
    sessions: &mut JoinSet<()>,
    socket: TcpStream,
    addr: SocketAddr,
) {
    info!("accepted new connection from {addr}");
    state.stats.increment_total_connections();

    let (read_half, write_half) = socket.into_split();
    let (kill_tx, kill_rx) = broadcast::channel(1);
    let sink = FramedWrite::new(write_half, FrameCodec::new(state.config.max_frame_len));

    // Handle assignment and insertion happen atomically inside the registry.
    let client = state
        .registry
        .insert_with(|id| ClientInfo::new(id, addr, sink, kill_tx));
    debug!("client {} registered for {addr}", client.id);

    let global_shutdown_rx = state.shutdown_tx.subscribe();
    let state = state.clone();
    sessions.spawn(async move {
        let mut handler = ConnectionHandler::new(
            read_half,
            addr,
            state,
            client,
            kill_rx,
            global_shutdown_rx,
        );
        handler.run().await;
    });
}
