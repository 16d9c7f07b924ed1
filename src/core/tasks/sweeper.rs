// src/core/tasks/sweeper.rs

//! The background task that evicts dead and idle connections.

use crate::core::state::ServerState;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

/// Periodically sweeps the registry for connections whose socket is dead or
/// whose last activity is older than the idle timeout.
pub struct LivenessSweeper {
    state: Arc<ServerState>,
}

impl LivenessSweeper {
    pub fn new(state: Arc<ServerState>) -> Self {
        Self { state }
    }

    /// Runs the sweep loop until shutdown is signalled.
    pub async fn run(self, mut shutdown_rx: broadcast::Receiver<()>) {
        let period = self.state.config.sweep_interval;
        let idle_timeout = self.state.config.idle_timeout;
        info!(
            "liveness sweeper started (period {:?}, idle timeout {:?})",
            period, idle_timeout
        );

        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    self.sweep_once(idle_timeout).await;
                }
                _ = shutdown_rx.recv() => {
                    info!("liveness sweeper shutting down");
                    return;
                }
            }
        }
    }

    /// Performs a single sweep over a point-in-time snapshot.
    ///
    /// Teardown happens per entry, outside the registry lock, so lock hold
    /// time stays bounded regardless of how many sockets need closing. An
    /// entry that a concurrent path already removed counts as not evicted.
    pub async fn sweep_once(&self, idle_timeout: Duration) -> usize {
        let mut evicted = 0;

        for client in self.state.registry.snapshot() {
            let dead = !client.is_open();
            if !dead && client.idle_for() <= idle_timeout {
                continue;
            }

            if self.state.teardown(client.id).await {
                if dead {
                    debug!("purged client {} ({}): socket closed", client.id, client.addr);
                    self.state.stats.increment_evicted_dead();
                } else {
                    debug!(
                        "purged client {} ({}): idle for {:?}",
                        client.id,
                        client.addr,
                        client.idle_for()
                    );
                    self.state.stats.increment_evicted_idle();
                }
                evicted += 1;
            }
        }

        evicted
    }
}
