// src/core/state/stats.rs

//! Contains state definitions and logic for server statistics.

use std::sync::atomic::{AtomicU64, Ordering};

/// Holds all state and logic related to server-wide statistics.
#[derive(Debug, Default)]
pub struct StatsState {
    /// The total number of connections accepted by the server since startup.
    total_connections: AtomicU64,
    /// The total number of frames handed to the dispatcher since startup.
    frames_dispatched: AtomicU64,
    /// The total number of frames successfully written to peers since startup.
    frames_sent: AtomicU64,
    /// Connections evicted by the sweeper because their socket was dead.
    evicted_dead: AtomicU64,
    /// Connections evicted by the sweeper because they were idle too long.
    evicted_idle: AtomicU64,
}

impl StatsState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_total_connections(&self) {
        self.total_connections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_total_connections(&self) -> u64 {
        self.total_connections.load(Ordering::Relaxed)
    }

    pub fn increment_frames_dispatched(&self) {
        self.frames_dispatched.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_frames_dispatched(&self) -> u64 {
        self.frames_dispatched.load(Ordering::Relaxed)
    }

    pub fn increment_frames_sent(&self) {
        self.frames_sent.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_frames_sent(&self) -> u64 {
        self.frames_sent.load(Ordering::Relaxed)
    }

    pub fn increment_evicted_dead(&self) {
        self.evicted_dead.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_evicted_dead(&self) -> u64 {
        self.evicted_dead.load(Ordering::Relaxed)
    }

    pub fn increment_evicted_idle(&self) {
        self.evicted_idle.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_evicted_idle(&self) -> u64 {
        self.evicted_idle.load(Ordering::Relaxed)
    }
}
