// src/core/state/mod.rs

//! Defines the central `ServerState` struct and all related state components.
//! This module is broken down into logical parts for better organization.

mod client;
mod core;
mod registry;
mod stats;

pub use client::{ClientId, ClientInfo, Identity};
pub use core::{NodeInfo, ServerState};
pub use registry::ClientRegistry;
pub use stats::StatsState;
