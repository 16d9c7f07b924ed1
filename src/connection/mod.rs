// src/connection/mod.rs

//! Manages the lifecycle of a single client TCP connection: framing, frame
//! dispatch, and resource cleanup.

mod guard;
mod handler;

pub use guard::ConnectionGuard;
pub use handler::ConnectionHandler;
