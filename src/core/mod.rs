// src/core/mod.rs

//! The central module containing the core logic and data structures of framelink.

pub mod dispatch;
pub mod errors;
pub mod protocol;
pub mod state;
pub mod tasks;

pub use dispatch::FrameDispatcher;
pub use errors::FrameLinkError;
