// src/core/errors.rs

//! Defines the primary error type for the entire crate.

use thiserror::Error;

/// The main error enum, representing all possible failures within the server.
/// Using `thiserror` allows for clean error definitions and automatic `From` trait implementations.
#[derive(Error, Debug)]
pub enum FrameLinkError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A peer declared a frame length above the configured limit. Only raised
    /// when a maximum frame length is configured; fatal to the connection.
    #[error("frame of {declared} bytes exceeds the {limit}-byte limit")]
    FrameTooLarge { declared: usize, limit: usize },

    /// An unrecoverable error reported by the frame dispatcher. The connection
    /// that produced the frame is torn down; other sessions are unaffected.
    #[error("dispatch error: {0}")]
    Dispatch(String),
}
