// src/core/tasks/mod.rs

//! Long-running background tasks that support the connection engine.

pub mod sweeper;
