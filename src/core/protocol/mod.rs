// src/core/protocol/mod.rs

mod frame;

pub use frame::{Frame, FrameCodec, LENGTH_PREFIX_LEN};
