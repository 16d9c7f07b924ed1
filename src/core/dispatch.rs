// src/core/dispatch.rs

//! The seam between the connection engine and the application-level packet
//! handler.

use crate::core::FrameLinkError;
use crate::core::state::{ClientId, ServerState};
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;

/// Interprets fully decoded frames.
///
/// The session loop invokes `handle_frame` synchronously, once per frame, in
/// arrival order for a given connection; the call must return before the next
/// frame from the same connection is dispatched. Implementations may call back
/// into [`ServerState::send`] to respond.
///
/// Returning an error is treated as unrecoverable for that connection: it is
/// logged and the connection is torn down, but no other session is affected.
#[async_trait]
pub trait FrameDispatcher: Send + Sync {
    async fn handle_frame(
        &self,
        state: &Arc<ServerState>,
        id: ClientId,
        payload: Bytes,
    ) -> Result<(), FrameLinkError>;
}
