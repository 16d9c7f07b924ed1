// src/core/protocol/frame.rs

//! Implements the wire frame structure and the corresponding `Encoder` and
//! `Decoder` for network communication.
//!
//! Every message on the wire is a 4-byte little-endian payload length followed
//! by exactly that many payload bytes. There is no magic number, version field,
//! or checksum at this layer.

use crate::core::FrameLinkError;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

/// The number of bytes in the length prefix preceding every payload.
pub const LENGTH_PREFIX_LEN: usize = 4;

/// A single length-prefixed protocol message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub payload: Bytes,
}

impl Frame {
    /// Creates a new frame wrapping the given payload.
    pub fn new(payload: impl Into<Bytes>) -> Self {
        Self {
            payload: payload.into(),
        }
    }

    /// The payload length in bytes, excluding the length prefix.
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    /// A convenience method to encode a frame into a `Vec<u8>`.
    /// Fails only for payloads whose length does not fit the 4-byte prefix.
    pub fn encode_to_vec(&self) -> Result<Vec<u8>, FrameLinkError> {
        let prefix = self.length_prefix()?;
        let mut buf = Vec::with_capacity(LENGTH_PREFIX_LEN + self.payload.len());
        buf.extend_from_slice(&prefix.to_le_bytes());
        buf.extend_from_slice(&self.payload);
        Ok(buf)
    }

    /// The payload length as the wire prefix. A payload beyond the prefix
    /// range must never be encoded with a truncated header.
    fn length_prefix(&self) -> Result<u32, FrameLinkError> {
        u32::try_from(self.payload.len()).map_err(|_| FrameLinkError::FrameTooLarge {
            declared: self.payload.len(),
            limit: u32::MAX as usize,
        })
    }
}

/// A `tokio_util::codec` implementation for encoding and decoding `Frame`s.
///
/// The decoder tolerates arbitrary read partitioning: a single receive may
/// deliver a partial length prefix, several frames, or a partial frame. Bytes
/// are never consumed from the buffer until a complete frame is available.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameCodec {
    /// Maximum accepted payload length. `None` accepts any declared length,
    /// which lets a malicious peer stall the buffer indefinitely; deployments
    /// that care set this through the configuration. Enforced on decode only.
    max_frame_len: Option<usize>,
}

impl FrameCodec {
    pub fn new(max_frame_len: Option<usize>) -> Self {
        Self { max_frame_len }
    }
}

impl Encoder<Frame> for FrameCodec {
    type Error = FrameLinkError;

    fn encode(&mut self, item: Frame, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let prefix = item.length_prefix()?;
        dst.reserve(LENGTH_PREFIX_LEN + item.payload.len());
        dst.put_u32_le(prefix);
        dst.extend_from_slice(&item.payload);
        Ok(())
    }
}

impl Decoder for FrameCodec {
    type Item = Frame;
    type Error = FrameLinkError;

    /// Decodes one frame from the buffer, or returns `Ok(None)` to signal that
    /// more bytes are needed. `Ok(None)` consumes nothing.
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.len() < LENGTH_PREFIX_LEN {
            return Ok(None);
        }

        let mut prefix = [0u8; LENGTH_PREFIX_LEN];
        prefix.copy_from_slice(&src[..LENGTH_PREFIX_LEN]);
        let declared = u32::from_le_bytes(prefix) as usize;

        if let Some(limit) = self.max_frame_len
            && declared > limit
        {
            return Err(FrameLinkError::FrameTooLarge { declared, limit });
        }

        if src.len() < LENGTH_PREFIX_LEN + declared {
            // Pre-reserve the rest of the frame so the next reads land in one
            // allocation.
            src.reserve(LENGTH_PREFIX_LEN + declared - src.len());
            return Ok(None);
        }

        src.advance(LENGTH_PREFIX_LEN);
        let payload = src.split_to(declared).freeze();
        Ok(Some(Frame { payload }))
    }
}
