//! Frame type and the two external seams: the codec that turns wire
//! payloads into frames and the per-frame transform.
//!
//! The transports never look inside a payload; the codec and transform
//! belong to the image pipeline and are injected into the relay loop as
//! trait objects.

use bytes::Bytes;

use crate::mode::Mode;

/// One unit of image data: an opaque encoded payload plus its logical
/// dimensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub payload: Bytes,
    pub width: u16,
    pub height: u16,
}

#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("frame decode failed: {0}")]
    Decode(String),

    #[error("frame transform failed: {0}")]
    Transform(String),
}

/// Serializes a frame to and from a transport payload.
pub trait FrameCodec: Send + Sync {
    fn decode(&self, payload: Bytes) -> Result<Frame, FrameError>;
    fn encode(&self, frame: &Frame) -> Bytes;
}

/// Passthrough codec: the payload is already pixel data encoded by the
/// external image pipeline, so decode just attaches the configured nominal
/// dimensions and encode hands the payload straight back.
#[derive(Debug, Clone)]
pub struct OpaqueCodec {
    width: u16,
    height: u16,
}

impl OpaqueCodec {
    pub fn new(width: u16, height: u16) -> Self {
        Self { width, height }
    }
}

impl FrameCodec for OpaqueCodec {
    fn decode(&self, payload: Bytes) -> Result<Frame, FrameError> {
        Ok(Frame {
            payload,
            width: self.width,
            height: self.height,
        })
    }

    fn encode(&self, frame: &Frame) -> Bytes {
        frame.payload.clone()
    }
}

/// The per-frame pixel transform, keyed by the current mode.
///
/// Deterministic and side-effect-free as far as the relay is concerned.
/// A failure drops that one frame; it never stops the relay loop.
pub trait FrameTransform: Send + Sync {
    fn apply(&self, frame: Frame, mode: Mode) -> Result<Frame, FrameError>;
}

/// Identity transform, used until a real pixel pipeline is plugged in.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughTransform;

impl FrameTransform for PassthroughTransform {
    fn apply(&self, frame: Frame, _mode: Mode) -> Result<Frame, FrameError> {
        Ok(frame)
    }
}
