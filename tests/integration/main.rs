//! framelink integration test harness.
//!
//! These tests drive the real daemon components over loopback sockets —
//! nothing on the wire path is mocked. Every socket binds port 0, so the
//! suite needs no environment setup and tests cannot collide.

mod datagram;
mod stream;

use std::time::Duration;

use bytes::Bytes;

use framelink_core::frame::{Frame, FrameError, FrameTransform, OpaqueCodec, PassthroughTransform};
use framelink_core::mode::{Mode, ModeSwitch};
use framelinkd::relay::FrameProcessor;

// ── Harness ───────────────────────────────────────────────────────────────────

/// Transform that appends the mode name to the payload, so tests can see
/// which mode snapshot a frame was processed under.
pub struct TaggingTransform;

impl FrameTransform for TaggingTransform {
    fn apply(&self, frame: Frame, mode: Mode) -> Result<Frame, FrameError> {
        let mut tagged = frame.payload.to_vec();
        tagged.extend_from_slice(mode.name().as_bytes());
        Ok(Frame {
            payload: Bytes::from(tagged),
            ..frame
        })
    }
}

pub fn passthrough_processor(modes: ModeSwitch) -> FrameProcessor {
    FrameProcessor::new(
        modes,
        Box::new(OpaqueCodec::new(320, 240)),
        Box::new(PassthroughTransform),
        Duration::from_secs(2),
    )
}

pub fn tagging_processor(modes: ModeSwitch) -> FrameProcessor {
    FrameProcessor::new(
        modes,
        Box::new(OpaqueCodec::new(320, 240)),
        Box::new(TaggingTransform),
        Duration::from_secs(2),
    )
}
