//! The per-frame relay step: mode snapshot → transform → metrics.
//!
//! Shared by both transports. The processor is confined to whichever
//! transport task owns it; only the [`ModeSwitch`] inside is shared state.

use std::time::{Duration, Instant};

use bytes::Bytes;

use framelink_core::frame::{FrameCodec, FrameTransform};
use framelink_core::mode::{Mode, ModeSwitch};

use crate::metrics::ThroughputWindow;

pub struct FrameProcessor {
    modes: ModeSwitch,
    codec: Box<dyn FrameCodec>,
    transform: Box<dyn FrameTransform>,
    window: ThroughputWindow,
    report_interval: Duration,
    last_report: Instant,
}

impl FrameProcessor {
    pub fn new(
        modes: ModeSwitch,
        codec: Box<dyn FrameCodec>,
        transform: Box<dyn FrameTransform>,
        report_interval: Duration,
    ) -> Self {
        Self {
            modes,
            codec,
            transform,
            window: ThroughputWindow::default(),
            report_interval,
            last_report: Instant::now(),
        }
    }

    /// Run one received payload through the transform under the current
    /// mode. Returns the payload to send back, or `None` when the frame is
    /// dropped — a dropped frame never stops the relay.
    pub fn process(&mut self, payload: Bytes) -> Option<Bytes> {
        let mode = self.modes.get();

        let frame = match self.codec.decode(payload) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::warn!(error = %e, "frame decode failed, dropping frame");
                return None;
            }
        };

        let transformed = match self.transform.apply(frame, mode) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::warn!(error = %e, %mode, "frame transform failed, dropping frame");
                return None;
            }
        };

        let reply = self.codec.encode(&transformed);
        self.window.record(Instant::now());
        self.maybe_report(mode);
        Some(reply)
    }

    /// Periodic throughput log, derived from the completion window.
    /// Skipped while throughput is undefined (fewer than two samples).
    fn maybe_report(&mut self, mode: Mode) {
        if self.last_report.elapsed() < self.report_interval {
            return;
        }
        if let Some(fps) = self.window.throughput() {
            tracing::info!(fps = format_args!("{fps:.1}"), %mode, "relay throughput");
        }
        self.last_report = Instant::now();
    }
}
