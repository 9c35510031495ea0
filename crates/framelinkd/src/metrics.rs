//! Throughput metrics — a rolling window of frame-completion instants.

use std::collections::VecDeque;
use std::time::Instant;

/// Rolling window over the most recent frame completions.
///
/// Owned by the relay task; nothing else reads or writes it, so there is
/// no locking here.
#[derive(Debug)]
pub struct ThroughputWindow {
    samples: VecDeque<Instant>,
    capacity: usize,
}

impl ThroughputWindow {
    pub const DEFAULT_CAPACITY: usize = 30;

    pub fn new(capacity: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity: capacity.max(2),
        }
    }

    pub fn record(&mut self, at: Instant) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(at);
    }

    /// Frames per second across the window.
    ///
    /// Undefined with fewer than two samples — returns `None` rather than a
    /// misleading zero.
    pub fn throughput(&self) -> Option<f64> {
        let first = self.samples.front()?;
        let last = self.samples.back()?;
        if self.samples.len() < 2 {
            return None;
        }
        let span = last.duration_since(*first).as_secs_f64();
        if span <= 0.0 {
            return None;
        }
        Some(self.samples.len() as f64 / span)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

impl Default for ThroughputWindow {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}
