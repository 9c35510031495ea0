//! Per-frame chunk reassembly with bounded staleness.
//!
//! Each incomplete frame moves through absent → accumulating → complete or
//! evicted. The buffer is owned by the datagram receive task alone; no
//! locking here. Memory is bounded three ways: completing a frame evicts
//! everything more than the window behind it, an age sweep drops entries
//! that never complete, and the number of accumulating frames is capped —
//! when a new frame would exceed the cap, the longest-pending one is
//! dropped to make room.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use bytes::{Bytes, BytesMut};

use framelink_core::wire::{frames_behind, Chunk};

/// Hard ceiling on accumulating frames. With a healthy sender only a
/// handful of frames are ever in flight; anything near this cap is loss or
/// garbage, and the oldest entries are the least likely to still complete.
pub const MAX_PENDING_FRAMES: usize = 32;

struct Entry {
    chunks: HashMap<u16, Bytes>,
    total_chunks: u16,
    total_length: u32,
    first_seen: Instant,
}

pub struct ReassemblyBuffer {
    entries: HashMap<u16, Entry>,
    window: u16,
    stale_ttl: Duration,
    last_completed: Option<u16>,
}

impl ReassemblyBuffer {
    pub fn new(window: u16, stale_ttl: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            window,
            stale_ttl,
            last_completed: None,
        }
    }

    /// Feed one chunk. Returns the reassembled payload when this chunk
    /// completes its frame; the entry is removed on completion.
    ///
    /// Duplicate-tolerant: the same chunk index arriving twice overwrites
    /// (last write wins) and is not counted twice.
    pub fn accept(&mut self, chunk: Chunk) -> Option<Bytes> {
        // A straggler for a frame already outside the window never starts
        // a new entry.
        if let Some(done) = self.last_completed {
            if matches!(frames_behind(done, chunk.frame_id), Some(d) if d > self.window) {
                tracing::trace!(
                    frame_id = chunk.frame_id,
                    "chunk older than reassembly window, dropping"
                );
                return None;
            }
        }

        let frame_id = chunk.frame_id;
        if !self.entries.contains_key(&frame_id) && self.entries.len() >= MAX_PENDING_FRAMES {
            self.evict_longest_pending();
        }
        let entry = self.entries.entry(frame_id).or_insert_with(|| Entry {
            chunks: HashMap::new(),
            total_chunks: chunk.total_chunks,
            total_length: chunk.total_length,
            first_seen: Instant::now(),
        });

        if chunk.total_chunks != entry.total_chunks {
            // Header disagrees with the chunks seen so far; corrupt or a
            // reused frame_id. Drop the chunk, keep the entry.
            tracing::trace!(
                frame_id,
                expected = entry.total_chunks,
                got = chunk.total_chunks,
                "chunk header mismatch, dropping"
            );
            return None;
        }

        entry.chunks.insert(chunk.chunk_index, chunk.payload);
        if entry.chunks.len() < entry.total_chunks as usize {
            return None;
        }

        // Complete: indices are parse-checked to be < total_chunks, and we
        // hold total_chunks distinct ones, so 0..total_chunks are all here.
        let entry = self.entries.remove(&frame_id)?;
        let mut assembled = BytesMut::with_capacity(entry.total_length as usize);
        for index in 0..entry.total_chunks {
            let part = entry.chunks.get(&index)?;
            assembled.extend_from_slice(part);
        }
        assembled.truncate(entry.total_length as usize);

        self.evict_behind(frame_id);
        Some(assembled.freeze())
    }

    /// Drop every entry more than the window behind the just-completed id.
    fn evict_behind(&mut self, completed: u16) {
        self.last_completed = Some(completed);
        let window = self.window;
        self.entries.retain(|&frame_id, _| {
            match frames_behind(completed, frame_id) {
                Some(distance) if distance > window => {
                    tracing::trace!(frame_id, distance, "evicting stale reassembly entry");
                    false
                }
                _ => true,
            }
        });
    }

    /// Drop the entry that has been accumulating the longest.
    fn evict_longest_pending(&mut self) {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|(_, entry)| entry.first_seen)
            .map(|(&frame_id, _)| frame_id);
        if let Some(frame_id) = oldest {
            tracing::trace!(frame_id, "reassembly full, dropping longest-pending frame");
            self.entries.remove(&frame_id);
        }
    }

    /// Drop entries that have sat incomplete longer than the stale TTL.
    /// Keeps memory bounded even when no frame ever completes.
    pub fn sweep_stale(&mut self) {
        let ttl = self.stale_ttl;
        self.entries.retain(|_, entry| entry.first_seen.elapsed() <= ttl);
    }

    /// Number of frames currently accumulating.
    pub fn pending(&self) -> usize {
        self.entries.len()
    }
}
