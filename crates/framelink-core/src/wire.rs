//! framelink wire format — on-wire types for both transports.
//!
//! These types ARE the protocol. Every field and every size is part of the
//! wire format and must match what the peer endpoint expects; changing
//! anything here is a breaking change.
//!
//! All multi-byte integers are big-endian. The header type is #[repr(C)]
//! with zerocopy derives for safe, allocation-free serialization. There is
//! no unsafe code in this module.

use bytes::Bytes;
use static_assertions::assert_eq_size;
use zerocopy::byteorder::{BigEndian, U16, U32};
use zerocopy::{AsBytes, FromBytes, FromZeroes, Unaligned};

// ── Constants ─────────────────────────────────────────────────────────────────

/// Maximum chunk payload per datagram. Together with the 12-byte header this
/// keeps every datagram under the 65507-byte UDP payload ceiling.
pub const MAX_CHUNK_PAYLOAD: usize = 60_000;

/// Wire size of [`ChunkHeader`].
pub const CHUNK_HEADER_SIZE: usize = 12;

/// Length-prefix size for stream mode.
pub const STREAM_PREFIX_SIZE: usize = 4;

/// Largest payload a stream receiver will accept. A length prefix above this
/// is treated as a corrupt stream, not an allocation request.
pub const MAX_STREAM_PAYLOAD: usize = 16 * 1024 * 1024;

// ── Chunk Header ─────────────────────────────────────────────────────────────

/// Header preceding every datagram-mode chunk.
///
/// A frame larger than [`MAX_CHUNK_PAYLOAD`] is split by the sender into
/// `total_chunks` consecutive chunks that all carry the same `frame_id` and
/// `total_length`. The receiver can place a chunk into its frame before any
/// other chunk of that frame has arrived.
///
/// Wire size: 12 bytes, all fields big-endian.
#[derive(Debug, Clone, AsBytes, FromBytes, FromZeroes, Unaligned)]
#[repr(C)]
pub struct ChunkHeader {
    /// Frame this chunk belongs to. Values wrap modulo 65536; only the low
    /// 16 bits are significant. Four bytes on the wire for compatibility.
    pub frame_id: U32<BigEndian>,

    /// Zero-based position of this chunk within the frame.
    /// Invariant: `chunk_index < total_chunks`.
    pub chunk_index: U16<BigEndian>,

    /// Number of chunks the frame was split into. Never zero.
    pub total_chunks: U16<BigEndian>,

    /// Length of the complete frame payload across all chunks.
    pub total_length: U32<BigEndian>,
}

// Compile-time size guard. If this fails, the wire format has silently changed.
assert_eq_size!(ChunkHeader, [u8; 12]);

impl ChunkHeader {
    pub fn new(frame_id: u16, chunk_index: u16, total_chunks: u16, total_length: u32) -> Self {
        Self {
            frame_id: U32::new(frame_id as u32),
            chunk_index: U16::new(chunk_index),
            total_chunks: U16::new(total_chunks),
            total_length: U32::new(total_length),
        }
    }
}

// ── Parsed Chunk ─────────────────────────────────────────────────────────────

/// One parsed datagram: header fields plus the chunk payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub frame_id: u16,
    pub chunk_index: u16,
    pub total_chunks: u16,
    pub total_length: u32,
    pub payload: Bytes,
}

impl Chunk {
    /// Parse one received datagram.
    ///
    /// Anything that fails here is discarded by the receiver without a reply;
    /// loss and garbage are expected operating conditions in datagram mode.
    pub fn parse(datagram: &[u8]) -> Result<Self, WireError> {
        if datagram.len() < CHUNK_HEADER_SIZE {
            return Err(WireError::DatagramTooShort(datagram.len()));
        }

        let header = ChunkHeader::read_from_prefix(&datagram[..CHUNK_HEADER_SIZE])
            .ok_or(WireError::DatagramTooShort(datagram.len()))?;

        let total_chunks = header.total_chunks.get();
        let chunk_index = header.chunk_index.get();
        if total_chunks == 0 {
            return Err(WireError::EmptyChunkSet);
        }
        if chunk_index >= total_chunks {
            return Err(WireError::ChunkIndexOutOfRange {
                index: chunk_index,
                total: total_chunks,
            });
        }

        // total_length comes off the wire; never let it drive an allocation
        // larger than the chunk set could actually deliver.
        let total_length = header.total_length.get();
        if total_length > total_chunks as u32 * MAX_CHUNK_PAYLOAD as u32 {
            return Err(WireError::TotalLengthTooLarge {
                length: total_length,
                total_chunks,
            });
        }

        let payload = &datagram[CHUNK_HEADER_SIZE..];
        if payload.len() > MAX_CHUNK_PAYLOAD {
            return Err(WireError::ChunkTooLarge(payload.len()));
        }

        Ok(Self {
            frame_id: header.frame_id.get() as u16,
            chunk_index,
            total_chunks,
            total_length,
            payload: Bytes::copy_from_slice(payload),
        })
    }
}

// ── Frame-id arithmetic ───────────────────────────────────────────────────────

/// Wraparound-aware distance from `older` to `newer` in frame-id space.
///
/// Returns `Some(d)` when `older` is behind `newer` by `d` positions,
/// treating distances of 32768 or more as "ahead, not behind" so that a
/// legitimately newer id just past the 16-bit wraparound is never mistaken
/// for an ancient one. Returns `None` for equal ids.
pub fn frames_behind(newer: u16, older: u16) -> Option<u16> {
    let d = newer.wrapping_sub(older);
    if d == 0 || d >= 0x8000 {
        None
    } else {
        Some(d)
    }
}

// ── Errors ────────────────────────────────────────────────────────────────────

/// Errors that can arise when interpreting wire-format data.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WireError {
    #[error("datagram too short: {0} bytes, header needs {}", CHUNK_HEADER_SIZE)]
    DatagramTooShort(usize),

    #[error("chunk index {index} out of range (total_chunks {total})")]
    ChunkIndexOutOfRange { index: u16, total: u16 },

    #[error("chunk payload {0} exceeds maximum {}", MAX_CHUNK_PAYLOAD)]
    ChunkTooLarge(usize),

    #[error("header declares zero total_chunks")]
    EmptyChunkSet,

    #[error("total_length {length} cannot fit in {total_chunks} chunks of {}", MAX_CHUNK_PAYLOAD)]
    TotalLengthTooLarge { length: u32, total_chunks: u16 },
}

// ── Tests ─────────────────────────────────────────────────────────────────────
