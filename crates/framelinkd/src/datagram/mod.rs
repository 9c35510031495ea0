//! Datagram transport — chunked frames over UDP, fire-and-forget.
//!
//! No acknowledgements, no retransmission. Frames may be lost, duplicated,
//! or reordered; the reassembly buffer absorbs what it can and the eviction
//! window forgets the rest.

pub mod receive;
pub mod send;

pub use receive::DatagramRelay;
