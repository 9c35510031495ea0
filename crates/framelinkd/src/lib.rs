//! framelinkd — live frame relay daemon.
//!
//! Receives frames from a capture endpoint over one of two transports,
//! runs each through the mode-keyed transform, and sends the result back.
//! Exposed as a library so the integration tests can drive the transports
//! over loopback sockets.

pub mod control;
pub mod datagram;
pub mod metrics;
pub mod reassembly;
pub mod relay;
pub mod stream;
