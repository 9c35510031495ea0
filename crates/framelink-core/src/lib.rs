//! framelink-core — wire format, frame and mode types, configuration.
//! Both the daemon and the test harness depend on this one.

pub mod config;
pub mod frame;
pub mod mode;
pub mod wire;

pub use frame::{Frame, FrameCodec, FrameTransform};
pub use mode::{Mode, ModeSwitch};
