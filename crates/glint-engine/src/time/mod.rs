//! Frame timing.
//!
//! `FrameClock` produces per-frame deltas and `FpsCounter` turns a stream of
//! frame timestamps into one frames-per-second sample per elapsed second.

mod fps;
mod frame_clock;

pub use fps::FpsCounter;
pub use frame_clock::{FrameClock, FrameTime};
