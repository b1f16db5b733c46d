//! Window and runtime loop.
//!
//! Owns the `winit` event loop and window and wires them to the GPU, the
//! event queue, the resource manager and the renderer.

mod runtime;

pub use runtime::{AppConfig, Runtime};
