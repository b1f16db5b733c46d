//! Event queue.
//!
//! Platform events are translated into [`Event`]s by the runtime, buffered in
//! an [`EventQueue`] and delivered to registered handlers once per frame.

mod handler;
mod queue;

pub use handler::{EventHandler, FnHandler, HandlerRef};
pub use queue::EventQueue;

use crate::input::{ButtonAction, Modifiers, MouseButton};
use crate::math::Vec2;

/// Engine event.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// Framebuffer size in physical pixels.
    Resize { width: u32, height: u32 },

    /// Cursor position in logical pixels (origin top-left) and the same
    /// position divided by the logical window size.
    MouseMove { pos: Vec2, normalized: Vec2 },

    MouseButton {
        button: MouseButton,
        action: ButtonAction,
        modifiers: Modifiers,
    },

    MouseScroll { dx: f32, dy: f32 },

    /// Frames presented during the last second.
    Fps { count: u32 },
}
