//! Input types and mouse helpers.
//!
//! Public types do not expose winit; `platform::winit` turns window events
//! into engine [`Event`](crate::event::Event)s.

mod drag;
pub mod platform;
mod types;

pub use drag::MouseDragMonitor;
pub use types::{ButtonAction, Modifiers, MouseButton};
