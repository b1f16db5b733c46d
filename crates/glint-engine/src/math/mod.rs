//! Math types shared by the renderer, camera and input.
//!
//! World space is the renderer's orthographic volume: Y up, the visible
//! height spans `[-1, 1]` and the width spans `[-aspect, aspect]`.

mod color;
mod transform;

pub use color::Color;
pub use glam::{Mat4, Vec2, Vec3};
pub use transform::{model_transform, ortho_projection};
