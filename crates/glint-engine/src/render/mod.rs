//! 2D rendering.
//!
//! [`Renderer2d`] draws unit primitives (quads, circles and their outlines)
//! scaled, rotated and translated into an orthographic world whose visible
//! height spans `[-1, 1]`.

mod pipeline;
mod renderer;
mod state;
mod target;
mod uniforms;

pub use renderer::{
    Renderer2d, DEFAULT_CIRCLE_BORDER_MESH, DEFAULT_CIRCLE_MESH, DEFAULT_QUAD_BORDER_MESH,
    DEFAULT_QUAD_MESH, DEFAULT_SHADER, DEFAULT_TEXTURE_SHADER,
};
pub use state::{RenderState, SyncState};
pub use target::RenderTarget;

use crate::resource::ResourceManager;

/// Draw callback run once per frame inside [`Renderer2d::render`].
pub trait Scene2d {
    fn render(&mut self, dt: f32, renderer: &mut Renderer2d, resources: &ResourceManager);
}
