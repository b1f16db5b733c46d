use crate::event::EventQueue;
use crate::render::Renderer2d;
use crate::resource::ResourceManager;

/// Engine services lent to [`App`](super::App) callbacks.
pub struct AppCtx<'a> {
    pub resources: &'a mut ResourceManager,
    pub renderer: &'a mut Renderer2d,
    pub events: &'a mut EventQueue,
    /// Drawable size in physical pixels.
    pub window_size: (u32, u32),
    pub scale_factor: f64,
}

impl AppCtx<'_> {
    /// Width over height, or 1 for a degenerate window.
    pub fn aspect(&self) -> f32 {
        let (w, h) = self.window_size;
        if w == 0 || h == 0 {
            1.0
        } else {
            w as f32 / h as f32
        }
    }
}
