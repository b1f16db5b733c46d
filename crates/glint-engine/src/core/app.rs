use anyhow::Result;

use crate::render::Scene2d;

use super::ctx::AppCtx;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AppControl {
    Continue,
    Exit,
}

/// Application driven by the runtime.
///
/// Per frame the runtime flushes queued events, calls `update`, then renders
/// through [`Scene2d::render`].
pub trait App: Scene2d {
    /// Called once after the window, GPU and default resources exist.
    /// Register event handlers and preload resources here.
    fn init(&mut self, ctx: &mut AppCtx<'_>) -> Result<()>;

    fn update(&mut self, dt: f32, ctx: &mut AppCtx<'_>) -> AppControl;

    /// Called before resources are unloaded at shutdown.
    fn on_exit(&mut self) {}
}
