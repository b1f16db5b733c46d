use glam::Mat4;

use crate::event::{Event, EventHandler};
use crate::math::{ortho_projection, Color};

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum RenderState {
    /// Derived GPU state must be reissued before the next draw.
    Dirty,
    Clean,
}

/// Renderer settings whose derived GPU state is rebuilt lazily.
///
/// Every setter marks the state dirty; [`sync`](Self::sync) recomputes the
/// projection once and marks it clean. Registered with the event queue to
/// follow window resizes.
#[derive(Debug, Clone)]
pub struct SyncState {
    viewport: (u32, u32),
    clear_color: Color,
    alpha: bool,
    projection: Mat4,
    state: RenderState,
}

impl SyncState {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            viewport: (width, height),
            clear_color: Color::BLACK,
            alpha: false,
            projection: Mat4::IDENTITY,
            state: RenderState::Dirty,
        }
    }

    pub fn state(&self) -> RenderState {
        self.state
    }

    pub fn viewport(&self) -> (u32, u32) {
        self.viewport
    }

    pub fn clear_color(&self) -> Color {
        self.clear_color
    }

    pub fn alpha(&self) -> bool {
        self.alpha
    }

    /// Projection computed by the last `sync`.
    pub fn projection(&self) -> Mat4 {
        self.projection
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.viewport = (width, height);
        self.invalidate();
    }

    pub fn set_clear_color(&mut self, color: Color) {
        self.clear_color = color;
        self.invalidate();
    }

    pub fn set_alpha(&mut self, enabled: bool) {
        self.alpha = enabled;
        self.invalidate();
    }

    pub fn invalidate(&mut self) {
        self.state = RenderState::Dirty;
    }

    /// Rebuilds derived state if dirty. Returns whether anything was rebuilt.
    pub fn sync(&mut self) -> bool {
        if self.state == RenderState::Clean {
            return false;
        }
        let (width, height) = self.viewport;
        self.projection = ortho_projection(width, height);
        self.state = RenderState::Clean;
        true
    }
}

impl EventHandler for SyncState {
    fn handle_event(&mut self, event: &Event) -> bool {
        if let Event::Resize { width, height } = *event {
            self.resize(width, height);
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::event::EventQueue;

    #[test]
    fn starts_dirty_and_cleans_once() {
        let mut s = SyncState::new(800, 600);
        assert_eq!(s.state(), RenderState::Dirty);
        assert!(s.sync());
        assert_eq!(s.state(), RenderState::Clean);
        assert!(!s.sync());
        assert_eq!(s.projection(), ortho_projection(800, 600));
    }

    #[test]
    fn setters_mark_dirty() {
        let mut s = SyncState::new(10, 10);
        s.sync();
        s.set_clear_color(Color::RED);
        assert_eq!(s.state(), RenderState::Dirty);
        s.sync();
        s.set_alpha(true);
        assert_eq!(s.state(), RenderState::Dirty);
        assert!(s.alpha());
        assert_eq!(s.clear_color(), Color::RED);
    }

    #[test]
    fn resize_event_through_queue_marks_dirty() {
        let state = Rc::new(RefCell::new(SyncState::new(800, 600)));
        let mut queue = EventQueue::new();
        queue.register_handler(state.clone());

        state.borrow_mut().sync();
        queue.push(Event::Resize { width: 1024, height: 512 });
        queue.flush();

        let mut s = state.borrow_mut();
        assert_eq!(s.state(), RenderState::Dirty);
        assert_eq!(s.viewport(), (1024, 512));
        assert!(s.sync());
        assert_eq!(s.projection(), ortho_projection(1024, 512));
    }

    #[test]
    fn other_events_leave_state_clean() {
        let mut s = SyncState::new(800, 600);
        s.sync();
        assert!(!s.handle_event(&Event::Fps { count: 60 }));
        assert_eq!(s.state(), RenderState::Clean);
    }
}
