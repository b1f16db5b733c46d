use crate::event::{Event, EventHandler};
use crate::input::{ButtonAction, MouseButton};
use crate::math::Vec2;

/// Turns a mouse drag into one-shot deltas.
///
/// Register it with the event queue behind an `Rc<RefCell<..>>` and poll
/// [`delta`](Self::delta) once per frame. Positions are logical pixels with Y
/// growing downwards; the returned Y is flipped so that dragging up is
/// positive, then everything is scaled by `multiplier`.
///
/// [`EventQueue::flush`](crate::event::EventQueue::flush) delivers newest
/// first, so when several moves arrive in one frame the monitor ends the
/// flush on the oldest of them. The remaining motion shows up in the next
/// frame's delta: reads lag by at most one frame and their sum always equals
/// the total movement.
#[derive(Debug, Clone)]
pub struct MouseDragMonitor {
    button: MouseButton,
    multiplier: f32,
    active: bool,
    last_pos: Vec2,
    anchor: Vec2,
    delta: Vec2,
    applied: bool,
}

impl MouseDragMonitor {
    pub fn new(button: MouseButton, multiplier: f32) -> Self {
        Self {
            button,
            multiplier,
            active: false,
            last_pos: Vec2::ZERO,
            anchor: Vec2::ZERO,
            delta: Vec2::ZERO,
            applied: true,
        }
    }

    /// Changes the scale applied to future deltas, e.g. after a resize.
    pub fn set_multiplier(&mut self, multiplier: f32) {
        self.multiplier = multiplier;
    }

    pub fn button(&self) -> MouseButton {
        self.button
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Movement since the previous read, or `(0, 0)` when nothing moved.
    pub fn delta(&mut self) -> (f32, f32) {
        let d = self.delta_v();
        (d.x, d.y)
    }

    pub fn delta_v(&mut self) -> Vec2 {
        if !self.applied {
            self.delta = Vec2::new(
                (self.last_pos.x - self.anchor.x) * self.multiplier,
                (self.anchor.y - self.last_pos.y) * self.multiplier,
            );
            self.anchor = self.last_pos;
            self.applied = true;
        }
        std::mem::take(&mut self.delta)
    }
}

impl EventHandler for MouseDragMonitor {
    fn handle_event(&mut self, event: &Event) -> bool {
        match event {
            Event::MouseButton { button, action, .. } if *button == self.button => match action {
                ButtonAction::Press => {
                    self.active = true;
                    self.anchor = self.last_pos;
                    self.delta = Vec2::ZERO;
                    self.applied = true;
                }
                ButtonAction::Release => self.active = false,
            },
            Event::MouseMove { pos, .. } => {
                self.last_pos = *pos;
                if self.active {
                    self.applied = false;
                }
            }
            _ => {}
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
    use crate::input::Modifiers;

    fn move_to(x: f32, y: f32) -> Event {
        Event::MouseMove {
            pos: Vec2::new(x, y),
            normalized: Vec2::ZERO,
        }
    }

    fn button(action: ButtonAction) -> Event {
        Event::MouseButton {
            button: MouseButton::Left,
            action,
            modifiers: Modifiers::default(),
        }
    }

    #[test]
    fn drag_yields_one_shot_delta() {
        let mut drag = MouseDragMonitor::new(MouseButton::Left, 0.5);

        assert!(!drag.handle_event(&move_to(10.0, 10.0)));
        assert!(!drag.handle_event(&button(ButtonAction::Press)));
        assert!(drag.is_active());
        assert!(!drag.handle_event(&move_to(20.0, 15.0)));

        assert_eq!(drag.delta(), (5.0, -2.5));
        assert_eq!(drag.delta(), (0.0, 0.0));
    }

    #[test]
    fn moves_without_press_do_not_accumulate() {
        let mut drag = MouseDragMonitor::new(MouseButton::Left, 1.0);
        drag.handle_event(&move_to(10.0, 10.0));
        drag.handle_event(&move_to(50.0, 50.0));
        assert_eq!(drag.delta(), (0.0, 0.0));

        drag.handle_event(&button(ButtonAction::Press));
        drag.handle_event(&move_to(60.0, 40.0));
        drag.handle_event(&button(ButtonAction::Release));
        assert!(!drag.is_active());
        assert_eq!(drag.delta(), (10.0, 10.0));
    }

    #[test]
    fn other_buttons_are_ignored() {
        let mut drag = MouseDragMonitor::new(MouseButton::Right, 1.0);
        drag.handle_event(&button(ButtonAction::Press));
        assert!(!drag.is_active());
    }

    #[test]
    fn anchor_follows_reads() {
        let mut drag = MouseDragMonitor::new(MouseButton::Left, 1.0);
        drag.handle_event(&move_to(0.0, 0.0));
        drag.handle_event(&button(ButtonAction::Press));
        drag.handle_event(&move_to(5.0, 0.0));
        assert_eq!(drag.delta(), (5.0, 0.0));
        drag.handle_event(&move_to(8.0, 2.0));
        assert_eq!(drag.delta(), (3.0, -2.0));
    }

    #[test]
    fn moves_batched_in_one_flush_lag_by_one_frame() {
        let drag = Rc::new(RefCell::new(MouseDragMonitor::new(MouseButton::Left, 1.0)));
        let mut queue = EventQueue::new();
        queue.register_handler(drag.clone());

        queue.push(move_to(10.0, 10.0));
        queue.flush();
        queue.push(button(ButtonAction::Press));
        queue.flush();

        queue.push(move_to(20.0, 15.0));
        queue.push(move_to(30.0, 25.0));
        queue.flush();
        assert_eq!(drag.borrow_mut().delta(), (10.0, -5.0));

        queue.push(move_to(40.0, 30.0));
        queue.flush();
        assert_eq!(drag.borrow_mut().delta(), (20.0, -15.0));
    }

    #[test]
    fn multiplier_can_change_between_reads() {
        let mut drag = MouseDragMonitor::new(MouseButton::Left, 1.0);
        drag.handle_event(&button(ButtonAction::Press));
        drag.handle_event(&move_to(4.0, 0.0));
        drag.set_multiplier(0.5);
        assert_eq!(drag.delta(), (2.0, 0.0));
    }
}
