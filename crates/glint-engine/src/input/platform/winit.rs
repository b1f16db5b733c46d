use winit::dpi::PhysicalPosition;
use winit::event::{ElementState, MouseButton as WinitMouseButton, MouseScrollDelta, WindowEvent};
use winit::keyboard::ModifiersState;
use winit::window::Window;

use crate::event::Event;
use crate::input::{ButtonAction, Modifiers, MouseButton};
use crate::math::Vec2;

/// Logical pixels per scroll line for touchpads reporting pixel deltas.
const PIXELS_PER_LINE: f32 = 20.0;

/// Turns winit window events into engine events.
///
/// winit reports modifiers separately from button presses, so the translator
/// keeps the last modifier state and stamps it onto button events.
#[derive(Debug, Default)]
pub struct EventTranslator {
    modifiers: Modifiers,
}

impl EventTranslator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `None` for window events with no engine counterpart.
    pub fn translate(&mut self, window: &Window, event: &WindowEvent) -> Option<Event> {
        match event {
            WindowEvent::ModifiersChanged(m) => {
                self.modifiers = map_modifiers(m.state());
                None
            }

            WindowEvent::Resized(size) => Some(Event::Resize {
                width: size.width,
                height: size.height,
            }),

            WindowEvent::CursorMoved { position, .. } => {
                let pos = to_logical(window, *position);
                let size = window.inner_size().to_logical::<f32>(window.scale_factor());
                let normalized = if size.width > 0.0 && size.height > 0.0 {
                    Vec2::new(pos.x / size.width, pos.y / size.height)
                } else {
                    Vec2::ZERO
                };
                Some(Event::MouseMove { pos, normalized })
            }

            WindowEvent::MouseInput { state, button, .. } => Some(Event::MouseButton {
                button: map_mouse_button(*button),
                action: match state {
                    ElementState::Pressed => ButtonAction::Press,
                    ElementState::Released => ButtonAction::Release,
                },
                modifiers: self.modifiers,
            }),

            WindowEvent::MouseWheel { delta, .. } => {
                let (dx, dy) = match delta {
                    MouseScrollDelta::LineDelta(x, y) => (*x, *y),
                    MouseScrollDelta::PixelDelta(p) => {
                        let p = to_logical(window, *p);
                        (p.x / PIXELS_PER_LINE, p.y / PIXELS_PER_LINE)
                    }
                };
                Some(Event::MouseScroll { dx, dy })
            }

            _ => None,
        }
    }
}

fn to_logical(window: &Window, pos: PhysicalPosition<f64>) -> Vec2 {
    let logical = pos.to_logical::<f64>(window.scale_factor());
    Vec2::new(logical.x as f32, logical.y as f32)
}

fn map_modifiers(m: ModifiersState) -> Modifiers {
    Modifiers {
        shift: m.shift_key(),
        ctrl: m.control_key(),
        alt: m.alt_key(),
        logo: m.super_key(),
    }
}

fn map_mouse_button(b: WinitMouseButton) -> MouseButton {
    match b {
        WinitMouseButton::Left => MouseButton::Left,
        WinitMouseButton::Right => MouseButton::Right,
        WinitMouseButton::Middle => MouseButton::Middle,
        WinitMouseButton::Back => MouseButton::Back,
        WinitMouseButton::Forward => MouseButton::Forward,
        WinitMouseButton::Other(v) => MouseButton::Other(v),
    }
}
