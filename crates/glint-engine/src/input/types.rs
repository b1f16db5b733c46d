/// Mouse button, independent of the windowing backend.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    Back,
    Forward,
    /// Backend-specific button code.
    Other(u16),
}

/// Transition reported by a [`MouseButton`] event.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ButtonAction {
    Press,
    Release,
}

/// Modifier keys held when a button event fired.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    /// Windows / Command / Super key.
    pub logo: bool,
}
