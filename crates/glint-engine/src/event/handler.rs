use std::cell::RefCell;
use std::rc::Rc;

use super::Event;

/// Receives events flushed from an [`EventQueue`](super::EventQueue).
pub trait EventHandler {
    /// Returns `true` when the event is consumed; later handlers do not see it.
    fn handle_event(&mut self, event: &Event) -> bool;
}

/// Shared handler handle. Callers keep a clone to read handler state back.
pub type HandlerRef = Rc<RefCell<dyn EventHandler>>;

/// Adapts a closure into an [`EventHandler`].
pub struct FnHandler<F>(pub F);

impl<F> EventHandler for FnHandler<F>
where
    F: FnMut(&Event) -> bool,
{
    fn handle_event(&mut self, event: &Event) -> bool {
        (self.0)(event)
    }
}
