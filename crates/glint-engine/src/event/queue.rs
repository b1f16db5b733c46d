use std::cell::RefCell;
use std::rc::Rc;

use super::{Event, EventHandler, FnHandler, HandlerRef};

/// Buffered event dispatcher.
///
/// `flush` delivers the newest event first. Each event walks the handlers in
/// registration order and stops at the first one that consumes it.
#[derive(Default)]
pub struct EventQueue {
    events: Vec<Event>,
    handlers: Vec<HandlerRef>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            events: Vec::with_capacity(capacity),
            handlers: Vec::new(),
        }
    }

    pub fn push(&mut self, event: Event) {
        self.events.push(event);
    }

    /// Delivers and drops every buffered event.
    pub fn flush(&mut self) {
        if self.events.is_empty() {
            return;
        }
        log::trace!(
            "flushing {} events to {} handlers",
            self.events.len(),
            self.handlers.len()
        );

        for event in self.events.drain(..).rev() {
            for handler in &self.handlers {
                if handler.borrow_mut().handle_event(&event) {
                    break;
                }
            }
        }
    }

    pub fn register_handler(&mut self, handler: HandlerRef) {
        self.handlers.push(handler);
    }

    /// Registers a closure and returns its shared handle.
    pub fn register_fn<F>(&mut self, f: F) -> HandlerRef
    where
        F: FnMut(&Event) -> bool + 'static,
    {
        let handler: HandlerRef = Rc::new(RefCell::new(FnHandler(f)));
        self.handlers.push(handler.clone());
        handler
    }

    /// Handler removal is not supported; handlers live as long as the queue.
    pub fn unregister_handler(&mut self, _handler: &HandlerRef) -> ! {
        log::error!("EventQueue::unregister_handler called");
        panic!("EventQueue::unregister_handler: not supported");
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }
}

impl std::fmt::Debug for EventQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventQueue")
            .field("events", &self.events)
            .field("handlers", &self.handlers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Records every event it sees, consuming those matching `consume`.
    struct Recorder {
        seen: Vec<Event>,
        consume: fn(&Event) -> bool,
    }

    impl EventHandler for Recorder {
        fn handle_event(&mut self, event: &Event) -> bool {
            self.seen.push(event.clone());
            (self.consume)(event)
        }
    }

    fn recorder(consume: fn(&Event) -> bool) -> Rc<RefCell<Recorder>> {
        Rc::new(RefCell::new(Recorder {
            seen: Vec::new(),
            consume,
        }))
    }

    fn fps(count: u32) -> Event {
        Event::Fps { count }
    }

    #[test]
    fn flush_delivers_newest_first_and_empties() {
        let mut queue = EventQueue::with_capacity(4);
        let rec = recorder(|_| false);
        queue.register_handler(rec.clone());

        queue.push(fps(1));
        queue.push(fps(2));
        queue.push(fps(3));
        assert_eq!(queue.len(), 3);

        queue.flush();
        assert!(queue.is_empty());
        assert_eq!(rec.borrow().seen, vec![fps(3), fps(2), fps(1)]);

        queue.flush();
        assert_eq!(rec.borrow().seen.len(), 3);
    }

    #[test]
    fn consuming_handler_stops_later_handlers() {
        let mut queue = EventQueue::new();
        let first = recorder(|_| false);
        let consumer = recorder(|e| matches!(e, Event::Fps { count: 2 }));
        let last = recorder(|_| false);
        queue.register_handler(first.clone());
        queue.register_handler(consumer.clone());
        queue.register_handler(last.clone());

        queue.push(fps(1));
        queue.push(fps(2));
        queue.flush();

        assert_eq!(first.borrow().seen, vec![fps(2), fps(1)]);
        assert_eq!(consumer.borrow().seen, vec![fps(2), fps(1)]);
        assert_eq!(last.borrow().seen, vec![fps(1)]);
    }

    #[test]
    fn register_fn_wraps_closures() {
        let mut queue = EventQueue::new();
        let hits = Rc::new(RefCell::new(0));
        let counter = hits.clone();
        queue.register_fn(move |e| {
            if let Event::MouseScroll { dy, .. } = e {
                *counter.borrow_mut() += *dy as i32;
            }
            true
        });
        assert_eq!(queue.handler_count(), 1);

        queue.push(Event::MouseScroll { dx: 0.0, dy: 2.0 });
        queue.push(Event::MouseScroll { dx: 0.0, dy: 3.0 });
        queue.flush();
        assert_eq!(*hits.borrow(), 5);
    }

    #[test]
    #[should_panic(expected = "not supported")]
    fn unregister_is_not_supported() {
        let mut queue = EventQueue::new();
        let handler = queue.register_fn(|_| false);
        queue.unregister_handler(&handler);
    }
}
