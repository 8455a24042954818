use std::sync::Arc;

use parking_lot::RwLock;

/// Swappable optional handler shared between a control thread and audio threads.
///
/// `load` clones the `Arc` out and releases the lock before returning, so a
/// handler never runs with the slot locked and `store` never waits on a
/// running callback. A handler swapped out mid-call finishes on the old
/// `Arc` it already holds.
pub struct HandlerSlot<T: ?Sized> {
    handler: RwLock<Option<Arc<T>>>,
}

impl<T: ?Sized> HandlerSlot<T> {
    pub fn empty() -> Self {
        Self {
            handler: RwLock::new(None),
        }
    }

    pub fn new(handler: Arc<T>) -> Self {
        Self {
            handler: RwLock::new(Some(handler)),
        }
    }

    /// Replace the handler, returning the previous one.
    pub fn store(&self, handler: Option<Arc<T>>) -> Option<Arc<T>> {
        std::mem::replace(&mut *self.handler.write(), handler)
    }

    pub fn take(&self) -> Option<Arc<T>> {
        self.handler.write().take()
    }

    pub fn load(&self) -> Option<Arc<T>> {
        self.handler.read().clone()
    }

    pub fn is_set(&self) -> bool {
        self.handler.read().is_some()
    }
}

impl<T: ?Sized> Default for HandlerSlot<T> {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Greeter: Send + Sync {
        fn greet(&self) -> &'static str;
    }

    struct Hello;
    impl Greeter for Hello {
        fn greet(&self) -> &'static str {
            "hello"
        }
    }

    struct Bye;
    impl Greeter for Bye {
        fn greet(&self) -> &'static str {
            "bye"
        }
    }

    #[test]
    fn empty_slot_loads_nothing() {
        let slot: HandlerSlot<dyn Greeter> = HandlerSlot::empty();
        assert!(slot.load().is_none());
        assert!(!slot.is_set());
    }

    #[test]
    fn store_swaps_and_returns_previous() {
        let slot: HandlerSlot<dyn Greeter> = HandlerSlot::new(Arc::new(Hello));
        let previous = slot.store(Some(Arc::new(Bye)));

        assert_eq!(previous.map(|h| h.greet()), Some("hello"));
        assert_eq!(slot.load().map(|h| h.greet()), Some("bye"));
    }

    #[test]
    fn loaded_handler_outlives_swap() {
        let slot: HandlerSlot<dyn Greeter> = HandlerSlot::new(Arc::new(Hello));
        let in_flight = slot.load().unwrap();

        slot.take();

        assert!(slot.load().is_none());
        assert_eq!(in_flight.greet(), "hello");
    }

    #[test]
    fn store_while_loaded_does_not_block() {
        let slot: Arc<HandlerSlot<dyn Greeter>> = Arc::new(HandlerSlot::new(Arc::new(Hello)));
        let held = slot.load().unwrap();

        let writer = {
            let slot = Arc::clone(&slot);
            std::thread::spawn(move || {
                slot.store(Some(Arc::new(Bye)));
            })
        };
        writer.join().unwrap();

        assert_eq!(held.greet(), "hello");
        assert_eq!(slot.load().unwrap().greet(), "bye");
    }
}
