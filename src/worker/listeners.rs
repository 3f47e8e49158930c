//! # Listener registry for worker implementations.
//!
//! [`ListenerSet`] keeps the registered [`MessageListener`]s and delivers each
//! message to all of them, in registration order, on the caller's context.
//!
//! ## Rules
//! - Registration is by identity: adding the same `Arc` twice is ignored,
//!   removal compares pointers.
//! - `notify()` snapshots the list first, so listeners may (un)register from
//!   inside `on_message` without deadlocking.

use std::sync::{Arc, PoisonError, RwLock};

use super::handle::MessageListener;
use crate::events::Message;

/// Thread-safe set of message listeners.
#[derive(Default)]
pub struct ListenerSet {
    inner: RwLock<Vec<Arc<dyn MessageListener>>>,
}

impl ListenerSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a listener (ignored if already present).
    pub fn add(&self, listener: Arc<dyn MessageListener>) {
        let mut list = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        if !list.iter().any(|l| Arc::ptr_eq(l, &listener)) {
            list.push(listener);
        }
    }

    /// Unregisters a listener.
    pub fn remove(&self, listener: &Arc<dyn MessageListener>) {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|l| !Arc::ptr_eq(l, listener));
    }

    /// Number of registered listeners.
    pub fn len(&self) -> usize {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Delivers `msg` to every registered listener.
    pub fn notify(&self, msg: &Message) {
        let snapshot: Vec<Arc<dyn MessageListener>> = self
            .inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for listener in snapshot {
            listener.on_message(msg);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Collect(Mutex<Vec<Message>>);

    impl MessageListener for Collect {
        fn on_message(&self, msg: &Message) {
            self.0.lock().unwrap().push(msg.clone());
        }
    }

    #[test]
    fn notifies_each_listener_once() {
        let set = ListenerSet::new();
        let a = Arc::new(Collect::default());
        let b = Arc::new(Collect::default());
        let a_dyn: Arc<dyn MessageListener> = a.clone();
        set.add(a_dyn.clone());
        set.add(a_dyn);
        set.add(b.clone());
        assert_eq!(set.len(), 2);

        set.notify(&Message::info("one"));
        set.notify(&Message::info("two"));

        assert_eq!(a.0.lock().unwrap().len(), 2);
        assert_eq!(b.0.lock().unwrap()[1], Message::info("two"));
    }

    #[test]
    fn removed_listener_is_not_called() {
        let set = ListenerSet::new();
        let a = Arc::new(Collect::default());
        let a_dyn: Arc<dyn MessageListener> = a.clone();
        set.add(a_dyn.clone());
        set.remove(&a_dyn);
        assert!(set.is_empty());

        set.notify(&Message::info("ignored"));
        assert!(a.0.lock().unwrap().is_empty());
    }
}
