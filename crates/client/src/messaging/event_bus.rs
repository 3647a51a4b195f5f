//! Event bus for session notices.
//!
//! Push-based: subscribers register callbacks that are invoked synchronously
//! when a notice is dispatched. All dispatching happens on the single router
//! task, so a plain mutex is enough; no callback ever re-enters the bus.

use std::sync::{Arc, Mutex};

use super::notices::SessionNotice;

type Subscriber = Box<dyn FnMut(SessionNotice) + Send + 'static>;

/// Bus carrying [`SessionNotice`] values to registered subscribers.
///
/// The bus holds strong references to subscribers, so they persist until
/// [`EventBus::clear`] or the bus itself is dropped.
#[derive(Clone, Default)]
pub struct EventBus {
    subscribers: Arc<Mutex<Vec<Subscriber>>>,
}

impl EventBus {
    /// Create a new EventBus with no subscribers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to all notices.
    ///
    /// The callback is invoked for every notice dispatched after
    /// registration.
    pub fn subscribe(&self, callback: impl FnMut(SessionNotice) + Send + 'static) {
        if let Ok(mut subscribers) = self.subscribers.lock() {
            subscribers.push(Box::new(callback));
        }
    }

    /// Dispatch a notice to all subscribers.
    pub fn dispatch(&self, notice: SessionNotice) {
        if let Ok(mut subscribers) = self.subscribers.lock() {
            for subscriber in subscribers.iter_mut() {
                subscriber(notice.clone());
            }
        }
    }

    /// Get the number of subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().map(|s| s.len()).unwrap_or(0)
    }

    /// Clear all subscribers (part of view teardown).
    pub fn clear(&self) {
        if let Ok(mut subscribers) = self.subscribers.lock() {
            subscribers.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    #[test]
    fn test_subscribe_and_dispatch() {
        let bus = EventBus::new();
        let count = Arc::new(AtomicU32::new(0));

        let count_clone = Arc::clone(&count);
        bus.subscribe(move |_notice| {
            count_clone.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(bus.subscriber_count(), 1);

        bus.dispatch(SessionNotice::LeaveRoom);
        bus.dispatch(SessionNotice::RoomExpired);

        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_multiple_subscribers_all_receive() {
        let bus = EventBus::new();
        let count1 = Arc::new(AtomicU32::new(0));
        let count2 = Arc::new(AtomicU32::new(0));

        let c1 = Arc::clone(&count1);
        bus.subscribe(move |_| {
            c1.fetch_add(1, Ordering::SeqCst);
        });
        let c2 = Arc::clone(&count2);
        bus.subscribe(move |_| {
            c2.fetch_add(1, Ordering::SeqCst);
        });

        bus.dispatch(SessionNotice::LeaveRoom);

        assert_eq!(count1.load(Ordering::SeqCst), 1);
        assert_eq!(count2.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_clear_removes_subscribers() {
        let bus = EventBus::new();
        let count = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&count);
        bus.subscribe(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });

        bus.clear();
        bus.dispatch(SessionNotice::LeaveRoom);

        assert_eq!(bus.subscriber_count(), 0);
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }
}
