//! Subscriber callbacks.

use serde_json::Value;
use std::fmt;
use std::sync::Arc;

type Callback = dyn Fn(&Value) + Send + Sync;

/// A callback registered against a topic.
///
/// Cloning is cheap and keeps the identity: two `Subscriber`s are equal only
/// if they were cloned from the same [`Subscriber::new`] call. Unsubscribing
/// relies on that identity.
#[derive(Clone)]
pub struct Subscriber(Arc<Callback>);

impl Subscriber {
    /// Wrap a closure as a subscriber.
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        Self(Arc::new(callback))
    }

    /// Invoke the callback.
    pub fn call(&self, data: &Value) {
        (self.0)(data);
    }

    fn addr(&self) -> *const u8 {
        Arc::as_ptr(&self.0).cast::<u8>()
    }
}

impl PartialEq for Subscriber {
    fn eq(&self, other: &Self) -> bool {
        self.addr() == other.addr()
    }
}

impl Eq for Subscriber {}

impl fmt::Debug for Subscriber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Subscriber({:p})", self.addr())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_subscriber_identity() {
        let a = Subscriber::new(|_| {});
        let b = Subscriber::new(|_| {});
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
    }

    #[test]
    fn test_subscriber_call() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        let sub = Subscriber::new(move |data| {
            assert_eq!(data, &Value::from(7));
            counter.fetch_add(1, Ordering::SeqCst);
        });

        sub.call(&Value::from(7));
        sub.clone().call(&Value::from(7));
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }
}
