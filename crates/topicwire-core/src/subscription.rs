//! Subscription bookkeeping.
//!
//! The manager sits between application code and the [`TopicRouter`]: it
//! announces new topics to the server and binds subscribers to scopes.

use crate::gate::Outbound;
use crate::router::TopicRouter;
use crate::scope::Scope;
use crate::subscriber::Subscriber;
use std::sync::Arc;
use topicwire_protocol::ControlFrame;
use tracing::debug;

/// Creates and removes subscriber bindings.
#[derive(Debug, Clone)]
pub struct SubscriptionManager {
    router: Arc<TopicRouter>,
    outbound: Outbound,
}

impl SubscriptionManager {
    /// Create a manager that registers into `router` and announces topics
    /// through `outbound`.
    #[must_use]
    pub fn new(router: Arc<TopicRouter>, outbound: Outbound) -> Self {
        Self { router, outbound }
    }

    /// The router this manager registers into.
    #[must_use]
    pub fn router(&self) -> &Arc<TopicRouter> {
        &self.router
    }

    /// Subscribe to a topic.
    ///
    /// The first subscription to a topic sends a `subscribe` control frame.
    pub fn subscribe(&self, topic: &str, subscriber: Subscriber) {
        if self.router.register(topic, subscriber) {
            debug!(topic = %topic, "Announcing new topic");
            self.outbound.send(&ControlFrame::subscribe(topic));
        }
        debug!(topic = %topic, subscribers = self.router.subscriber_count(topic), "Subscribed");
    }

    /// Subscribe to a topic for the lifetime of `scope`.
    ///
    /// The registered callback is a wrapper that runs `subscriber` and then
    /// [`Scope::after_dispatch`]. When the scope terminates the wrapper is
    /// unsubscribed. The wrapper is returned so it can also be unsubscribed
    /// by hand; the original `subscriber` is never registered.
    ///
    /// The binding holds the scope weakly, so dropping the last handle to a
    /// [`Lifetime`](crate::scope::Lifetime) ends its subscriptions.
    pub fn subscribe_scoped<S>(
        &self,
        topic: &str,
        subscriber: Subscriber,
        scope: &Arc<S>,
    ) -> Subscriber
    where
        S: Scope + 'static,
    {
        let weak_scope = Arc::downgrade(scope);
        let bound = Subscriber::new(move |data| {
            subscriber.call(data);
            if let Some(scope) = weak_scope.upgrade() {
                scope.after_dispatch();
            }
        });

        self.subscribe(topic, bound.clone());

        let router = Arc::downgrade(&self.router);
        let topic = topic.to_string();
        let registered = bound.clone();
        scope.on_terminate(Box::new(move || {
            if let Some(router) = router.upgrade() {
                debug!(topic = %topic, "Scope terminated, unsubscribing");
                router.remove(&topic, &registered);
            }
        }));

        bound
    }

    /// Unsubscribe a subscriber by identity.
    ///
    /// Unknown topics and subscribers are ignored. No control frame is sent
    /// and the topic's registration is kept.
    pub fn unsubscribe(&self, topic: &str, subscriber: &Subscriber) {
        if self.router.remove(topic, subscriber) {
            debug!(topic = %topic, "Unsubscribed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::{self, OutboundQueue};
    use crate::scope::Lifetime;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn manager() -> (SubscriptionManager, OutboundQueue) {
        let (outbound, queue) = gate::channel();
        (SubscriptionManager::new(Arc::new(TopicRouter::new()), outbound), queue)
    }

    fn counter() -> (Subscriber, Arc<AtomicUsize>) {
        let hits = Arc::new(AtomicUsize::new(0));
        let inner = Arc::clone(&hits);
        let sub = Subscriber::new(move |_| {
            inner.fetch_add(1, Ordering::SeqCst);
        });
        (sub, hits)
    }

    #[test]
    fn test_first_subscribe_announces_topic() {
        let (manager, mut queue) = manager();
        let (a, _) = counter();
        let (b, _) = counter();

        manager.subscribe("prices", a);
        manager.subscribe("prices", b);

        assert_eq!(
            queue.try_recv().as_deref(),
            Some(r#"{"type":"subscribe","topic":"prices"}"#)
        );
        assert_eq!(queue.try_recv(), None);
        assert_eq!(manager.router().subscriber_count("prices"), 2);
    }

    #[test]
    fn test_resubscribe_after_empty_is_silent() {
        let (manager, mut queue) = manager();
        let (a, _) = counter();

        manager.subscribe("t", a.clone());
        manager.unsubscribe("t", &a);
        manager.subscribe("t", a);

        assert!(queue.try_recv().is_some());
        assert_eq!(queue.try_recv(), None);
    }

    #[test]
    fn test_unsubscribe_unknown_is_noop() {
        let (manager, mut queue) = manager();
        let (a, _) = counter();

        manager.unsubscribe("missing", &a);
        assert!(!manager.router().has_topic("missing"));
        assert_eq!(queue.try_recv(), None);
    }

    #[test]
    fn test_scoped_binding_refreshes_and_terminates() {
        let (manager, _queue) = manager();
        let (sub, hits) = counter();
        let refreshes = Arc::new(AtomicUsize::new(0));
        let refresh_counter = Arc::clone(&refreshes);
        let scope = Arc::new(Lifetime::with_refresh(move || {
            refresh_counter.fetch_add(1, Ordering::SeqCst);
        }));

        let bound = manager.subscribe_scoped("t", sub.clone(), &scope);
        assert_ne!(bound, sub);

        manager.router().dispatch(&json!({"topic": "t", "data": 1}).to_string());
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(refreshes.load(Ordering::SeqCst), 1);

        // The bare callback was never registered
        manager.unsubscribe("t", &sub);
        assert_eq!(manager.router().subscriber_count("t"), 1);

        scope.terminate();
        assert_eq!(manager.router().subscriber_count("t"), 0);

        manager.router().dispatch(&json!({"topic": "t", "data": 2}).to_string());
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_dropping_scope_unsubscribes() {
        let (manager, _queue) = manager();
        let (sub, _) = counter();
        let scope = Arc::new(Lifetime::new());

        manager.subscribe_scoped("t", sub, &scope);
        assert_eq!(manager.router().subscriber_count("t"), 1);

        drop(scope);
        assert_eq!(manager.router().subscriber_count("t"), 0);
    }

    #[test]
    fn test_manual_unsubscribe_of_bound_subscriber() {
        let (manager, _queue) = manager();
        let (sub, _) = counter();
        let scope = Arc::new(Lifetime::new());

        let bound = manager.subscribe_scoped("t", sub, &scope);
        manager.unsubscribe("t", &bound);
        assert_eq!(manager.router().subscriber_count("t"), 0);

        // Terminating afterwards finds nothing left to remove
        scope.terminate();
        assert_eq!(manager.router().subscriber_count("t"), 0);
    }
}
