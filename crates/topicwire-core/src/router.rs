//! Topic router for topicwire.
//!
//! The router owns the topic registrations of one client and fans inbound
//! envelopes out to the subscribers of their topic.

use crate::subscriber::Subscriber;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use regex::Regex;
use serde::Deserialize;
use std::panic::{self, AssertUnwindSafe};
use topicwire_protocol::{codec, InboundFrame};
use tracing::{debug, trace, warn};

/// Per-dispatch debug tracing.
///
/// Deserializes from `true`/`false` or from a regular expression matched
/// against topic names.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(try_from = "RawTrace")]
pub enum TopicTrace {
    /// No tracing.
    #[default]
    Off,
    /// Trace every dispatched topic.
    All,
    /// Trace topics the pattern matches anywhere in the name.
    Pattern(Regex),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTrace {
    Flag(bool),
    Pattern(String),
}

impl TryFrom<RawTrace> for TopicTrace {
    type Error = regex::Error;

    fn try_from(raw: RawTrace) -> Result<Self, Self::Error> {
        match raw {
            RawTrace::Flag(true) => Ok(TopicTrace::All),
            RawTrace::Flag(false) => Ok(TopicTrace::Off),
            RawTrace::Pattern(pattern) => Ok(TopicTrace::Pattern(Regex::new(&pattern)?)),
        }
    }
}

impl TopicTrace {
    /// Parse a setting as written in an environment variable.
    ///
    /// `""`, `"0"` and `"false"` disable tracing, `"1"` and `"true"` trace
    /// everything, anything else is compiled as a pattern.
    ///
    /// # Errors
    ///
    /// Returns an error if the pattern is not a valid regular expression.
    pub fn parse(setting: &str) -> Result<Self, regex::Error> {
        match setting.trim() {
            "" | "0" | "false" => Ok(TopicTrace::Off),
            "1" | "true" => Ok(TopicTrace::All),
            pattern => Ok(TopicTrace::Pattern(Regex::new(pattern)?)),
        }
    }

    /// Whether a dispatch to `topic` should be traced.
    #[must_use]
    pub fn matches(&self, topic: &str) -> bool {
        match self {
            TopicTrace::Off => false,
            TopicTrace::All => true,
            TopicTrace::Pattern(re) => re.is_match(topic),
        }
    }
}

/// Outcome of routing one inbound frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// The topic is registered; this many callbacks ran.
    Delivered(usize),
    /// No registration for the frame's topic, or the frame had none.
    UnknownTopic,
    /// The frame was not a JSON envelope.
    Malformed,
}

impl Dispatch {
    /// Number of callbacks invoked.
    #[must_use]
    pub fn delivered(&self) -> usize {
        match self {
            Dispatch::Delivered(n) => *n,
            _ => 0,
        }
    }
}

/// The topic registration table.
///
/// Registrations are created on first subscribe and kept even when their
/// subscriber list becomes empty, so a later subscribe does not send a
/// second control frame.
#[derive(Debug, Default)]
pub struct TopicRouter {
    /// Subscribers indexed by topic, in registration order.
    topics: DashMap<String, Vec<Subscriber>>,
    /// Debug tracing of dispatches.
    trace: TopicTrace,
}

impl TopicRouter {
    /// Create a router without dispatch tracing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a router with the given dispatch tracing.
    #[must_use]
    pub fn with_trace(trace: TopicTrace) -> Self {
        Self {
            topics: DashMap::new(),
            trace,
        }
    }

    /// Append a subscriber to a topic.
    ///
    /// A subscriber already registered on the topic is not added again.
    /// Returns `true` if this call created the topic's registration.
    pub fn register(&self, topic: &str, subscriber: Subscriber) -> bool {
        match self.topics.entry(topic.to_string()) {
            Entry::Occupied(mut entry) => {
                let subscribers = entry.get_mut();
                if subscribers.contains(&subscriber) {
                    trace!(topic = %topic, "Subscriber already registered");
                } else {
                    subscribers.push(subscriber);
                }
                false
            }
            Entry::Vacant(entry) => {
                debug!(topic = %topic, "Creating topic registration");
                entry.insert(vec![subscriber]);
                true
            }
        }
    }

    /// Remove a subscriber from a topic by identity.
    ///
    /// Returns `true` if the subscriber was registered. Unknown topics and
    /// subscribers are ignored.
    pub fn remove(&self, topic: &str, subscriber: &Subscriber) -> bool {
        let Some(mut subscribers) = self.topics.get_mut(topic) else {
            return false;
        };
        let before = subscribers.len();
        subscribers.retain(|s| s != subscriber);
        if subscribers.len() == before {
            return false;
        }
        debug!(topic = %topic, remaining = subscribers.len(), "Removed subscriber");
        true
    }

    /// Route a raw text frame.
    pub fn dispatch(&self, raw: &str) -> Dispatch {
        match codec::decode(raw) {
            Ok(frame) => self.deliver(frame),
            Err(e) => {
                trace!(error = %e, "Dropping malformed frame");
                Dispatch::Malformed
            }
        }
    }

    /// Fan a decoded envelope out to its topic's subscribers.
    ///
    /// The subscriber list is snapshotted before any callback runs, so
    /// callbacks may subscribe or unsubscribe without affecting this
    /// dispatch. A panicking callback does not stop the others.
    pub fn deliver(&self, frame: InboundFrame) -> Dispatch {
        let Some(topic) = frame.topic.as_deref() else {
            trace!("Dropping frame without topic");
            return Dispatch::UnknownTopic;
        };

        let Some(subscribers) = self.topics.get(topic).map(|s| s.value().clone()) else {
            trace!(topic = %topic, "Dropping frame for unknown topic");
            return Dispatch::UnknownTopic;
        };

        if self.trace.matches(topic) {
            debug!(topic = %topic, data = %frame.data, "Dispatch");
        }

        for subscriber in &subscribers {
            let result = panic::catch_unwind(AssertUnwindSafe(|| subscriber.call(&frame.data)));
            if result.is_err() {
                warn!(topic = %topic, ?subscriber, "Subscriber panicked during dispatch");
            }
        }

        Dispatch::Delivered(subscribers.len())
    }

    /// Check if a topic has a registration.
    #[must_use]
    pub fn has_topic(&self, topic: &str) -> bool {
        self.topics.contains_key(topic)
    }

    /// Get the subscriber count for a topic.
    #[must_use]
    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.topics.get(topic).map(|s| s.len()).unwrap_or(0)
    }

    /// Get all registered topic names.
    #[must_use]
    pub fn topics(&self) -> Vec<String> {
        self.topics.iter().map(|e| e.key().clone()).collect()
    }

    /// Get router statistics.
    #[must_use]
    pub fn stats(&self) -> RouterStats {
        RouterStats {
            topic_count: self.topics.len(),
            total_subscribers: self.topics.iter().map(|s| s.len()).sum(),
        }
    }
}

/// Router statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouterStats {
    /// Number of topic registrations, including empty ones.
    pub topic_count: usize,
    /// Total number of registered subscribers.
    pub total_subscribers: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use std::sync::{Arc, Mutex};

    fn recorder() -> (Subscriber, Arc<Mutex<Vec<Value>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let sub = Subscriber::new(move |data| sink.lock().unwrap().push(data.clone()));
        (sub, seen)
    }

    #[test]
    fn test_router_register_remove() {
        let router = TopicRouter::new();
        let (a, _) = recorder();
        let (b, _) = recorder();

        assert!(router.register("prices", a.clone()));
        assert!(!router.register("prices", b.clone()));
        assert_eq!(router.subscriber_count("prices"), 2);

        assert!(router.remove("prices", &a));
        assert!(!router.remove("prices", &a));
        assert!(!router.remove("missing", &b));
        assert!(router.remove("prices", &b));

        // Registration outlives its last subscriber
        assert!(router.has_topic("prices"));
        assert_eq!(router.subscriber_count("prices"), 0);
    }

    #[test]
    fn test_router_register_is_idempotent() {
        let router = TopicRouter::new();
        let (a, seen) = recorder();

        assert!(router.register("prices", a.clone()));
        assert!(!router.register("prices", a.clone()));
        assert_eq!(router.subscriber_count("prices"), 1);

        assert_eq!(
            router.dispatch(r#"{"topic":"prices","data":1}"#),
            Dispatch::Delivered(1)
        );
        assert!(router.remove("prices", &a));
        assert_eq!(
            router.dispatch(r#"{"topic":"prices","data":2}"#),
            Dispatch::Delivered(0)
        );
        assert_eq!(*seen.lock().unwrap(), vec![json!(1)]);
    }

    #[test]
    fn test_router_dispatch() {
        let router = TopicRouter::new();
        let (a, seen_a) = recorder();
        let (b, seen_b) = recorder();
        router.register("prices", a);
        router.register("prices", b);

        let outcome = router.dispatch(r#"{"topic":"prices","data":42}"#);
        assert_eq!(outcome, Dispatch::Delivered(2));
        assert_eq!(*seen_a.lock().unwrap(), vec![json!(42)]);
        assert_eq!(*seen_b.lock().unwrap(), vec![json!(42)]);
    }

    #[test]
    fn test_router_drops_unrouted() {
        let router = TopicRouter::new();
        let (a, seen) = recorder();
        router.register("prices", a);

        assert_eq!(router.dispatch(r#"{"topic":"news","data":1}"#), Dispatch::UnknownTopic);
        assert_eq!(router.dispatch(r#"{"data":1}"#), Dispatch::UnknownTopic);
        assert_eq!(router.dispatch("garbage"), Dispatch::Malformed);
        assert_eq!(router.dispatch("[1]"), Dispatch::Malformed);
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn test_router_isolates_panics() {
        let router = TopicRouter::new();
        let (after, seen) = recorder();
        router.register("t", Subscriber::new(|_| panic!("subscriber failure")));
        router.register("t", after);

        let outcome = router.dispatch(r#"{"topic":"t","data":"x"}"#);
        assert_eq!(outcome, Dispatch::Delivered(2));
        assert_eq!(*seen.lock().unwrap(), vec![json!("x")]);
    }

    #[test]
    fn test_router_snapshot_during_dispatch() {
        let router = Arc::new(TopicRouter::new());
        let (late, seen) = recorder();

        let inner = Arc::clone(&router);
        router.register(
            "t",
            Subscriber::new(move |_| {
                inner.register("t", late.clone());
            }),
        );

        assert_eq!(router.dispatch(r#"{"topic":"t"}"#), Dispatch::Delivered(1));
        assert!(seen.lock().unwrap().is_empty());
        assert_eq!(router.subscriber_count("t"), 2);
    }

    #[test]
    fn test_router_stats() {
        let router = TopicRouter::new();
        let (a, _) = recorder();
        router.register("one", a.clone());
        router.register("two", a.clone());
        router.register("two", Subscriber::new(|_| {}));
        router.remove("one", &a);

        let stats = router.stats();
        assert_eq!(stats.topic_count, 2);
        assert_eq!(stats.total_subscribers, 2);

        let mut topics = router.topics();
        topics.sort();
        assert_eq!(topics, vec!["one".to_string(), "two".to_string()]);
    }

    #[test]
    fn test_topic_trace_matching() {
        assert!(!TopicTrace::Off.matches("a"));
        assert!(TopicTrace::All.matches("a"));

        let trace = TopicTrace::parse("price").unwrap();
        assert!(trace.matches("eur.prices"));
        assert!(!trace.matches("news"));

        assert!(matches!(TopicTrace::parse("false").unwrap(), TopicTrace::Off));
        assert!(matches!(TopicTrace::parse("true").unwrap(), TopicTrace::All));
        assert!(TopicTrace::parse("(").is_err());
    }

    #[test]
    fn test_topic_trace_deserialize() {
        let trace: TopicTrace = serde_json::from_value(json!(true)).unwrap();
        assert!(matches!(trace, TopicTrace::All));

        let trace: TopicTrace = serde_json::from_value(json!("^orders\\.")).unwrap();
        assert!(trace.matches("orders.new"));
        assert!(!trace.matches("my.orders.new"));

        assert!(serde_json::from_value::<TopicTrace>(json!("[")).is_err());
    }
}
