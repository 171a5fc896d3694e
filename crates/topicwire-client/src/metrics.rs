//! Metrics instrumentation for topicwire clients.
//!
//! Uses the `metrics` crate; nothing is recorded until the application
//! installs a recorder (the `topicwire-tail` binary can install the
//! Prometheus exporter).

use metrics::{counter, gauge};

/// Metric names.
pub mod names {
    pub const CLIENTS_ACTIVE: &str = "topicwire_clients_active";
    pub const MESSAGES_TOTAL: &str = "topicwire_messages_total";
    pub const MESSAGES_BYTES: &str = "topicwire_messages_bytes";
    pub const DROPPED_TOTAL: &str = "topicwire_dropped_total";
    pub const SUBSCRIPTIONS_TOTAL: &str = "topicwire_subscriptions_total";
    pub const TOPICS_ACTIVE: &str = "topicwire_topics_active";
    pub const SUSPENDED: &str = "topicwire_suspended";
    pub const ERRORS_TOTAL: &str = "topicwire_errors_total";
}

/// Describe every metric to the installed recorder.
pub fn describe_metrics() {
    metrics::describe_gauge!(names::CLIENTS_ACTIVE, "Current number of live clients");
    metrics::describe_counter!(names::MESSAGES_TOTAL, "Total number of frames sent or delivered");
    metrics::describe_counter!(names::MESSAGES_BYTES, "Total bytes of frames sent or delivered");
    metrics::describe_counter!(
        names::DROPPED_TOTAL,
        "Inbound frames dropped, by reason (suspended, unknown_topic, malformed)"
    );
    metrics::describe_counter!(
        names::SUBSCRIPTIONS_TOTAL,
        "Total number of subscribe calls"
    );
    metrics::describe_gauge!(names::TOPICS_ACTIVE, "Current number of topic registrations");
    metrics::describe_gauge!(names::SUSPENDED, "1 while inbound delivery is suspended");
    metrics::describe_counter!(names::ERRORS_TOTAL, "Total number of errors, by type");
}

/// Record a frame.
pub fn record_message(bytes: usize, direction: &str) {
    counter!(names::MESSAGES_TOTAL, "direction" => direction.to_string()).increment(1);
    counter!(names::MESSAGES_BYTES, "direction" => direction.to_string()).increment(bytes as u64);
}

/// Record a dropped inbound frame.
pub fn record_dropped(reason: &'static str) {
    counter!(names::DROPPED_TOTAL, "reason" => reason).increment(1);
}

/// Record a subscription.
pub fn record_subscription() {
    counter!(names::SUBSCRIPTIONS_TOTAL).increment(1);
}

/// Update the topic registration count.
pub fn set_active_topics(count: usize) {
    gauge!(names::TOPICS_ACTIVE).set(count as f64);
}

/// Update the suspension flag.
pub fn set_suspended(suspended: bool) {
    gauge!(names::SUSPENDED).set(if suspended { 1.0 } else { 0.0 });
}

/// Record an error.
pub fn record_error(error_type: &'static str) {
    counter!(names::ERRORS_TOTAL, "type" => error_type).increment(1);
}

/// Metrics guard that tracks a live client until dropped.
#[derive(Debug)]
pub struct ClientMetricsGuard;

impl ClientMetricsGuard {
    /// Create a new metrics guard, recording a live client.
    #[must_use]
    pub fn new() -> Self {
        gauge!(names::CLIENTS_ACTIVE).increment(1.0);
        Self
    }
}

impl Default for ClientMetricsGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ClientMetricsGuard {
    fn drop(&mut self) {
        gauge!(names::CLIENTS_ACTIVE).decrement(1.0);
    }
}
