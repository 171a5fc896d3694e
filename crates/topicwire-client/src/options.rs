//! Client options.
//!
//! Defaults can be overridden from the environment:
//! - `TOPICWIRE_URL` - server URL
//! - `TOPICWIRE_VISIBILITY_TIMEOUT_MS` - suspension grace period
//! - `TOPICWIRE_TRACE` - `true`, or a regular expression of topics to trace

use serde::Deserialize;
use std::time::Duration;
use topicwire_core::{TopicTrace, DEFAULT_VISIBILITY_TIMEOUT_MS};
use tracing::warn;

/// Client options.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientOptions {
    /// Server URL. Required unless a transport is injected.
    #[serde(default = "default_url")]
    pub url: Option<String>,

    /// How long the application may stay hidden before delivery is
    /// suspended, in milliseconds.
    #[serde(default = "default_visibility_timeout")]
    pub visibility_timeout_ms: u64,

    /// Debug tracing of dispatched topics.
    #[serde(default = "default_trace")]
    pub trace_topics: TopicTrace,

    /// Maximum inbound message size in bytes.
    #[serde(default = "default_max_message_size")]
    pub max_message_size: usize,
}

// Default value functions
fn default_url() -> Option<String> {
    std::env::var("TOPICWIRE_URL").ok().filter(|url| !url.is_empty())
}

fn default_visibility_timeout() -> u64 {
    std::env::var("TOPICWIRE_VISIBILITY_TIMEOUT_MS")
        .ok()
        .and_then(|ms| ms.parse().ok())
        .unwrap_or(DEFAULT_VISIBILITY_TIMEOUT_MS)
}

fn default_trace() -> TopicTrace {
    std::env::var("TOPICWIRE_TRACE")
        .map(|setting| parse_trace(&setting))
        .unwrap_or_default()
}

fn parse_trace(setting: &str) -> TopicTrace {
    TopicTrace::parse(setting).unwrap_or_else(|e| {
        warn!("Ignoring invalid TOPICWIRE_TRACE pattern {:?}: {}", setting, e);
        TopicTrace::Off
    })
}

fn default_max_message_size() -> usize {
    64 * 1024 // 64 KB
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            url: default_url(),
            visibility_timeout_ms: default_visibility_timeout(),
            trace_topics: default_trace(),
            max_message_size: default_max_message_size(),
        }
    }
}

impl ClientOptions {
    /// Options for `url` with every other setting at its default.
    #[must_use]
    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Self::default()
        }
    }

    /// The visibility timeout as a duration.
    #[must_use]
    pub fn visibility_timeout(&self) -> Duration {
        Duration::from_millis(self.visibility_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_with_url() {
        let options = ClientOptions::with_url("ws://localhost:9000/ws");
        assert_eq!(options.url.as_deref(), Some("ws://localhost:9000/ws"));
        assert_eq!(options.max_message_size, 64 * 1024);
    }

    #[test]
    fn test_parse_trace_setting() {
        assert!(matches!(parse_trace("true"), TopicTrace::All));
        assert!(parse_trace("^prices").matches("prices.eur"));
        assert!(matches!(parse_trace("(unclosed"), TopicTrace::Off));
    }

    #[test]
    fn test_options_deserialize() {
        let options: ClientOptions = serde_json::from_value(serde_json::json!({
            "url": "ws://example.test/ws",
            "visibility_timeout_ms": 100,
            "trace_topics": "^prices",
        }))
        .unwrap();

        assert_eq!(options.visibility_timeout(), Duration::from_millis(100));
        assert!(options.trace_topics.matches("prices.eur"));
        assert!(!options.trace_topics.matches("news"));
    }
}
