//! Frame types for the topicwire protocol.
//!
//! The protocol is asymmetric. Clients send control frames and free-form
//! application messages; servers push topic envelopes.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A control frame sent from client to server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ControlFrame {
    /// Ask the server to start pushing a topic.
    ///
    /// Sent once per topic, when the first subscriber registers.
    #[serde(rename = "subscribe")]
    Subscribe {
        /// Topic name.
        topic: String,
    },
}

impl ControlFrame {
    /// Create a new Subscribe frame.
    #[must_use]
    pub fn subscribe(topic: impl Into<String>) -> Self {
        ControlFrame::Subscribe {
            topic: topic.into(),
        }
    }

    /// Get the topic this frame refers to.
    #[must_use]
    pub fn topic(&self) -> &str {
        match self {
            ControlFrame::Subscribe { topic } => topic,
        }
    }
}

/// A topic envelope pushed by the server.
///
/// Both fields are lenient: an object without `topic` decodes with
/// `topic == None` and is routed nowhere.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct InboundFrame {
    /// Topic the payload belongs to.
    #[serde(default)]
    pub topic: Option<String>,
    /// Payload handed to subscribers.
    #[serde(default)]
    pub data: Value,
}

impl InboundFrame {
    /// Create a new envelope.
    #[must_use]
    pub fn new(topic: impl Into<String>, data: Value) -> Self {
        Self {
            topic: Some(topic.into()),
            data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_subscribe_frame_shape() {
        let frame = ControlFrame::subscribe("prices");
        assert_eq!(frame.topic(), "prices");
        assert_eq!(
            serde_json::to_value(&frame).unwrap(),
            json!({"type": "subscribe", "topic": "prices"})
        );
    }

    #[test]
    fn test_inbound_frame_missing_fields() {
        let frame: InboundFrame = serde_json::from_str(r#"{"data": [1, 2]}"#).unwrap();
        assert!(frame.topic.is_none());
        assert_eq!(frame.data, json!([1, 2]));

        let frame: InboundFrame = serde_json::from_str(r#"{"topic": "t"}"#).unwrap();
        assert_eq!(frame.topic.as_deref(), Some("t"));
        assert_eq!(frame.data, Value::Null);
    }
}
