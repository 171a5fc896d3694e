//! In-memory transport.
//!
//! [`pair`] returns a transport for the client and a [`MemoryPeer`] that
//! plays the server: it decides when the connection opens, closes or fails,
//! pushes inbound frames, and observes everything the client writes.

use crate::traits::{Transport, TransportError, TransportEvent};
use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;
use topicwire_protocol::InboundFrame;
use tracing::trace;

/// Create a linked transport and peer.
#[must_use]
pub fn pair() -> (MemoryTransport, MemoryPeer) {
    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let (sent_tx, sent_rx) = mpsc::unbounded_channel();
    (
        MemoryTransport {
            events: events_rx,
            sent: sent_tx,
        },
        MemoryPeer {
            events: events_tx,
            sent: sent_rx,
        },
    )
}

/// Client side of an in-memory connection.
#[derive(Debug)]
pub struct MemoryTransport {
    events: mpsc::UnboundedReceiver<TransportEvent>,
    sent: mpsc::UnboundedSender<String>,
}

impl MemoryTransport {
    /// Create a linked transport and peer.
    #[must_use]
    pub fn pair() -> (MemoryTransport, MemoryPeer) {
        pair()
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn recv(&mut self) -> Option<TransportEvent> {
        self.events.recv().await
    }

    async fn send(&mut self, text: String) -> Result<(), TransportError> {
        trace!(len = text.len(), "Memory transport send");
        self.sent
            .send(text)
            .map_err(|_| TransportError::ConnectionClosed)
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

/// Server side of an in-memory connection.
#[derive(Debug)]
pub struct MemoryPeer {
    events: mpsc::UnboundedSender<TransportEvent>,
    sent: mpsc::UnboundedReceiver<String>,
}

impl MemoryPeer {
    /// Emit a raw event. Returns `false` if the transport is gone.
    pub fn emit(&self, event: TransportEvent) -> bool {
        self.events.send(event).is_ok()
    }

    /// Complete the opening handshake.
    pub fn open(&self) -> bool {
        self.emit(TransportEvent::Open)
    }

    /// Close the connection.
    pub fn close(&self) -> bool {
        self.emit(TransportEvent::Close)
    }

    /// Fail the connection.
    pub fn error(&self, reason: impl Into<String>) -> bool {
        self.emit(TransportEvent::Error(reason.into()))
    }

    /// Push a raw inbound text frame.
    pub fn deliver(&self, text: impl Into<String>) -> bool {
        self.emit(TransportEvent::Message(text.into()))
    }

    /// Push a `{"topic": .., "data": ..}` envelope.
    pub fn publish(&self, topic: &str, data: Value) -> bool {
        match serde_json::to_string(&InboundFrame::new(topic, data)) {
            Ok(text) => self.deliver(text),
            Err(_) => false,
        }
    }

    /// Wait for the next frame the client wrote.
    pub async fn recv_sent(&mut self) -> Option<String> {
        self.sent.recv().await
    }

    /// Take the next written frame if there is one.
    pub fn try_recv_sent(&mut self) -> Option<String> {
        self.sent.try_recv().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_memory_pair_events() {
        let (mut transport, peer) = pair();
        assert_eq!(transport.name(), "memory");

        peer.open();
        peer.publish("prices", json!(42));
        peer.error("boom");
        peer.close();

        assert_eq!(transport.recv().await, Some(TransportEvent::Open));
        match transport.recv().await {
            Some(TransportEvent::Message(text)) => {
                let value: Value = serde_json::from_str(&text).unwrap();
                assert_eq!(value, json!({"topic": "prices", "data": 42}));
            }
            other => panic!("Expected message, got {:?}", other),
        }
        assert_eq!(transport.recv().await, Some(TransportEvent::Error("boom".into())));
        assert_eq!(transport.recv().await, Some(TransportEvent::Close));

        drop(peer);
        assert_eq!(transport.recv().await, None);
    }

    #[tokio::test]
    async fn test_memory_pair_send() {
        let (mut transport, mut peer) = MemoryTransport::pair();

        transport.send("one".into()).await.unwrap();
        transport.send("two".into()).await.unwrap();
        assert_eq!(peer.recv_sent().await.as_deref(), Some("one"));
        assert_eq!(peer.try_recv_sent().as_deref(), Some("two"));
        assert_eq!(peer.try_recv_sent(), None);

        drop(peer);
        assert!(matches!(
            transport.send("three".into()).await,
            Err(TransportError::ConnectionClosed)
        ));
    }
}
