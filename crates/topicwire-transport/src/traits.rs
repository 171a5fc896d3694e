//! Transport abstraction traits for topicwire.
//!
//! These traits define the interface every transport provides, so the
//! client never depends on a concrete socket implementation.

use async_trait::async_trait;
use thiserror::Error;

/// Transport errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connection was closed.
    #[error("Connection closed")]
    ConnectionClosed,
}

/// A lifecycle notification or inbound frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// The opening handshake completed.
    Open,
    /// The connection closed.
    Close,
    /// The transport failed. A `Close` normally follows.
    Error(String),
    /// An inbound text frame.
    Message(String),
}

/// A connected-on-construction bidirectional text socket.
///
/// The first event is `Open` or `Error`. After `Close` the transport yields
/// `None`.
#[async_trait]
pub trait Transport: Send {
    /// Receive the next event.
    ///
    /// Must be cancel safe: the client polls it inside `tokio::select!`.
    async fn recv(&mut self) -> Option<TransportEvent>;

    /// Send a text frame.
    async fn send(&mut self, text: String) -> Result<(), TransportError>;

    /// Get the transport name (e.g., "websocket", "memory").
    fn name(&self) -> &'static str;
}
