//! Outbound readiness gating.
//!
//! Sends are accepted at any time but must not reach the transport before
//! it has finished opening. [`Outbound`] is the producer side handed to
//! application code; the client's driver task owns the [`OutboundQueue`] and
//! routes every item through a [`ReadinessGate`].

use serde::Serialize;
use std::collections::VecDeque;
use tokio::sync::mpsc;
use topicwire_protocol::codec;
use tracing::warn;

/// One-shot gate that holds items until it is opened.
///
/// Before [`open`](Self::open) every submitted item is queued. Opening hands
/// back the queue in submission order; from then on items pass straight
/// through.
#[derive(Debug)]
pub struct ReadinessGate<T> {
    /// `None` once the gate is open.
    pending: Option<VecDeque<T>>,
}

impl<T> Default for ReadinessGate<T> {
    fn default() -> Self {
        Self {
            pending: Some(VecDeque::new()),
        }
    }
}

impl<T> ReadinessGate<T> {
    /// Create a closed gate.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Submit an item.
    ///
    /// Returns the item back if the gate is already open, otherwise queues it
    /// and returns `None`.
    pub fn submit(&mut self, item: T) -> Option<T> {
        match &mut self.pending {
            Some(queue) => {
                queue.push_back(item);
                None
            }
            None => Some(item),
        }
    }

    /// Open the gate.
    ///
    /// Returns the queued items in submission order. Only the first call
    /// returns anything.
    pub fn open(&mut self) -> Vec<T> {
        self.pending
            .take()
            .map(Vec::from)
            .unwrap_or_default()
    }

    /// Check if the gate has been opened.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.pending.is_none()
    }

    /// Number of items waiting for the gate to open.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.pending.as_ref().map_or(0, VecDeque::len)
    }
}

/// Create a linked outbound handle and queue.
#[must_use]
pub fn channel() -> (Outbound, OutboundQueue) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Outbound { tx }, OutboundQueue { rx })
}

/// Producer side of the outbound path.
///
/// Serializes values to JSON text at call time and enqueues them in call
/// order.
#[derive(Debug, Clone)]
pub struct Outbound {
    tx: mpsc::UnboundedSender<String>,
}

impl Outbound {
    /// Serialize and enqueue a message.
    ///
    /// Returns `false` if the message could not be encoded or the queue's
    /// consumer is gone. Both cases are logged.
    pub fn send<T: Serialize + ?Sized>(&self, message: &T) -> bool {
        match codec::encode(message) {
            Ok(text) => self.send_text(text),
            Err(e) => {
                warn!(error = %e, "Dropping unencodable outbound message");
                false
            }
        }
    }

    /// Enqueue an already encoded text frame.
    pub fn send_text(&self, text: String) -> bool {
        if self.tx.send(text).is_err() {
            warn!("Outbound queue closed, dropping message");
            return false;
        }
        true
    }

    /// Check if the consumer side has been dropped.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Consumer side of the outbound path.
#[derive(Debug)]
pub struct OutboundQueue {
    rx: mpsc::UnboundedReceiver<String>,
}

impl OutboundQueue {
    /// Receive the next encoded frame.
    ///
    /// Returns `None` once every [`Outbound`] handle has been dropped.
    pub async fn recv(&mut self) -> Option<String> {
        self.rx.recv().await
    }

    /// Receive a frame if one is immediately available.
    pub fn try_recv(&mut self) -> Option<String> {
        self.rx.try_recv().ok()
    }
}
