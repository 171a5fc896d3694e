//! # topicwire-transport
//!
//! Transport abstraction layer for the topicwire client.
//!
//! A transport is one bidirectional text socket. It connects as soon as it
//! is constructed and reports its lifecycle as [`TransportEvent`]s:
//!
//! - **WebSocket** - The real thing, over tokio-tungstenite
//! - **Memory** - An in-process pair for tests and embedding
//!
//! ## Transport Abstraction
//!
//! ```rust,ignore
//! use topicwire_transport::{Transport, TransportEvent};
//!
//! async fn pump(mut transport: Box<dyn Transport>) {
//!     while let Some(event) = transport.recv().await {
//!         if let TransportEvent::Open = event {
//!             transport.send(r#"{"type":"subscribe","topic":"prices"}"#.into()).await.ok();
//!         }
//!     }
//! }
//! ```

pub mod memory;
pub mod traits;

#[cfg(feature = "websocket")]
pub mod websocket;

pub use memory::{MemoryPeer, MemoryTransport};
pub use traits::{Transport, TransportError, TransportEvent};

#[cfg(feature = "websocket")]
pub use websocket::{WebSocketConfig, WebSocketTransport};
