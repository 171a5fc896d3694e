//! # topicwire-client
//!
//! A publish/subscribe client that multiplexes named topics over one
//! WebSocket connection.
//!
//! - Outbound messages wait until the connection is open, then go out in
//!   call order.
//! - The first subscriber of a topic makes the client send
//!   `{"type":"subscribe","topic":...}`.
//! - Inbound `{"topic":...,"data":...}` frames fan out to the topic's
//!   subscribers.
//! - When the application is hidden for longer than the visibility timeout,
//!   inbound delivery is suspended until it becomes visible again.
//!
//! ## Example
//!
//! ```rust,no_run
//! use topicwire_client::{Client, Subscriber};
//!
//! # async fn example() -> Result<(), topicwire_client::ClientError> {
//! let client = Client::connect("ws://127.0.0.1:8080/ws")?;
//!
//! client.subscribe("prices", Subscriber::new(|data| println!("price: {data}")));
//! client.send(&serde_json::json!({"action": "snapshot", "topic": "prices"}));
//! # Ok(())
//! # }
//! ```

mod client;
mod driver;
pub mod error;
pub mod metrics;
pub mod options;

pub use client::{Client, ClientBuilder};
pub use error::ClientError;
pub use options::ClientOptions;

pub use topicwire_core::{
    visibility, DisplayOptions, Lifetime, Notification, NotificationSink, Scope, Severity,
    Subscriber, TopicRouter, TopicTrace, TracingSink, Visibility, VisibilityEvents,
    VisibilityNotifier,
};
pub use topicwire_transport::{MemoryPeer, MemoryTransport, Transport, TransportEvent};
