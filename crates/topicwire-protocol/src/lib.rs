//! # topicwire-protocol
//!
//! Wire protocol definitions for topicwire, a topic-multiplexed pub/sub
//! client that carries many logical channels over one socket.
//!
//! Every frame is a JSON text message.
//!
//! ## Frame Types
//!
//! - `ControlFrame::Subscribe` - Sent once per topic, on first subscription
//! - `InboundFrame` - `{"topic": ..., "data": ...}` pushed by the server
//! - Application messages - Any serializable value, sent verbatim
//!
//! ## Example
//!
//! ```rust
//! use topicwire_protocol::{codec, ControlFrame};
//!
//! let text = codec::encode(&ControlFrame::subscribe("prices")).unwrap();
//! assert_eq!(text, r#"{"type":"subscribe","topic":"prices"}"#);
//!
//! let frame = codec::decode(r#"{"topic":"prices","data":42}"#).unwrap();
//! assert_eq!(frame.topic.as_deref(), Some("prices"));
//! ```

pub mod codec;
pub mod frames;

pub use codec::{decode, encode, ProtocolError};
pub use frames::{ControlFrame, InboundFrame};
