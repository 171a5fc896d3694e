//! Codec for topicwire frames.
//!
//! Frames travel as JSON text. Outbound values are serialized verbatim, so
//! callers can send any `Serialize` type next to the control frames.

use serde::Serialize;
use thiserror::Error;

use crate::frames::InboundFrame;

/// Protocol errors that can occur during encoding/decoding.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Value could not be serialized to JSON.
    #[error("Encoding error: {0}")]
    Encode(#[source] serde_json::Error),

    /// Text is not a JSON object shaped like an inbound envelope.
    #[error("Decoding error: {0}")]
    Decode(#[source] serde_json::Error),
}

/// Encode any serializable value as a JSON text frame.
///
/// # Errors
///
/// Returns an error if serialization fails (for example a map with
/// non-string keys).
pub fn encode<T: Serialize + ?Sized>(value: &T) -> Result<String, ProtocolError> {
    serde_json::to_string(value).map_err(ProtocolError::Encode)
}

/// Decode an inbound text frame.
///
/// # Errors
///
/// Returns an error if the text is not valid JSON or not an object whose
/// `topic` is a string.
pub fn decode(text: &str) -> Result<InboundFrame, ProtocolError> {
    serde_json::from_str(text).map_err(ProtocolError::Decode)
}
