//! Client errors.

use thiserror::Error;

/// Errors raised while building a [`Client`](crate::Client).
///
/// Once built, a client never returns errors from its operations; failures
/// are logged and surfaced through the notification sink.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Neither a URL nor a transport was supplied.
    #[error("WebSocket URL is not defined")]
    MissingTarget,

    /// The client was built outside a tokio runtime.
    #[error("No tokio runtime available to drive the client")]
    NoRuntime,
}
