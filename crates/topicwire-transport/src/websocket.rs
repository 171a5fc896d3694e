//! WebSocket transport implementation.
//!
//! This module provides a WebSocket client transport using tokio-tungstenite.
//! The socket lives on its own task; the transport handle only exchanges
//! events and frames with it over channels, which keeps `recv` cancel safe.

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::{
    connect_async,
    tungstenite::{Error as WsError, Message},
};
use tracing::{debug, error, info, warn};

use crate::traits::{Transport, TransportError, TransportEvent};

/// Default maximum inbound message size in bytes.
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 64 * 1024;

/// WebSocket transport configuration.
#[derive(Debug, Clone)]
pub struct WebSocketConfig {
    /// Server URL (`ws://` or `wss://`).
    pub url: String,
    /// Maximum inbound message size in bytes; larger frames are dropped.
    pub max_message_size: usize,
}

impl WebSocketConfig {
    /// Create a config for `url` with default limits.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
        }
    }
}

/// WebSocket client transport.
pub struct WebSocketTransport {
    url: String,
    events: mpsc::UnboundedReceiver<TransportEvent>,
    outbound: mpsc::UnboundedSender<String>,
    task: JoinHandle<()>,
}

impl WebSocketTransport {
    /// Start connecting to `config.url`.
    ///
    /// Returns immediately; the outcome arrives as the first event. Must be
    /// called from within a tokio runtime.
    #[must_use]
    pub fn connect(config: WebSocketConfig) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let url = config.url.clone();
        let task = tokio::spawn(run_socket(config, events_tx, outbound_rx));

        Self {
            url,
            events: events_rx,
            outbound: outbound_tx,
            task,
        }
    }

    /// Get the URL this transport connects to.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Drop for WebSocketTransport {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[async_trait]
impl Transport for WebSocketTransport {
    async fn recv(&mut self) -> Option<TransportEvent> {
        self.events.recv().await
    }

    async fn send(&mut self, text: String) -> Result<(), TransportError> {
        self.outbound
            .send(text)
            .map_err(|_| TransportError::ConnectionClosed)
    }

    fn name(&self) -> &'static str {
        "websocket"
    }
}

/// Drive one WebSocket connection until it closes.
async fn run_socket(
    config: WebSocketConfig,
    events: mpsc::UnboundedSender<TransportEvent>,
    mut outbound: mpsc::UnboundedReceiver<String>,
) {
    let emit = |event: TransportEvent| {
        // The handle is gone; nothing left to report to.
        let _ = events.send(event);
    };

    let stream = match connect_async(config.url.as_str()).await {
        Ok((stream, _response)) => stream,
        Err(e) => {
            error!("WebSocket connect to {} failed: {}", config.url, e);
            emit(TransportEvent::Error(e.to_string()));
            emit(TransportEvent::Close);
            return;
        }
    };

    info!("WebSocket connected to {}", config.url);
    emit(TransportEvent::Open);

    let (mut sink, mut source) = stream.split();

    loop {
        tokio::select! {
            msg = source.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        if text.len() > config.max_message_size {
                            warn!(
                                "Message too large: {} bytes (max: {})",
                                text.len(),
                                config.max_message_size
                            );
                            continue;
                        }
                        emit(TransportEvent::Message(text));
                    }
                    Some(Ok(Message::Binary(data))) => {
                        // Frames are JSON text; accept binary frames that hold UTF-8
                        if data.len() > config.max_message_size {
                            warn!(
                                "Message too large: {} bytes (max: {})",
                                data.len(),
                                config.max_message_size
                            );
                            continue;
                        }
                        match String::from_utf8(data) {
                            Ok(text) => emit(TransportEvent::Message(text)),
                            Err(_) => warn!("Dropping non UTF-8 binary frame"),
                        }
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if let Err(e) = sink.send(Message::Pong(data)).await {
                            warn!("Failed to send pong: {}", e);
                        }
                    }
                    Some(Ok(Message::Pong(_))) | Some(Ok(Message::Frame(_))) => {}
                    Some(Ok(Message::Close(_))) => {
                        debug!("Received close frame");
                        emit(TransportEvent::Close);
                        break;
                    }
                    Some(Err(WsError::ConnectionClosed)) | None => {
                        debug!("WebSocket stream ended");
                        emit(TransportEvent::Close);
                        break;
                    }
                    Some(Err(e)) => {
                        error!("WebSocket error: {}", e);
                        emit(TransportEvent::Error(e.to_string()));
                        emit(TransportEvent::Close);
                        break;
                    }
                }
            }

            text = outbound.recv() => {
                match text {
                    Some(text) => {
                        if let Err(e) = sink.send(Message::Text(text)).await {
                            error!("WebSocket send failed: {}", e);
                            emit(TransportEvent::Error(e.to_string()));
                            emit(TransportEvent::Close);
                            break;
                        }
                    }
                    None => {
                        debug!("Transport handle dropped, closing socket");
                        if let Err(e) = sink.close().await {
                            debug!("Failed to close: {}", e);
                        }
                        break;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;
    use tokio_tungstenite::accept_async;

    #[test]
    fn test_websocket_config_default() {
        let config = WebSocketConfig::new("ws://127.0.0.1:8080/ws");
        assert_eq!(config.url, "ws://127.0.0.1:8080/ws");
        assert_eq!(config.max_message_size, 64 * 1024);
    }

    #[tokio::test]
    async fn test_websocket_roundtrip() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = accept_async(stream).await.unwrap();

            let received = ws.next().await.unwrap().unwrap();
            ws.send(Message::Text(r#"{"topic":"t","data":1}"#.to_string()))
                .await
                .unwrap();
            ws.close(None).await.unwrap();
            received
        });

        let mut transport = WebSocketTransport::connect(WebSocketConfig::new(format!(
            "ws://{}",
            addr
        )));
        assert_eq!(transport.name(), "websocket");
        assert_eq!(transport.recv().await, Some(TransportEvent::Open));

        transport.send("hello".to_string()).await.unwrap();
        assert_eq!(
            transport.recv().await,
            Some(TransportEvent::Message(r#"{"topic":"t","data":1}"#.to_string()))
        );
        assert_eq!(transport.recv().await, Some(TransportEvent::Close));

        let received = server.await.unwrap();
        assert_eq!(received, Message::Text("hello".to_string()));
    }

    #[tokio::test]
    async fn test_websocket_connect_failure() {
        // Bind then drop to get a port nothing listens on
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let mut transport = WebSocketTransport::connect(WebSocketConfig::new(format!(
            "ws://{}",
            addr
        )));
        assert!(matches!(transport.recv().await, Some(TransportEvent::Error(_))));
        assert_eq!(transport.recv().await, Some(TransportEvent::Close));
        assert_eq!(transport.recv().await, None);
    }
}
