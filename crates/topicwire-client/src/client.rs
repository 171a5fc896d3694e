//! The client facade.

use crate::driver::{Driver, Status};
use crate::error::ClientError;
use crate::metrics::{self, ClientMetricsGuard};
use crate::options::ClientOptions;
use serde::Serialize;
use std::fmt;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use topicwire_core::{
    gate, NotificationSink, Outbound, ReadinessGate, Scope, Subscriber, SubscriptionManager,
    SuspensionController, TopicRouter, TopicTrace, TracingSink, VisibilityEvents,
};
use topicwire_transport::Transport;
use tracing::info;

/// A topic-multiplexed pub/sub client over one connection.
///
/// `Client` is a cheap handle; clones share the same connection and
/// registrations. The connection is driven by a background task that stops
/// when the last handle is dropped, taking the suspension timer and the
/// visibility subscription with it.
#[derive(Clone)]
pub struct Client {
    shared: Arc<Shared>,
}

struct Shared {
    subscriptions: SubscriptionManager,
    outbound: Outbound,
    status: Arc<Status>,
    driver: JoinHandle<()>,
    _metrics: ClientMetricsGuard,
}

impl Drop for Shared {
    fn drop(&mut self) {
        self.driver.abort();
    }
}

impl Client {
    /// Start building a client.
    #[must_use]
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Connect to `url` with default options.
    ///
    /// # Errors
    ///
    /// Returns an error if called outside a tokio runtime.
    pub fn connect(url: impl Into<String>) -> Result<Self, ClientError> {
        Self::builder().url(url).build()
    }

    /// Send an application message.
    ///
    /// The message is serialized now and written once the connection is
    /// open, after every message sent before it. Unencodable messages are
    /// logged and dropped.
    pub fn send<T: Serialize + ?Sized>(&self, message: &T) {
        self.shared.outbound.send(message);
    }

    /// Subscribe to a topic.
    ///
    /// The first subscription to a topic sends a `subscribe` control frame.
    pub fn subscribe(&self, topic: &str, subscriber: Subscriber) {
        self.shared.subscriptions.subscribe(topic, subscriber);
        self.record_subscription();
    }

    /// Subscribe to a topic for the lifetime of `scope`.
    ///
    /// Returns the subscriber actually registered: a wrapper that also runs
    /// the scope's post-dispatch hook. Pass that wrapper, not `subscriber`,
    /// to [`unsubscribe`](Self::unsubscribe) to end the binding early.
    pub fn subscribe_scoped<S>(
        &self,
        topic: &str,
        subscriber: Subscriber,
        scope: &Arc<S>,
    ) -> Subscriber
    where
        S: Scope + 'static,
    {
        let bound = self
            .shared
            .subscriptions
            .subscribe_scoped(topic, subscriber, scope);
        self.record_subscription();
        bound
    }

    /// Unsubscribe a subscriber by identity.
    ///
    /// Unknown topics and subscribers are ignored. The server is not told.
    pub fn unsubscribe(&self, topic: &str, subscriber: &Subscriber) {
        self.shared.subscriptions.unsubscribe(topic, subscriber);
    }

    /// Whether the connection has completed opening.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.shared.status.open.load(Ordering::SeqCst)
    }

    /// Whether the transport has reported an error.
    #[must_use]
    pub fn has_errored(&self) -> bool {
        self.shared.status.errored.load(Ordering::SeqCst)
    }

    /// Whether inbound delivery is currently suspended.
    #[must_use]
    pub fn is_suspended(&self) -> bool {
        self.shared.status.suspended.load(Ordering::SeqCst)
    }

    /// The client's topic registrations.
    #[must_use]
    pub fn router(&self) -> &Arc<TopicRouter> {
        self.shared.subscriptions.router()
    }

    fn record_subscription(&self) {
        metrics::record_subscription();
        metrics::set_active_topics(self.router().stats().topic_count);
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("open", &self.is_open())
            .field("errored", &self.has_errored())
            .field("suspended", &self.is_suspended())
            .field("topics", &self.router().stats().topic_count)
            .finish()
    }
}

/// Builder for [`Client`].
pub struct ClientBuilder {
    options: ClientOptions,
    transport: Option<Box<dyn Transport>>,
    notifier: Arc<dyn NotificationSink>,
    visibility: Option<VisibilityEvents>,
}

impl ClientBuilder {
    /// Create a builder with default options and a [`TracingSink`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            options: ClientOptions::default(),
            transport: None,
            notifier: Arc::new(TracingSink),
            visibility: None,
        }
    }

    /// Replace all options.
    #[must_use]
    pub fn options(mut self, options: ClientOptions) -> Self {
        self.options = options;
        self
    }

    /// Set the server URL.
    #[must_use]
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.options.url = Some(url.into());
        self
    }

    /// Use an already constructed transport instead of connecting to the
    /// URL.
    #[must_use]
    pub fn transport<T: Transport + 'static>(mut self, transport: T) -> Self {
        self.transport = Some(Box::new(transport));
        self
    }

    /// Set the suspension grace period.
    #[must_use]
    pub fn visibility_timeout(mut self, timeout: Duration) -> Self {
        self.options.visibility_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Set debug tracing of dispatched topics.
    #[must_use]
    pub fn trace(mut self, trace: TopicTrace) -> Self {
        self.options.trace_topics = trace;
        self
    }

    /// Set the sink for user-facing alerts.
    #[must_use]
    pub fn notifier(mut self, notifier: Arc<dyn NotificationSink>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Listen to visibility transitions. Without this the client never
    /// suspends delivery.
    #[must_use]
    pub fn visibility(mut self, events: VisibilityEvents) -> Self {
        self.visibility = Some(events);
        self
    }

    /// Build the client and start connecting.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::MissingTarget`] if neither a URL nor a
    /// transport was given, and [`ClientError::NoRuntime`] outside a tokio
    /// runtime.
    pub fn build(self) -> Result<Client, ClientError> {
        let ClientBuilder {
            options,
            transport,
            notifier,
            visibility,
        } = self;

        if transport.is_none() && options.url.is_none() {
            return Err(ClientError::MissingTarget);
        }
        let runtime = Handle::try_current().map_err(|_| ClientError::NoRuntime)?;

        let transport = match transport {
            Some(transport) => transport,
            None => connect_url(&options)?,
        };

        info!(
            transport = transport.name(),
            visibility_timeout_ms = options.visibility_timeout_ms,
            "Creating client"
        );

        let router = Arc::new(TopicRouter::with_trace(options.trace_topics.clone()));
        let (outbound, queue) = gate::channel();
        let status = Arc::new(Status::default());

        let driver = Driver {
            transport,
            outbound: queue,
            gate: ReadinessGate::new(),
            router: Arc::clone(&router),
            suspension: SuspensionController::new(options.visibility_timeout()),
            visibility,
            notifier,
            status: Arc::clone(&status),
        };
        let driver = runtime.spawn(driver.run());

        Ok(Client {
            shared: Arc::new(Shared {
                subscriptions: SubscriptionManager::new(router, outbound.clone()),
                outbound,
                status,
                driver,
                _metrics: ClientMetricsGuard::new(),
            }),
        })
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "websocket")]
fn connect_url(options: &ClientOptions) -> Result<Box<dyn Transport>, ClientError> {
    use topicwire_transport::{WebSocketConfig, WebSocketTransport};

    let url = options.url.clone().ok_or(ClientError::MissingTarget)?;
    Ok(Box::new(WebSocketTransport::connect(WebSocketConfig {
        url,
        max_message_size: options.max_message_size,
    })))
}

#[cfg(not(feature = "websocket"))]
fn connect_url(_options: &ClientOptions) -> Result<Box<dyn Transport>, ClientError> {
    Err(ClientError::MissingTarget)
}
