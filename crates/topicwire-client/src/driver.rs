//! The client's event loop.
//!
//! Every transport event, outbound frame, visibility transition and timer
//! expiry is handled here, one at a time, on a single task.

use crate::metrics;
use std::future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::time::{self, Instant};
use topicwire_core::{
    Dispatch, Notification, NotificationSink, OutboundQueue, ReadinessGate, SuspensionController,
    TopicRouter, Visibility, VisibilityEvents, VisibleOutcome,
};
use topicwire_transport::{Transport, TransportEvent};
use tracing::{debug, error, info, trace, warn};

/// Connection flags shared with client handles.
#[derive(Debug, Default)]
pub(crate) struct Status {
    pub(crate) open: AtomicBool,
    pub(crate) errored: AtomicBool,
    pub(crate) suspended: AtomicBool,
}

pub(crate) struct Driver {
    pub(crate) transport: Box<dyn Transport>,
    pub(crate) outbound: OutboundQueue,
    pub(crate) gate: ReadinessGate<String>,
    pub(crate) router: Arc<TopicRouter>,
    pub(crate) suspension: SuspensionController,
    pub(crate) visibility: Option<VisibilityEvents>,
    pub(crate) notifier: Arc<dyn NotificationSink>,
    pub(crate) status: Arc<Status>,
}

impl Driver {
    pub(crate) async fn run(mut self) {
        let mut transport_done = false;

        loop {
            let deadline = self.suspension.deadline();

            tokio::select! {
                event = self.transport.recv(), if !transport_done => {
                    match event {
                        Some(event) => self.on_transport(event).await,
                        None => {
                            debug!(transport = self.transport.name(), "Transport finished");
                            transport_done = true;
                        }
                    }
                }

                text = self.outbound.recv() => {
                    match text {
                        Some(text) => self.on_outbound(text).await,
                        // Every client handle is gone
                        None => break,
                    }
                }

                visibility = next_visibility(&mut self.visibility) => {
                    match visibility {
                        Some(visibility) => self.on_visibility(visibility),
                        None => {
                            debug!("Visibility source detached");
                            self.visibility = None;
                        }
                    }
                }

                _ = time::sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    self.on_deadline();
                }
            }
        }

        debug!("Client driver stopped");
    }

    async fn on_transport(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::Open => {
                if self.status.open.swap(true, Ordering::SeqCst) {
                    warn!("Ignoring duplicate open notification");
                    return;
                }
                let queued = self.gate.open();
                info!(
                    transport = self.transport.name(),
                    queued = queued.len(),
                    "Connection open"
                );
                for text in queued {
                    self.transmit(text).await;
                }
                self.notifier.notify(Notification::connected());
            }
            TransportEvent::Close => {
                info!("Connection closed");
                if !self.status.errored.load(Ordering::SeqCst) {
                    self.notifier.notify(Notification::closed());
                }
            }
            TransportEvent::Error(reason) => {
                error!(reason = %reason, "Transport error");
                metrics::record_error("transport");
                self.status.errored.store(true, Ordering::SeqCst);
                self.notifier.notify(Notification::transport_error());
            }
            TransportEvent::Message(text) => self.on_message(&text),
        }
    }

    fn on_message(&self, text: &str) {
        if self.suspension.is_suspended() {
            trace!("Delivery suspended, dropping frame");
            metrics::record_dropped("suspended");
            return;
        }

        match self.router.dispatch(text) {
            Dispatch::Delivered(_) => metrics::record_message(text.len(), "inbound"),
            Dispatch::UnknownTopic => metrics::record_dropped("unknown_topic"),
            Dispatch::Malformed => metrics::record_dropped("malformed"),
        }
    }

    async fn on_outbound(&mut self, text: String) {
        match self.gate.submit(text) {
            Some(text) => self.transmit(text).await,
            None => trace!(pending = self.gate.pending_len(), "Queued until open"),
        }
    }

    async fn transmit(&mut self, text: String) {
        debug!("send {}", text);
        metrics::record_message(text.len(), "outbound");
        if let Err(e) = self.transport.send(text).await {
            warn!(error = %e, "Failed to send frame");
            metrics::record_error("send");
        }
    }

    fn on_visibility(&mut self, visibility: Visibility) {
        match visibility {
            Visibility::Hidden => self.suspension.on_hidden(Instant::now()),
            Visibility::Visible => {
                let errored = self.status.errored.load(Ordering::SeqCst);
                match self.suspension.on_visible(errored) {
                    VisibleOutcome::Resumed { warn } => {
                        self.status.suspended.store(false, Ordering::SeqCst);
                        metrics::set_suspended(false);
                        if warn {
                            self.notifier
                                .notify(Notification::suspended(self.suspension.delay()));
                        }
                    }
                    VisibleOutcome::Cancelled => debug!("Suspension cancelled"),
                    VisibleOutcome::Unchanged => {}
                }
            }
        }
    }

    fn on_deadline(&mut self) {
        if self.suspension.on_deadline(Instant::now()) {
            self.status.suspended.store(true, Ordering::SeqCst);
            metrics::set_suspended(true);
        }
    }
}

async fn next_visibility(events: &mut Option<VisibilityEvents>) -> Option<Visibility> {
    match events {
        Some(events) => events.recv().await,
        None => future::pending().await,
    }
}
