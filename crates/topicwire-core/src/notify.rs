//! User-facing alerts.
//!
//! Lifecycle anomalies are reported to a [`NotificationSink`] as
//! human-readable descriptors. The sink decides how to present them; the
//! default [`TracingSink`] writes them to the log.

use std::time::Duration;
use tracing::{error, info, warn};

/// How serious an alert is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    /// Something went right.
    Success,
    /// Degraded but working.
    Warning,
    /// Broken until the user acts.
    Error,
}

/// Presentation hints for a notification.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisplayOptions {
    /// Hide automatically after this long; `None` keeps it until dismissed.
    pub auto_hide: Option<Duration>,
    /// Show a severity icon.
    pub icon: bool,
    /// Keep the alert in a notification history.
    pub history: bool,
}

/// A human-readable alert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Short heading.
    pub title: String,
    /// Body text.
    pub text: String,
    /// Severity.
    pub severity: Severity,
    /// Presentation hints.
    pub display: DisplayOptions,
}

impl Notification {
    /// Create a sticky notification.
    #[must_use]
    pub fn new(title: impl Into<String>, text: impl Into<String>, severity: Severity) -> Self {
        Self {
            title: title.into(),
            text: text.into(),
            severity,
            display: DisplayOptions::default(),
        }
    }

    /// Hide the notification automatically after `delay`.
    #[must_use]
    pub fn auto_hide(mut self, delay: Duration) -> Self {
        self.display.auto_hide = Some(delay);
        self
    }

    /// The connection finished opening.
    #[must_use]
    pub fn connected() -> Self {
        Self::new(
            "WebSocket",
            "WebSocket connection established.",
            Severity::Success,
        )
        .auto_hide(Duration::from_secs(2))
    }

    /// The connection closed without a prior error.
    #[must_use]
    pub fn closed() -> Self {
        Self::new(
            "WebSocket Closed",
            "WebSocket connection has been closed. Try refreshing the page.",
            Severity::Error,
        )
    }

    /// The transport reported an error.
    #[must_use]
    pub fn transport_error() -> Self {
        Self::new(
            "WebSocket Error",
            "WebSocket error. Try refreshing the page.",
            Severity::Error,
        )
    }

    /// Delivery resumed after being suspended for `hidden_for`.
    #[must_use]
    pub fn suspended(hidden_for: Duration) -> Self {
        Self::new(
            "Warning",
            format!(
                "Page has not been visible for more than {} seconds. WebSocket real-time \
                 updates have been suspended to conserve system resources. Refreshing the \
                 page is recommended.",
                hidden_for.as_secs_f64()
            ),
            Severity::Warning,
        )
    }
}

/// Destination for user-facing alerts.
pub trait NotificationSink: Send + Sync {
    /// Present an alert. Must not block.
    fn notify(&self, notification: Notification);
}

/// Sink that logs alerts at a level matching their severity.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl NotificationSink for TracingSink {
    fn notify(&self, notification: Notification) {
        let Notification {
            title,
            text,
            severity,
            ..
        } = notification;
        match severity {
            Severity::Success => info!(title = %title, "{}", text),
            Severity::Warning => warn!(title = %title, "{}", text),
            Severity::Error => error!(title = %title, "{}", text),
        }
    }
}
