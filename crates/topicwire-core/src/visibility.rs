//! Visibility notifications.
//!
//! Whatever knows whether the application is on screen (a window system, a
//! terminal, a test) holds a [`VisibilityNotifier`]; the client consumes the
//! matching [`VisibilityEvents`].

use tokio::sync::mpsc;

/// A visibility transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// The application is no longer visible to its user.
    Hidden,
    /// The application is visible again.
    Visible,
}

/// Create a linked notifier and event stream.
#[must_use]
pub fn channel() -> (VisibilityNotifier, VisibilityEvents) {
    let (tx, rx) = mpsc::unbounded_channel();
    (VisibilityNotifier { tx }, VisibilityEvents { rx })
}

/// Sending side of visibility transitions.
#[derive(Debug, Clone)]
pub struct VisibilityNotifier {
    tx: mpsc::UnboundedSender<Visibility>,
}

impl VisibilityNotifier {
    /// Report a transition.
    ///
    /// Returns `false` if nothing listens any more.
    pub fn notify(&self, visibility: Visibility) -> bool {
        self.tx.send(visibility).is_ok()
    }

    /// Report that the application became hidden.
    pub fn hidden(&self) -> bool {
        self.notify(Visibility::Hidden)
    }

    /// Report that the application became visible.
    pub fn visible(&self) -> bool {
        self.notify(Visibility::Visible)
    }
}

/// Receiving side of visibility transitions.
#[derive(Debug)]
pub struct VisibilityEvents {
    rx: mpsc::UnboundedReceiver<Visibility>,
}

impl VisibilityEvents {
    /// Receive the next transition, or `None` once every notifier is gone.
    pub async fn recv(&mut self) -> Option<Visibility> {
        self.rx.recv().await
    }
}
