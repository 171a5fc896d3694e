//! Visibility-driven delivery suspension.
//!
//! While the consuming application is hidden for longer than a grace
//! period, inbound delivery is suspended to conserve resources. The
//! controller is a plain state machine: the caller feeds it visibility
//! transitions and the current time, and sleeps until [`deadline`].
//!
//! [`deadline`]: SuspensionController::deadline

use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};

/// Delivery state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuspensionState {
    /// Inbound frames are delivered.
    Active,
    /// Inbound frames are dropped.
    Suspended,
}

/// What a visible notification did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisibleOutcome {
    /// Nothing was pending.
    Unchanged,
    /// An armed suspension was cancelled before it fired.
    Cancelled,
    /// Delivery resumed after a suspension.
    Resumed {
        /// Whether the user should be warned about missed updates.
        warn: bool,
    },
}

/// Single-slot suspension timer and flag.
#[derive(Debug)]
pub struct SuspensionController {
    delay: Duration,
    state: SuspensionState,
    deadline: Option<Instant>,
}

impl SuspensionController {
    /// Create an active controller with the given grace period.
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            state: SuspensionState::Active,
            deadline: None,
        }
    }

    /// Grace period between hiding and suspension.
    #[must_use]
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> SuspensionState {
        self.state
    }

    /// Whether inbound delivery is suspended.
    #[must_use]
    pub fn is_suspended(&self) -> bool {
        self.state == SuspensionState::Suspended
    }

    /// The armed suspension instant, if any.
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// The application became hidden.
    ///
    /// Arms the timer unless one is already armed or delivery is already
    /// suspended.
    pub fn on_hidden(&mut self, now: Instant) {
        if self.is_suspended() || self.deadline.is_some() {
            return;
        }
        let Some(deadline) = now.checked_add(self.delay) else {
            debug!(delay = ?self.delay, "Hidden, delay out of range, not arming");
            return;
        };
        debug!(delay = ?self.delay, "Hidden, arming suspension");
        self.deadline = Some(deadline);
    }

    /// The application became visible.
    ///
    /// `errored` is the connection's sticky error flag; it suppresses the
    /// resume warning.
    pub fn on_visible(&mut self, errored: bool) -> VisibleOutcome {
        debug!("Visible");
        if self.deadline.take().is_some() {
            return VisibleOutcome::Cancelled;
        }
        match self.state {
            SuspensionState::Suspended => {
                self.state = SuspensionState::Active;
                info!("Resuming delivery");
                VisibleOutcome::Resumed { warn: !errored }
            }
            SuspensionState::Active => VisibleOutcome::Unchanged,
        }
    }

    /// The timer fired.
    ///
    /// Returns `true` if this call suspended delivery.
    pub fn on_deadline(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                self.state = SuspensionState::Suspended;
                info!("Hidden past grace period, suspending delivery");
                true
            }
            _ => false,
        }
    }
}
