//! # topicwire-core
//!
//! Core types and state machines for the topicwire client.
//!
//! This crate provides the building blocks the client composes:
//!
//! - **Router** - Topic registrations and inbound fan-out
//! - **Subscription** - First-subscriber control frames and scoped bindings
//! - **Gate** - One-shot readiness gate for outbound sends
//! - **Suspension** - Visibility-driven delivery suspension
//! - **Notify** - Human-readable alerts and their sinks
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  Transport  │────▶│ Suspension  │────▶│   Router    │────▶ subscribers
//! └─────────────┘     └─────────────┘     └─────────────┘
//!        ▲                                       ▲
//!        │            ┌─────────────┐     ┌──────┴──────┐
//!        └────────────│    Gate     │◀────│Subscription │◀──── client
//!                     └─────────────┘     └─────────────┘
//! ```

pub mod gate;
pub mod notify;
pub mod router;
pub mod scope;
pub mod subscriber;
pub mod subscription;
pub mod suspension;
pub mod visibility;

pub use gate::{Outbound, OutboundQueue, ReadinessGate};
pub use notify::{DisplayOptions, Notification, NotificationSink, Severity, TracingSink};
pub use router::{Dispatch, RouterStats, TopicRouter, TopicTrace};
pub use scope::{Lifetime, Scope, TerminateHook};
pub use subscriber::Subscriber;
pub use subscription::SubscriptionManager;
pub use suspension::{SuspensionController, SuspensionState, VisibleOutcome};
pub use visibility::{Visibility, VisibilityEvents, VisibilityNotifier};

/// Default delay between the app becoming hidden and delivery suspension.
pub const DEFAULT_VISIBILITY_TIMEOUT_MS: u64 = 20_000;
