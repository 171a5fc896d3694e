//! # topicwire-tail
//!
//! Subscribe to topics on a topicwire server and print what arrives.
//!
//! ## Usage
//!
//! ```bash
//! # Run with topicwire.toml from the working directory
//! topicwire-tail
//!
//! # Run with a custom config
//! topicwire-tail /path/to/topicwire.toml
//!
//! # Run with environment variables
//! TOPICWIRE_URL=ws://127.0.0.1:8080/ws TOPICWIRE_TRACE=prices topicwire-tail
//! ```
//!
//! Received frames go to stdout as JSON lines, logs go to stderr. Stdin
//! takes `:sub <topic>`, `:unsub <topic>`, `:hide`, `:show`, or a JSON
//! value to send as-is.

mod config;
mod metrics;
mod session;

use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "topicwire=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Load configuration
    let path = std::env::args().nth(1);
    let config = config::Config::load(path.as_deref())?;

    tracing::info!(
        "Starting topicwire-tail for {}",
        config.client.url.as_deref().unwrap_or("<unset>")
    );

    // Initialize metrics
    if config.metrics.enabled {
        if let Err(e) = metrics::start_metrics_server(config.metrics.port) {
            tracing::error!("Failed to start metrics server: {}", e);
        }
    }

    session::run(config).await
}
