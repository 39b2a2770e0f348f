//! ns-filter library
//!
//! This crate provides a metric pipeline stage that moves namespace segments
//! matching a pattern (IP addresses, host names, container IDs, ...) out of a
//! metric's namespace and into its tags, so metrics of the same shape share
//! the same identity.

pub mod cli;
pub mod codec;
pub mod config;
pub mod error;
pub mod metric;
pub mod policy;
pub mod processor;
pub mod server;
pub mod transformer;

use anyhow::Result;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the logging subsystem
///
/// Logs are written to stderr so stdout stays free for encoded batches.
///
/// # Arguments
/// * `level` - Log level string (trace, debug, info, warn, error)
/// * `json` - Emit one JSON object per event instead of plain text
///
/// # Errors
/// Returns an error if the logging system fails to initialize
pub fn init_logging(level: &str, json: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let registry = tracing_subscriber::registry().with(filter);

    let result = if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .try_init()
    };

    result.map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))
}
