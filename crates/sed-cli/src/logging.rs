//! Log subscriber setup

use anyhow::{Context, Result};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const DEFAULT_LOG_FILTER: &str = "info";

/// Build the stderr subscriber.
///
/// `--verbose` forces debug level; otherwise `RUST_LOG` wins over the default.
pub fn build_subscriber(verbose: bool) -> impl tracing::Subscriber + Send + Sync {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
}

/// Install the subscriber for the whole process
pub fn init(verbose: bool) -> Result<()> {
    tracing::subscriber::set_global_default(build_subscriber(verbose))
        .context("Failed to install log subscriber")
}
