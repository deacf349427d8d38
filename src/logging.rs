//! Logging setup.
//!
//! Reconciler verbs emit `tracing` spans named `topic.create`, `topic.read`,
//! `topic.update` and `topic.delete` carrying the topic identity. Retries are
//! logged at `warn`, terminal failures at `error`. Output goes to **stderr**
//! so stdout stays free for the host.
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: Controls log levels (e.g., `info`, `hemmer_provider_datahub=debug`)
//!
//! ```bash
//! # Show each delete retry and read
//! RUST_LOG=hemmer_provider_datahub=debug ./my-provider
//! ```

use tracing_subscriber::{fmt, prelude::*, registry::Registry, EnvFilter};

/// Filter used when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "info";

fn subscriber(default_filter: &str) -> impl tracing::Subscriber + Send + Sync + 'static {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    Registry::default().with(filter).with(
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false),
    )
}

/// Initialize the default logging subscriber at `info`.
///
/// # Panics
///
/// Panics if a global subscriber has already been set.
pub fn init_logging() {
    init_logging_with_default(DEFAULT_FILTER);
}

/// Initialize logging with a custom default filter, used when `RUST_LOG` is
/// not set.
///
/// # Panics
///
/// Panics if a global subscriber has already been set.
pub fn init_logging_with_default(default_filter: &str) {
    subscriber(default_filter).init();
}

/// Try to initialize logging, returning false if already initialized.
pub fn try_init_logging() -> bool {
    subscriber(DEFAULT_FILTER).try_init().is_ok()
}
