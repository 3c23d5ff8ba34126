//! Logging initialization and configuration.
//!
//! Log records go to stderr; stdout stays reserved for forwarded command
//! output.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when `RUST_LOG` is not set.
pub const DEFAULT_FILTER: &str = "shellmux=info";

/// Initialize the logging system.
///
/// Uses the `RUST_LOG` environment variable for filtering. If not set,
/// defaults to `shellmux=info`.
///
/// # Panics
///
/// Panics if called more than once, or if another tracing subscriber
/// has already been set.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_writer(std::io::stderr),
        )
        .init();
}

/// Try to initialize the logging system.
///
/// Returns `Ok(())` if successful, or `Err` if logging has already been
/// initialized.
pub fn try_init() -> Result<(), tracing_subscriber::util::TryInitError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    try_init_with(filter)
}

/// Try to initialize logging with an explicit level or filter directive.
///
/// A bare level such as `debug` is scoped to this crate; anything else is
/// used as a full `EnvFilter` directive string.
pub fn try_init_with_level(level: &str) -> Result<(), tracing_subscriber::util::TryInitError> {
    try_init_with(EnvFilter::new(filter_directive(level)))
}

fn try_init_with(filter: EnvFilter) -> Result<(), tracing_subscriber::util::TryInitError> {
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_writer(std::io::stderr),
        )
        .try_init()
}

fn filter_directive(level: &str) -> String {
    match level {
        "error" | "warn" | "info" | "debug" | "trace" | "off" => format!("shellmux={}", level),
        other => other.to_string(),
    }
}
