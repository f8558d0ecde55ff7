//! Subscriber installation. JSON output, filtered by `BEACON_LOG`.

pub mod events;
pub mod spans;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Environment variable holding the filter directive.
pub const LOG_ENV_VAR: &str = "BEACON_LOG";

/// Filter used when `BEACON_LOG` is unset or invalid.
pub const DEFAULT_FILTER: &str = "info";

/// Install the global JSON subscriber, filtered by `BEACON_LOG` (default `info`).
///
/// Returns false if a global subscriber was already installed.
pub fn init_tracing() -> bool {
    let filter = EnvFilter::try_from_env(LOG_ENV_VAR)
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    install(filter)
}

/// Install the global JSON subscriber with an explicit filter directive.
/// An unparsable directive falls back to [`DEFAULT_FILTER`].
pub fn init_tracing_with_filter(directive: &str) -> bool {
    let filter = EnvFilter::try_new(directive).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    install(filter)
}

fn install(filter: EnvFilter) -> bool {
    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .json()
                .with_target(true)
                .with_thread_names(true)
                .with_current_span(true),
        )
        .try_init()
        .is_ok()
}
