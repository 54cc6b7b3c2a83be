//! Tracing setup for the staticpilot binary.
//!
//! Progress of a run (archive, each loop step, release path) is logged at
//! `info`; port internals (spawn, HTTP status, walk decisions) at `debug`.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber.
///
/// Reads `RUST_LOG` when set. Otherwise defaults to `info`, or to
/// `staticpilot=debug` when `verbose` is requested.
/// Output: stderr, compact format.
///
/// # Example
/// ```bash
/// RUST_LOG=staticpilot=trace staticpilot run --root ./job
/// ```
pub fn init(verbose: bool) {
    let default_directive = if verbose { "info,staticpilot=debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}
