//! Tracing subscriber setup.
//!
//! Hosts embedding the crate usually install their own subscriber; `init` is
//! for binaries and tests that want a sensible default.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Default log filter directive.
pub const DEFAULT_LOG_FILTER: &str = "streampull=info";

/// Install a fmt subscriber filtered by `RUST_LOG`, falling back to
/// [`DEFAULT_LOG_FILTER`].
///
/// Does nothing if a global subscriber is already set.
pub fn init() {
    init_with_filter(DEFAULT_LOG_FILTER);
}

/// Install a fmt subscriber with an explicit fallback filter directive.
pub fn init_with_filter(directives: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directives));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .try_init();
}
