//! Tracing/logging initialization.
//!
//! Output is one JSON object per line. `RUST_LOG` always wins; otherwise the
//! caller's default filter applies (`EngineConfig::log_filter` in practice).

use tracing_subscriber::EnvFilter;

/// Initialize with the `info` default filter.
pub fn init() -> bool {
    init_with_filter("info")
}

/// Initialize tracing for the process.
///
/// Safe to call multiple times; only the first call installs a subscriber.
/// Returns whether this call installed it.
pub fn init_with_filter(default_filter: &str) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .json()
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_target(false)
        .with_current_span(true)
        .try_init()
        .is_ok();

    if installed {
        ::tracing::debug!(default_filter, "tracing initialized");
    }
    installed
}
