//! Tracing subscriber bootstrap shared by the binaries.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, reload, util::SubscriberInitExt};

use crate::config::LoggingConfig;

const FALLBACK_LEVEL: &str = "debug";

/// Handle for swapping the active filter after configuration is loaded.
pub type FilterHandle = reload::Handle<EnvFilter, tracing_subscriber::Registry>;

/// ## Summary
/// Parses a filter directive, falling back to `debug` when it is invalid.
#[must_use]
pub fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_new(level).unwrap_or_else(|_| {
        tracing::warn!(%level, "Invalid log level, falling back to {FALLBACK_LEVEL}");
        EnvFilter::new(FALLBACK_LEVEL)
    })
}

/// ## Summary
/// Installs the global subscriber at `debug` and returns a handle to retune it.
///
/// Calling this more than once is a no-op for the subscriber; the returned
/// handle then points at a filter nobody listens to.
#[must_use]
pub fn init() -> FilterHandle {
    let (filter_layer, filter_handle) = reload::Layer::new(EnvFilter::new(FALLBACK_LEVEL));

    let installed = tracing_subscriber::registry()
        .with(filter_layer)
        .with(
            fmt::layer()
                .with_target(true)
                .with_file(true)
                .with_line_number(true),
        )
        .try_init();

    if let Err(e) = installed {
        tracing::debug!(error = %e, "Tracing subscriber already installed");
    }

    filter_handle
}

/// ## Summary
/// Applies the configured log level to a running subscriber.
pub fn apply(handle: &FilterHandle, config: &LoggingConfig) {
    let filter = env_filter(&config.level);
    if let Err(e) = handle.modify(|current| *current = filter) {
        tracing::warn!(error = %e, "Failed to update log filter from config");
    }
}
