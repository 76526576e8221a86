//! Tracing subscriber bootstrap.

use tracing_subscriber::EnvFilter;

use crate::config::LOG_ENV;

const DEFAULT_FILTER: &str = "warn";

/// Builds the filter from `directive`, falling back to `warn` when it is
/// missing or invalid.
pub fn env_filter(directive: Option<&str>) -> EnvFilter {
    directive
        .and_then(|directive| EnvFilter::try_new(directive).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_FILTER))
}

/// Installs a stderr fmt subscriber filtered by `CINTESSA_LOG`. Calling it
/// again after a subscriber is installed is a no-op.
pub fn init_logging(directive: Option<&str>) {
    let directive = directive
        .map(str::to_string)
        .or_else(|| std::env::var(LOG_ENV).ok());

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter(directive.as_deref()))
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
