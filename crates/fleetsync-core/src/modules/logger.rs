//! Logging initialisation.
//!
//! Diagnostics go to stderr through `tracing`; stdout is reserved for the
//! human-readable plan and run summary.

use tracing_subscriber::EnvFilter;

/// Install the global subscriber. `level` is an `EnvFilter` directive such as
/// `info` or `fleetsync_core=debug`; an invalid directive falls back to `info`.
///
/// Calling it twice is harmless (the second install is ignored).
pub fn init_logging(level: &str) {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));
    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
    if installed.is_err() {
        tracing::debug!("Logging already initialised");
    }
}
