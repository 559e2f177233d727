//! Error types for the AMP client.

use thiserror::Error;

/// Errors raised while constructing a client. Call failures are reported as
/// `fleetsync_types::ApiError`.
#[derive(Error, Debug)]
pub enum ClientError {
    /// Base URL is not an absolute http(s) URL.
    #[error("Invalid base URL '{url}': {reason}")]
    InvalidUrl {
        /// The rejected URL.
        url: String,
        /// Why it was rejected.
        reason: String,
    },

    /// HTTP client could not be built (TLS backend, proxy settings).
    #[error("HTTP client setup failed: {0}")]
    Build(#[from] reqwest::Error),
}
