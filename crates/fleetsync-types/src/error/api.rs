//! Control-plane API errors.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors reported by (or while talking to) the control plane.
///
/// Every variant names the endpoint or instance involved so a per-destination
/// summary line can be printed without further context.
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "details")]
pub enum ApiError {
    /// Network failure, timeout, TLS error
    #[error("Transport error calling {endpoint}: {message}")]
    Transport { endpoint: String, message: String },

    /// Non-success HTTP status
    #[error("{endpoint} returned HTTP {status}: {message}")]
    Status { endpoint: String, status: u16, message: String },

    /// The call reached the API but it reported failure
    #[error("{endpoint} rejected the call: {reason}")]
    Rejected { endpoint: String, reason: String },

    /// Login refused or session invalid
    #[error("Authentication failed for {target}: {reason}")]
    Authentication { target: String, reason: String },

    /// Response body did not have the expected shape
    #[error("Unexpected payload from {endpoint}: {message}")]
    InvalidPayload { endpoint: String, message: String },

    /// A trigger was created but the new id could not be located afterwards
    #[error("Trigger '{description}' created on {instance} but its id was not found")]
    TriggerNotFound { instance: String, description: String },
}

impl ApiError {
    /// Convenience constructor for `Rejected`.
    pub fn rejected(endpoint: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Rejected { endpoint: endpoint.into(), reason: reason.into() }
    }

    /// Convenience constructor for `InvalidPayload`.
    pub fn invalid_payload(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidPayload { endpoint: endpoint.into(), message: message.into() }
    }
}
