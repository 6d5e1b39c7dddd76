//! Control protocol error types

use std::time::Duration;

/// Failure of an ONVIF control operation
///
/// `action` names the SOAP operation that failed. Nothing is retried.
#[derive(Debug, thiserror::Error)]
pub enum ControlError {
    /// Connection could not be established or was dropped
    #[error("{action}: device unreachable: {reason}")]
    Unreachable { action: &'static str, reason: String },

    /// No complete response within the request timeout
    #[error("{action}: no response within {}ms", timeout.as_millis())]
    Timeout {
        action: &'static str,
        timeout: Duration,
    },

    /// Credentials rejected
    #[error("{action}: credentials rejected by device")]
    Unauthorized { action: &'static str },

    /// SOAP fault or non-success HTTP status
    #[error("{action}: device returned fault: {reason}")]
    Fault { action: &'static str, reason: String },

    /// Response lacks an expected element
    #[error("{action}: malformed response: {reason}")]
    Malformed { action: &'static str, reason: String },

    /// Device does not advertise a required service or profile
    #[error("device does not support {0}")]
    Unsupported(&'static str),

    /// No media source matches the requested identifier
    #[error("no media source matches {0:?}")]
    SourceNotFound(String),

    /// HTTP client could not be built
    #[error("control client setup failed: {0}")]
    Client(String),
}

impl ControlError {
    /// Whether the device could not be talked to at all
    pub fn is_connectivity(&self) -> bool {
        matches!(
            self,
            ControlError::Unreachable { .. } | ControlError::Timeout { .. }
        )
    }

    /// Classify a transport-level failure
    pub(crate) fn from_transport(action: &'static str, timeout: Duration, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ControlError::Timeout { action, timeout }
        } else {
            ControlError::Unreachable {
                action,
                reason: err.to_string(),
            }
        }
    }
}
