//! Error types
//!
//! Each subsystem reports its own error type ([`ConfigError`],
//! [`SessionError`], [`ControlError`]). [`Error`] unifies them for callers
//! that drive more than one subsystem and maps them onto HTTP responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::camera::ConfigError;
use crate::onvif::ControlError;
use crate::supervisor::SessionError;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification of an [`Error`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad or missing configuration; fatal at startup
    Config,
    /// Output directory or converter spawn failure
    SessionStart,
    /// Device unreachable, rejected credentials, or bad response
    ControlProtocol,
    /// Unknown camera address, session key, or recording identifier
    NotFound,
    /// Malformed request parameters
    InvalidRequest,
    /// Listener or filesystem failure outside a session
    Io,
}

/// Crate-level error
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Converter session could not be started
    #[error("session start failed: {0}")]
    SessionStart(#[from] SessionError),

    /// Control protocol failure
    #[error("control command failed: {0}")]
    Control(ControlError),

    /// No camera registered under this address
    #[error("camera not found: {0}")]
    CameraNotFound(String),

    /// No converter session registered under this key
    #[error("session not found: {0}")]
    SessionNotFound(String),

    /// The camera exposes no media source with this identifier
    #[error("recording source not found: {0}")]
    RecordingNotFound(String),

    /// Request parameters missing or malformed
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Config(_) => ErrorKind::Config,
            Error::SessionStart(_) => ErrorKind::SessionStart,
            Error::Control(_) => ErrorKind::ControlProtocol,
            Error::CameraNotFound(_) | Error::SessionNotFound(_) | Error::RecordingNotFound(_) => {
                ErrorKind::NotFound
            }
            Error::InvalidRequest(_) => ErrorKind::InvalidRequest,
            Error::Io(_) => ErrorKind::Io,
        }
    }

    /// HTTP status this error is reported with
    pub fn status(&self) -> StatusCode {
        match self.kind() {
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::InvalidRequest => StatusCode::BAD_REQUEST,
            ErrorKind::Config
            | ErrorKind::SessionStart
            | ErrorKind::ControlProtocol
            | ErrorKind::Io => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            Error::Config(_) => "CONFIG_ERROR",
            Error::SessionStart(_) => "SESSION_START_FAILED",
            Error::Control(_) => "CONTROL_FAILED",
            Error::CameraNotFound(_) => "CAMERA_NOT_FOUND",
            Error::SessionNotFound(_) => "SESSION_NOT_FOUND",
            Error::RecordingNotFound(_) => "RECORDING_NOT_FOUND",
            Error::InvalidRequest(_) => "INVALID_REQUEST",
            Error::Io(_) => "IO_ERROR",
        }
    }
}

impl From<ControlError> for Error {
    fn from(err: ControlError) -> Self {
        match err {
            ControlError::SourceNotFound(token) => Error::RecordingNotFound(token),
            other => Error::Control(other),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();
        let message = self.to_string();

        if status.is_server_error() {
            tracing::error!(status = %status, error_code = code, message = %message, "Request failed");
        } else {
            tracing::debug!(status = %status, error_code = code, message = %message, "Request rejected");
        }

        let body = Json(json!({
            "success": false,
            "error_code": code,
            "error": message,
        }));

        (status, body).into_response()
    }
}
