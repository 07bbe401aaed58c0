//! Error classification shared by the runner and the backends.

use serde::Serialize;
use std::fmt;

/// Every fault the pipeline can report, as seen by the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Re-executed command ran past its timeout
    CommandTimeout,
    /// Command could not be spawned or waited on
    CommandExecutionFailure,
    /// Backend unreachable or the transport failed mid-request
    ConnectionError,
    /// Missing credential or other local misconfiguration
    ConfigError,
    /// Backend answered with an explicit error
    ApiError,
    /// Backend refused the prompt
    SafetyBlocked,
    /// Backend answered with something we cannot read
    ProtocolError,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ErrorKind::CommandTimeout => "command timeout",
            ErrorKind::CommandExecutionFailure => "command execution failure",
            ErrorKind::ConnectionError => "connection error",
            ErrorKind::ConfigError => "configuration error",
            ErrorKind::ApiError => "API error",
            ErrorKind::SafetyBlocked => "blocked by safety filters",
            ErrorKind::ProtocolError => "protocol error",
        };
        f.write_str(label)
    }
}

/// Classified backend failure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct BackendError {
    pub kind: ErrorKind,
    pub message: String,
}

impl BackendError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn connection(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ConnectionError, message)
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ConfigError, message)
    }

    pub fn api(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ApiError, message)
    }

    pub fn protocol(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ProtocolError, message)
    }
}
