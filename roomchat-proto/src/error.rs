//! Errors reported by the room gateway.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Error code attached to a [`GatewayError`].
///
/// Remote errors carry the homeserver's `errcode` string; the well-known
/// ones the core reacts to get their own variant, anything else is kept
/// verbatim in [`ErrorCode::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ErrorCode {
    /// `M_FORBIDDEN`: the user lacks permission for the operation.
    Forbidden,
    /// `M_NOT_FOUND`: the target room or user does not exist.
    NotFound,
    /// `M_LIMIT_EXCEEDED`: the request was rate limited.
    LimitExceeded,
    /// `M_UNKNOWN`: the server gave no specific reason.
    Unknown,
    /// The request never got a reply (connection refused, timed out, ...).
    Network,
    /// Any other `errcode` string.
    Other(String),
}

impl ErrorCode {
    /// Return the wire form of this code.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Forbidden => "M_FORBIDDEN",
            Self::NotFound => "M_NOT_FOUND",
            Self::LimitExceeded => "M_LIMIT_EXCEEDED",
            Self::Unknown => "M_UNKNOWN",
            Self::Network => "network",
            Self::Other(code) => code,
        }
    }
}

impl From<&str> for ErrorCode {
    fn from(code: &str) -> Self {
        match code {
            "M_FORBIDDEN" => Self::Forbidden,
            "M_NOT_FOUND" => Self::NotFound,
            "M_LIMIT_EXCEEDED" => Self::LimitExceeded,
            "M_UNKNOWN" => Self::Unknown,
            "network" => Self::Network,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<String> for ErrorCode {
    fn from(code: String) -> Self {
        Self::from(code.as_str())
    }
}

impl From<ErrorCode> for String {
    fn from(code: ErrorCode) -> Self {
        match code {
            ErrorCode::Other(code) => code,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed room gateway call.
///
/// Deserializes from the homeserver's standard error body
/// (`{"errcode": "...", "error": "..."}`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{code}: {message}")]
pub struct GatewayError {
    /// Machine-readable error code.
    #[serde(rename = "errcode")]
    pub code: ErrorCode,
    /// Human-readable message, suitable for showing to the user.
    #[serde(rename = "error", default)]
    pub message: String,
}

impl GatewayError {
    /// Create an error from a code and message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Shorthand for an `M_FORBIDDEN` error.
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Forbidden, message)
    }

    /// Shorthand for a transport-level failure.
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Network, message)
    }

    /// Whether the server refused the operation for lack of permission.
    #[must_use]
    pub fn is_forbidden(&self) -> bool {
        self.code == ErrorCode::Forbidden
    }
}
