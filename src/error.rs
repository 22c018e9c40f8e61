//! Error taxonomy shared by every part of the request pipeline.
//!
//! Every failure a caller can observe is an [`ApiError`]: a fixed [`ErrorKind`], the
//! HTTP status when one was received, a human-readable message and, for rate limits,
//! the server's retry-after hint. Which kinds are recovered locally (and how often) is
//! decided in [`crate::pipeline::classify`].

use std::{fmt, time::Duration};

/// Result alias used throughout the library.
pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// The closed set of failure categories surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A caller-supplied argument violated a documented constraint, or the server
    /// rejected the request with a 4xx other than 401/404/429.
    Validation,
    /// No usable credential: 401 after one refresh, or the credential exchange failed.
    Auth,
    /// 429 beyond the retry budget or with a retry-after above the ceiling.
    RateLimit,
    /// 404.
    NotFound,
    /// 5xx after retries were exhausted.
    Server,
    /// Connection failure, reset or timeout after retries were exhausted.
    Network,
    /// The response body did not match the expected shape.
    Decode,
    /// The caller cancelled the call.
    Cancelled,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Validation => "validation",
            ErrorKind::Auth => "auth",
            ErrorKind::RateLimit => "rate limit",
            ErrorKind::NotFound => "not found",
            ErrorKind::Server => "server",
            ErrorKind::Network => "network",
            ErrorKind::Decode => "decode",
            ErrorKind::Cancelled => "cancelled",
        };
        f.write_str(name)
    }
}

/// A classified failure of a pipeline call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} error{}: {message}", status_suffix(.status))]
pub struct ApiError {
    pub kind: ErrorKind,
    pub status: Option<u16>,
    pub message: String,
    pub retry_after: Option<Duration>,
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" (HTTP {s})")).unwrap_or_default()
}

impl ApiError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            status: None,
            message: message.into(),
            retry_after: None,
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    pub fn auth(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Auth, message)
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Network, message)
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Decode, message)
    }

    pub fn cancelled() -> Self {
        Self::new(ErrorKind::Cancelled, "the call was cancelled")
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_retry_after(mut self, retry_after: Option<Duration>) -> Self {
        self.retry_after = retry_after;
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn is(&self, kind: ErrorKind) -> bool {
        self.kind == kind
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::decode(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_status_when_present() {
        let err = ApiError::new(ErrorKind::NotFound, "non existing id").with_status(404);
        assert_eq!(err.to_string(), "not found error (HTTP 404): non existing id");
    }

    #[test]
    fn display_omits_status_for_pre_flight_errors() {
        let err = ApiError::validation("ids must not be empty");
        assert_eq!(err.to_string(), "validation error: ids must not be empty");
        assert!(err.is(ErrorKind::Validation));
    }
}
