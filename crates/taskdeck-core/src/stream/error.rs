//! Error types for the streaming transport.

use std::fmt;

use serde_json::Value;

/// Categories of stream errors for consistent error handling.
///
/// Local cancellation is deliberately absent: a cancelled connection
/// surfaces as a close signal, never as an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamErrorKind {
    /// Network-level failure (connect, timeout, mid-stream disconnect)
    Transport,
    /// Non-2xx HTTP response caught before streaming started
    HttpStatus,
    /// Malformed SSE framing or invalid UTF-8 on the wire
    Decode,
}

impl fmt::Display for StreamErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamErrorKind::Transport => write!(f, "transport"),
            StreamErrorKind::HttpStatus => write!(f, "http_status"),
            StreamErrorKind::Decode => write!(f, "decode"),
        }
    }
}

/// Structured stream error with kind and details.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamError {
    /// Error category
    pub kind: StreamErrorKind,
    /// One-line summary suitable for display
    pub message: String,
    /// Optional additional details (e.g., raw error body)
    pub details: Option<String>,
}

impl StreamError {
    /// Creates a new stream error.
    pub fn new(kind: StreamErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            details: None,
        }
    }

    /// Creates a transport error.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(StreamErrorKind::Transport, message)
    }

    /// Creates a decode error.
    pub fn decode(message: impl Into<String>) -> Self {
        Self::new(StreamErrorKind::Decode, message)
    }

    /// Creates an HTTP status error from a response body.
    ///
    /// Extracts the server's `{"detail": ...}` message when the body is JSON.
    pub fn http_status(status: u16, body: &str) -> Self {
        let message = format!("HTTP {status}");
        let details = if body.is_empty() {
            None
        } else {
            if let Ok(json) = serde_json::from_str::<Value>(body)
                && let Some(detail) = json.get("detail").and_then(|v| v.as_str())
            {
                return Self {
                    kind: StreamErrorKind::HttpStatus,
                    message: format!("HTTP {status}: {detail}"),
                    details: Some(body.to_string()),
                };
            }
            Some(body.to_string())
        };
        Self {
            kind: StreamErrorKind::HttpStatus,
            message,
            details,
        }
    }

    /// Classifies a reqwest error into a transport error.
    pub fn from_reqwest(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::transport(format!("Request timed out: {err}"))
        } else if err.is_connect() {
            Self::transport(format!("Connection failed: {err}"))
        } else if err.is_request() {
            Self::transport(format!("Request error: {err}"))
        } else {
            Self::transport(format!("Network error: {err}"))
        }
    }
}

impl fmt::Display for StreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for StreamError {}

/// Result type for stream operations.
pub type StreamResult<T> = std::result::Result<T, StreamError>;

#[cfg(test)]
mod tests {
    use super::*;

    /// http_status: extracts the detail message from a JSON error body.
    #[test]
    fn test_http_status_extracts_detail() {
        let err = StreamError::http_status(404, r#"{"detail":"Session not found"}"#);
        assert_eq!(err.kind, StreamErrorKind::HttpStatus);
        assert_eq!(err.message, "HTTP 404: Session not found");
        assert_eq!(err.details, Some(r#"{"detail":"Session not found"}"#.to_string()));
    }

    /// http_status: keeps raw body as details when it is not JSON.
    #[test]
    fn test_http_status_non_json_body() {
        let err = StreamError::http_status(502, "Bad Gateway");
        assert_eq!(err.message, "HTTP 502");
        assert_eq!(err.details, Some("Bad Gateway".to_string()));
    }

    /// http_status: empty body yields no details.
    #[test]
    fn test_http_status_empty_body() {
        let err = StreamError::http_status(500, "");
        assert_eq!(err.message, "HTTP 500");
        assert_eq!(err.details, None);
    }

    /// Display prints the one-line message only.
    #[test]
    fn test_display_is_message() {
        let err = StreamError::transport("Connection failed: refused");
        assert_eq!(err.to_string(), "Connection failed: refused");
    }
}
