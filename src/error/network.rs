//! Network-related error types.
//!
//! Errors raised while opening or reading the response stream.

use thiserror::Error;

/// Network-specific error variants.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum NetworkError {
    /// Connection to the server failed.
    #[error("connection to {url} failed: {message}")]
    ConnectionFailed { url: String, message: String },

    /// Request timed out.
    #[error("{operation} timed out")]
    Timeout { operation: String },

    /// HTTP status error (non-2xx response).
    #[error("server returned HTTP {status}: {message}")]
    HttpStatus { status: u16, message: String },

    /// The body stream broke off mid-read.
    #[error("response stream interrupted: {message}")]
    StreamInterrupted { message: String },

    /// Generic network error.
    #[error("network error: {message}")]
    Other { message: String },
}

impl NetworkError {
    /// Check if this error is likely transient and can be retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            NetworkError::ConnectionFailed { .. } => true,
            NetworkError::Timeout { .. } => true,
            NetworkError::HttpStatus { status, .. } => {
                *status >= 500 || *status == 429 || *status == 408
            }
            NetworkError::StreamInterrupted { .. } => true,
            NetworkError::Other { .. } => false,
        }
    }

    /// Get a user-friendly error message.
    pub fn user_message(&self) -> String {
        match self {
            NetworkError::ConnectionFailed { .. } => {
                "Unable to connect to the server. Please check your internet connection."
                    .to_string()
            }
            NetworkError::Timeout { operation } => {
                format!("The {} timed out. The server may be slow or unreachable.", operation)
            }
            NetworkError::HttpStatus { status, message } => match *status {
                401 => "Authentication required. Please sign in again.".to_string(),
                403 => "Access denied.".to_string(),
                404 => "The chat endpoint was not found.".to_string(),
                429 => "Too many requests. Please wait a moment and try again.".to_string(),
                500..=599 if !message.is_empty() => format!("Server error ({}): {}", status, message),
                500..=599 => "The server is experiencing issues. Please try again later.".to_string(),
                _ => format!("The server returned an error (HTTP {}).", status),
            },
            NetworkError::StreamInterrupted { .. } => {
                "The connection was interrupted while receiving the response.".to_string()
            }
            NetworkError::Other { message } => format!("Network error: {}", message),
        }
    }
}

/// Classify a reqwest error into a NetworkError.
pub fn classify_reqwest_error(err: &reqwest::Error, url: &str) -> NetworkError {
    if err.is_connect() {
        NetworkError::ConnectionFailed {
            url: url.to_string(),
            message: err.to_string(),
        }
    } else if err.is_timeout() {
        NetworkError::Timeout {
            operation: "chat request".to_string(),
        }
    } else if let Some(status) = err.status() {
        NetworkError::HttpStatus {
            status: status.as_u16(),
            message: err.to_string(),
        }
    } else if err.is_body() || err.is_decode() {
        NetworkError::StreamInterrupted {
            message: err.to_string(),
        }
    } else {
        NetworkError::Other {
            message: err.to_string(),
        }
    }
}
