//! Error category classification.
//!
//! Categories drive what the controller does with a failure: whether it is
//! worth a retry, and whether it is shown to the user at all.

use std::fmt;

/// High-level categorization of errors for handling decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Network-related errors (connection, timeout).
    /// Generally transient and retryable.
    Network,

    /// Backend errors: HTTP 5xx, or an `error` event from the server.
    Server,

    /// Client-side errors (malformed payloads, invalid state).
    Client,

    /// Missing or invalid backend configuration.
    Configuration,

    /// Intentional cancellation. Never surfaced as an error.
    Cancelled,
}

impl ErrorCategory {
    /// Returns true if errors in this category are generally transient
    /// and the operation can be retried.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorCategory::Network | ErrorCategory::Server)
    }

    /// Returns a short label for the category suitable for logging.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Network => "network",
            ErrorCategory::Server => "server",
            ErrorCategory::Client => "client",
            ErrorCategory::Configuration => "configuration",
            ErrorCategory::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
