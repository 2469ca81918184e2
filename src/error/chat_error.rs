//! Unified error type for the chat client.

use thiserror::Error;

use super::category::ErrorCategory;
use super::network::NetworkError;
use super::stream::StreamError;

/// Top-level error for every fallible operation in the crate.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error(transparent)]
    Network(#[from] NetworkError),

    #[error(transparent)]
    Stream(#[from] StreamError),

    /// The backend is not ready to answer (e.g. no model configured).
    #[error("configuration error: {0}")]
    Config(String),

    /// The request was aborted by the user or superseded.
    #[error("request cancelled")]
    Cancelled,

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ChatError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ChatError::Network(NetworkError::HttpStatus { status, .. }) if *status >= 500 => {
                ErrorCategory::Server
            }
            ChatError::Network(NetworkError::HttpStatus { .. }) => ErrorCategory::Client,
            ChatError::Network(_) => ErrorCategory::Network,
            ChatError::Stream(StreamError::BackendError { .. }) => ErrorCategory::Server,
            ChatError::Stream(_) => ErrorCategory::Client,
            ChatError::Config(_) => ErrorCategory::Configuration,
            ChatError::Cancelled => ErrorCategory::Cancelled,
            ChatError::Json(_) => ErrorCategory::Client,
        }
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            ChatError::Network(e) => e.is_retryable(),
            other => other.category().is_retryable(),
        }
    }

    /// Intentional cancellation is an expected outcome, not a failure.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, ChatError::Cancelled)
    }

    /// Text placed into the synthesized assistant error message.
    pub fn user_message(&self) -> String {
        match self {
            ChatError::Network(e) => e.user_message(),
            ChatError::Stream(e) => e.user_message(),
            ChatError::Config(msg) => msg.clone(),
            ChatError::Cancelled => "The request was cancelled.".to_string(),
            ChatError::Json(_) => "Received invalid data from server.".to_string(),
        }
    }
}
