//! Streaming-related error types.
//!
//! Errors raised while decoding event blocks or interpreting the event
//! sequence of a single response.

use thiserror::Error;

/// Stream-specific error variants.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum StreamError {
    /// The `data:` payload of an event block is not JSON.
    #[error("invalid JSON for event '{event_type}': {message}")]
    InvalidJson { event_type: String, message: String },

    /// A known event type arrived without the fields it needs.
    #[error("malformed payload for event '{event_type}': {message}")]
    MalformedPayload { event_type: String, message: String },

    /// Backend reported an error via an `error` event.
    #[error("backend error: {message}")]
    BackendError { message: String },

    /// The stream closed before a `done` or `error` event arrived.
    #[error("stream ended without a terminal event")]
    Incomplete,
}

impl StreamError {
    /// Get a user-friendly error message.
    ///
    /// Backend errors are surfaced verbatim.
    pub fn user_message(&self) -> String {
        match self {
            StreamError::InvalidJson { .. } | StreamError::MalformedPayload { .. } => {
                "Received invalid data from server. Please try again.".to_string()
            }
            StreamError::BackendError { message } => message.clone(),
            StreamError::Incomplete => "The response ended unexpectedly.".to_string(),
        }
    }
}
