//! Messages delivered to the controller from background tasks.

use tokio_util::sync::CancellationToken;

use crate::error::ChatError;
use crate::session::SessionNotice;
use crate::sse::StreamEvent;

/// Everything that can change controller state from outside a method call.
///
/// Stream tasks tag each message with the id of the request that produced
/// it; the controller drops messages whose request is no longer active.
#[derive(Debug)]
pub enum ControllerMessage {
    /// The backend accepted the request and the body is being read
    Connected { request_id: String },
    /// One decoded event from the response body
    Event {
        request_id: String,
        event: StreamEvent,
    },
    /// The body ended normally
    StreamEnded { request_id: String },
    /// Opening or reading the body failed
    TransportFailed {
        request_id: String,
        error: ChatError,
    },
    /// Deferred conversation store notification
    Notify(SessionNotice),
}

impl ControllerMessage {
    pub fn request_id(&self) -> Option<&str> {
        match self {
            ControllerMessage::Connected { request_id }
            | ControllerMessage::Event { request_id, .. }
            | ControllerMessage::StreamEnded { request_id }
            | ControllerMessage::TransportFailed { request_id, .. } => Some(request_id),
            ControllerMessage::Notify(_) => None,
        }
    }
}

/// Where the current send is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestPhase {
    #[default]
    Idle,
    /// Checking that the backend is configured
    Preflight,
    /// Request issued, no response yet
    Sending,
    /// Response body is being read
    Streaming,
}

/// Correlation record of the one active request
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub request_id: String,
    pub cancel: CancellationToken,
    /// The request went out without a session id
    pub is_new_conversation: bool,
    pub session_id: Option<String>,
    /// Original input, used for the provisional title
    pub user_text: String,
}

/// Result of a send attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// Nothing happened
    Ignored(IgnoreReason),
    /// The backend is not usable; an error message was appended locally
    PreflightFailed,
    /// The request is in flight
    Started { request_id: String },
}

impl SendOutcome {
    pub fn request_id(&self) -> Option<&str> {
        match self {
            SendOutcome::Started { request_id } => Some(request_id),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// No text and no attachments
    EmptyInput,
    /// Another request is still in progress
    Busy,
    /// Retry target has no preceding user message
    NothingToRetry,
}
