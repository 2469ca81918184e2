//! SSE event types

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Event type used when a block carries no `event:` line.
pub const DEFAULT_EVENT_TYPE: &str = "message";

/// Terminal sentinel payload some backends send instead of a `done` event.
pub const DONE_SENTINEL: &str = "[DONE]";

/// A single decoded event: its wire type name and JSON payload.
///
/// No business logic lives here; the assembler decides what the type means.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: Value,
}

impl StreamEvent {
    pub fn new(event_type: impl Into<String>, data: Value) -> Self {
        Self {
            event_type: event_type.into(),
            data,
        }
    }

    /// The synthetic event produced for a `[DONE]` payload.
    pub fn done_sentinel() -> Self {
        Self::new("done", serde_json::json!({ "finished": true }))
    }

    /// `done` and `error` end a response; everything else is incremental.
    pub fn is_terminal(&self) -> bool {
        matches!(self.event_type.as_str(), "done" | "error")
    }
}

/// Represents a parsed SSE line
#[derive(Debug, Clone, PartialEq)]
pub enum SseLine {
    /// Event type declaration (e.g., "event: text_delta")
    Event(String),
    /// Data payload (e.g., "data: {\"content\": \"hello\"}")
    Data(String),
    /// Empty line - signals end of event
    Empty,
    /// Comment line (starts with ':')
    Comment(String),
}
