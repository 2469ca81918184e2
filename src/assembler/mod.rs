//! Segment assembler
//!
//! A pure reducer that folds [`StreamEvent`]s into a [`StreamingMessage`].
//! There is no state outside the message itself: the caller owns it and
//! passes it back in for every event.
//!
//! - `events` - typed [`ServerEvent`] decoding with lenient payloads
//! - `reducer` - per-event handlers and run-search
//! - `finalize` - idempotent close-out of a message
//! - `organize` - sub-step grouping for display

mod events;
mod finalize;
mod organize;
mod reducer;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::models::StreamingMessage;
use crate::sse::StreamEvent;

pub use events::{
    DeltaPayload, DonePayload, ErrorPayload, IntentEndPayload, ReasoningPayload, ServerEvent,
    SubStepEndPayload, SubStepStartPayload, ToolCallFinishPayload, ToolCallStartPayload,
    ToolProgressPayload, TranscriptPayload,
};
pub use finalize::{finalize, finalize_segments};
pub use organize::{organize_segments, SegmentNode};
pub use reducer::{find_last, find_running, reduce};

/// Apply one transport event to the current state.
///
/// With no active message every event is a no-op, which guards against
/// events that arrive after completion or abort.
pub fn apply_event(state: Option<StreamingMessage>, event: &StreamEvent) -> Option<StreamingMessage> {
    apply_event_at(state, event, Utc::now())
}

/// [`apply_event`] with an explicit clock.
pub fn apply_event_at(
    state: Option<StreamingMessage>,
    event: &StreamEvent,
    now: DateTime<Utc>,
) -> Option<StreamingMessage> {
    let message = state?;

    match ServerEvent::from_stream_event(event) {
        Ok(ServerEvent::Unknown(event_type)) => {
            debug!(event_type = %event_type, "ignoring unknown event type");
            Some(message)
        }
        Ok(decoded) => Some(reduce(message, decoded, now)),
        Err(e) => {
            debug!(error = %e, "ignoring undecodable event");
            Some(message)
        }
    }
}
